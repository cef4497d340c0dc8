use std::time::Duration;

/// Prefix for every key written to the shared cache
pub const CACHE_KEY_PREFIX: &str = "tokenlens";

/// Icon URLs rarely change once a token is launched
pub const ICON_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Creation time, including the "unknown" sentinel
pub const CREATED_AT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Lower bound for market snapshot freshness
pub const MIN_MARKET_TTL: Duration = Duration::from_secs(60);

/// Upper bound for market snapshot freshness
pub const MAX_MARKET_TTL: Duration = Duration::from_secs(300);

/// Default market snapshot freshness
pub const DEFAULT_MARKET_TTL: Duration = MIN_MARKET_TTL;

/// Default freshness of the market cap + volume fallback entry
pub const DEFAULT_FUNDAMENTALS_TTL: Duration = MAX_MARKET_TTL;

/// How long an explicitly rejected address is short-circuited
pub const DEFAULT_NEGATIVE_TTL: Duration = Duration::from_secs(5 * 60);

/// Maximum number of in-process (L1) entries
pub const DEFAULT_L1_CAPACITY: usize = 10_000;

/// Interval for the L1 and failure-tracker sweep
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Interval for purging poisoned durable records
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Records scanned per page during the poisoned-record purge
pub const PURGE_PAGE_SIZE: usize = 500;

/// Concurrent resolutions in a batch
pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;

/// Source reported when no provider or cache produced the value
pub const DEGRADED_SOURCE: &str = "DEGRADED";

/// Source reported for fields filled from the cached fundamentals entry
pub const FUNDAMENTALS_SOURCE: &str = "FUNDAMENTALS_CACHE";
