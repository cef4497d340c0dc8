//! Resolver configuration.
//!
//! Everything that tunes the engine is data: provider order per data class,
//! time-to-live values, sweep intervals and backend locations. Values come from
//! `TOKENLENS_*` environment variables (a `.env` file is honored) with the
//! defaults in [`crate::constants`].

use std::str::FromStr;
use std::time::Duration;

use log::warn;

use crate::constants::*;
use crate::errors::{Error, Result};

const DEFAULT_IDENTITY_PROVIDERS: &str = "SOLANA_RPC,DEXSCREENER,BIRDEYE,JUPITER";
const DEFAULT_MARKET_PROVIDERS: &str = "DEXSCREENER,BIRDEYE,JUPITER";
const DEFAULT_SOLANA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 4_000;

/// Time-to-live values used by the resolver when writing to the cache tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheTtls {
    pub icon: Duration,
    pub created_at: Duration,
    pub market: Duration,
    pub fundamentals: Duration,
    pub negative: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            icon: ICON_TTL,
            created_at: CREATED_AT_TTL,
            market: DEFAULT_MARKET_TTL,
            fundamentals: DEFAULT_FUNDAMENTALS_TTL,
            negative: DEFAULT_NEGATIVE_TTL,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolverConfig {
    /// Provider ids for identity, in walk order.
    pub identity_providers: Vec<String>,
    /// Provider ids for market data, in walk order.
    pub market_providers: Vec<String>,
    pub provider_timeout: Duration,
    pub ttls: CacheTtls,
    pub l1_capacity: usize,
    pub sweep_interval: Duration,
    pub purge_interval: Duration,
    pub batch_concurrency: usize,
    /// SQLite file for the durable tier. In-memory when unset.
    pub db_path: Option<String>,
    /// Redis URL for the shared tier. In-memory when unset.
    pub redis_url: Option<String>,
    pub solana_rpc_url: String,
    pub birdeye_api_key: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            identity_providers: split_list(DEFAULT_IDENTITY_PROVIDERS),
            market_providers: split_list(DEFAULT_MARKET_PROVIDERS),
            provider_timeout: Duration::from_millis(DEFAULT_PROVIDER_TIMEOUT_MS),
            ttls: CacheTtls::default(),
            l1_capacity: DEFAULT_L1_CAPACITY,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            purge_interval: DEFAULT_PURGE_INTERVAL,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            db_path: None,
            redis_url: None,
            solana_rpc_url: DEFAULT_SOLANA_RPC_URL.to_string(),
            birdeye_api_key: None,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let identity_providers = get("TOKENLENS_IDENTITY_PROVIDERS")
            .map(|v| split_list(&v))
            .unwrap_or(defaults.identity_providers);
        let market_providers = get("TOKENLENS_MARKET_PROVIDERS")
            .map(|v| split_list(&v))
            .unwrap_or(defaults.market_providers);

        let provider_timeout = Duration::from_millis(parse_or(
            &get,
            "TOKENLENS_PROVIDER_TIMEOUT_MS",
            DEFAULT_PROVIDER_TIMEOUT_MS,
        )?);

        let market = clamp_market_ttl(
            "TOKENLENS_MARKET_TTL_SECS",
            Duration::from_secs(parse_or(
                &get,
                "TOKENLENS_MARKET_TTL_SECS",
                DEFAULT_MARKET_TTL.as_secs(),
            )?),
        );
        let fundamentals = clamp_market_ttl(
            "TOKENLENS_FUNDAMENTALS_TTL_SECS",
            Duration::from_secs(parse_or(
                &get,
                "TOKENLENS_FUNDAMENTALS_TTL_SECS",
                DEFAULT_FUNDAMENTALS_TTL.as_secs(),
            )?),
        );
        let negative = Duration::from_secs(parse_or(
            &get,
            "TOKENLENS_NEGATIVE_TTL_SECS",
            DEFAULT_NEGATIVE_TTL.as_secs(),
        )?);

        let l1_capacity = parse_or(&get, "TOKENLENS_L1_CAPACITY", DEFAULT_L1_CAPACITY)?;
        if l1_capacity == 0 {
            return Err(Error::InvalidConfigValue(
                "TOKENLENS_L1_CAPACITY must be greater than zero".to_string(),
            ));
        }

        let sweep_interval = Duration::from_secs(parse_or(
            &get,
            "TOKENLENS_L1_SWEEP_SECS",
            DEFAULT_SWEEP_INTERVAL.as_secs(),
        )?);
        let purge_interval = Duration::from_secs(parse_or(
            &get,
            "TOKENLENS_PURGE_INTERVAL_SECS",
            DEFAULT_PURGE_INTERVAL.as_secs(),
        )?);
        if sweep_interval.is_zero() || purge_interval.is_zero() {
            return Err(Error::InvalidConfigValue(
                "maintenance intervals must be greater than zero".to_string(),
            ));
        }

        let batch_concurrency = parse_or(
            &get,
            "TOKENLENS_BATCH_CONCURRENCY",
            DEFAULT_BATCH_CONCURRENCY,
        )?
        .max(1);

        Ok(Self {
            identity_providers,
            market_providers,
            provider_timeout,
            ttls: CacheTtls {
                market,
                fundamentals,
                negative,
                ..CacheTtls::default()
            },
            l1_capacity,
            sweep_interval,
            purge_interval,
            batch_concurrency,
            db_path: get("TOKENLENS_DB_PATH"),
            redis_url: get("TOKENLENS_REDIS_URL"),
            solana_rpc_url: get("SOLANA_RPC_URL").unwrap_or(defaults.solana_rpc_url),
            birdeye_api_key: get("BIRDEYE_API_KEY"),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::InvalidConfigValue(format!("{key}={raw}"))),
    }
}

fn clamp_market_ttl(key: &str, ttl: Duration) -> Duration {
    let clamped = ttl.clamp(MIN_MARKET_TTL, MAX_MARKET_TTL);
    if clamped != ttl {
        warn!(
            "{} of {}s is outside [{}s, {}s], using {}s",
            key,
            ttl.as_secs(),
            MIN_MARKET_TTL.as_secs(),
            MAX_MARKET_TTL.as_secs(),
            clamped.as_secs()
        );
    }
    clamped
}
