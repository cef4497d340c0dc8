//! Tokenlens Core
//!
//! Resolution engine for token identity and market data. A [`Resolver`] sits in
//! front of two provider chains (from `tokenlens-market-data`) and a three-tier
//! [`CacheHierarchy`]:
//!
//! - L1: bounded in-process map, swept on an interval
//! - L2: shared store with per-key expiry ([`SharedCache`], Redis or in-memory)
//! - L3: durable identity records ([`DurableStore`])
//!
//! Concurrent requests for the same address share one chain walk, explicit
//! rejections are suppressed for a short while by a [`FailureTracker`], and both
//! public operations always return a value before the caller's deadline.

pub mod cache;
pub mod config;
pub mod constants;
pub mod errors;
pub mod failure_tracker;
pub mod identity;
pub mod maintenance;
pub mod resolver;
pub mod single_flight;

pub use cache::{
    CacheClass, CacheHierarchy, CacheKey, CacheStats, CacheTier, CachedValue, CreationTime,
    Fundamentals, InMemorySharedCache, SharedCache,
};
#[cfg(feature = "redis")]
pub use cache::RedisSharedCache;
pub use config::{CacheTtls, ResolverConfig};
pub use errors::{CacheError, DatabaseError, Error, Result};
pub use failure_tracker::FailureTracker;
pub use identity::{DurableStore, IdentityPage, IdentityRecord, InMemoryDurableStore};
pub use maintenance::{purge_poisoned, Maintenance, MaintenanceConfig, MaintenanceHandle, Sweep};
pub use resolver::{ResolvedIdentity, ResolvedMarketData, Resolver};
pub use single_flight::SingleFlight;
