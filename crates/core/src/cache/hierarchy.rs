//! The three-tier cache.
//!
//! ```text
//!   read:   L1 (memory) -> L2 (shared) -> L3 (durable, identities only)
//!   write:  L1 + L2 for expiring values, L3 for validated identities
//! ```
//!
//! The typed tier operations ([`CacheHierarchy::get`], [`CacheHierarchy::set`],
//! [`CacheHierarchy::invalidate`]) surface backend errors. The `*_through`
//! helpers used on the resolution hot path log those errors and carry on as if
//! the tier had missed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;

use super::key::{CacheClass, CacheKey, CacheTier, CachedValue};
use super::memory::MemoryCache;
use super::shared::{InMemorySharedCache, SharedCache};
use crate::errors::{CacheError, Error, Result};
use crate::identity::{DurableStore, InMemoryDurableStore};

/// Point-in-time counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub l1_hits: u64,
    pub l1_misses: u64,
    pub l1_entries: usize,
    pub l2_hits: u64,
    pub l2_misses: u64,
    pub l2_errors: u64,
}

pub struct CacheHierarchy {
    memory: MemoryCache,
    shared: Arc<dyn SharedCache>,
    durable: Arc<dyn DurableStore>,
    l2_hits: AtomicU64,
    l2_misses: AtomicU64,
    l2_errors: AtomicU64,
}

impl CacheHierarchy {
    pub fn new(
        l1_capacity: usize,
        shared: Arc<dyn SharedCache>,
        durable: Arc<dyn DurableStore>,
    ) -> Self {
        Self {
            memory: MemoryCache::new(l1_capacity),
            shared,
            durable,
            l2_hits: AtomicU64::new(0),
            l2_misses: AtomicU64::new(0),
            l2_errors: AtomicU64::new(0),
        }
    }

    /// All three tiers in process memory.
    pub fn in_memory(l1_capacity: usize) -> Self {
        Self::new(
            l1_capacity,
            Arc::new(InMemorySharedCache::new()),
            Arc::new(InMemoryDurableStore::new()),
        )
    }

    pub fn durable(&self) -> &Arc<dyn DurableStore> {
        &self.durable
    }

    // =========================================================================
    // Tier operations
    // =========================================================================

    /// Reads one tier.
    ///
    /// The durable tier only holds identities; other classes always miss there.
    pub async fn get(&self, tier: CacheTier, key: &CacheKey) -> Result<Option<CachedValue>> {
        match tier {
            CacheTier::Memory => Ok(self.memory.get(&key.to_string())),
            CacheTier::Shared => {
                let rendered = key.to_string();
                let raw = self.shared.get(&rendered).await.inspect_err(|_| {
                    self.l2_errors.fetch_add(1, Ordering::Relaxed);
                })?;
                let value = raw.map(|raw| decode(&rendered, &raw)).transpose()?;
                let counter = if value.is_some() {
                    &self.l2_hits
                } else {
                    &self.l2_misses
                };
                counter.fetch_add(1, Ordering::Relaxed);
                Ok(value)
            }
            CacheTier::Durable => {
                if key.class != CacheClass::Identity {
                    return Ok(None);
                }
                let record = self.durable.find(&key.address).await?;
                Ok(record.map(CachedValue::Identity))
            }
        }
    }

    /// Writes one tier. `ttl` is ignored by the durable tier.
    pub async fn set(
        &self,
        tier: CacheTier,
        key: &CacheKey,
        value: CachedValue,
        ttl: Duration,
    ) -> Result<()> {
        if value.class() != key.class {
            return Err(Error::Unexpected(format!(
                "{} value written under {} key",
                value.class().as_str(),
                key.class.as_str()
            )));
        }

        match tier {
            CacheTier::Memory => {
                self.memory.insert(key.to_string(), value, ttl);
                Ok(())
            }
            CacheTier::Shared => {
                let encoded = serde_json::to_string(&value)?;
                self.shared
                    .set_ex(&key.to_string(), &encoded, ttl)
                    .await
                    .inspect_err(|_| {
                        self.l2_errors.fetch_add(1, Ordering::Relaxed);
                    })
            }
            CacheTier::Durable => match value {
                CachedValue::Identity(record) => self.durable.upsert(&record).await,
                other => Err(Error::Unexpected(format!(
                    "durable tier only stores identities, got {}",
                    other.class().as_str()
                ))),
            },
        }
    }

    /// Writes to the shared tier only if the key is absent there. On success
    /// the value is also placed in L1.
    pub async fn set_if_absent(
        &self,
        key: &CacheKey,
        value: CachedValue,
        ttl: Duration,
    ) -> Result<bool> {
        let encoded = serde_json::to_string(&value)?;
        let written = self
            .shared
            .set_nx_ex(&key.to_string(), &encoded, ttl)
            .await
            .inspect_err(|_| {
                self.l2_errors.fetch_add(1, Ordering::Relaxed);
            })?;
        if written {
            self.memory.insert(key.to_string(), value, ttl);
        }
        Ok(written)
    }

    /// Removes the key from every tier that may hold it.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<()> {
        let rendered = key.to_string();
        self.memory.remove(&rendered);
        self.shared.delete(&rendered).await?;
        if key.class == CacheClass::Identity {
            self.durable
                .delete(&[key.address.to_string()])
                .await?;
        }
        Ok(())
    }

    // =========================================================================
    // Hot-path helpers
    // =========================================================================

    /// L1 then L2. An L2 hit is copied into L1 for `promote_ttl`.
    pub async fn read_through(
        &self,
        key: &CacheKey,
        promote_ttl: Duration,
    ) -> Option<(CachedValue, CacheTier)> {
        if let Some(value) = self.memory.get(&key.to_string()) {
            debug!("L1 hit for {}", key);
            return Some((value, CacheTier::Memory));
        }

        match self.get(CacheTier::Shared, key).await {
            Ok(Some(value)) => {
                debug!("L2 hit for {}", key);
                if !promote_ttl.is_zero() {
                    self.promote(key, value.clone(), promote_ttl);
                }
                Some((value, CacheTier::Shared))
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Shared cache read for {} failed, treating as miss: {}", key, e);
                None
            }
        }
    }

    /// Places a value read from a slower tier into L1.
    pub fn promote(&self, key: &CacheKey, value: CachedValue, ttl: Duration) {
        self.memory.insert(key.to_string(), value, ttl);
    }

    /// L1 and L2. A failed L2 write is logged; L1 still holds the value.
    pub async fn write_through(&self, key: &CacheKey, value: CachedValue, ttl: Duration) {
        if let Err(e) = self
            .set(CacheTier::Memory, key, value.clone(), ttl)
            .await
        {
            warn!("Refusing to cache {}: {}", key, e);
            return;
        }
        if let Err(e) = self.set(CacheTier::Shared, key, value, ttl).await {
            warn!("Shared cache write for {} failed: {}", key, e);
        }
    }

    // =========================================================================
    // Housekeeping
    // =========================================================================

    /// Reclaims expired L1 entries.
    pub fn sweep_memory(&self) -> usize {
        self.memory.sweep_expired()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            l1_hits: self.memory.hits(),
            l1_misses: self.memory.misses(),
            l1_entries: self.memory.len(),
            l2_hits: self.l2_hits.load(Ordering::Relaxed),
            l2_misses: self.l2_misses.load(Ordering::Relaxed),
            l2_errors: self.l2_errors.load(Ordering::Relaxed),
        }
    }
}

fn decode(key: &str, raw: &str) -> Result<CachedValue> {
    serde_json::from_str(raw).map_err(|e| {
        CacheError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CreationTime;
    use crate::identity::IdentityRecord;
    use std::borrow::Cow;
    use tokenlens_market_data::{IdentityCandidate, TokenAddress};

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    fn bonk() -> TokenAddress {
        TokenAddress::parse(BONK).unwrap()
    }

    fn setup() -> (CacheHierarchy, Arc<InMemorySharedCache>, Arc<InMemoryDurableStore>) {
        let shared = Arc::new(InMemorySharedCache::new());
        let durable = Arc::new(InMemoryDurableStore::new());
        let cache = CacheHierarchy::new(100, shared.clone(), durable.clone());
        (cache, shared, durable)
    }

    #[tokio::test]
    async fn test_read_through_promotes_l2_hit_into_l1() {
        let (cache, _, _) = setup();
        let key = CacheKey::icon(&bonk());
        let value = CachedValue::ImageUrl("https://img/bonk.png".into());
        cache
            .set(CacheTier::Shared, &key, value.clone(), Duration::from_secs(60))
            .await
            .unwrap();

        let (hit, tier) = cache.read_through(&key, Duration::from_secs(60)).await.unwrap();
        assert_eq!(hit, value);
        assert_eq!(tier, CacheTier::Shared);

        let (_, tier) = cache.read_through(&key, Duration::from_secs(60)).await.unwrap();
        assert_eq!(tier, CacheTier::Memory);

        let stats = cache.stats();
        assert_eq!(stats.l2_hits, 1);
        assert_eq!(stats.l1_hits, 1);
        assert_eq!(stats.l1_entries, 1);
    }

    #[tokio::test]
    async fn test_shared_outage_is_a_miss_on_hot_path() {
        let (cache, shared, _) = setup();
        shared.set_available(false);
        let key = CacheKey::market(&bonk());
        assert!(cache.read_through(&key, Duration::from_secs(60)).await.is_none());
        assert!(cache.get(CacheTier::Shared, &key).await.is_err());
        assert_eq!(cache.stats().l2_errors, 2);
    }

    #[tokio::test]
    async fn test_durable_tier_only_holds_identities() {
        let (cache, _, durable) = setup();
        let key = CacheKey::icon(&bonk());
        let err = cache
            .set(
                CacheTier::Durable,
                &key,
                CachedValue::ImageUrl("x".into()),
                Duration::ZERO,
            )
            .await;
        assert!(err.is_err());
        assert!(durable.is_empty());

        let record = IdentityRecord::accepted(
            bonk(),
            IdentityCandidate::new("BONK", "Bonk"),
            &Cow::Borrowed("TEST"),
        );
        let key = CacheKey::identity(&bonk());
        cache
            .set(CacheTier::Durable, &key, CachedValue::Identity(record.clone()), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(
            cache.get(CacheTier::Durable, &key).await.unwrap(),
            Some(CachedValue::Identity(record))
        );
    }

    #[tokio::test]
    async fn test_mismatched_value_and_key_is_refused() {
        let (cache, _, _) = setup();
        let key = CacheKey::market(&bonk());
        let err = cache
            .set(
                CacheTier::Memory,
                &key,
                CachedValue::CreatedAt(CreationTime::Unknown),
                Duration::from_secs(1),
            )
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_set_if_absent_keeps_existing_value() {
        let (cache, _, _) = setup();
        let key = CacheKey::created_at(&bonk());
        let known = CachedValue::CreatedAt(CreationTime::Known(chrono::Utc::now()));
        cache.write_through(&key, known.clone(), Duration::from_secs(60)).await;

        let written = cache
            .set_if_absent(
                &key,
                CachedValue::CreatedAt(CreationTime::Unknown),
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        assert!(!written);
        assert_eq!(
            cache.get(CacheTier::Shared, &key).await.unwrap(),
            Some(known)
        );
    }

    #[tokio::test]
    async fn test_invalidate_clears_all_tiers() {
        let (cache, shared, durable) = setup();
        let record = IdentityRecord::accepted(
            bonk(),
            IdentityCandidate::new("BONK", "Bonk"),
            &Cow::Borrowed("TEST"),
        );
        let key = CacheKey::identity(&bonk());
        cache
            .set(CacheTier::Durable, &key, CachedValue::Identity(record), Duration::ZERO)
            .await
            .unwrap();

        cache.invalidate(&key).await.unwrap();
        assert!(durable.is_empty());
        assert!(shared.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_shared_value_is_reported() {
        let (cache, shared, _) = setup();
        let key = CacheKey::market(&bonk());
        shared
            .set_ex(&key.to_string(), "{not json", Duration::from_secs(60))
            .await
            .unwrap();
        let err = cache.get(CacheTier::Shared, &key).await.unwrap_err();
        assert!(matches!(err, Error::Cache(CacheError::Corrupt { .. })));
    }
}
