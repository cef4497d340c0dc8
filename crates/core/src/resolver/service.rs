//! Resolution orchestration.
//!
//! ```text
//!   ResolveIdentity:    failure mark? -> L3 -> single-flight identity walk -> L3 write
//!   ResolveMarketData:  failure mark? -> L1/L2 -> single-flight market walk -> L1+L2 write
//! ```
//!
//! Both public operations take a caller deadline and never fail: when nothing
//! trustworthy is available in time they return the degraded placeholder.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use tokio::time::{timeout_at, Instant};

use super::model::{MarketResolution, ResolvedIdentity, ResolvedMarketData};
use crate::cache::{
    CacheHierarchy, CacheKey, CacheStats, CacheTier, CachedValue, CreationTime, Fundamentals,
};
use crate::config::{CacheTtls, ResolverConfig};
use crate::constants::{DEFAULT_BATCH_CONCURRENCY, FUNDAMENTALS_SOURCE};
use crate::errors::Result;
use crate::failure_tracker::FailureTracker;
use crate::identity::IdentityRecord;
use crate::maintenance::{Maintenance, MaintenanceConfig, MaintenanceHandle};
use crate::single_flight::SingleFlight;
use tokenlens_market_data::{
    ChainOutcome, CircuitBreaker, DataClass, MarketField, MarketOutcome, MarketSnapshot,
    MergedQuote, ProviderChain, RateLimiter, TokenAddress, TokenDataProvider,
};

/// Everything a chain walk needs, cloneable into a detached future.
#[derive(Clone)]
struct Walker {
    cache: Arc<CacheHierarchy>,
    identity_chain: Arc<ProviderChain>,
    market_chain: Arc<ProviderChain>,
    identity_failures: Arc<FailureTracker>,
    market_failures: Arc<FailureTracker>,
    ttls: CacheTtls,
}

pub struct Resolver {
    walker: Walker,
    identity_flights: Arc<SingleFlight<TokenAddress, ResolvedIdentity>>,
    market_flights: Arc<SingleFlight<TokenAddress, MarketResolution>>,
    batch_concurrency: usize,
}

impl Resolver {
    pub fn new(
        cache: Arc<CacheHierarchy>,
        identity_chain: ProviderChain,
        market_chain: ProviderChain,
        ttls: CacheTtls,
    ) -> Self {
        Self {
            walker: Walker {
                cache,
                identity_chain: Arc::new(identity_chain),
                market_chain: Arc::new(market_chain),
                identity_failures: Arc::new(FailureTracker::new("identity", ttls.negative)),
                market_failures: Arc::new(FailureTracker::new("market", ttls.negative)),
                ttls,
            },
            identity_flights: Arc::new(SingleFlight::new()),
            market_flights: Arc::new(SingleFlight::new()),
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    /// Wires both chains from configured provider order. The chains share one
    /// rate limiter and one circuit breaker, so a provider serving both data
    /// classes is throttled and tripped once.
    pub fn from_config(
        config: &ResolverConfig,
        providers: &[Arc<dyn TokenDataProvider>],
        cache: Arc<CacheHierarchy>,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new());
        let circuit_breaker = Arc::new(CircuitBreaker::new());

        let identity_chain = ProviderChain::from_order(
            DataClass::Identity,
            &config.identity_providers,
            providers,
            Arc::clone(&rate_limiter),
            Arc::clone(&circuit_breaker),
        )
        .with_call_timeout(config.provider_timeout);

        let market_chain = ProviderChain::from_order(
            DataClass::Market,
            &config.market_providers,
            providers,
            rate_limiter,
            circuit_breaker,
        )
        .with_call_timeout(config.provider_timeout);

        info!(
            "Resolver wired: identity [{}], market [{}]",
            identity_chain.order().join(", "),
            market_chain.order().join(", ")
        );

        Self::new(cache, identity_chain, market_chain, config.ttls)
            .with_batch_concurrency(config.batch_concurrency)
    }

    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    pub fn cache(&self) -> &Arc<CacheHierarchy> {
        &self.walker.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.walker.cache.stats()
    }

    pub fn identity_failures(&self) -> &Arc<FailureTracker> {
        &self.walker.identity_failures
    }

    pub fn market_failures(&self) -> &Arc<FailureTracker> {
        &self.walker.market_failures
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Symbol, name and icon for `address`.
    pub async fn resolve_identity(&self, address: &TokenAddress, deadline: Instant) -> ResolvedIdentity {
        match timeout_at(deadline, self.identity_inner(address)).await {
            Ok(resolved) => resolved,
            Err(_) => {
                warn!("Identity resolution for {} hit its deadline", address);
                ResolvedIdentity::degraded(address)
            }
        }
    }

    /// Resolves many identities with bounded concurrency. Output order matches
    /// input order.
    pub async fn resolve_identities(
        &self,
        addresses: &[TokenAddress],
        deadline: Instant,
    ) -> Vec<ResolvedIdentity> {
        stream::iter(addresses)
            .map(|address| self.resolve_identity(address, deadline))
            .buffered(self.batch_concurrency)
            .collect()
            .await
    }

    async fn identity_inner(&self, address: &TokenAddress) -> ResolvedIdentity {
        let walker = &self.walker;

        if walker.identity_failures.is_failed(address) {
            debug!("Identity for {} is marked failed, skipping providers", address);
            return ResolvedIdentity::degraded(address);
        }

        match walker
            .cache
            .get(CacheTier::Durable, &CacheKey::identity(address))
            .await
        {
            Ok(Some(CachedValue::Identity(record))) => {
                debug!("L3 hit for {}", address);
                return ResolvedIdentity::from(&record);
            }
            Ok(_) => {}
            Err(e) => warn!(
                "Durable store unavailable for {}, resolving from providers only: {}",
                address, e
            ),
        }

        let walker = walker.clone();
        let key = address.clone();
        self.identity_flights
            .join(address.clone(), move || walker.walk_identity(key))
            .await
    }

    /// Icon URL from L2, falling back to the durable record.
    pub async fn resolve_image_url(&self, address: &TokenAddress, deadline: Instant) -> Option<String> {
        timeout_at(deadline, self.image_url_inner(address))
            .await
            .unwrap_or_else(|_| {
                warn!("Image lookup for {} hit its deadline", address);
                None
            })
    }

    async fn image_url_inner(&self, address: &TokenAddress) -> Option<String> {
        let cache = &self.walker.cache;
        let key = CacheKey::icon(address);

        if let Some((CachedValue::ImageUrl(url), _)) =
            cache.read_through(&key, self.walker.ttls.market).await
        {
            return Some(url);
        }

        match cache.get(CacheTier::Durable, &CacheKey::identity(address)).await {
            Ok(Some(CachedValue::Identity(IdentityRecord {
                image_url: Some(url),
                ..
            }))) => {
                cache
                    .write_through(&key, CachedValue::ImageUrl(url.clone()), self.walker.ttls.icon)
                    .await;
                Some(url)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Durable store unavailable for image of {}: {}", address, e);
                None
            }
        }
    }

    // =========================================================================
    // Market
    // =========================================================================

    /// Price, market cap and 24h volume for `address`.
    pub async fn resolve_market_data(
        &self,
        address: &TokenAddress,
        deadline: Instant,
    ) -> ResolvedMarketData {
        match timeout_at(deadline, self.market_inner(address)).await {
            Ok(resolved) => resolved,
            Err(_) => {
                warn!("Market resolution for {} hit its deadline", address);
                ResolvedMarketData::degraded()
            }
        }
    }

    async fn market_inner(&self, address: &TokenAddress) -> ResolvedMarketData {
        if self.walker.market_failures.is_failed(address) {
            debug!("Market data for {} is marked failed, skipping providers", address);
            return ResolvedMarketData::degraded();
        }

        let key = CacheKey::market(address);
        if let Some((CachedValue::Market(snapshot), tier)) =
            self.walker.cache.read_through(&key, Duration::ZERO).await
        {
            if tier == CacheTier::Shared {
                let remaining = remaining_ttl(&snapshot, self.walker.ttls.market);
                if !remaining.is_zero() {
                    self.walker
                        .cache
                        .promote(&key, CachedValue::Market(snapshot.clone()), remaining);
                }
            }
            return ResolvedMarketData::from(&snapshot);
        }

        self.market_flight(address).await.data
    }

    /// When the token was created, or [`CreationTime::Unknown`].
    pub async fn resolve_created_at(&self, address: &TokenAddress, deadline: Instant) -> CreationTime {
        timeout_at(deadline, self.created_at_inner(address))
            .await
            .unwrap_or_else(|_| {
                warn!("Creation time lookup for {} hit its deadline", address);
                CreationTime::Unknown
            })
    }

    async fn created_at_inner(&self, address: &TokenAddress) -> CreationTime {
        let key = CacheKey::created_at(address);
        if let Some((CachedValue::CreatedAt(created_at), _)) =
            self.walker.cache.read_through(&key, self.walker.ttls.market).await
        {
            return created_at;
        }

        if self.walker.market_failures.is_failed(address) {
            return CreationTime::Unknown;
        }

        self.market_flight(address)
            .await
            .created_at
            .unwrap_or(CreationTime::Unknown)
    }

    async fn market_flight(&self, address: &TokenAddress) -> MarketResolution {
        let walker = self.walker.clone();
        let key = address.clone();
        self.market_flights
            .join(address.clone(), move || walker.walk_market(key))
            .await
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Maintenance over this resolver's cache, failure marks and in-flight
    /// registry.
    pub fn maintenance(&self) -> Maintenance {
        Maintenance::new(
            Arc::clone(&self.walker.cache),
            self.walker.identity_chain.identity_validator().clone(),
        )
        .with_sweeper("identity failure", self.walker.identity_failures.clone())
        .with_sweeper("market failure", self.walker.market_failures.clone())
        .with_sweeper("identity flight", self.identity_flights.clone())
        .with_sweeper("market flight", self.market_flights.clone())
    }

    pub fn start_maintenance(&self, config: MaintenanceConfig) -> MaintenanceHandle {
        self.maintenance().start(config)
    }

    /// Deletes durable identities that fail validation. Returns how many.
    pub async fn purge_poisoned(&self) -> Result<usize> {
        self.maintenance().purge_poisoned().await
    }
}

impl Walker {
    async fn walk_identity(self, address: TokenAddress) -> ResolvedIdentity {
        let outcome = self.identity_chain.resolve_identity(&address).await;

        let (candidate, source) = match outcome {
            ChainOutcome::Accepted { value, source, .. } => (value, source),
            unresolved => {
                if unresolved.is_explicit_rejection() {
                    info!(
                        "Identity for {} explicitly rejected, suppressing for {}s: {}",
                        address,
                        self.identity_failures.ttl().as_secs(),
                        unresolved.diagnostics().summary()
                    );
                    self.identity_failures.mark_failed(&address);
                } else {
                    debug!(
                        "Identity for {} unresolved without rejection: {}",
                        address,
                        unresolved.diagnostics().summary()
                    );
                }
                return ResolvedIdentity::degraded(&address);
            }
        };

        let record = IdentityRecord::accepted(address.clone(), candidate, &source);
        if let Err(e) = self
            .cache
            .set(
                CacheTier::Durable,
                &CacheKey::identity(&address),
                CachedValue::Identity(record.clone()),
                Duration::ZERO,
            )
            .await
        {
            warn!("Could not persist identity for {}: {}", address, e);
        }

        if let Some(url) = &record.image_url {
            self.cache
                .write_through(
                    &CacheKey::icon(&address),
                    CachedValue::ImageUrl(url.clone()),
                    self.ttls.icon,
                )
                .await;
        }

        ResolvedIdentity::from(&record)
    }

    async fn walk_market(self, address: TokenAddress) -> MarketResolution {
        let outcome = self.market_chain.resolve_market(&address).await;
        let rejected = outcome.is_explicit_rejection();
        let MarketOutcome {
            mut merged,
            diagnostics,
        } = outcome;

        let created_at = self
            .record_created_at(&address, &merged, diagnostics.has_success())
            .await;

        let filled = !merged.is_resolved() && self.fill_fundamentals(&address, &mut merged).await;

        if merged.price.is_none() && merged.market_cap.is_none() && merged.volume_24h.is_none() {
            if rejected {
                info!(
                    "Market data for {} explicitly rejected, suppressing for {}s: {}",
                    address,
                    self.market_failures.ttl().as_secs(),
                    diagnostics.summary()
                );
                self.market_failures.mark_failed(&address);
            }
            return MarketResolution {
                data: ResolvedMarketData::degraded(),
                created_at,
            };
        }

        let snapshot = MarketSnapshot {
            address: address.clone(),
            price: merged.price.unwrap_or(0.0),
            market_cap: merged.market_cap.unwrap_or(0.0),
            volume_24h: merged.volume_24h.unwrap_or(0.0),
            captured_at: Utc::now(),
            sources: merged.sources.clone(),
        };

        let resolved = merged.is_resolved();
        if resolved {
            self.cache
                .write_through(
                    &CacheKey::market(&address),
                    CachedValue::Market(snapshot.clone()),
                    self.ttls.market,
                )
                .await;
        } else {
            debug!(
                "Market data for {} missing {:?}, not caching",
                address,
                merged.missing()
            );
        }

        if !filled {
            if let (Some(market_cap), Some(volume_24h)) = (merged.market_cap, merged.volume_24h) {
                let fundamentals = Fundamentals {
                    market_cap,
                    volume_24h,
                    captured_at: snapshot.captured_at,
                };
                self.cache
                    .write_through(
                        &CacheKey::fundamentals(&address),
                        CachedValue::Fundamentals(fundamentals),
                        self.ttls.fundamentals,
                    )
                    .await;
            }
        }

        let mut data = ResolvedMarketData::from(&snapshot);
        data.degraded = !resolved;
        MarketResolution { data, created_at }
    }

    /// Caches the creation time the walk found. When providers answered but
    /// none knew it, the `Unknown` sentinel is cached without overwriting a
    /// real timestamp another instance may have written.
    async fn record_created_at(
        &self,
        address: &TokenAddress,
        merged: &MergedQuote,
        answered: bool,
    ) -> Option<CreationTime> {
        let key = CacheKey::created_at(address);
        match merged.created_at {
            Some(ts) => {
                let known = CreationTime::Known(ts);
                self.cache
                    .write_through(&key, CachedValue::CreatedAt(known), self.ttls.created_at)
                    .await;
                Some(known)
            }
            None if answered => {
                if let Err(e) = self
                    .cache
                    .set_if_absent(
                        &key,
                        CachedValue::CreatedAt(CreationTime::Unknown),
                        self.ttls.created_at,
                    )
                    .await
                {
                    warn!("Could not cache unknown creation time for {}: {}", address, e);
                }
                Some(CreationTime::Unknown)
            }
            None => None,
        }
    }

    /// Fills market cap and volume from the longer-lived fundamentals entry.
    /// Returns true if anything was filled.
    async fn fill_fundamentals(&self, address: &TokenAddress, merged: &mut MergedQuote) -> bool {
        let Some((CachedValue::Fundamentals(fundamentals), _)) = self
            .cache
            .read_through(&CacheKey::fundamentals(address), Duration::ZERO)
            .await
        else {
            return false;
        };

        let missing = merged.missing();
        let mut filled = false;
        for (field, value) in [
            (MarketField::MarketCap, fundamentals.market_cap),
            (MarketField::Volume24h, fundamentals.volume_24h),
        ] {
            if missing.contains(&field) {
                merged.fill_missing(field, value, Cow::Borrowed(FUNDAMENTALS_SOURCE));
                filled = true;
            }
        }

        if filled {
            debug!("Filled {:?} for {} from cached fundamentals", missing, address);
        }
        filled
    }
}

pub(crate) fn remaining_ttl(snapshot: &MarketSnapshot, ttl: Duration) -> Duration {
    let age = (Utc::now() - snapshot.captured_at)
        .to_std()
        .unwrap_or_default();
    ttl.saturating_sub(age)
}
