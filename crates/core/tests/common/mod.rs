//! Shared fixtures for resolver integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use tokenlens_core::{CacheHierarchy, CacheTtls, InMemoryDurableStore, InMemorySharedCache, Resolver};
use tokenlens_market_data::{
    AddressKind, DataClass, IdentityCandidate, MarketDataError, MarketQuote, ProviderCapabilities,
    ProviderChain, RateLimit, RetryPolicy, TokenAddress, TokenDataProvider,
};

/// Unseen address used by the happy-path scenarios.
pub const X: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
/// Address every provider answers with garbage for.
pub const Y: &str = "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm";

pub fn addr(raw: &str) -> TokenAddress {
    TokenAddress::parse(raw).unwrap()
}

pub fn deadline(ms: u64) -> Instant {
    Instant::now() + Duration::from_millis(ms)
}

pub fn quote(price: Option<f64>, market_cap: Option<f64>, volume_24h: Option<f64>) -> MarketQuote {
    MarketQuote {
        price,
        market_cap,
        volume_24h,
        created_at: None,
    }
}

// =============================================================================
// Scripted provider
// =============================================================================

/// What a scripted provider answers with.
#[derive(Clone, Debug)]
pub enum Reply {
    Identity {
        symbol: &'static str,
        name: &'static str,
        image_url: Option<&'static str>,
    },
    Quote(MarketQuote),
    Timeout,
    RateLimited,
    NotFound,
    /// Provider-side invariant violation.
    Invalid,
    /// Never answers within any sane deadline.
    Hang,
}

impl Reply {
    pub fn symbol(symbol: &'static str) -> Self {
        Reply::Identity {
            symbol,
            name: "Some Token Name",
            image_url: None,
        }
    }
}

pub struct ScriptedProvider {
    id: &'static str,
    identity: Mutex<Reply>,
    market: Mutex<Reply>,
    delay: Duration,
    identity_calls: AtomicUsize,
    market_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(id: &'static str, identity: Reply, market: Reply) -> Arc<Self> {
        Self::with_delay(id, identity, market, Duration::ZERO)
    }

    pub fn identity(id: &'static str, reply: Reply) -> Arc<Self> {
        Self::new(id, reply, Reply::NotFound)
    }

    pub fn market(id: &'static str, reply: Reply) -> Arc<Self> {
        Self::new(id, Reply::NotFound, reply)
    }

    pub fn with_delay(id: &'static str, identity: Reply, market: Reply, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id,
            identity: Mutex::new(identity),
            market: Mutex::new(market),
            delay,
            identity_calls: AtomicUsize::new(0),
            market_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_identity(&self, reply: Reply) {
        *self.identity.lock().unwrap() = reply;
    }

    pub fn set_market(&self, reply: Reply) {
        *self.market.lock().unwrap() = reply;
    }

    pub fn identity_calls(&self) -> usize {
        self.identity_calls.load(Ordering::SeqCst)
    }

    pub fn market_calls(&self) -> usize {
        self.market_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.identity_calls() + self.market_calls()
    }

    async fn answer(&self, reply: Reply) -> Result<Reply, MarketDataError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let provider = self.id.to_string();
        match reply {
            Reply::Timeout => Err(MarketDataError::Timeout { provider }),
            Reply::RateLimited => Err(MarketDataError::RateLimited { provider }),
            Reply::NotFound => Err(MarketDataError::NotFound { provider }),
            Reply::Invalid => Err(MarketDataError::ExplicitInvalid {
                provider,
                message: "malformed token record".to_string(),
            }),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(MarketDataError::Timeout { provider })
            }
            answer => Ok(answer),
        }
    }
}

#[async_trait]
impl TokenDataProvider for ScriptedProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            identity: true,
            market: true,
            address_kinds: &[AddressKind::Base58, AddressKind::Evm],
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 600_000,
            max_concurrency: 1_000,
            min_delay: Duration::ZERO,
        }
    }

    async fn fetch_identity(
        &self,
        _address: &TokenAddress,
        _timeout: Duration,
    ) -> Result<IdentityCandidate, MarketDataError> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.identity.lock().unwrap().clone();
        match self.answer(reply).await? {
            Reply::Identity {
                symbol,
                name,
                image_url,
            } => {
                let candidate = IdentityCandidate::new(symbol, name);
                Ok(match image_url {
                    Some(url) => candidate.with_image_url(url),
                    None => candidate,
                })
            }
            _ => Err(MarketDataError::NotFound {
                provider: self.id.to_string(),
            }),
        }
    }

    async fn fetch_market(
        &self,
        _address: &TokenAddress,
        _timeout: Duration,
    ) -> Result<MarketQuote, MarketDataError> {
        self.market_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.market.lock().unwrap().clone();
        match self.answer(reply).await? {
            Reply::Quote(quote) => Ok(quote),
            _ => Err(MarketDataError::NotFound {
                provider: self.id.to_string(),
            }),
        }
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub resolver: Resolver,
    pub cache: Arc<CacheHierarchy>,
    pub shared: Arc<InMemorySharedCache>,
    pub durable: Arc<InMemoryDurableStore>,
}

pub fn chain(class: DataClass, providers: &[Arc<ScriptedProvider>]) -> ProviderChain {
    let providers: Vec<Arc<dyn TokenDataProvider>> = providers
        .iter()
        .map(|p| Arc::clone(p) as Arc<dyn TokenDataProvider>)
        .collect();
    ProviderChain::new(class, providers)
        .with_retry_policy(RetryPolicy::immediate())
        .with_call_timeout(Duration::from_secs(2))
}

pub fn harness(identity: &[Arc<ScriptedProvider>], market: &[Arc<ScriptedProvider>]) -> Harness {
    harness_with_ttls(identity, market, CacheTtls::default())
}

pub fn harness_with_ttls(
    identity: &[Arc<ScriptedProvider>],
    market: &[Arc<ScriptedProvider>],
    ttls: CacheTtls,
) -> Harness {
    let shared = Arc::new(InMemorySharedCache::new());
    let durable = Arc::new(InMemoryDurableStore::new());
    let cache = Arc::new(CacheHierarchy::new(1_000, shared.clone(), durable.clone()));
    let resolver = Resolver::new(
        cache.clone(),
        chain(DataClass::Identity, identity),
        chain(DataClass::Market, market),
        ttls,
    );
    Harness {
        resolver,
        cache,
        shared,
        durable,
    }
}
