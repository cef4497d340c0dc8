//! Ordered provider fallback chains.
//!
//! A [`ProviderChain`] walks its providers strictly in configured order for a
//! single data class. For each provider it:
//!
//! 1. Skips it if its circuit is open or it does not index the address
//! 2. Acquires a rate limiter token
//! 3. Calls it under the per-call timeout
//! 4. Retries on the same provider according to the error's [`RetryClass`]
//! 5. Validates the answer; a rejected answer is recorded and the walk goes on
//!
//! The identity walk stops at the first accepted answer. The market walk
//! stops once every field holds a positive value.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use super::backoff::RetryPolicy;
use super::merge::MergedQuote;
use super::skip_reason::{FetchDiagnostics, SkipReason};
use super::{CircuitBreaker, QuoteValidator, RateLimiter};
use crate::errors::{ErrorKind, MarketDataError, RetryClass};
use crate::models::{DataClass, IdentityCandidate, ProviderId, TokenAddress};
use crate::provider::TokenDataProvider;
use crate::validator::IdentityValidator;

/// Default deadline for a single provider call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(4);

/// Result of an identity walk.
#[derive(Clone, Debug)]
pub enum ChainOutcome<T> {
    /// A provider's answer passed validation.
    Accepted {
        value: T,
        source: ProviderId,
        diagnostics: FetchDiagnostics,
    },
    /// Every provider was exhausted without an accepted answer.
    Unresolved { diagnostics: FetchDiagnostics },
}

impl<T> ChainOutcome<T> {
    pub fn diagnostics(&self) -> &FetchDiagnostics {
        match self {
            Self::Accepted { diagnostics, .. } | Self::Unresolved { diagnostics } => diagnostics,
        }
    }

    /// Unresolved, and at least one provider gave a definitive rejected answer.
    pub fn is_explicit_rejection(&self) -> bool {
        matches!(self, Self::Unresolved { diagnostics } if diagnostics.has_explicit_rejection())
    }
}

/// Result of a market walk: whatever could be merged, plus diagnostics.
#[derive(Clone, Debug, Default)]
pub struct MarketOutcome {
    pub merged: MergedQuote,
    pub diagnostics: FetchDiagnostics,
}

impl MarketOutcome {
    pub fn is_explicit_rejection(&self) -> bool {
        !self.diagnostics.has_success() && self.diagnostics.has_explicit_rejection()
    }
}

/// Ordered list of providers for one data class.
pub struct ProviderChain {
    class: DataClass,
    providers: Vec<Arc<dyn TokenDataProvider>>,
    rate_limiter: Arc<RateLimiter>,
    circuit_breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    call_timeout: Duration,
    identity_validator: IdentityValidator,
    quote_validator: QuoteValidator,
}

impl ProviderChain {
    /// Build a chain from providers in the order given.
    ///
    /// Providers that do not serve `class` are dropped.
    pub fn new(class: DataClass, providers: Vec<Arc<dyn TokenDataProvider>>) -> Self {
        Self::with_shared(
            class,
            providers,
            Arc::new(RateLimiter::new()),
            Arc::new(CircuitBreaker::new()),
        )
    }

    /// Build a chain that shares rate limiting and circuit state with other
    /// chains, so a provider serving both classes is throttled once.
    pub fn with_shared(
        class: DataClass,
        providers: Vec<Arc<dyn TokenDataProvider>>,
        rate_limiter: Arc<RateLimiter>,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Self {
        let providers: Vec<_> = providers
            .into_iter()
            .filter(|p| {
                let serves = p.capabilities().serves(class);
                if !serves {
                    warn!("Provider '{}' does not serve {} data, dropping", p.id(), class);
                }
                serves
            })
            .collect();

        for provider in &providers {
            rate_limiter.configure(&Cow::Borrowed(provider.id()), provider.rate_limit());
        }

        Self {
            class,
            providers,
            rate_limiter,
            circuit_breaker,
            retry: RetryPolicy::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            identity_validator: IdentityValidator::new(),
            quote_validator: QuoteValidator::new(),
        }
    }

    /// Build a chain whose order is given as provider ids.
    ///
    /// Ids not present in `available` are logged and ignored, as are repeats.
    pub fn from_order(
        class: DataClass,
        order: &[String],
        available: &[Arc<dyn TokenDataProvider>],
        rate_limiter: Arc<RateLimiter>,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Self {
        let mut selected: Vec<Arc<dyn TokenDataProvider>> = Vec::with_capacity(order.len());
        for id in order {
            let id = id.trim();
            if selected.iter().any(|p| p.id().eq_ignore_ascii_case(id)) {
                continue;
            }
            match available.iter().find(|p| p.id().eq_ignore_ascii_case(id)) {
                Some(provider) => selected.push(Arc::clone(provider)),
                None => warn!("Unknown provider '{}' in {} chain order, ignoring", id, class),
            }
        }
        Self::with_shared(class, selected, rate_limiter, circuit_breaker)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_identity_validator(mut self, validator: IdentityValidator) -> Self {
        self.identity_validator = validator;
        self
    }

    pub fn class(&self) -> DataClass {
        self.class
    }

    /// Provider ids in walk order.
    pub fn order(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|p| Cow::Borrowed(p.id())).collect()
    }

    pub fn identity_validator(&self) -> &IdentityValidator {
        &self.identity_validator
    }

    /// Walk the chain for an identity. Stops at the first accepted answer.
    pub async fn resolve_identity(&self, address: &TokenAddress) -> ChainOutcome<IdentityCandidate> {
        let mut diagnostics = FetchDiagnostics::new();

        if self.providers.is_empty() {
            warn!("No identity providers configured");
            return ChainOutcome::Unresolved { diagnostics };
        }

        for provider in &self.providers {
            let provider_id: ProviderId = Cow::Borrowed(provider.id());
            if !self.admit(provider.as_ref(), address, &mut diagnostics) {
                continue;
            }

            let timeout = self.call_timeout;
            let (result, tries) = self
                .call_with_retry(&provider_id, move || provider.fetch_identity(address, timeout))
                .await;

            match result {
                Ok(raw) => {
                    self.circuit_breaker.record_success(&provider_id);
                    let candidate = self.identity_validator.normalize(address, &raw);
                    match self.identity_validator.check_candidate(address, &candidate) {
                        Ok(()) => {
                            diagnostics.record_success(provider_id.clone());
                            info!(
                                "Resolved identity for {} via '{}': {}",
                                address, provider_id, candidate.symbol
                            );
                            debug!("Identity walk for {}: {}", address, diagnostics.summary());
                            return ChainOutcome::Accepted {
                                value: candidate,
                                source: provider_id,
                                diagnostics,
                            };
                        }
                        Err(rejection) => {
                            debug!(
                                "Provider '{}' answered {:?}/{:?} for {}, rejected: {}",
                                provider_id, raw.symbol, raw.name, address, rejection
                            );
                            diagnostics.record_rejection(provider_id, rejection.to_string());
                        }
                    }
                }
                Err(e) => {
                    if !self.record_error(&provider_id, e, tries, &mut diagnostics) {
                        break;
                    }
                }
            }
        }

        debug!("Identity walk for {} unresolved: {}", address, diagnostics.summary());
        ChainOutcome::Unresolved { diagnostics }
    }

    /// Walk the chain for market data, merging fields across providers.
    pub async fn resolve_market(&self, address: &TokenAddress) -> MarketOutcome {
        let mut outcome = MarketOutcome::default();

        if self.providers.is_empty() {
            warn!("No market providers configured");
            return outcome;
        }

        for provider in &self.providers {
            let provider_id: ProviderId = Cow::Borrowed(provider.id());
            if !self.admit(provider.as_ref(), address, &mut outcome.diagnostics) {
                continue;
            }

            let timeout = self.call_timeout;
            let (result, tries) = self
                .call_with_retry(&provider_id, move || provider.fetch_market(address, timeout))
                .await;

            let quote = match result {
                Ok(quote) => quote,
                Err(e) => {
                    if !self.record_error(&provider_id, e, tries, &mut outcome.diagnostics) {
                        break;
                    }
                    continue;
                }
            };

            self.circuit_breaker.record_success(&provider_id);
            if quote.is_empty() {
                debug!("Quote from '{}' for {} is empty", provider_id, address);
                outcome.diagnostics.record_error(
                    provider_id,
                    ErrorKind::NotFound,
                    "empty quote".to_string(),
                    tries,
                );
                continue;
            }

            if let Err(e) = self.quote_validator.validate(&provider_id, &quote) {
                debug!("Quote from '{}' for {} rejected: {}", provider_id, address, e);
                outcome
                    .diagnostics
                    .record_rejection(provider_id, e.to_string());
                continue;
            }

            // A valid answer that adds nothing new is still a healthy answer.
            outcome.merged.absorb(&provider_id, &quote);
            outcome.diagnostics.record_success(provider_id);

            if outcome.merged.is_complete() {
                break;
            }
        }

        debug!("Market walk for {}: {}", address, outcome.diagnostics.summary());
        outcome
    }

    /// Pre-call checks. Returns false (and records why) to skip the provider.
    fn admit(
        &self,
        provider: &dyn TokenDataProvider,
        address: &TokenAddress,
        diagnostics: &mut FetchDiagnostics,
    ) -> bool {
        let provider_id: ProviderId = Cow::Borrowed(provider.id());

        if !provider.capabilities().indexes(address.kind()) {
            diagnostics.record_skip(provider_id, SkipReason::Unsupported);
            return false;
        }

        if !self.circuit_breaker.is_allowed(&provider_id) {
            debug!("Circuit breaker open for provider '{}', skipping", provider_id);
            diagnostics.record_skip(provider_id, SkipReason::CircuitBreakerOpen);
            return false;
        }

        true
    }

    /// Record a terminal provider error. Returns false if the walk must stop.
    fn record_error(
        &self,
        provider_id: &ProviderId,
        error: MarketDataError,
        tries: u32,
        diagnostics: &mut FetchDiagnostics,
    ) -> bool {
        match error.retry_class() {
            RetryClass::Never => {
                warn!("Terminal error from '{}': {}, stopping walk", provider_id, error);
                diagnostics.record_error(provider_id.clone(), error.kind(), error.to_string(), tries);
                return false;
            }
            RetryClass::ExponentialBackoff | RetryClass::LinearBackoff => {
                self.circuit_breaker.record_failure(provider_id);
                warn!(
                    "Provider '{}' failed after {} tries: {}, trying next provider",
                    provider_id, tries, error
                );
            }
            RetryClass::NextProvider => {
                debug!("Provider '{}': {}, trying next provider", provider_id, error);
            }
            RetryClass::CircuitOpen => {
                diagnostics.record_skip(provider_id.clone(), SkipReason::CircuitBreakerOpen);
                return true;
            }
        }
        diagnostics.record_error(provider_id.clone(), error.kind(), error.to_string(), tries);
        true
    }

    /// Call one provider, retrying per the error's class.
    ///
    /// Returns the last result and the number of calls made.
    async fn call_with_retry<T, F, Fut>(
        &self,
        provider_id: &ProviderId,
        mut call: F,
    ) -> (Result<T, MarketDataError>, u32)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MarketDataError>>,
    {
        let mut tries = 0u32;
        loop {
            self.rate_limiter.acquire(provider_id).await;
            tries += 1;

            let result = match tokio::time::timeout(self.call_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(MarketDataError::Timeout {
                    provider: provider_id.to_string(),
                }),
            };

            let error = match result {
                Ok(value) => return (Ok(value), tries),
                Err(e) => e,
            };

            match self.retry.delay_for(error.retry_class(), tries - 1) {
                Some(delay) => {
                    debug!(
                        "Provider '{}' {} (try {}), retrying in {:?}",
                        provider_id,
                        error.kind(),
                        tries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return (Err(error), tries),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AddressKind, MarketQuote};
    use crate::provider::{ProviderCapabilities, RateLimit};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const ADDR: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    #[derive(Clone, Copy)]
    enum Step {
        Symbol(&'static str),
        RateLimited,
        Timeout,
        NotFound,
        Hang,
    }

    struct MockProvider {
        id: &'static str,
        script: Mutex<VecDeque<Step>>,
        fallback: Step,
        quote: Option<MarketQuote>,
        call_count: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: &'static str, script: &[Step], fallback: Step) -> Arc<Self> {
            Arc::new(Self {
                id,
                script: Mutex::new(script.iter().copied().collect()),
                fallback,
                quote: None,
                call_count: AtomicUsize::new(0),
            })
        }

        fn market(id: &'static str, quote: MarketQuote) -> Arc<Self> {
            Arc::new(Self {
                id,
                script: Mutex::new(VecDeque::new()),
                fallback: Step::NotFound,
                quote: Some(quote),
                call_count: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        fn next_step(&self) -> Step {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.fallback)
        }

        fn error(&self, step: Step) -> MarketDataError {
            let provider = self.id.to_string();
            match step {
                Step::RateLimited => MarketDataError::RateLimited { provider },
                Step::Timeout => MarketDataError::Timeout { provider },
                _ => MarketDataError::NotFound { provider },
            }
        }
    }

    #[async_trait]
    impl TokenDataProvider for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities {
                identity: true,
                market: true,
                address_kinds: &[AddressKind::Base58],
            }
        }

        fn rate_limit(&self) -> RateLimit {
            RateLimit {
                requests_per_minute: 60_000,
                max_concurrency: 100,
                min_delay: Duration::ZERO,
            }
        }

        async fn fetch_identity(
            &self,
            _address: &TokenAddress,
            _timeout: Duration,
        ) -> Result<IdentityCandidate, MarketDataError> {
            match self.next_step() {
                Step::Symbol(s) => Ok(IdentityCandidate::new(s, format!("{} Token Name", s))),
                Step::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Err(self.error(Step::Timeout))
                }
                step => Err(self.error(step)),
            }
        }

        async fn fetch_market(
            &self,
            _address: &TokenAddress,
            _timeout: Duration,
        ) -> Result<MarketQuote, MarketDataError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.quote.clone().ok_or(MarketDataError::NotFound {
                provider: self.id.to_string(),
            })
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            rate_limit_retries: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            jitter_percent: 0,
            transient_retries: 1,
            linear_step: Duration::from_millis(1),
        }
    }

    fn chain(class: DataClass, providers: Vec<Arc<dyn TokenDataProvider>>) -> ProviderChain {
        ProviderChain::new(class, providers)
            .with_retry_policy(fast_policy())
            .with_call_timeout(Duration::from_millis(50))
    }

    fn addr() -> TokenAddress {
        TokenAddress::parse(ADDR).unwrap()
    }

    #[tokio::test]
    async fn test_fallback_ordering_determinism() {
        let a = MockProvider::new("A", &[], Step::Timeout);
        let b = MockProvider::new("B", &[], Step::Symbol("Unknown"));
        let c = MockProvider::new("C", &[], Step::Symbol("DOGE"));
        let chain = chain(DataClass::Identity, vec![a.clone(), b.clone(), c.clone()]);

        for _ in 0..3 {
            match chain.resolve_identity(&addr()).await {
                ChainOutcome::Accepted { value, source, .. } => {
                    assert_eq!(value.symbol, "DOGE");
                    assert_eq!(source, "C");
                }
                other => panic!("expected acceptance, got {:?}", other),
            }
        }
        // one retry per walk on the transient timeout
        assert_eq!(a.calls(), 6);
        assert_eq!(b.calls(), 3);
        assert_eq!(c.calls(), 3);
    }

    #[tokio::test]
    async fn test_stops_at_first_accepted() {
        let a = MockProvider::new("A", &[], Step::Symbol("BONK"));
        let b = MockProvider::new("B", &[], Step::Symbol("DOGE"));
        let chain = chain(DataClass::Identity, vec![a.clone(), b.clone()]);

        let outcome = chain.resolve_identity(&addr()).await;
        assert!(matches!(outcome, ChainOutcome::Accepted { ref source, .. } if source == "A"));
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_retries_then_moves_on() {
        let a = MockProvider::new("A", &[], Step::RateLimited);
        let b = MockProvider::new("B", &[], Step::Symbol("DOGE"));
        let chain = chain(DataClass::Identity, vec![a.clone(), b.clone()]);

        let outcome = chain.resolve_identity(&addr()).await;
        assert!(matches!(outcome, ChainOutcome::Accepted { ref source, .. } if source == "B"));
        // initial call + 2 retries
        assert_eq!(a.calls(), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_recovers_on_same_provider() {
        let a = MockProvider::new("A", &[Step::RateLimited], Step::Symbol("BONK"));
        let b = MockProvider::new("B", &[], Step::Symbol("DOGE"));
        let chain = chain(DataClass::Identity, vec![a.clone(), b.clone()]);

        let outcome = chain.resolve_identity(&addr()).await;
        assert!(matches!(outcome, ChainOutcome::Accepted { ref source, .. } if source == "A"));
        assert_eq!(a.calls(), 2);
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let a = MockProvider::new("A", &[], Step::NotFound);
        let chain = chain(DataClass::Identity, vec![a.clone()]);

        let outcome = chain.resolve_identity(&addr()).await;
        assert!(matches!(outcome, ChainOutcome::Unresolved { .. }));
        assert!(!outcome.is_explicit_rejection());
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn test_hung_provider_times_out_as_transient() {
        let a = MockProvider::new("A", &[], Step::Hang);
        let b = MockProvider::new("B", &[], Step::Symbol("DOGE"));
        let chain = chain(DataClass::Identity, vec![a.clone(), b]);

        let outcome = chain.resolve_identity(&addr()).await;
        assert!(matches!(outcome, ChainOutcome::Accepted { ref source, .. } if source == "B"));
        assert_eq!(a.calls(), 2);
    }

    #[tokio::test]
    async fn test_explicit_rejection_vs_transport_failure() {
        let rejected = chain(
            DataClass::Identity,
            vec![
                MockProvider::new("A", &[], Step::Symbol("Unknown")),
                MockProvider::new("B", &[], Step::Timeout),
            ],
        );
        assert!(rejected.resolve_identity(&addr()).await.is_explicit_rejection());

        let transport = chain(
            DataClass::Identity,
            vec![
                MockProvider::new("A", &[], Step::RateLimited),
                MockProvider::new("B", &[], Step::Timeout),
            ],
        );
        let outcome = transport.resolve_identity(&addr()).await;
        assert!(matches!(outcome, ChainOutcome::Unresolved { .. }));
        assert!(!outcome.is_explicit_rejection());
    }

    #[tokio::test]
    async fn test_from_order_uses_configured_order() {
        let a = MockProvider::new("A", &[], Step::Symbol("AAA"));
        let b = MockProvider::new("B", &[], Step::Symbol("BBB"));
        let available: Vec<Arc<dyn TokenDataProvider>> = vec![a, b];
        let order = vec!["b".to_string(), "MISSING".to_string(), "A".to_string(), "B".to_string()];

        let chain = ProviderChain::from_order(
            DataClass::Identity,
            &order,
            &available,
            Arc::new(RateLimiter::new()),
            Arc::new(CircuitBreaker::new()),
        );
        assert_eq!(chain.order(), vec![Cow::Borrowed("B"), Cow::Borrowed("A")]);

        let outcome = chain.resolve_identity(&addr()).await;
        assert!(matches!(outcome, ChainOutcome::Accepted { ref source, .. } if source == "B"));
    }

    #[tokio::test]
    async fn test_open_circuit_is_skipped() {
        let a = MockProvider::new("A", &[], Step::Symbol("AAA"));
        let b = MockProvider::new("B", &[], Step::Symbol("BBB"));
        let breaker = Arc::new(CircuitBreaker::with_config(crate::registry::CircuitBreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::from_secs(60),
            half_open_success_threshold: 1,
        }));
        breaker.record_failure(&Cow::Borrowed("A"));

        let chain = ProviderChain::with_shared(
            DataClass::Identity,
            vec![a.clone(), b],
            Arc::new(RateLimiter::new()),
            breaker,
        );
        let outcome = chain.resolve_identity(&addr()).await;
        assert!(matches!(outcome, ChainOutcome::Accepted { ref source, .. } if source == "B"));
        assert_eq!(a.calls(), 0);
        assert!(outcome.diagnostics().summary().starts_with("A: skipped (circuit open)"));
    }

    #[tokio::test]
    async fn test_market_fields_from_different_providers() {
        let a = MockProvider::market(
            "A",
            MarketQuote {
                price: Some(0.002),
                market_cap: Some(0.0),
                volume_24h: None,
                created_at: None,
            },
        );
        let b = MockProvider::market(
            "B",
            MarketQuote {
                price: Some(0.0021),
                market_cap: Some(2_000_000.0),
                volume_24h: Some(35_000.0),
                created_at: None,
            },
        );
        let c = MockProvider::market("C", MarketQuote::default());
        let chain = chain(DataClass::Market, vec![a, b, c.clone()]);

        let outcome = chain.resolve_market(&addr()).await;
        assert_eq!(outcome.merged.price, Some(0.002));
        assert_eq!(outcome.merged.market_cap, Some(2_000_000.0));
        assert_eq!(outcome.merged.volume_24h, Some(35_000.0));
        assert_eq!(outcome.merged.sources.price.as_deref(), Some("A"));
        assert_eq!(outcome.merged.sources.market_cap.as_deref(), Some("B"));
        // complete after B, C never called
        assert_eq!(c.calls(), 0);
    }

    #[tokio::test]
    async fn test_market_invalid_quote_is_explicit_rejection() {
        let a = MockProvider::market(
            "A",
            MarketQuote {
                price: Some(-3.0),
                ..MarketQuote::default()
            },
        );
        let chain = chain(DataClass::Market, vec![a]);

        let outcome = chain.resolve_market(&addr()).await;
        assert!(outcome.is_explicit_rejection());
        assert_eq!(outcome.merged, MergedQuote::default());
    }

    #[tokio::test]
    async fn test_empty_quote_is_not_found_not_rejection() {
        let a = MockProvider::market("A", MarketQuote::default());
        let b = MockProvider::market(
            "B",
            MarketQuote {
                price: Some(1.5),
                ..MarketQuote::default()
            },
        );
        let chain = chain(DataClass::Market, vec![a, b]);

        let outcome = chain.resolve_market(&addr()).await;
        assert!(!outcome.is_explicit_rejection());
        assert_eq!(outcome.merged.price, Some(1.5));
        assert!(outcome
            .diagnostics
            .summary()
            .starts_with("A: not-found"));
    }

    #[tokio::test]
    async fn test_quote_adding_nothing_new_counts_as_success() {
        let quote = MarketQuote {
            price: Some(1.5),
            ..MarketQuote::default()
        };
        let a = MockProvider::market("A", quote.clone());
        let b = MockProvider::market("B", quote);
        let chain = chain(DataClass::Market, vec![a, b]);

        let outcome = chain.resolve_market(&addr()).await;
        assert!(!outcome.is_explicit_rejection());
        assert_eq!(outcome.merged.sources.price.as_deref(), Some("A"));
    }
}
