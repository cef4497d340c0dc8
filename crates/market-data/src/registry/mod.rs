//! Provider chain orchestration.
//!
//! This module provides:
//! - Ordered fallback chains per data class
//! - Per-provider retry with exponential (rate limit) or linear (transient) backoff
//! - Rate limiting and circuit breaking per provider
//! - Market quote validation and per-field merging
//! - Walk diagnostics

mod backoff;
mod chain;
mod circuit_breaker;
mod merge;
mod rate_limiter;
mod skip_reason;
mod validator;

pub use backoff::{RetryPolicy, DEFAULT_RATE_LIMIT_RETRIES, DEFAULT_TRANSIENT_RETRIES};
pub use chain::{ChainOutcome, MarketOutcome, ProviderChain, DEFAULT_CALL_TIMEOUT};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use merge::MergedQuote;
pub use rate_limiter::RateLimiter;
pub use skip_reason::{AttemptOutcome, FetchDiagnostics, ProviderAttempt, SkipReason};
pub use validator::{QuoteValidator, ValidatorConfig};
