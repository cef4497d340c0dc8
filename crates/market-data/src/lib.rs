//! Tokenlens Market Data Crate
//!
//! Provider-facing half of token resolution: talking to external sources of
//! token identity (symbol, name, icon) and market data (price, market cap,
//! volume, creation time), and deciding which answers to trust.
//!
//! # Architecture
//!
//! ```text
//!                 +-------------------+
//!                 |   ProviderChain   |  (one per data class, order is config)
//!                 +-------------------+
//!                   |       |       |
//!        rate limiter  circuit breaker  retry policy
//!                   |       |       |
//!                   v       v       v
//!                 +-------------------+
//!                 | TokenDataProvider |  (Solana RPC, DexScreener, Birdeye, Jupiter)
//!                 +-------------------+
//!                           |
//!                           v
//!                 +-------------------+
//!                 |     Validator     |  (identity rules, quote sanity)
//!                 +-------------------+
//! ```
//!
//! # Core Types
//!
//! - [`TokenAddress`] - Validated base58 or EVM token address
//! - [`IdentityCandidate`] - A provider's symbol/name/icon answer
//! - [`MarketQuote`] - A provider's market answer, fields optional
//! - [`MarketSnapshot`] - Merged market data as cached
//! - [`IdentityValidator`] - Trust rules for identity answers

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod validator;

pub use errors::{ErrorKind, MarketDataError, RetryClass};

pub use models::{
    AddressKind, DataClass, FieldSources, IdentityCandidate, MarketField, MarketQuote,
    MarketSnapshot, ProviderId, TokenAddress,
};

pub use provider::{
    BirdeyeProvider, DexScreenerProvider, JupiterProvider, ProviderCapabilities, RateLimit,
    SolanaRpcProvider, TokenDataProvider,
};

pub use registry::{
    ChainOutcome, CircuitBreaker, CircuitBreakerConfig, CircuitState, FetchDiagnostics,
    MarketOutcome, MergedQuote, ProviderChain, QuoteValidator, RateLimiter, RetryPolicy,
    SkipReason,
};

pub use validator::{
    normalize_text, IdentityField, IdentityValidator, IdentityValidatorConfig, RejectReason,
    Rejection, BONDING_CURVE_SUFFIX,
};
