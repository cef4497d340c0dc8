//! Token data provider trait definitions.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{IdentityCandidate, MarketQuote, TokenAddress};

use super::capabilities::{ProviderCapabilities, RateLimit};

/// An external source of token identity and/or market data.
///
/// Errors must be classifiable by [`MarketDataError::kind`] as rate-limited,
/// not-found, transient or explicit-invalid; the chain's retry behavior
/// depends on it.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use tokenlens_market_data::provider::{ProviderCapabilities, RateLimit, TokenDataProvider};
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl TokenDataProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities {
///             identity: true,
///             market: false,
///             address_kinds: &[AddressKind::Base58],
///         }
///     }
///
///     fn rate_limit(&self) -> RateLimit {
///         RateLimit::default()
///     }
///
///     // ... implement fetch_identity
/// }
/// ```
#[async_trait]
pub trait TokenDataProvider: Send + Sync {
    /// Unique identifier, e.g. "DEXSCREENER". Used in provider ordering
    /// configuration, diagnostics and as the `source` of resolved identities.
    fn id(&self) -> &'static str;

    fn capabilities(&self) -> ProviderCapabilities;

    fn rate_limit(&self) -> RateLimit;

    /// Fetch symbol, name and icon for a token.
    ///
    /// `timeout` is the provider's share of the caller's budget; adapters
    /// should apply it to their HTTP request.
    async fn fetch_identity(
        &self,
        address: &TokenAddress,
        timeout: Duration,
    ) -> Result<IdentityCandidate, MarketDataError> {
        let _ = (address, timeout);
        Err(MarketDataError::NotSupported {
            operation: "identity".to_string(),
            provider: self.id().to_string(),
        })
    }

    /// Fetch price, market cap and volume for a token.
    async fn fetch_market(
        &self,
        address: &TokenAddress,
        timeout: Duration,
    ) -> Result<MarketQuote, MarketDataError> {
        let _ = (address, timeout);
        Err(MarketDataError::NotSupported {
            operation: "market".to_string(),
            provider: self.id().to_string(),
        })
    }
}
