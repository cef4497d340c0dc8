//! Error types and classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for provider and chain operations
//! - [`ErrorKind`]: The four-way provider error taxonomy plus contract errors
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while fetching token data.
///
/// Every provider error is classified by [`kind`](MarketDataError::kind) into
/// rate-limited, not-found, transient or explicit-invalid, and mapped to a
/// [`RetryClass`] via [`retry_class`](MarketDataError::retry_class).
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The address is empty or malformed. A caller contract violation.
    #[error("Invalid token address: {0}")]
    InvalidAddress(String),

    /// The provider explicitly has no record of the token.
    #[error("Token not found: {provider}")]
    NotFound {
        /// The provider that reported the miss
        provider: String,
    },

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request exceeded its per-call deadline.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A transport-level provider failure (5xx, bad gateway, unreadable body).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider affirmatively returned data that fails validation.
    #[error("Invalid data from {provider}: {message}")]
    ExplicitInvalid {
        /// The provider that returned the data
        provider: String,
        /// Why the data was rejected
        message: String,
    },

    /// The provider does not implement the requested operation.
    #[error("Operation '{operation}' not supported by {provider}")]
    NotSupported {
        operation: String,
        provider: String,
    },

    /// The circuit breaker is open for this provider.
    #[error("Circuit open: {provider}")]
    CircuitOpen {
        /// The provider with an open circuit
        provider: String,
    },

    /// No providers are configured for the requested data class.
    #[error("No providers available")]
    NoProvidersAvailable,

    /// All providers were tried and none produced an accepted answer.
    #[error("All providers failed")]
    AllProvidersFailed,

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Coarse classification of an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    RateLimited,
    NotFound,
    Transient,
    ExplicitInvalid,
    Unsupported,
    /// Contract violations and terminal chain results.
    Fatal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "rate-limited",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Transient => "transient",
            ErrorKind::ExplicitInvalid => "explicit-invalid",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MarketDataError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Timeout { .. } | Self::ProviderError { .. } | Self::Network(_) => {
                ErrorKind::Transient
            }
            Self::ExplicitInvalid { .. } => ErrorKind::ExplicitInvalid,
            Self::NotSupported { .. } | Self::CircuitOpen { .. } => ErrorKind::Unsupported,
            Self::InvalidAddress(_) | Self::NoProvidersAvailable | Self::AllProvidersFailed => {
                ErrorKind::Fatal
            }
        }
    }

    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokenlens_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "BIRDEYE".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::ExponentialBackoff);
    ///
    /// let error = MarketDataError::NotFound { provider: "JUPITER".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::NextProvider);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } => RetryClass::ExponentialBackoff,

            Self::Timeout { .. } | Self::ProviderError { .. } | Self::Network(_) => {
                RetryClass::LinearBackoff
            }

            Self::NotFound { .. } | Self::ExplicitInvalid { .. } | Self::NotSupported { .. } => {
                RetryClass::NextProvider
            }

            Self::CircuitOpen { .. } => RetryClass::CircuitOpen,

            Self::InvalidAddress(_) | Self::NoProvidersAvailable | Self::AllProvidersFailed => {
                RetryClass::Never
            }
        }
    }

    /// Classify a non-success HTTP status from `provider`.
    pub fn from_status(provider: &str, status: reqwest::StatusCode) -> Self {
        let provider = provider.to_string();
        match status.as_u16() {
            429 => Self::RateLimited { provider },
            404 => Self::NotFound { provider },
            408 | 504 => Self::Timeout { provider },
            code => Self::ProviderError {
                provider,
                message: format!("HTTP {}", code),
            },
        }
    }

    /// Classify a transport error from `provider`.
    pub fn from_transport(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                provider: provider.to_string(),
            };
        }
        if let Some(status) = err.status() {
            return Self::from_status(provider, status);
        }
        Self::ProviderError {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> String {
        "DEXSCREENER".to_string()
    }

    #[test]
    fn test_rate_limited_backs_off_exponentially() {
        let error = MarketDataError::RateLimited { provider: p() };
        assert_eq!(error.kind(), ErrorKind::RateLimited);
        assert_eq!(error.retry_class(), RetryClass::ExponentialBackoff);
    }

    #[test]
    fn test_timeout_is_transient() {
        let error = MarketDataError::Timeout { provider: p() };
        assert_eq!(error.kind(), ErrorKind::Transient);
        assert_eq!(error.retry_class(), RetryClass::LinearBackoff);
    }

    #[test]
    fn test_provider_error_is_transient() {
        let error = MarketDataError::ProviderError {
            provider: p(),
            message: "HTTP 502".to_string(),
        };
        assert_eq!(error.kind(), ErrorKind::Transient);
        assert_eq!(error.retry_class(), RetryClass::LinearBackoff);
    }

    #[test]
    fn test_not_found_moves_on() {
        let error = MarketDataError::NotFound { provider: p() };
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
    }

    #[test]
    fn test_explicit_invalid_moves_on() {
        let error = MarketDataError::ExplicitInvalid {
            provider: p(),
            message: "negative price".to_string(),
        };
        assert_eq!(error.kind(), ErrorKind::ExplicitInvalid);
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
    }

    #[test]
    fn test_circuit_open() {
        let error = MarketDataError::CircuitOpen { provider: p() };
        assert_eq!(error.retry_class(), RetryClass::CircuitOpen);
    }

    #[test]
    fn test_contract_errors_never_retry() {
        assert_eq!(
            MarketDataError::InvalidAddress("x".into()).retry_class(),
            RetryClass::Never
        );
        assert_eq!(
            MarketDataError::NoProvidersAvailable.retry_class(),
            RetryClass::Never
        );
        assert_eq!(MarketDataError::AllProvidersFailed.kind(), ErrorKind::Fatal);
    }

    #[test]
    fn test_from_status() {
        use reqwest::StatusCode;
        assert_eq!(
            MarketDataError::from_status("X", StatusCode::TOO_MANY_REQUESTS).kind(),
            ErrorKind::RateLimited
        );
        assert_eq!(
            MarketDataError::from_status("X", StatusCode::NOT_FOUND).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            MarketDataError::from_status("X", StatusCode::GATEWAY_TIMEOUT).kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            MarketDataError::from_status("X", StatusCode::INTERNAL_SERVER_ERROR).kind(),
            ErrorKind::Transient
        );
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::RateLimited {
            provider: "BIRDEYE".to_string(),
        };
        assert_eq!(format!("{}", error), "Rate limited: BIRDEYE");

        let error = MarketDataError::ProviderError {
            provider: "JUPITER".to_string(),
            message: "HTTP 503".to_string(),
        };
        assert_eq!(format!("{}", error), "Provider error: JUPITER - HTTP 503");
    }
}
