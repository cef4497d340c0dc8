//! Market quote validation.
//!
//! Rejects quotes that cannot be real before they reach the merge step:
//! - Non-finite values (NaN, infinity)
//! - Negative price, market cap or volume
//! - Prices above a sanity ceiling

use log::warn;

use crate::errors::MarketDataError;
use crate::models::MarketQuote;

/// Quote validator configuration.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Maximum allowed USD price (for sanity check).
    pub max_price: Option<f64>,
    /// Whether to warn when market cap is reported below price.
    pub warn_on_cap_below_price: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_price: Some(10_000_000.0),
            warn_on_cap_below_price: true,
        }
    }
}

/// Market quote validator.
pub struct QuoteValidator {
    config: ValidatorConfig,
}

impl QuoteValidator {
    pub fn new() -> Self {
        Self {
            config: ValidatorConfig::default(),
        }
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a quote from `provider`.
    ///
    /// Failures are explicit-invalid: the provider answered, and the answer
    /// is garbage.
    pub fn validate(&self, provider: &str, quote: &MarketQuote) -> Result<(), MarketDataError> {
        for (field, value) in quote.fields() {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(invalid(provider, format!("{} is not finite", field.as_str())));
                }
                if v < 0.0 {
                    return Err(invalid(provider, format!("{} is negative: {}", field.as_str(), v)));
                }
            }
        }

        if let (Some(price), Some(max)) = (quote.price, self.config.max_price) {
            if price > max {
                return Err(invalid(provider, format!("price {} exceeds {}", price, max)));
            }
        }

        if self.config.warn_on_cap_below_price {
            if let (Some(price), Some(cap)) = (quote.price, quote.market_cap) {
                if cap > 0.0 && cap < price {
                    warn!(
                        "Quote from '{}' has market cap {} below price {}",
                        provider, cap, price
                    );
                }
            }
        }

        Ok(())
    }
}

impl Default for QuoteValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(provider: &str, message: String) -> MarketDataError {
    MarketDataError::ExplicitInvalid {
        provider: provider.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn quote(price: Option<f64>, cap: Option<f64>, vol: Option<f64>) -> MarketQuote {
        MarketQuote {
            price,
            market_cap: cap,
            volume_24h: vol,
            created_at: None,
        }
    }

    #[test]
    fn test_valid_quote() {
        let v = QuoteValidator::new();
        assert!(v
            .validate("X", &quote(Some(0.5), Some(1_000_000.0), Some(20_000.0)))
            .is_ok());
    }

    #[test]
    fn test_missing_and_zero_fields_are_valid() {
        let v = QuoteValidator::new();
        assert!(v.validate("X", &quote(Some(0.5), None, Some(0.0))).is_ok());
        assert!(v.validate("X", &quote(None, None, None)).is_ok());
    }

    #[test]
    fn test_negative_rejected() {
        let err = QuoteValidator::new()
            .validate("X", &quote(Some(-1.0), None, None))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExplicitInvalid);
    }

    #[test]
    fn test_nan_rejected() {
        let err = QuoteValidator::new()
            .validate("X", &quote(Some(1.0), Some(f64::NAN), None))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExplicitInvalid);
    }

    #[test]
    fn test_price_ceiling() {
        let v = QuoteValidator::new();
        assert!(v.validate("X", &quote(Some(1e9), None, None)).is_err());

        let relaxed = QuoteValidator::with_config(ValidatorConfig {
            max_price: None,
            ..ValidatorConfig::default()
        });
        assert!(relaxed.validate("X", &quote(Some(1e9), None, None)).is_ok());
    }
}
