//! Provider capabilities and rate limiting configuration.

use std::time::Duration;

use crate::models::{AddressKind, DataClass};

/// What a provider can answer.
#[derive(Clone, Debug)]
pub struct ProviderCapabilities {
    /// Whether the provider implements `fetch_identity`.
    pub identity: bool,

    /// Whether the provider implements `fetch_market`.
    pub market: bool,

    /// Address families the provider indexes.
    pub address_kinds: &'static [AddressKind],
}

impl ProviderCapabilities {
    pub fn serves(&self, class: DataClass) -> bool {
        match class {
            DataClass::Identity => self.identity,
            DataClass::Market => self.market,
        }
    }

    pub fn indexes(&self, kind: AddressKind) -> bool {
        self.address_kinds.contains(&kind)
    }
}

/// Rate limiting configuration for a provider.
///
/// Controls how aggressively we can call a provider to avoid
/// hitting their rate limits and getting blocked.
#[derive(Clone, Debug)]
pub struct RateLimit {
    /// Maximum requests allowed per minute.
    pub requests_per_minute: u32,

    /// Maximum burst of back-to-back requests.
    pub max_concurrency: usize,

    /// Minimum delay between requests.
    pub min_delay: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            max_concurrency: 5,
            min_delay: Duration::from_millis(100),
        }
    }
}
