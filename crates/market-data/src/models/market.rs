use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProviderId, TokenAddress};

/// Market answer from a single provider.
///
/// `None` means the provider did not report the field. `Some(0.0)` means it
/// explicitly reported zero, which is a legitimate value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketQuote {
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    /// Token or first pool creation time, when the provider knows it.
    pub created_at: Option<DateTime<Utc>>,
}

impl MarketQuote {
    pub fn fields(&self) -> [(MarketField, Option<f64>); 3] {
        [
            (MarketField::Price, self.price),
            (MarketField::MarketCap, self.market_cap),
            (MarketField::Volume24h, self.volume_24h),
        ]
    }

    /// No field and no creation time: the provider knows nothing about the token.
    pub fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.market_cap.is_none()
            && self.volume_24h.is_none()
            && self.created_at.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarketField {
    Price,
    MarketCap,
    Volume24h,
}

impl MarketField {
    pub const ALL: [MarketField; 3] = [Self::Price, Self::MarketCap, Self::Volume24h];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketField::Price => "price",
            MarketField::MarketCap => "marketCap",
            MarketField::Volume24h => "volume24h",
        }
    }
}

/// Which provider supplied each field of a merged snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSources {
    pub price: Option<ProviderId>,
    pub market_cap: Option<ProviderId>,
    pub volume_24h: Option<ProviderId>,
}

impl FieldSources {
    pub fn get(&self, field: MarketField) -> Option<&ProviderId> {
        match field {
            MarketField::Price => self.price.as_ref(),
            MarketField::MarketCap => self.market_cap.as_ref(),
            MarketField::Volume24h => self.volume_24h.as_ref(),
        }
    }

    pub fn set(&mut self, field: MarketField, provider: ProviderId) {
        match field {
            MarketField::Price => self.price = Some(provider),
            MarketField::MarketCap => self.market_cap = Some(provider),
            MarketField::Volume24h => self.volume_24h = Some(provider),
        }
    }
}

/// Point-in-time market data for a token, as held in the L1/L2 tiers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub address: TokenAddress,
    pub price: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub sources: FieldSources,
}

impl MarketSnapshot {
    /// All-zero snapshot returned when nothing better is known.
    pub fn zeroed(address: TokenAddress) -> Self {
        Self {
            address,
            price: 0.0,
            market_cap: 0.0,
            volume_24h: 0.0,
            captured_at: Utc::now(),
            sources: FieldSources::default(),
        }
    }
}
