use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CreationTime;
use crate::constants::DEGRADED_SOURCE;
use crate::identity::IdentityRecord;
use tokenlens_market_data::{FieldSources, MarketSnapshot, ProviderId, TokenAddress};

/// Identity returned to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIdentity {
    pub symbol: String,
    pub name: String,
    pub image_url: Option<String>,
    pub source: ProviderId,
    /// True when no trusted answer was available and the placeholder was
    /// returned instead.
    pub degraded: bool,
}

impl ResolvedIdentity {
    /// Placeholder identity: shortened address as symbol, full address as name.
    pub fn degraded(address: &TokenAddress) -> Self {
        Self {
            symbol: address.shortened(),
            name: address.to_string(),
            image_url: None,
            source: Cow::Borrowed(DEGRADED_SOURCE),
            degraded: true,
        }
    }
}

impl From<&IdentityRecord> for ResolvedIdentity {
    fn from(record: &IdentityRecord) -> Self {
        Self {
            symbol: record.symbol.clone(),
            name: record.name.clone(),
            image_url: record.image_url.clone(),
            source: record.source_id(),
            degraded: false,
        }
    }
}

/// Market data returned to callers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMarketData {
    pub price: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub captured_at: DateTime<Utc>,
    /// True when at least one field could not be resolved and reads as zero.
    pub degraded: bool,
    pub sources: FieldSources,
}

impl ResolvedMarketData {
    /// All-zero placeholder.
    pub fn degraded() -> Self {
        Self {
            price: 0.0,
            market_cap: 0.0,
            volume_24h: 0.0,
            captured_at: Utc::now(),
            degraded: true,
            sources: FieldSources::default(),
        }
    }
}

impl From<&MarketSnapshot> for ResolvedMarketData {
    fn from(snapshot: &MarketSnapshot) -> Self {
        Self {
            price: snapshot.price,
            market_cap: snapshot.market_cap,
            volume_24h: snapshot.volume_24h,
            captured_at: snapshot.captured_at,
            degraded: false,
            sources: snapshot.sources.clone(),
        }
    }
}

/// What one market walk produced, shared among coalesced callers.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MarketResolution {
    pub data: ResolvedMarketData,
    /// `None` when the walk never reached a provider that answered.
    pub created_at: Option<CreationTime>,
}
