use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tokenlens_market_data::{IdentityCandidate, ProviderId, TokenAddress};

/// Persisted identity for a token address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub address: TokenAddress,
    pub symbol: String,
    pub name: String,
    pub image_url: Option<String>,
    /// Provider that produced the accepted answer.
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

impl IdentityRecord {
    /// Record for an answer the validator already accepted.
    pub fn accepted(address: TokenAddress, candidate: IdentityCandidate, source: &ProviderId) -> Self {
        Self {
            address,
            symbol: candidate.symbol,
            name: candidate.name,
            image_url: candidate.image_url,
            source: source.to_string(),
            last_updated: Utc::now(),
        }
    }

    pub fn source_id(&self) -> ProviderId {
        Cow::Owned(self.source.clone())
    }
}

/// One page of a keyset scan over the durable store.
///
/// `next_cursor` is the raw key of the last row visited, which may differ from
/// the last record returned when a backend skips rows it cannot decode.
#[derive(Clone, Debug, Default)]
pub struct IdentityPage {
    pub records: Vec<IdentityRecord>,
    pub next_cursor: Option<String>,
}
