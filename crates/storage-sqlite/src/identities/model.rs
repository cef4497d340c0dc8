//! Database models for token identities.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use tokenlens_core::identity::IdentityRecord;
use tokenlens_market_data::TokenAddress;

/// Row in `token_identities`. `last_updated` is stored as RFC 3339 text.
#[derive(Queryable, Insertable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::token_identities)]
#[serde(rename_all = "camelCase")]
pub struct TokenIdentityDB {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub image_url: Option<String>,
    pub source: String,
    pub last_updated: String,
}

impl From<&IdentityRecord> for TokenIdentityDB {
    fn from(record: &IdentityRecord) -> Self {
        Self {
            address: record.address.to_string(),
            symbol: record.symbol.clone(),
            name: record.name.clone(),
            image_url: record.image_url.clone(),
            source: record.source.clone(),
            last_updated: record
                .last_updated
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl TryFrom<TokenIdentityDB> for IdentityRecord {
    type Error = StorageError;

    fn try_from(row: TokenIdentityDB) -> Result<Self, Self::Error> {
        let address = TokenAddress::parse(&row.address).map_err(|e| {
            StorageError::SerializationError(format!("address {:?}: {}", row.address, e))
        })?;
        let last_updated = DateTime::parse_from_rfc3339(&row.last_updated)
            .map_err(|e| {
                StorageError::SerializationError(format!(
                    "last_updated {:?} for {}: {}",
                    row.last_updated, row.address, e
                ))
            })?
            .with_timezone(&Utc);

        Ok(Self {
            address,
            symbol: row.symbol,
            name: row.name,
            image_url: row.image_url,
            source: row.source,
            last_updated,
        })
    }
}
