//! Cache keys and the values the tiers hold.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::CACHE_KEY_PREFIX;
use crate::identity::IdentityRecord;
use tokenlens_market_data::{MarketSnapshot, TokenAddress};

/// The three cache tiers, fastest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheTier {
    /// L1: in-process, bounded, lost on restart.
    Memory,
    /// L2: shared between instances, per-key expiry.
    Shared,
    /// L3: durable, validated identities only.
    Durable,
}

impl CacheTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "L1",
            Self::Shared => "L2",
            Self::Durable => "L3",
        }
    }
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of value a key refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheClass {
    Identity,
    Icon,
    CreatedAt,
    Market,
    Fundamentals,
}

impl CacheClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Icon => "icon",
            Self::CreatedAt => "created_at",
            Self::Market => "market",
            Self::Fundamentals => "fundamentals",
        }
    }
}

/// Key of a cached value: one class of data for one address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub class: CacheClass,
    pub address: TokenAddress,
}

impl CacheKey {
    pub fn new(class: CacheClass, address: &TokenAddress) -> Self {
        Self {
            class,
            address: address.clone(),
        }
    }

    pub fn identity(address: &TokenAddress) -> Self {
        Self::new(CacheClass::Identity, address)
    }

    pub fn icon(address: &TokenAddress) -> Self {
        Self::new(CacheClass::Icon, address)
    }

    pub fn created_at(address: &TokenAddress) -> Self {
        Self::new(CacheClass::CreatedAt, address)
    }

    pub fn market(address: &TokenAddress) -> Self {
        Self::new(CacheClass::Market, address)
    }

    pub fn fundamentals(address: &TokenAddress) -> Self {
        Self::new(CacheClass::Fundamentals, address)
    }
}

/// Renders as `tokenlens:<class>:<address>`, the shared-tier key.
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            CACHE_KEY_PREFIX,
            self.class.as_str(),
            self.address
        )
    }
}

/// Token creation time.
///
/// `Unknown` is a real cached answer: providers were asked and none reported a
/// timestamp, so the lookup is not repeated until the entry expires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "at", rename_all = "lowercase")]
pub enum CreationTime {
    Known(DateTime<Utc>),
    Unknown,
}

impl CreationTime {
    pub fn known(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Known(ts) => Some(*ts),
            Self::Unknown => None,
        }
    }
}

/// Market cap and volume kept longer than a full snapshot, used to fill those
/// fields when a later walk cannot resolve them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fundamentals {
    pub market_cap: f64,
    pub volume_24h: f64,
    pub captured_at: DateTime<Utc>,
}

/// A value held by one of the tiers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CachedValue {
    Identity(IdentityRecord),
    ImageUrl(String),
    CreatedAt(CreationTime),
    Market(MarketSnapshot),
    Fundamentals(Fundamentals),
}

impl CachedValue {
    pub fn class(&self) -> CacheClass {
        match self {
            Self::Identity(_) => CacheClass::Identity,
            Self::ImageUrl(_) => CacheClass::Icon,
            Self::CreatedAt(_) => CacheClass::CreatedAt,
            Self::Market(_) => CacheClass::Market,
            Self::Fundamentals(_) => CacheClass::Fundamentals,
        }
    }
}
