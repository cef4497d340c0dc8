//! Core data types for token identity and market data.

mod address;
mod identity;
mod market;
mod types;

pub use address::{is_base58_address, AddressKind, TokenAddress};
pub use identity::IdentityCandidate;
pub use market::{FieldSources, MarketField, MarketQuote, MarketSnapshot};
pub use types::{DataClass, ProviderId, BIRDEYE, DEXSCREENER, JUPITER, SOLANA_RPC};
