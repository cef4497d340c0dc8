//! Durable store trait.
//!
//! This trait abstracts the persistence layer for identity records, allowing
//! different backends (in-memory, SQLite) to be used interchangeably.

use async_trait::async_trait;

use super::model::{IdentityPage, IdentityRecord};
use crate::errors::Result;
use tokenlens_market_data::TokenAddress;

/// Storage interface for validated token identities.
///
/// Implementations must be safe to share across tasks. An `Err` from any method
/// means the store is unavailable; callers degrade to provider-only resolution
/// rather than failing.
#[async_trait]
pub trait DurableStore: Send + Sync {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Looks up the record for an address.
    async fn find(&self, address: &TokenAddress) -> Result<Option<IdentityRecord>>;

    /// Returns up to `limit` records with addresses strictly after `after`,
    /// ordered by address.
    ///
    /// A page with `next_cursor == None` is the last one.
    async fn scan(&self, after: Option<&str>, limit: usize) -> Result<IdentityPage>;

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Inserts or replaces the record keyed by its address.
    async fn upsert(&self, record: &IdentityRecord) -> Result<()>;

    /// Deletes the records for the given raw addresses, returning how many
    /// existed.
    async fn delete(&self, addresses: &[String]) -> Result<usize>;
}
