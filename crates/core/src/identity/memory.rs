use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use super::model::{IdentityPage, IdentityRecord};
use super::store::DurableStore;
use crate::errors::{DatabaseError, Result};
use tokenlens_market_data::TokenAddress;

/// Durable store held in process memory.
///
/// Used when no database is configured and in tests. It can be switched to an
/// unavailable state to exercise the degraded paths.
#[derive(Debug, Default)]
pub struct InMemoryDurableStore {
    records: RwLock<BTreeMap<String, IdentityRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of a stored record, bypassing availability.
    pub fn get(&self, address: &str) -> Option<IdentityRecord> {
        self.records
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(address)
            .cloned()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DatabaseError::ConnectionFailed("in-memory store is offline".to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStore for InMemoryDurableStore {
    async fn find(&self, address: &TokenAddress) -> Result<Option<IdentityRecord>> {
        self.check_available()?;
        Ok(self.get(address.as_str()))
    }

    async fn scan(&self, after: Option<&str>, limit: usize) -> Result<IdentityPage> {
        self.check_available()?;
        let records = self.records.read().unwrap_or_else(|p| p.into_inner());

        let lower = match after {
            Some(cursor) => Bound::Excluded(cursor.to_string()),
            None => Bound::Unbounded,
        };
        let page: Vec<IdentityRecord> = records
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect();

        let next_cursor = if page.len() == limit {
            page.last().map(|r| r.address.to_string())
        } else {
            None
        };

        Ok(IdentityPage {
            records: page,
            next_cursor,
        })
    }

    async fn upsert(&self, record: &IdentityRecord) -> Result<()> {
        self.check_available()?;
        self.records
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(record.address.to_string(), record.clone());
        Ok(())
    }

    async fn delete(&self, addresses: &[String]) -> Result<usize> {
        self.check_available()?;
        let mut records = self.records.write().unwrap_or_else(|p| p.into_inner());
        Ok(addresses
            .iter()
            .filter(|address| records.remove(address.as_str()).is_some())
            .count())
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use tokenlens_market_data::IdentityCandidate;

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
    const WIF: &str = "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm";

    fn record(address: &str, symbol: &str) -> IdentityRecord {
        IdentityRecord::accepted(
            TokenAddress::parse(address).unwrap(),
            IdentityCandidate::new(symbol, format!("{symbol} token")),
            &Cow::Borrowed("TEST"),
        )
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_address() {
        let store = InMemoryDurableStore::new();
        store.upsert(&record(BONK, "BONK")).await.unwrap();
        store.upsert(&record(BONK, "BONK2")).await.unwrap();

        let found = store
            .find(&TokenAddress::parse(BONK).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.symbol, "BONK2");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_pages_in_address_order() {
        let store = InMemoryDurableStore::new();
        store.upsert(&record(WIF, "WIF")).await.unwrap();
        store.upsert(&record(BONK, "BONK")).await.unwrap();

        let first = store.scan(None, 1).await.unwrap();
        assert_eq!(first.records.len(), 1);
        assert_eq!(first.records[0].symbol, "BONK");

        let second = store
            .scan(first.next_cursor.as_deref(), 1)
            .await
            .unwrap();
        assert_eq!(second.records[0].symbol, "WIF");

        let third = store
            .scan(second.next_cursor.as_deref(), 1)
            .await
            .unwrap();
        assert!(third.records.is_empty());
        assert!(third.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_errors() {
        let store = InMemoryDurableStore::new();
        store.set_available(false);
        assert!(store.upsert(&record(BONK, "BONK")).await.is_err());
        assert!(store
            .find(&TokenAddress::parse(BONK).unwrap())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_delete_counts_existing_rows() {
        let store = InMemoryDurableStore::new();
        store.upsert(&record(BONK, "BONK")).await.unwrap();
        let removed = store
            .delete(&[BONK.to_string(), WIF.to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.is_empty());
    }
}
