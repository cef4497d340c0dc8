use async_trait::async_trait;
use diesel::prelude::*;
use log::{debug, warn};
use std::sync::Arc;

use super::model::TokenIdentityDB;
use crate::db::{self, get_connection, spawn_writer, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::token_identities;
use tokenlens_core::errors::{DatabaseError, Error, Result};
use tokenlens_core::identity::{DurableStore, IdentityPage, IdentityRecord};
use tokenlens_market_data::TokenAddress;

/// SQLite-backed L3 tier.
///
/// Reads check out a pooled connection on the blocking pool; writes are
/// serialized through the [`WriteHandle`].
pub struct SqliteDurableStore {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SqliteDurableStore {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SqliteDurableStore { pool, writer }
    }

    /// Opens (or creates) the database at `db_path`, applies pending
    /// migrations and starts the writer actor.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn open(db_path: &str) -> Result<Self> {
        let path = db::init(db_path)?;
        let pool = db::create_pool(&path)?;
        db::run_migrations(&pool)?;
        let writer = spawn_writer(pool.as_ref().clone());
        Ok(Self::new(pool, writer))
    }

    async fn read<F, T>(&self, query: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || {
            let mut conn = get_connection(&pool)?;
            query(&mut conn)
        })
        .await
        .map_err(|e| Error::Database(DatabaseError::Internal(e.to_string())))?
    }
}

/// Decodes a row, logging and dropping rows that no longer parse.
fn decode(row: TokenIdentityDB) -> Option<IdentityRecord> {
    let key = row.address.clone();
    match IdentityRecord::try_from(row) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Skipping undecodable identity row {}: {}", key, e);
            None
        }
    }
}

#[async_trait]
impl DurableStore for SqliteDurableStore {
    async fn find(&self, token: &TokenAddress) -> Result<Option<IdentityRecord>> {
        let key = token.to_string();
        let row = self
            .read(move |conn| {
                token_identities::table
                    .find(key)
                    .first::<TokenIdentityDB>(conn)
                    .optional()
                    .into_core()
            })
            .await?;
        Ok(row.and_then(decode))
    }

    async fn scan(&self, after: Option<&str>, limit: usize) -> Result<IdentityPage> {
        if limit == 0 {
            return Ok(IdentityPage::default());
        }

        let cursor = after.map(str::to_string);
        let page_size = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = self
            .read(move |conn| {
                let mut query = token_identities::table
                    .order(token_identities::address.asc())
                    .limit(page_size)
                    .into_boxed();
                if let Some(cursor) = cursor {
                    query = query.filter(token_identities::address.gt(cursor));
                }
                query.load::<TokenIdentityDB>(conn).into_core()
            })
            .await?;

        let next_cursor = if rows.len() == limit {
            rows.last().map(|row| row.address.clone())
        } else {
            None
        };
        let records = rows.into_iter().filter_map(decode).collect();

        Ok(IdentityPage {
            records,
            next_cursor,
        })
    }

    async fn upsert(&self, record: &IdentityRecord) -> Result<()> {
        let row = TokenIdentityDB::from(record);
        debug!("Persisting identity {} from {}", row.address, row.source);
        self.writer
            .exec(move |conn| {
                diesel::replace_into(token_identities::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    async fn delete(&self, addresses: &[String]) -> Result<usize> {
        if addresses.is_empty() {
            return Ok(0);
        }

        let keys = addresses.to_vec();
        self.writer
            .exec(move |conn| {
                let matching = token_identities::table.filter(token_identities::address.eq_any(keys));
                diesel::delete(matching).execute(conn).into_core()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
    const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
    const WIF: &str = "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm";

    fn open_store() -> (TempDir, SqliteDurableStore) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("identities.db");
        let store = SqliteDurableStore::open(path.to_str().unwrap()).unwrap();
        (dir, store)
    }

    fn record(address: &str, symbol: &str) -> IdentityRecord {
        IdentityRecord {
            address: TokenAddress::parse(address).unwrap(),
            symbol: symbol.to_string(),
            name: format!("{symbol} Token"),
            image_url: None,
            source: "dexscreener".to_string(),
            last_updated: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let (_dir, store) = open_store();
        let token = TokenAddress::parse(BONK).unwrap();
        assert!(store.find(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_then_find() {
        let (_dir, store) = open_store();
        let bonk = record(BONK, "BONK");
        store.upsert(&bonk).await.unwrap();

        let found = store.find(&bonk.address).await.unwrap().unwrap();
        assert_eq!(found.symbol, "BONK");
        assert_eq!(found.name, "BONK Token");
        assert_eq!(found.source, "dexscreener");
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let (_dir, store) = open_store();
        store.upsert(&record(BONK, "BONK")).await.unwrap();

        let mut updated = record(BONK, "BONK");
        updated.image_url = Some("https://example.com/bonk.png".to_string());
        updated.source = "birdeye".to_string();
        store.upsert(&updated).await.unwrap();

        let found = store.find(&updated.address).await.unwrap().unwrap();
        assert_eq!(found.source, "birdeye");
        assert_eq!(
            found.image_url.as_deref(),
            Some("https://example.com/bonk.png")
        );

        let page = store.scan(None, 10).await.unwrap();
        assert_eq!(page.records.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_pages_in_address_order() {
        let (_dir, store) = open_store();
        for (address, symbol) in [(WIF, "WIF"), (BONK, "BONK"), (USDC, "USDC")] {
            store.upsert(&record(address, symbol)).await.unwrap();
        }

        let first = store.scan(None, 2).await.unwrap();
        let symbols: Vec<_> = first.records.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BONK", "WIF"]);
        assert_eq!(first.next_cursor.as_deref(), Some(WIF));

        let second = store.scan(first.next_cursor.as_deref(), 2).await.unwrap();
        assert_eq!(second.records.len(), 1);
        assert_eq!(second.records[0].symbol, "USDC");
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_delete_counts_existing_rows() {
        let (_dir, store) = open_store();
        store.upsert(&record(BONK, "BONK")).await.unwrap();
        store.upsert(&record(USDC, "USDC")).await.unwrap();

        let removed = store
            .delete(&[BONK.to_string(), WIF.to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let token = TokenAddress::parse(BONK).unwrap();
        assert!(store.find(&token).await.unwrap().is_none());
        assert_eq!(store.delete(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_rows_are_skipped_but_advance_the_cursor() {
        let (_dir, store) = open_store();
        store.upsert(&record(BONK, "BONK")).await.unwrap();
        store
            .writer
            .exec(|conn| {
                diesel::insert_into(token_identities::table)
                    .values(&TokenIdentityDB {
                        address: "zzzz-not-a-mint".to_string(),
                        symbol: "BAD".to_string(),
                        name: "Bad Row".to_string(),
                        image_url: None,
                        source: "legacy".to_string(),
                        last_updated: "not a timestamp".to_string(),
                    })
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
            .unwrap();

        let page = store.scan(None, 2).await.unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.next_cursor.as_deref(), Some("zzzz-not-a-mint"));
    }
}
