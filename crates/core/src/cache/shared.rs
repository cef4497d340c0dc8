//! Shared cache tier (L2).
//!
//! The contract mirrors the handful of Redis commands the resolver needs. Values
//! are opaque strings (JSON-encoded [`super::CachedValue`]s) and every write
//! carries its own time-to-live.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::errors::{CacheError, Result};

#[async_trait]
pub trait SharedCache: Send + Sync {
    /// `GET key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// `SET key value EX ttl`
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// `SET key value NX EX ttl`. Returns true if the value was written.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// `EXISTS key`
    async fn exists(&self, key: &str) -> Result<bool>;

    /// `DEL key`
    async fn delete(&self, key: &str) -> Result<()>;
}

#[derive(Clone, Debug)]
struct SharedEntry {
    value: String,
    expires_at: Instant,
}

/// Single-process stand-in for Redis.
#[derive(Debug, Default)]
pub struct InMemorySharedCache {
    entries: DashMap<String, SharedEntry>,
    unavailable: AtomicBool,
}

impl InMemorySharedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Live (unexpired) key count.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|e| e.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("in-memory shared cache is offline".to_string()).into());
        }
        Ok(())
    }

    fn live(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let value = self.entries.get(key).map(|e| (e.value.clone(), e.expires_at));
        match value {
            Some((value, expires_at)) if expires_at > now => Some(value),
            Some(_) => {
                self.entries.remove_if(key, |_, e| e.expires_at <= now);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl SharedCache for InMemorySharedCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.live(key))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.check_available()?;
        self.entries.insert(
            key.to_string(),
            SharedEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        self.check_available()?;
        let now = Instant::now();
        let fresh = SharedEntry {
            value: value.to_string(),
            expires_at: now + ttl,
        };
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at > now {
                    return Ok(false);
                }
                occupied.insert(fresh);
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                Ok(true)
            }
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.check_available()?;
        Ok(self.live(key).is_some())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_available()?;
        self.entries.remove(key);
        Ok(())
    }
}
