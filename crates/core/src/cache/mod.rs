//! Tiered cache: in-process (L1), shared (L2) and durable (L3).

mod hierarchy;
mod key;
mod memory;
#[cfg(feature = "redis")]
mod redis_shared;
mod shared;

pub use hierarchy::{CacheHierarchy, CacheStats};
pub use key::{CacheClass, CacheKey, CacheTier, CachedValue, CreationTime, Fundamentals};
pub use memory::MemoryCache;
#[cfg(feature = "redis")]
pub use redis_shared::RedisSharedCache;
pub use shared::{InMemorySharedCache, SharedCache};
