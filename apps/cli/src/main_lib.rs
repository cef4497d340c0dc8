use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use tokenlens_core::{
    CacheHierarchy, CreationTime, DurableStore, InMemoryDurableStore, InMemorySharedCache,
    RedisSharedCache, ResolvedIdentity, ResolvedMarketData, Resolver, ResolverConfig, SharedCache,
};
use tokenlens_market_data::{
    BirdeyeProvider, DexScreenerProvider, JupiterProvider, SolanaRpcProvider, TokenDataProvider,
};
use tokenlens_storage_sqlite::SqliteDurableStore;

/// Budget for one command when `TOKENLENS_DEADLINE_MS` is unset.
const DEFAULT_DEADLINE_MS: u64 = 8000;

pub fn init_tracing() {
    let log_format = std::env::var("TOKENLENS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays machine-readable.
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub fn deadline_budget() -> anyhow::Result<Duration> {
    match std::env::var("TOKENLENS_DEADLINE_MS") {
        Ok(raw) => {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("TOKENLENS_DEADLINE_MS must be milliseconds, got {raw:?}"))?;
            Ok(Duration::from_millis(ms))
        }
        Err(_) => Ok(Duration::from_millis(DEFAULT_DEADLINE_MS)),
    }
}

/// Every provider this binary knows about. Which of them are walked, and in
/// what order, is decided by the configured provider lists.
pub fn build_providers(config: &ResolverConfig) -> Vec<Arc<dyn TokenDataProvider>> {
    let mut providers: Vec<Arc<dyn TokenDataProvider>> = vec![
        Arc::new(SolanaRpcProvider::new(config.solana_rpc_url.clone())),
        Arc::new(DexScreenerProvider::new()),
        Arc::new(JupiterProvider::new()),
    ];
    match &config.birdeye_api_key {
        Some(key) => providers.push(Arc::new(BirdeyeProvider::new(key.clone()))),
        None => tracing::info!("BIRDEYE_API_KEY not set, Birdeye provider disabled"),
    }
    providers
}

pub async fn build_cache(config: &ResolverConfig) -> anyhow::Result<Arc<CacheHierarchy>> {
    let shared: Arc<dyn SharedCache> = match &config.redis_url {
        Some(url) => {
            tracing::info!("Shared cache: Redis");
            Arc::new(RedisSharedCache::connect(url).await?)
        }
        None => {
            tracing::info!("Shared cache: in-process");
            Arc::new(InMemorySharedCache::new())
        }
    };

    let durable: Arc<dyn DurableStore> = match &config.db_path {
        Some(path) => {
            tracing::info!("Durable store: SQLite at {}", path);
            Arc::new(SqliteDurableStore::open(path)?)
        }
        None => {
            tracing::info!("Durable store: in-process");
            Arc::new(InMemoryDurableStore::new())
        }
    };

    Ok(Arc::new(CacheHierarchy::new(
        config.l1_capacity,
        shared,
        durable,
    )))
}

pub async fn build_resolver(config: &ResolverConfig) -> anyhow::Result<Resolver> {
    let providers = build_providers(config);
    let cache = build_cache(config).await?;
    Ok(Resolver::from_config(config, &providers, cache))
}

/// One line of output per requested address.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenReport {
    pub address: String,
    pub identity: ResolvedIdentity,
    pub image_url: Option<String>,
    pub market: ResolvedMarketData,
    pub created_at: CreationTime,
}
