//! Jupiter token search provider.
//!
//! `/tokens/v2/search?query={mint}` returns token records with identity,
//! USD price, market cap, 24h buy/sell volume and first pool creation time.
//! Solana only; the lite endpoint needs no key.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, send_json};
use crate::errors::MarketDataError;
use crate::models::{AddressKind, IdentityCandidate, MarketQuote, TokenAddress, JUPITER};
use crate::provider::{ProviderCapabilities, RateLimit, TokenDataProvider};

const BASE_URL: &str = "https://lite-api.jup.ag/tokens/v2";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JupiterToken {
    id: String,
    name: Option<String>,
    symbol: Option<String>,
    icon: Option<String>,
    usd_price: Option<f64>,
    mcap: Option<f64>,
    stats24h: Option<Stats>,
    first_pool: Option<FirstPool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    buy_volume: Option<f64>,
    sell_volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirstPool {
    created_at: Option<DateTime<Utc>>,
}

pub struct JupiterProvider {
    client: Client,
    base_url: String,
}

impl JupiterProvider {
    pub fn new() -> Self {
        Self {
            client: build_client(),
            base_url: BASE_URL.to_string(),
        }
    }

    async fn lookup(&self, address: &TokenAddress, timeout: Duration) -> Result<JupiterToken, MarketDataError> {
        let url = format!("{}/search", self.base_url);
        let request = self.client.get(&url).query(&[("query", address.as_str())]);
        debug!(%address, "Jupiter request");
        let tokens: Vec<JupiterToken> = send_json(JUPITER, request, timeout).await?;
        find_token(address, tokens)
    }
}

impl Default for JupiterProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Search is fuzzy; only an exact mint match counts.
fn find_token(address: &TokenAddress, tokens: Vec<JupiterToken>) -> Result<JupiterToken, MarketDataError> {
    tokens
        .into_iter()
        .find(|t| t.id == address.as_str())
        .ok_or_else(|| MarketDataError::NotFound {
            provider: JUPITER.to_string(),
        })
}

fn volume_24h(stats: Option<&Stats>) -> Option<f64> {
    let stats = stats?;
    match (stats.buy_volume, stats.sell_volume) {
        (None, None) => None,
        (buy, sell) => Some(buy.unwrap_or(0.0) + sell.unwrap_or(0.0)),
    }
}

#[async_trait]
impl TokenDataProvider for JupiterProvider {
    fn id(&self) -> &'static str {
        JUPITER
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            identity: true,
            market: true,
            address_kinds: &[AddressKind::Base58],
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 60,
            max_concurrency: 5,
            min_delay: Duration::from_millis(100),
        }
    }

    async fn fetch_identity(
        &self,
        address: &TokenAddress,
        timeout: Duration,
    ) -> Result<IdentityCandidate, MarketDataError> {
        let token = self.lookup(address, timeout).await?;
        Ok(IdentityCandidate {
            symbol: token.symbol.unwrap_or_default(),
            name: token.name.unwrap_or_default(),
            image_url: token.icon,
        })
    }

    async fn fetch_market(
        &self,
        address: &TokenAddress,
        timeout: Duration,
    ) -> Result<MarketQuote, MarketDataError> {
        let token = self.lookup(address, timeout).await?;
        Ok(MarketQuote {
            price: token.usd_price,
            market_cap: token.mcap,
            volume_24h: volume_24h(token.stats24h.as_ref()),
            created_at: token.first_pool.and_then(|p| p.created_at),
        })
    }
}
