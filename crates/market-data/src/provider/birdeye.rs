//! Birdeye provider.
//!
//! `/defi/token_overview` returns symbol, name, logo, price, market cap and
//! 24h volume in one call. Requires an API key (`X-API-KEY`); Solana only.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, send_json};
use crate::errors::MarketDataError;
use crate::models::{AddressKind, IdentityCandidate, MarketQuote, TokenAddress, BIRDEYE};
use crate::provider::{ProviderCapabilities, RateLimit, TokenDataProvider};

const BASE_URL: &str = "https://public-api.birdeye.so";

#[derive(Debug, Deserialize)]
struct OverviewResponse {
    #[serde(default)]
    success: bool,
    data: Option<Overview>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Overview {
    symbol: Option<String>,
    name: Option<String>,
    #[serde(rename = "logoURI")]
    logo_uri: Option<String>,
    price: Option<f64>,
    #[serde(alias = "mc")]
    market_cap: Option<f64>,
    #[serde(rename = "v24hUSD")]
    volume_24h_usd: Option<f64>,
}

pub struct BirdeyeProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl BirdeyeProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: build_client(),
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    async fn overview(&self, address: &TokenAddress, timeout: Duration) -> Result<Overview, MarketDataError> {
        let url = format!("{}/defi/token_overview", self.base_url);
        let request = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .header("x-chain", "solana")
            .query(&[("address", address.as_str())]);

        debug!(%address, "Birdeye request");
        let response: OverviewResponse = send_json(BIRDEYE, request, timeout).await?;
        unwrap_overview(response)
    }
}

fn unwrap_overview(response: OverviewResponse) -> Result<Overview, MarketDataError> {
    match response.data {
        Some(data) if response.success => Ok(data),
        _ => Err(MarketDataError::NotFound {
            provider: BIRDEYE.to_string(),
        }),
    }
}

#[async_trait]
impl TokenDataProvider for BirdeyeProvider {
    fn id(&self) -> &'static str {
        BIRDEYE
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            identity: true,
            market: true,
            address_kinds: &[AddressKind::Base58],
        }
    }

    fn rate_limit(&self) -> RateLimit {
        // Standard tier: 1 request per second.
        RateLimit {
            requests_per_minute: 60,
            max_concurrency: 1,
            min_delay: Duration::from_millis(1000),
        }
    }

    async fn fetch_identity(
        &self,
        address: &TokenAddress,
        timeout: Duration,
    ) -> Result<IdentityCandidate, MarketDataError> {
        let overview = self.overview(address, timeout).await?;
        Ok(IdentityCandidate {
            symbol: overview.symbol.unwrap_or_default(),
            name: overview.name.unwrap_or_default(),
            image_url: overview.logo_uri,
        })
    }

    async fn fetch_market(
        &self,
        address: &TokenAddress,
        timeout: Duration,
    ) -> Result<MarketQuote, MarketDataError> {
        let overview = self.overview(address, timeout).await?;
        Ok(MarketQuote {
            price: overview.price,
            market_cap: overview.market_cap,
            volume_24h: overview.volume_24h_usd,
            created_at: None,
        })
    }
}
