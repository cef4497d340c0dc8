//! DexScreener provider.
//!
//! Uses `/latest/dex/tokens/{address}`, which lists every pair the token
//! trades in across chains. The most liquid pair where the token is the base
//! token supplies identity and market data; the oldest pair supplies the
//! creation time.
//!
//! Public API, no key, roughly 300 requests per minute.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, parse_number, send_json};
use crate::errors::MarketDataError;
use crate::models::{AddressKind, IdentityCandidate, MarketQuote, TokenAddress, DEXSCREENER};
use crate::provider::{ProviderCapabilities, RateLimit, TokenDataProvider};

const BASE_URL: &str = "https://api.dexscreener.com/latest/dex/tokens";

#[derive(Debug, Deserialize)]
struct TokensResponse {
    pairs: Option<Vec<Pair>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pair {
    base_token: PairToken,
    price_usd: Option<String>,
    market_cap: Option<f64>,
    volume: Option<Volume>,
    liquidity: Option<Liquidity>,
    /// Unix millis.
    pair_created_at: Option<i64>,
    info: Option<PairInfo>,
}

#[derive(Debug, Deserialize)]
struct PairToken {
    address: String,
    name: Option<String>,
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    h24: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Liquidity {
    usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairInfo {
    image_url: Option<String>,
}

pub struct DexScreenerProvider {
    client: Client,
    base_url: String,
}

impl DexScreenerProvider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into(),
        }
    }

    async fn fetch_pairs(
        &self,
        address: &TokenAddress,
        timeout: Duration,
    ) -> Result<Vec<Pair>, MarketDataError> {
        let url = format!("{}/{}", self.base_url, address);
        debug!(%address, "DexScreener request");
        let response: TokensResponse =
            send_json(DEXSCREENER, self.client.get(&url), timeout).await?;
        base_pairs(address, response)
    }
}

impl Default for DexScreenerProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Pairs where `address` is the base token, most liquid first.
fn base_pairs(address: &TokenAddress, response: TokensResponse) -> Result<Vec<Pair>, MarketDataError> {
    let mut pairs: Vec<Pair> = response
        .pairs
        .unwrap_or_default()
        .into_iter()
        .filter(|p| p.base_token.address.eq_ignore_ascii_case(address.as_str()))
        .collect();

    if pairs.is_empty() {
        return Err(MarketDataError::NotFound {
            provider: DEXSCREENER.to_string(),
        });
    }

    pairs.sort_by(|a, b| liquidity(b).total_cmp(&liquidity(a)));
    Ok(pairs)
}

fn liquidity(pair: &Pair) -> f64 {
    pair.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)
}

fn identity_from_pairs(pairs: &[Pair]) -> IdentityCandidate {
    let top = &pairs[0];
    let image_url = pairs
        .iter()
        .find_map(|p| p.info.as_ref().and_then(|i| i.image_url.clone()));

    IdentityCandidate {
        symbol: top.base_token.symbol.clone().unwrap_or_default(),
        name: top.base_token.name.clone().unwrap_or_default(),
        image_url,
    }
}

fn quote_from_pairs(pairs: &[Pair]) -> MarketQuote {
    let top = &pairs[0];
    let created_at = pairs
        .iter()
        .filter_map(|p| p.pair_created_at)
        .min()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

    MarketQuote {
        price: parse_number(top.price_usd.as_deref()),
        market_cap: top.market_cap,
        volume_24h: top.volume.as_ref().and_then(|v| v.h24),
        created_at,
    }
}

#[async_trait]
impl TokenDataProvider for DexScreenerProvider {
    fn id(&self) -> &'static str {
        DEXSCREENER
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            identity: true,
            market: true,
            address_kinds: &[AddressKind::Base58, AddressKind::Evm],
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 300,
            max_concurrency: 10,
            min_delay: Duration::from_millis(50),
        }
    }

    async fn fetch_identity(
        &self,
        address: &TokenAddress,
        timeout: Duration,
    ) -> Result<IdentityCandidate, MarketDataError> {
        let pairs = self.fetch_pairs(address, timeout).await?;
        Ok(identity_from_pairs(&pairs))
    }

    async fn fetch_market(
        &self,
        address: &TokenAddress,
        timeout: Duration,
    ) -> Result<MarketQuote, MarketDataError> {
        let pairs = self.fetch_pairs(address, timeout).await?;
        Ok(quote_from_pairs(&pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::provider::http::decode;

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    fn sample() -> TokensResponse {
        let body = format!(
            r#"{{
              "schemaVersion": "1.0.0",
              "pairs": [
                {{
                  "chainId": "solana",
                  "baseToken": {{"address": "So11111111111111111111111111111111111111112", "name": "Wrapped SOL", "symbol": "SOL"}},
                  "quoteToken": {{"address": "{bonk}", "name": "Bonk", "symbol": "Bonk"}},
                  "priceUsd": "150.0",
                  "liquidity": {{"usd": 99999999.0}}
                }},
                {{
                  "chainId": "solana",
                  "baseToken": {{"address": "{bonk}", "name": "Bonk", "symbol": "Bonk"}},
                  "priceUsd": "0.00002",
                  "marketCap": 1500000000,
                  "volume": {{"h24": 2100000.5}},
                  "liquidity": {{"usd": 500.0}},
                  "pairCreatedAt": 1700000000000
                }},
                {{
                  "chainId": "solana",
                  "baseToken": {{"address": "{bonk}", "name": "Bonk", "symbol": "Bonk"}},
                  "priceUsd": "0.000021",
                  "marketCap": 1600000000,
                  "volume": {{"h24": 9000000.0}},
                  "liquidity": {{"usd": 8000000.0}},
                  "pairCreatedAt": 1710000000000,
                  "info": {{"imageUrl": "https://cdn.example/bonk.png"}}
                }}
              ]
            }}"#,
            bonk = BONK
        );
        decode(DEXSCREENER, &body).unwrap()
    }

    fn addr() -> TokenAddress {
        TokenAddress::parse(BONK).unwrap()
    }

    #[test]
    fn test_picks_most_liquid_base_pair() {
        let pairs = base_pairs(&addr(), sample()).unwrap();
        assert_eq!(pairs.len(), 2);

        let quote = quote_from_pairs(&pairs);
        assert_eq!(quote.price, Some(0.000021));
        assert_eq!(quote.market_cap, Some(1_600_000_000.0));
        assert_eq!(quote.volume_24h, Some(9_000_000.0));
        // oldest pair wins creation time
        assert_eq!(quote.created_at.map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn test_identity_mapping() {
        let pairs = base_pairs(&addr(), sample()).unwrap();
        let identity = identity_from_pairs(&pairs);
        assert_eq!(identity.symbol, "Bonk");
        assert_eq!(identity.name, "Bonk");
        assert_eq!(identity.image_url.as_deref(), Some("https://cdn.example/bonk.png"));
    }

    #[test]
    fn test_no_pairs_is_not_found() {
        let response: TokensResponse = decode(DEXSCREENER, r#"{"pairs": null}"#).unwrap();
        let err = base_pairs(&addr(), response).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_garbage_body_is_transient() {
        let err = decode::<TokensResponse>(DEXSCREENER, "<html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
    }
}
