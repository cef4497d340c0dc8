mod main_lib;

use anyhow::bail;
use futures::future::join_all;
use tokio::time::Instant;

use main_lib::{build_resolver, deadline_budget, init_tracing, TokenReport};
use tokenlens_core::{MaintenanceConfig, ResolverConfig};
use tokenlens_market_data::TokenAddress;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let config = ResolverConfig::from_env()?;

    let raw: Vec<String> = std::env::args().skip(1).collect();
    if raw.is_empty() {
        bail!("usage: tokenlens <address> [address ...]");
    }
    let mut addresses = Vec::with_capacity(raw.len());
    for value in &raw {
        match TokenAddress::parse(value) {
            Ok(address) => addresses.push(address),
            Err(e) => bail!("{value}: {e}"),
        }
    }

    let resolver = build_resolver(&config).await?;
    let maintenance = resolver.start_maintenance(MaintenanceConfig::from(&config));
    let deadline = Instant::now() + deadline_budget()?;

    let resolver = &resolver;
    let identities = resolver.resolve_identities(&addresses, deadline).await;
    let details = join_all(addresses.iter().map(|address| async move {
        tokio::join!(
            resolver.resolve_image_url(address, deadline),
            resolver.resolve_market_data(address, deadline),
            resolver.resolve_created_at(address, deadline),
        )
    }))
    .await;

    for ((address, identity), (image_url, market, created_at)) in
        addresses.iter().zip(identities).zip(details)
    {
        let report = TokenReport {
            address: address.to_string(),
            identity,
            image_url,
            market,
            created_at,
        };
        println!("{}", serde_json::to_string(&report)?);
    }

    let stats = resolver.stats();
    tracing::info!(
        "Cache stats: l1 {}/{} hits, l2 {}/{} hits, {} l2 errors",
        stats.l1_hits,
        stats.l1_hits + stats.l1_misses,
        stats.l2_hits,
        stats.l2_hits + stats.l2_misses,
        stats.l2_errors
    );

    maintenance.stop().await;
    Ok(())
}
