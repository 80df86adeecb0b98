//! Walk a market-data fallback chain backed by fixture providers.
//!
//! Run with `RUST_LOG=richdad=debug` to see budget skips and failed attempts.
use std::sync::Arc;
use std::time::Duration;

use richdad::{
    Acquisition, CapabilityKind, FetcherSet, Orchestrator, ProviderConfig, ProviderId,
    ProviderRegistry, ResourceKey, SharedRegistry, WindowLimit,
};
use richdad_mock::{FixtureFetcher, QuoteFixture};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let registry = SharedRegistry::new(ProviderRegistry::from_configs(vec![
        ProviderConfig::market_data("twelvedata")?
            .with_priority(1)
            .with_limits(vec![WindowLimit::per_minute(2)]),
        ProviderConfig::market_data("yahoo")?
            .with_priority(2)
            .delayed(true),
    ])?);

    let orchestrator = Orchestrator::builder()
        .config_source(Arc::new(registry.clone()))
        .provider_timeout(Duration::from_millis(100))
        .build()?;

    let quotes: FetcherSet<String, QuoteFixture> = FetcherSet::new()
        .with(Arc::new(FixtureFetcher::new(ProviderId::new("twelvedata")?)))
        .with(Arc::new(FixtureFetcher::new(ProviderId::new("yahoo")?)));

    // Third call exceeds twelvedata's minute budget and falls through to yahoo.
    for symbol in ["AAPL", "MSFT", "AAPL"] {
        let key = ResourceKey::quote(symbol);
        let params = symbol.to_string();
        match orchestrator
            .acquire_with(&key, CapabilityKind::MarketData, &params, &quotes)
            .await?
        {
            Acquisition::Completed(r) => println!(
                "{key}: {} {} (change {}) via {} [delayed={}] attempts: {}",
                r.payload.price,
                r.payload.currency,
                r.payload.change(),
                r.source.provider_id,
                r.source.is_delayed,
                r.attempts,
            ),
            Acquisition::Superseded { .. } => println!("{key}: superseded"),
        }
    }

    // TIMEOUT answers after 200 ms, past the 100 ms deadline on every provider.
    let key = ResourceKey::quote("TIMEOUT");
    if let Err(e) = orchestrator
        .acquire_with(&key, CapabilityKind::MarketData, &"TIMEOUT".to_string(), &quotes)
        .await
    {
        println!("{key}: {e} (needs setup: {})", e.needs_setup());
    }

    for usage in orchestrator.usage_all() {
        for w in &usage.windows {
            println!(
                "{} {}: {}/{} (resets in {} ms)",
                usage.provider_id, w.kind, w.used, w.limit, w.reset_in_ms
            );
        }
    }
    Ok(())
}
