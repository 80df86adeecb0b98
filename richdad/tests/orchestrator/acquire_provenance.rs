use std::sync::Arc;

use crate::helpers::{AAPL, orchestrator, pid};
use richdad::{
    CapabilityKind, Clock, FetcherSet, ProviderConfig, ProviderFetcher, ResourceKey, ResourceType,
    Tier,
};
use richdad_mock::{CandleFixture, FixtureFetcher, QuoteFixture, fixture};

fn yahoo() -> ProviderConfig {
    ProviderConfig::market_data("yahoo")
        .unwrap()
        .delayed(true)
        .with_tier(Tier::Unlimited)
}

#[tokio::test]
async fn completed_result_carries_provenance() {
    let (clock, orch) = orchestrator(vec![yahoo()]);
    let mut quotes: FetcherSet<String, QuoteFixture> = FetcherSet::new();
    quotes.register(Arc::new(FixtureFetcher::new(pid("yahoo"))));

    let res = orch
        .acquire_with(
            &ResourceKey::quote(AAPL),
            CapabilityKind::MarketData,
            &AAPL.to_string(),
            &quotes,
        )
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(Some(res.payload.clone()), fixture::quote_by_symbol(AAPL));
    assert_eq!(res.source.provider_id, "yahoo");
    assert_eq!(res.source.fetched_at, clock.now());
    assert_eq!(res.source.cache_age_ms, 0);
    assert!(res.source.is_fresh);
    assert!(res.source.is_delayed, "delayed regardless of age");

    // Re-render six minutes later: stale, still delayed.
    clock.advance_ms(6 * 60 * 1_000);
    let later = orch.freshness().refresh(res.source, ResourceType::Quote);
    assert_eq!(later.cache_age_ms, 360_000);
    assert!(!later.is_fresh);
    assert!(later.is_delayed);
}

#[tokio::test]
async fn chart_threshold_applies_to_chart_keys() {
    let (clock, orch) = orchestrator(vec![yahoo()]);
    let fx: Arc<dyn ProviderFetcher<String, Vec<CandleFixture>>> =
        Arc::new(FixtureFetcher::new(pid("yahoo")));
    let candles = FetcherSet::new().with(fx);

    let res = orch
        .acquire_with(
            &ResourceKey::chart_interval(AAPL, "1d"),
            CapabilityKind::MarketData,
            &AAPL.to_string(),
            &candles,
        )
        .await
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(res.payload.len(), 3);

    clock.advance_ms(59 * 60 * 1_000);
    assert!(orch.freshness().refresh(res.source.clone(), ResourceType::Chart).is_fresh);
    clock.advance_ms(60 * 1_000);
    assert!(!orch.freshness().refresh(res.source, ResourceType::Chart).is_fresh);
}
