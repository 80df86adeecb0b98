use std::sync::Arc;
use std::time::Duration;

use crate::helpers::{AAPL, MSFT, orchestrator, pid};
use richdad::{CapabilityKind, ProviderConfig, ProviderFetcher, ResourceKey, RichdadError, Tier};
use richdad_mock::{FixtureFetcher, QuoteFixture};

fn fixture_provider() -> ProviderConfig {
    ProviderConfig::market_data("fixture")
        .unwrap()
        .with_tier(Tier::Unlimited)
}

#[tokio::test]
async fn batch_groups_outcomes_in_request_order() {
    let (_, orch) = orchestrator(vec![fixture_provider()]);
    let fx = Arc::new(FixtureFetcher::new(pid("fixture")));

    let out = orch
        .acquire_batch(
            vec![
                (ResourceKey::quote(AAPL), CapabilityKind::MarketData),
                (ResourceKey::quote("FAIL"), CapabilityKind::MarketData),
                (ResourceKey::quote(MSFT), CapabilityKind::MarketData),
            ],
            |key, provider, token| {
                let fx = Arc::clone(&fx);
                let symbol = key.id().to_string();
                Some(async move {
                    <FixtureFetcher as ProviderFetcher<String, QuoteFixture>>::fetch(
                        &fx, &provider, &symbol, token,
                    )
                    .await
                })
            },
        )
        .await;

    let done: Vec<&str> = out.completed.iter().map(|(k, _)| k.id()).collect();
    assert_eq!(done, vec![AAPL, MSFT]);
    assert!(out.superseded.is_empty());
    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].0, ResourceKey::quote("FAIL"));
    assert!(matches!(
        out.failures[0].1,
        RichdadError::AllProvidersExhausted { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn duplicate_keys_in_a_batch_keep_only_the_latest() {
    let (_, orch) = orchestrator(vec![fixture_provider()]);
    let fx = Arc::new(FixtureFetcher::new(pid("fixture")).with_latency(Duration::from_millis(50)));

    let out = orch
        .acquire_batch(
            vec![
                (ResourceKey::quote(AAPL), CapabilityKind::MarketData),
                (ResourceKey::quote(AAPL), CapabilityKind::MarketData),
            ],
            |key, provider, token| {
                let fx = Arc::clone(&fx);
                let symbol = key.id().to_string();
                Some(async move {
                    <FixtureFetcher as ProviderFetcher<String, QuoteFixture>>::fetch(
                        &fx, &provider, &symbol, token,
                    )
                    .await
                })
            },
        )
        .await;

    assert_eq!(out.superseded, vec![ResourceKey::quote(AAPL)]);
    assert_eq!(out.completed.len(), 1);
    assert!(out.failures.is_empty());
}
