use std::sync::Arc;

use crate::helpers::{AAPL, orchestrator_from, pid};
use richdad::{
    CapabilityKind, FetchError, ProviderConfig, ProviderRegistry, ResourceKey, RichdadError,
    SharedRegistry, Tier, WindowKind,
};

async fn acquire_once(orch: &richdad::Orchestrator) -> Result<(), RichdadError> {
    orch.acquire(
        &ResourceKey::quote(AAPL),
        CapabilityKind::MarketData,
        |_, _| Some(async { Ok::<_, FetchError>(()) }),
    )
    .await
    .map(|_| ())
}

async fn served_by(orch: &richdad::Orchestrator) -> richdad::ProviderId {
    orch.acquire(&ResourceKey::quote(AAPL), CapabilityKind::MarketData, |p, _| {
        Some(async move { Ok::<_, FetchError>(p.id) })
    })
    .await
    .unwrap()
    .completed()
    .unwrap()
    .payload
}

#[tokio::test]
async fn twelvedata_free_then_premium() {
    let registry = SharedRegistry::new(
        ProviderRegistry::from_configs(vec![ProviderConfig::market_data("twelvedata").unwrap()])
            .unwrap(),
    );
    let (_, orch) = orchestrator_from(Arc::new(registry.clone()));
    let td = pid("twelvedata");

    for _ in 0..8 {
        acquire_once(&orch).await.expect("within the free minute budget");
    }
    let snap = orch.usage(&td);
    assert_eq!(snap.window(WindowKind::Minute).unwrap().used, 8);
    assert_eq!(snap.window(WindowKind::Day).unwrap().used, 8);

    let err = acquire_once(&orch).await.unwrap_err();
    let RichdadError::AllProvidersExhausted { attempts, .. } = &err else {
        panic!("unexpected: {err:?}");
    };
    assert!(attempts.all_budget_skipped());

    registry
        .update(|r| r.set_tier(&td, Tier::Premium))
        .unwrap();
    acquire_once(&orch).await.expect("premium limits apply immediately");

    let snap = orch.usage(&td);
    let minute = snap.window(WindowKind::Minute).unwrap();
    assert_eq!((minute.used, minute.limit), (9, 55));
    assert!(snap.window(WindowKind::Day).is_none());
}

#[tokio::test]
async fn disabling_a_provider_in_settings_applies_to_next_acquire() {
    let registry = SharedRegistry::new(
        ProviderRegistry::from_configs(vec![
            ProviderConfig::market_data("finnhub").unwrap(),
            ProviderConfig::market_data("polygon").unwrap(),
        ])
        .unwrap(),
    );
    let (_, orch) = orchestrator_from(Arc::new(registry.clone()));

    assert_eq!(served_by(&orch).await, "finnhub");
    registry
        .update(|r| r.set_enabled(&pid("finnhub"), false))
        .unwrap();
    assert_eq!(served_by(&orch).await, "polygon");
}
