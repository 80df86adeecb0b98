use std::sync::Arc;

use crate::helpers::{AAPL, MSFT, T0, fetchers, md, orchestrator, pid, scripted};
use richdad::{
    CapabilityKind, FetchError, ManualClock, Orchestrator, ResourceKey, WindowKind, WindowLimit,
};
use richdad_mock::MockBehavior;

#[tokio::test]
async fn provider_rate_limit_saturates_its_windows() {
    let a = md("a", 1).with_limits(vec![WindowLimit::per_minute(5)]);
    let (clock, orch) = orchestrator(vec![a, md("b", 2)]);
    let (fa, ca) = scripted::<&'static str>("a");
    let (fb, cb) = scripted::<&'static str>("b");
    ca.set_default(MockBehavior::Fail(FetchError::rate_limited("429")))
        .await;
    cb.set_default(MockBehavior::Return("b")).await;
    let set = fetchers(&[&fa, &fb]);

    let first = orch
        .acquire_with(
            &ResourceKey::quote(AAPL),
            CapabilityKind::MarketData,
            &AAPL.to_string(),
            &set,
        )
        .await
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(first.attempts.summary(), "a: FAILED(rate_limited) -> b: OK");
    let minute = orch.usage(&pid("a"));
    let minute = minute.window(WindowKind::Minute).unwrap();
    assert_eq!(minute.used, minute.limit);

    let second = orch
        .acquire_with(
            &ResourceKey::quote(MSFT),
            CapabilityKind::MarketData,
            &MSFT.to_string(),
            &set,
        )
        .await
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(second.attempts.summary(), "a: SKIPPED(budget) -> b: OK");
    assert_eq!(ca.call_count().await, 1);

    // The saturated window resets at the next minute boundary.
    clock.advance_ms(40_000);
    ca.set_default(MockBehavior::Return("a")).await;
    let third = orch
        .acquire_with(
            &ResourceKey::quote(MSFT),
            CapabilityKind::MarketData,
            &MSFT.to_string(),
            &set,
        )
        .await
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(third.payload, "a");
    assert_eq!(cb.call_count().await, 2);
}

#[tokio::test]
async fn saturation_can_be_disabled() {
    let clock = Arc::new(ManualClock::at_millis(T0));
    let orch = Orchestrator::builder()
        .providers(vec![
            md("a", 1).with_limits(vec![WindowLimit::per_minute(5)]),
            md("b", 2),
        ])
        .clock(clock)
        .saturate_on_rate_limit(false)
        .build()
        .unwrap();
    let (fa, ca) = scripted::<u32>("a");
    let (fb, cb) = scripted::<u32>("b");
    ca.set_default(MockBehavior::Fail(FetchError::rate_limited("429")))
        .await;
    cb.set_default(MockBehavior::Return(2)).await;
    let set = fetchers(&[&fa, &fb]);

    for sym in [AAPL, MSFT] {
        orch.acquire_with(
            &ResourceKey::quote(sym),
            CapabilityKind::MarketData,
            &sym.to_string(),
            &set,
        )
        .await
        .unwrap();
    }
    assert_eq!(ca.call_count().await, 2);
    assert_eq!(cb.call_count().await, 2);
    assert_eq!(
        orch.usage(&pid("a")).window(WindowKind::Minute).unwrap().used,
        0
    );
}
