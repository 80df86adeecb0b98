use std::time::Duration;

use crate::helpers::{AAPL, fetchers, md, orchestrator, pid, scripted};
use richdad::{AttemptOutcome, CapabilityKind, ResourceKey, WindowKind};
use richdad_mock::MockBehavior;

#[tokio::test(start_paused = true)]
async fn timeout_falls_back_instead_of_superseding() {
    let (_, orch) = orchestrator(vec![md("slow", 1), md("fast", 2)]);
    let (slow, cs) = scripted::<u32>("slow");
    let (fast, cf) = scripted::<u32>("fast");
    cs.set_default(MockBehavior::Hang).await;
    cf.set_default(MockBehavior::Return(9)).await;
    let key = ResourceKey::quote(AAPL);

    let started = tokio::time::Instant::now();
    let res = orch
        .acquire_with(
            &key,
            CapabilityKind::MarketData,
            &AAPL.to_string(),
            &fetchers(&[&slow, &fast]),
        )
        .await
        .expect("fallback succeeds")
        .completed()
        .expect("a timeout is not a supersede");

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(res.payload, 9);
    assert_eq!(
        res.attempts.attempts()[0].outcome,
        AttemptOutcome::TimedOut { timeout_ms: 1_000 }
    );
    assert_eq!(res.attempts.summary(), "slow: TIMEOUT(1000ms) -> fast: OK");
    assert!(orch.is_current(&key, 1));
    assert_eq!(
        orch.usage(&pid("slow")).window(WindowKind::Minute).unwrap().used,
        0
    );
}

#[tokio::test(start_paused = true)]
async fn delay_under_the_deadline_succeeds() {
    let (_, orch) = orchestrator(vec![md("p", 1)]);
    let (p, cp) = scripted::<u32>("p");
    cp.set_default(MockBehavior::Delay(Duration::from_millis(999), 5))
        .await;

    let res = orch
        .acquire_with(
            &ResourceKey::quote(AAPL),
            CapabilityKind::MarketData,
            &AAPL.to_string(),
            &fetchers(&[&p]),
        )
        .await
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(res.payload, 5);
}
