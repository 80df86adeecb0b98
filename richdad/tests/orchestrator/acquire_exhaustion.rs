use crate::helpers::{AAPL, fetchers, md, orchestrator, scripted};
use richdad::{
    AttemptOutcome, CapabilityKind, FetchError, FetchErrorKind, ResourceKey, RichdadError,
    WindowKind, WindowLimit,
};
use richdad_mock::MockBehavior;

#[tokio::test]
async fn all_providers_failing_returns_exhausted_with_trail() {
    let (_, orch) = orchestrator(vec![md("a", 1), md("b", 2), md("c", 3)]);
    let (fa, ca) = scripted::<u32>("a");
    let (fb, cb) = scripted::<u32>("b");
    let (fc, cc) = scripted::<u32>("c");
    ca.set_default(MockBehavior::Fail(FetchError::network("dns"))).await;
    cb.set_default(MockBehavior::Fail(FetchError::server("500"))).await;
    cc.set_default(MockBehavior::Fail(FetchError::network("reset"))).await;
    let set = fetchers(&[&fa, &fb, &fc]);

    let key = ResourceKey::quote(AAPL);
    let err = orch
        .acquire_with(&key, CapabilityKind::MarketData, &AAPL.to_string(), &set)
        .await
        .expect_err("every provider fails");

    match &err {
        RichdadError::AllProvidersExhausted {
            capability,
            resource,
            attempts,
        } => {
            assert_eq!(*capability, CapabilityKind::MarketData);
            assert_eq!(resource, "quote:AAPL");
            assert_eq!(attempts.len(), 3);
            assert!(matches!(
                attempts.attempts()[1].outcome,
                AttemptOutcome::Failed {
                    kind: FetchErrorKind::Server,
                    ..
                }
            ));
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(!err.needs_setup());
    assert_eq!(orch.in_flight(), 0, "exhaustion releases the handle");
    for w in orch.usage_all() {
        assert!(w.windows.iter().all(|w| w.used == 0));
    }
}

#[tokio::test]
async fn all_budgets_exhausted_makes_no_calls() {
    let a = md("a", 1).with_limits(vec![WindowLimit::per_day(2)]);
    let b = md("b", 2).with_limits(vec![WindowLimit::per_minute(1)]);
    let (_, orch) = orchestrator(vec![a.clone(), b.clone()]);
    for p in [&a, &b] {
        orch.budget().configure(&p.id, &p.window_limits());
        orch.budget().saturate(&p.id, None);
    }
    let (fa, ca) = scripted::<u32>("a");
    let (fb, cb) = scripted::<u32>("b");
    ca.set_default(MockBehavior::Return(1)).await;
    cb.set_default(MockBehavior::Return(2)).await;

    let err = orch
        .acquire_with(
            &ResourceKey::quote(AAPL),
            CapabilityKind::MarketData,
            &AAPL.to_string(),
            &fetchers(&[&fa, &fb]),
        )
        .await
        .unwrap_err();

    let RichdadError::AllProvidersExhausted { attempts, .. } = &err else {
        panic!("unexpected: {err:?}");
    };
    assert!(attempts.all_budget_skipped());
    assert_eq!(attempts.summary(), "a: SKIPPED(budget) -> b: SKIPPED(budget)");
    assert!(!err.needs_setup(), "budget exhaustion heals on its own");
    assert_eq!(ca.call_count().await + cb.call_count().await, 0);
    assert_eq!(
        orch.usage(&a.id).window(WindowKind::Day).map(|w| w.used),
        Some(2)
    );
}

#[tokio::test]
async fn no_providers_for_kind_needs_setup() {
    let (_, orch) = orchestrator(vec![md("a", 1)]);
    let err = orch
        .acquire(
            &ResourceKey::recommendation(AAPL),
            CapabilityKind::Ai,
            |_, _| None::<std::future::Ready<Result<u32, FetchError>>>,
        )
        .await
        .unwrap_err();
    let RichdadError::AllProvidersExhausted { attempts, .. } = &err else {
        panic!("unexpected: {err:?}");
    };
    assert!(attempts.is_empty());
    assert!(err.needs_setup());
    assert!(err.to_string().contains("no providers configured"));
}

#[tokio::test]
async fn auth_failure_points_user_at_settings() {
    let (_, orch) = orchestrator(vec![md("a", 1)]);
    let (fa, ca) = scripted::<u32>("a");
    ca.set_default(MockBehavior::Fail(FetchError::auth("invalid api key")))
        .await;

    let err = orch
        .acquire_with(
            &ResourceKey::quote(AAPL),
            CapabilityKind::MarketData,
            &AAPL.to_string(),
            &fetchers(&[&fa]),
        )
        .await
        .unwrap_err();
    assert!(err.needs_setup());
}
