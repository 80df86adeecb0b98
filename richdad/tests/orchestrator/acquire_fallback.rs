use crate::helpers::{AAPL, fetchers, md, orchestrator, pid, scripted};
use richdad::{
    Acquisition, AttemptOutcome, CapabilityKind, FetchError, ProviderConfig, ResourceKey,
    WindowKind, WindowLimit,
};
use richdad_mock::MockBehavior;

#[tokio::test]
async fn budget_then_network_then_healthy() {
    let a = md("a", 1).with_limits(vec![WindowLimit::per_minute(1)]);
    let b = md("b", 2);
    let c = md("c", 3);
    let (_, orch) = orchestrator(vec![a.clone(), b, c]);

    // Exhaust A's only window before the acquisition starts.
    orch.budget().configure(&a.id, &a.window_limits());
    orch.budget().record_call(&a.id, &[WindowKind::Minute]);

    let (fa, ca) = scripted::<String>("a");
    let (fb, cb) = scripted::<String>("b");
    let (fc, cc) = scripted::<String>("c");
    ca.set_default(MockBehavior::Return("from-a".into())).await;
    cb.set_default(MockBehavior::Fail(FetchError::network("connection reset")))
        .await;
    cc.set_default(MockBehavior::Return("from-c".into())).await;
    let set = fetchers(&[&fa, &fb, &fc]);

    let key = ResourceKey::quote(AAPL);
    let res = orch
        .acquire_with(&key, CapabilityKind::MarketData, &AAPL.to_string(), &set)
        .await
        .expect("acquire ok")
        .completed()
        .expect("not superseded");

    assert_eq!(res.payload, "from-c");
    assert_eq!(res.source.provider_id, "c");
    assert_eq!(
        res.attempts.summary(),
        "a: SKIPPED(budget) -> b: FAILED(network) -> c: OK"
    );

    assert_eq!(ca.call_count().await, 0);
    assert_eq!(cb.call_count().await, 1);
    assert_eq!(cc.call_count().await, 1);

    let used = |id: &str| {
        orch.usage(&pid(id))
            .window(WindowKind::Minute)
            .map(|w| w.used)
    };
    assert_eq!(used("a"), Some(1), "A keeps only its pre-existing usage");
    assert_eq!(used("b"), Some(0), "failures are never charged");
    assert_eq!(used("c"), Some(1), "exactly one charge for the winner");
}

#[tokio::test]
async fn primary_wins_and_others_are_not_called() {
    let (_, orch) = orchestrator(vec![md("second", 2), md("first", 1), md("third", 3)]);
    let (f1, c1) = scripted::<u32>("first");
    let (f2, c2) = scripted::<u32>("second");
    let (f3, c3) = scripted::<u32>("third");
    c1.set_default(MockBehavior::Return(1)).await;
    c2.set_default(MockBehavior::Return(2)).await;
    c3.set_default(MockBehavior::Return(3)).await;
    let set = fetchers(&[&f1, &f2, &f3]);

    let res = orch
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
    assert_eq!(res.payload, 1);
    assert_eq!(res.attempts.len(), 1);
    assert_eq!(c2.call_count().await + c3.call_count().await, 0);
}

#[tokio::test]
async fn disabled_and_other_kind_providers_are_ignored() {
    let (_, orch) = orchestrator(vec![
        md("off", 1).with_enabled(false),
        ProviderConfig::ai("gemini", "gemini-2.0-flash")
            .unwrap()
            .with_priority(1),
        md("on", 2),
    ]);
    let (off, c_off) = scripted::<u32>("off");
    let (ai, c_ai) = scripted::<u32>("gemini");
    let (on, c_on) = scripted::<u32>("on");
    c_on.set_default(MockBehavior::Return(42)).await;
    let set = fetchers(&[&off, &ai, &on]);

    let res = orch
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
    assert_eq!(res.payload, 42);
    assert_eq!(res.attempts.providers().collect::<Vec<_>>(), vec![&pid("on")]);
    assert_eq!(c_off.call_count().await, 0);
    assert_eq!(c_ai.call_count().await, 0);
}

#[tokio::test]
async fn provider_without_fetcher_is_skipped() {
    let (_, orch) = orchestrator(vec![md("nofetch", 1), md("backup", 2)]);
    let (backup, cb) = scripted::<u32>("backup");
    cb.set_default(MockBehavior::Return(7)).await;

    let res = orch
        .acquire(
            &ResourceKey::quote(AAPL),
            CapabilityKind::MarketData,
            |provider, token| {
                if provider.id != "backup" {
                    return None;
                }
                let f = backup.clone();
                Some(async move { f.call(AAPL, token).await })
            },
        )
        .await
        .unwrap();

    let Acquisition::Completed(res) = res else {
        panic!("unexpected supersede");
    };
    assert_eq!(res.payload, 7);
    assert_eq!(
        res.attempts.attempts()[0].outcome,
        AttemptOutcome::NoFetcher
    );
    assert_eq!(res.attempts.summary(), "nofetch: SKIPPED(no fetcher) -> backup: OK");
}

#[tokio::test]
async fn failed_provider_is_not_retried_within_one_call() {
    let (_, orch) = orchestrator(vec![md("flaky", 1), md("steady", 2)]);
    let (flaky, cf) = scripted::<u32>("flaky");
    let (steady, cs) = scripted::<u32>("steady");
    cf.set_default(MockBehavior::Fail(FetchError::server("502"))).await;
    cs.set_default(MockBehavior::Fail(FetchError::server("503"))).await;
    let set = fetchers(&[&flaky, &steady]);

    let err = orch
        .acquire_with(
            &ResourceKey::quote(AAPL),
            CapabilityKind::MarketData,
            &AAPL.to_string(),
            &set,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, richdad::RichdadError::AllProvidersExhausted { .. }));
    assert_eq!(cf.call_count().await, 1);
    assert_eq!(cs.call_count().await, 1);

    // The next acquisition starts from the top of the chain again.
    cf.set_default(MockBehavior::Return(1)).await;
    let again = orch
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
    assert_eq!(again.payload, 1);
    assert_eq!(cf.call_count().await, 2);
}

#[tokio::test]
async fn fetchers_see_dense_ranks_from_a_static_provider_list() {
    let (_, orch) = orchestrator(vec![md("a", 5), md("b", 5), md("c", 0)]);
    let seen = std::sync::Mutex::new(Vec::new());

    let err = orch
        .acquire(
            &ResourceKey::quote(AAPL),
            CapabilityKind::MarketData,
            |provider, _| {
                seen.lock()
                    .unwrap()
                    .push((provider.id.to_string(), provider.priority));
                Some(async { Err::<u32, _>(FetchError::server("down")) })
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, richdad::RichdadError::AllProvidersExhausted { .. }));
    assert_eq!(
        seen.into_inner().unwrap(),
        vec![("a".to_string(), 1), ("b".to_string(), 2), ("c".to_string(), 3)]
    );
}
