use std::sync::Arc;
use std::time::Duration;

use crate::helpers::md;
use richdad::{BudgetTracker, ManualClock, Orchestrator, RichdadError};

#[test]
fn build_requires_a_provider_source() {
    let err = Orchestrator::builder().build().unwrap_err();
    assert!(matches!(err, RichdadError::InvalidConfig(_)));
}

#[test]
fn build_rejects_zero_timeout() {
    let err = Orchestrator::builder()
        .providers(vec![md("a", 1)])
        .provider_timeout(Duration::ZERO)
        .build()
        .unwrap_err();
    assert!(matches!(err, RichdadError::InvalidConfig(_)));
}

#[test]
fn shared_budget_tracker_is_used_as_is() {
    let clock = Arc::new(ManualClock::at_millis(0));
    let tracker = Arc::new(BudgetTracker::new(clock.clone()));
    let orch = Orchestrator::builder()
        .providers(vec![md("a", 1)])
        .budget_tracker(Arc::clone(&tracker))
        .clock(clock)
        .build()
        .unwrap();
    assert!(Arc::ptr_eq(orch.budget(), &tracker));
    assert_eq!(orch.config().provider_timeout, Duration::from_secs(10));
    assert!(orch.config().saturate_on_rate_limit);
}
