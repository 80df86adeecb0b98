// Shared fixtures for orchestrator integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use richdad::{
    ConfigSource, FetcherSet, ManualClock, Orchestrator, ProviderConfig, ProviderFetcher,
    ProviderId, WindowLimit,
};
use richdad_mock::{ScriptedController, ScriptedFetcher};

/// 2023-11-14T22:13:20Z, 20 seconds into a minute window.
pub const T0: i64 = 1_700_000_000_000;

pub const AAPL: &str = "AAPL";
pub const MSFT: &str = "MSFT";

pub fn pid(s: &str) -> ProviderId {
    ProviderId::new(s).expect("valid provider id")
}

/// Market-data provider with explicit priority and a generous minute window.
pub fn md(id: &str, priority: u32) -> ProviderConfig {
    ProviderConfig::market_data(id)
        .expect("valid config")
        .with_priority(priority)
        .with_limits(vec![WindowLimit::per_minute(100)])
}

pub fn scripted<T: Clone + Send + Sync + 'static>(
    id: &str,
) -> (Arc<ScriptedFetcher<T>>, ScriptedController<T>) {
    ScriptedFetcher::new_with_controller(pid(id))
}

pub fn fetchers<T: Clone + Send + Sync + 'static>(
    list: &[&Arc<ScriptedFetcher<T>>],
) -> FetcherSet<String, T> {
    let mut set = FetcherSet::new();
    for f in list {
        set.register(Arc::clone(*f) as Arc<dyn ProviderFetcher<String, T>>);
    }
    set
}

/// Orchestrator over a fixed provider list with a manual clock at [`T0`].
pub fn orchestrator(providers: Vec<ProviderConfig>) -> (Arc<ManualClock>, Orchestrator) {
    orchestrator_from(Arc::new(providers))
}

pub fn orchestrator_from(source: Arc<dyn ConfigSource>) -> (Arc<ManualClock>, Orchestrator) {
    let clock = Arc::new(ManualClock::at_millis(T0));
    let orch = Orchestrator::builder()
        .config_source(source)
        .clock(clock.clone())
        .provider_timeout(std::time::Duration::from_secs(1))
        .build()
        .expect("orchestrator");
    (clock, orch)
}
