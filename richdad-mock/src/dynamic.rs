use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use richdad_core::{CancellationToken, FetchError, ProviderConfig, ProviderFetcher, ProviderId};

/// Instruction for how a fetch should behave for a given key.
#[derive(Debug, Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(FetchError),
    /// Never answer (simulate a stalled connection). Ends only on cancellation.
    Hang,
    /// Return the value after a delay, unless cancelled first.
    Delay(Duration, T),
}

struct InternalState<T> {
    rules: HashMap<String, MockBehavior<T>>,
    fallback: Option<MockBehavior<T>>,
    calls: Vec<String>,
    cancelled: usize,
}

impl<T> Default for InternalState<T> {
    fn default() -> Self {
        Self {
            rules: HashMap::new(),
            fallback: None,
            calls: vec![],
            cancelled: 0,
        }
    }
}

/// Controller handle used by tests to drive a [`ScriptedFetcher`] from the outside.
pub struct ScriptedController<T> {
    state: Arc<Mutex<InternalState<T>>>,
}

impl<T> Clone for ScriptedController<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Clone> ScriptedController<T> {
    /// Set the behavior for a specific key (usually a symbol).
    pub async fn set_behavior(&self, key: impl Into<String>, behavior: MockBehavior<T>) {
        let mut guard = self.state.lock().await;
        guard.rules.insert(key.into(), behavior);
    }

    /// Behavior for keys without a specific rule.
    pub async fn set_default(&self, behavior: MockBehavior<T>) {
        let mut guard = self.state.lock().await;
        guard.fallback = Some(behavior);
    }

    /// Keys requested so far, in call order.
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    /// Number of calls made so far.
    pub async fn call_count(&self) -> usize {
        self.state.lock().await.calls.len()
    }

    /// Number of calls that ended because their token was cancelled.
    pub async fn cancelled_count(&self) -> usize {
        self.state.lock().await.cancelled
    }

    /// Clear all configured behaviors and the call log.
    pub async fn clear_all(&self) {
        let mut guard = self.state.lock().await;
        guard.rules.clear();
        guard.fallback = None;
        guard.calls.clear();
        guard.cancelled = 0;
    }
}

/// A provider fetcher that defers all behavior to a [`ScriptedController`].
///
/// Implements `ProviderFetcher<String, T>`, keyed by the request parameter.
/// Keys without a rule and no default fail with a non-retriable server error.
pub struct ScriptedFetcher<T> {
    id: ProviderId,
    state: Arc<Mutex<InternalState<T>>>,
}

impl<T: Clone + Send + Sync + 'static> ScriptedFetcher<T> {
    /// Create a scripted fetcher for `id` and its controller.
    #[must_use]
    pub fn new_with_controller(id: ProviderId) -> (Arc<Self>, ScriptedController<T>) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = ScriptedController {
            state: Arc::clone(&state),
        };
        (Arc::new(Self { id, state }), controller)
    }

    /// Provider id this fetcher answers for.
    #[must_use]
    pub const fn id(&self) -> &ProviderId {
        &self.id
    }

    /// Run one scripted call for `key`.
    pub async fn call(&self, key: &str, token: CancellationToken) -> Result<T, FetchError> {
        // Snapshot the behavior without holding the lock across await points
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.calls.push(key.to_string());
            guard
                .rules
                .get(key)
                .cloned()
                .or_else(|| guard.fallback.clone())
        };

        match behavior {
            Some(MockBehavior::Return(v)) => Ok(v),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => {
                token.cancelled().await;
                Err(self.cancelled().await)
            }
            Some(MockBehavior::Delay(d, v)) => {
                tokio::select! {
                    () = tokio::time::sleep(d) => Ok(v),
                    () = token.cancelled() => Err(self.cancelled().await),
                }
            }
            None => Err(FetchError::new(
                richdad_core::FetchErrorKind::Server,
                false,
                format!("{}: no behavior scripted for '{key}'", self.id),
            )),
        }
    }

    async fn cancelled(&self) -> FetchError {
        self.state.lock().await.cancelled += 1;
        FetchError::network(format!("{}: request cancelled", self.id))
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> ProviderFetcher<String, T> for ScriptedFetcher<T> {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    async fn fetch(
        &self,
        _provider: &ProviderConfig,
        params: &String,
        token: CancellationToken,
    ) -> Result<T, FetchError> {
        self.call(params, token).await
    }
}
