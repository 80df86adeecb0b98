use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use richdad_types::{FetchError, ProviderConfig, ProviderId};

use crate::cancel::CancellationToken;

/// A provider-specific fetch routine for one kind of payload.
///
/// `P` is the request parameters (symbol, interval, prompt...) and `T` the
/// decoded payload. Implementations own the wire format and authentication;
/// the orchestrator only sees the typed result.
///
/// Implementations should observe `token` at their own suspension points. The
/// orchestrator also races every call against the token, so a fetcher that
/// ignores it is dropped at the next await rather than leaking.
#[async_trait]
pub trait ProviderFetcher<P, T>: Send + Sync {
    /// Id of the provider this fetcher talks to.
    fn provider_id(&self) -> &ProviderId;

    /// Perform one attempt against the provider.
    async fn fetch(
        &self,
        provider: &ProviderConfig,
        params: &P,
        token: CancellationToken,
    ) -> Result<T, FetchError>;
}

/// Registered fetchers for one payload type, keyed by provider id.
pub struct FetcherSet<P, T> {
    fetchers: HashMap<ProviderId, Arc<dyn ProviderFetcher<P, T>>>,
}

impl<P, T> Default for FetcherSet<P, T> {
    fn default() -> Self {
        Self {
            fetchers: HashMap::new(),
        }
    }
}

impl<P, T> Clone for FetcherSet<P, T> {
    fn clone(&self) -> Self {
        Self {
            fetchers: self.fetchers.clone(),
        }
    }
}

impl<P, T> std::fmt::Debug for FetcherSet<P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&str> = self.fetchers.keys().map(ProviderId::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("FetcherSet").field("providers", &ids).finish()
    }
}

impl<P, T> FetcherSet<P, T> {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the fetcher for its provider id.
    pub fn register(&mut self, fetcher: Arc<dyn ProviderFetcher<P, T>>) {
        self.fetchers.insert(fetcher.provider_id().clone(), fetcher);
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, fetcher: Arc<dyn ProviderFetcher<P, T>>) -> Self {
        self.register(fetcher);
        self
    }

    /// Fetcher for a provider, if registered.
    #[must_use]
    pub fn get(&self, provider_id: &ProviderId) -> Option<Arc<dyn ProviderFetcher<P, T>>> {
        self.fetchers.get(provider_id).cloned()
    }

    /// Number of registered fetchers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fetchers.len()
    }

    /// True when no fetcher is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }
}
