use std::collections::HashSet;

use richdad_core::{
    AttemptOutcome, AttemptTrail, CancellationToken, CapabilityKind, FetchError, FetchErrorKind,
    FetchResult, FetcherSet, ProviderConfig, ProviderId, RequestHandle, RequestSequencer,
    ResourceKey, RichdadError,
};

use crate::chain::Selection;
use crate::core::{AttemptError, Orchestrator};

/// Terminal outcome of an acquisition that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition<T> {
    /// The payload, annotated with provenance. Safe to apply to shared state.
    Completed(FetchResult<T>),
    /// A newer request for the same key started (or the key was cancelled)
    /// before this one finished. The caller must drop it silently.
    Superseded {
        /// Resource key of the retired request.
        key: ResourceKey,
        /// Sequence id of the retired request.
        sequence: u64,
    },
}

impl<T> Acquisition<T> {
    /// The completed result, if any.
    pub fn completed(self) -> Option<FetchResult<T>> {
        match self {
            Self::Completed(r) => Some(r),
            Self::Superseded { .. } => None,
        }
    }

    /// True for [`Acquisition::Superseded`].
    pub const fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }
}

/// Outcome of [`Orchestrator::acquire_batch`], grouped by result.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Keys that produced a payload, in request order.
    pub completed: Vec<(ResourceKey, FetchResult<T>)>,
    /// Keys whose request was superseded while the batch ran.
    pub superseded: Vec<ResourceKey>,
    /// Keys for which every provider was exhausted.
    pub failures: Vec<(ResourceKey, RichdadError)>,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self {
            completed: vec![],
            superseded: vec![],
            failures: vec![],
        }
    }
}

/// Owns a sequencer turn for the lifetime of one acquisition.
///
/// Dropping it releases the slot (a no-op once superseded) and fires the
/// token, so an acquisition whose future is dropped mid-flight does not stay
/// in flight.
struct InFlight<'a> {
    sequencer: &'a RequestSequencer,
    handle: RequestHandle,
}

impl<'a> InFlight<'a> {
    fn begin(sequencer: &'a RequestSequencer, key: &ResourceKey) -> Self {
        Self {
            handle: sequencer.begin(key),
            sequencer,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.sequencer.complete(&self.handle);
        self.handle.token.cancel();
    }
}

impl Orchestrator {
    fn superseded<T>(handle: &RequestHandle) -> Acquisition<T> {
        #[cfg(feature = "tracing")]
        tracing::debug!(key = %handle.key, sequence = handle.sequence, "acquisition superseded");
        Acquisition::Superseded {
            key: handle.key.clone(),
            sequence: handle.sequence,
        }
    }

    /// Acquire `key` from the providers of `kind`, in priority order.
    ///
    /// `fetcher` is invoked once per candidate with the provider's
    /// configuration and the request's cancellation token; returning `None`
    /// means there is no fetch routine for that provider and it is skipped.
    ///
    /// Behavior:
    /// - Starting an acquisition cancels any in-flight acquisition for the same
    ///   key; that one resolves as [`Acquisition::Superseded`].
    /// - Providers whose budget is exhausted are skipped without a call.
    /// - A failed or timed-out provider is excluded for the rest of this call
    ///   and never retried; the next candidate is tried.
    /// - Exactly one budget unit per window is charged, to the provider whose
    ///   call succeeded.
    /// - Dropping the returned future releases the key and cancels the token
    ///   handed to the fetcher.
    ///
    /// # Errors
    /// `AllProvidersExhausted` when no provider produced a payload. Its
    /// attempt trail tells budget exhaustion apart from provider failures.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "richdad::acquire",
            skip(self, fetcher),
            fields(key = %key, kind = %kind),
        )
    )]
    pub async fn acquire<T, F, Fut>(
        &self,
        key: &ResourceKey,
        kind: CapabilityKind,
        fetcher: F,
    ) -> Result<Acquisition<T>, RichdadError>
    where
        T: Send,
        F: Fn(ProviderConfig, CancellationToken) -> Option<Fut> + Send,
        Fut: core::future::Future<Output = Result<T, FetchError>> + Send,
    {
        let turn = InFlight::begin(&self.sequencer, key);
        let handle = &turn.handle;
        let chain = self.chain();
        let mut excluded: HashSet<ProviderId> = HashSet::new();
        let mut attempts = AttemptTrail::new();

        loop {
            if handle.token.is_cancelled() {
                return Ok(Self::superseded(handle));
            }

            let (provider, budget_skipped) =
                match chain.select_next(kind, &excluded, &self.budget) {
                    Selection::Candidate {
                        provider,
                        budget_skipped,
                    } => (Some(provider), budget_skipped),
                    Selection::Exhausted { budget_skipped } => (None, budget_skipped),
                };
            for skip in budget_skipped {
                excluded.insert(skip.provider_id.clone());
                attempts.push(
                    skip.provider_id,
                    AttemptOutcome::SkippedBudget {
                        retry_in_ms: skip.check.retry_in_ms,
                    },
                );
            }

            let Some(provider) = provider else {
                #[cfg(feature = "tracing")]
                tracing::warn!(key = %key, kind = %kind, attempts = %attempts, "all providers exhausted");
                return Err(RichdadError::AllProvidersExhausted {
                    capability: kind,
                    resource: key.to_string(),
                    attempts,
                });
            };

            let Some(fut) = fetcher(provider.clone(), handle.token.clone()) else {
                excluded.insert(provider.id.clone());
                attempts.push(provider.id, AttemptOutcome::NoFetcher);
                continue;
            };

            let res = tokio::select! {
                biased;
                () = handle.token.cancelled() => None,
                r = Self::provider_call_with_timeout(&provider.id, self.cfg.provider_timeout, fut) => Some(r),
            };
            let Some(res) = res else {
                return Ok(Self::superseded(handle));
            };

            match res {
                Ok(payload) => {
                    self.budget
                        .record_call(&provider.id, &provider.window_kinds());
                    let source =
                        self.freshness
                            .describe(self.clock.now(), &provider, key.resource_type());
                    attempts.push(provider.id.clone(), AttemptOutcome::Succeeded);
                    if !self.sequencer.is_current(key, handle.sequence) {
                        return Ok(Self::superseded(handle));
                    }
                    return Ok(Acquisition::Completed(FetchResult {
                        payload,
                        source,
                        attempts,
                    }));
                }
                Err(_) if handle.token.is_cancelled() => {
                    return Ok(Self::superseded(handle));
                }
                Err(AttemptError::TimedOut { timeout_ms }) => {
                    #[cfg(feature = "tracing")]
                    {
                        let e = FetchError::timeout(&provider.id, timeout_ms);
                        tracing::warn!(provider = %provider.id, kind = %e.kind, retriable = e.retriable, error = %e, "provider attempt timed out");
                    }
                    excluded.insert(provider.id.clone());
                    attempts.push(provider.id, AttemptOutcome::TimedOut { timeout_ms });
                }
                Err(AttemptError::Provider(e)) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(provider = %provider.id, kind = %e.kind, retriable = e.retriable, error = %e, "provider attempt failed");
                    if e.kind == FetchErrorKind::RateLimited && self.cfg.saturate_on_rate_limit {
                        self.budget.saturate(&provider.id, None);
                    }
                    excluded.insert(provider.id.clone());
                    attempts.push(
                        provider.id,
                        AttemptOutcome::Failed {
                            kind: e.kind,
                            retriable: e.retriable,
                            message: e.message,
                        },
                    );
                }
            }
        }
    }

    /// Acquire `key` using the fetchers registered in `fetchers`.
    ///
    /// Providers without a registered fetcher are recorded as
    /// [`AttemptOutcome::NoFetcher`] and skipped.
    ///
    /// # Errors
    /// Same as [`acquire`](Self::acquire).
    pub async fn acquire_with<P, T>(
        &self,
        key: &ResourceKey,
        kind: CapabilityKind,
        params: &P,
        fetchers: &FetcherSet<P, T>,
    ) -> Result<Acquisition<T>, RichdadError>
    where
        P: Send + Sync,
        T: Send,
    {
        self.acquire(key, kind, |provider, token| {
            let f = fetchers.get(&provider.id)?;
            Some(async move { f.fetch(&provider, params, token).await })
        })
        .await
    }

    /// Acquire several independent keys concurrently.
    ///
    /// Each key runs its own fallback chain and sequencing; budgets are shared,
    /// so keys earlier in the list do not get priority over later ones once
    /// their calls interleave.
    pub async fn acquire_batch<T, F, Fut>(
        &self,
        requests: Vec<(ResourceKey, CapabilityKind)>,
        fetcher: F,
    ) -> BatchOutcome<T>
    where
        T: Send,
        F: Fn(&ResourceKey, ProviderConfig, CancellationToken) -> Option<Fut> + Send + Sync,
        Fut: core::future::Future<Output = Result<T, FetchError>> + Send,
    {
        let fetcher = &fetcher;
        let tasks = requests.into_iter().map(|(key, kind)| async move {
            let res = self
                .acquire(&key, kind, |provider, token| fetcher(&key, provider, token))
                .await;
            (key, res)
        });

        let mut out = BatchOutcome::default();
        for (key, res) in futures::future::join_all(tasks).await {
            match res {
                Ok(Acquisition::Completed(r)) => out.completed.push((key, r)),
                Ok(Acquisition::Superseded { .. }) => out.superseded.push(key),
                Err(e) => out.failures.push((key, e)),
            }
        }
        out
    }
}
