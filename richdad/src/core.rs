use std::sync::Arc;

use richdad_core::{
    BudgetTracker, Clock, FetchError, FreshnessConfig, FreshnessEvaluator, OrchestratorConfig,
    ProviderConfig, ProviderId, RequestSequencer, ResourceKey, RichdadError, SystemClock,
    UsageSnapshot,
};

use crate::chain::FallbackChain;
use crate::registry::ConfigSource;

/// Budget-aware, fallback-capable acquisition façade.
///
/// Share one instance (behind `Arc`) per application session. It owns the
/// request sequencer, so supersede semantics only hold between acquisitions
/// that go through the same orchestrator.
pub struct Orchestrator {
    pub(crate) source: Arc<dyn ConfigSource>,
    pub(crate) budget: Arc<BudgetTracker>,
    pub(crate) sequencer: RequestSequencer,
    pub(crate) freshness: FreshnessEvaluator,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) cfg: OrchestratorConfig,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("budget", &self.budget)
            .field("sequencer", &self.sequencer)
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

/// Builder for constructing an [`Orchestrator`].
pub struct OrchestratorBuilder {
    source: Option<Arc<dyn ConfigSource>>,
    budget: Option<Arc<BudgetTracker>>,
    clock: Option<Arc<dyn Clock>>,
    cfg: OrchestratorConfig,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    /// Create a builder with default configuration and no provider source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            budget: None,
            clock: None,
            cfg: OrchestratorConfig::default(),
        }
    }

    /// Read provider configuration from `source` at the start of every acquisition.
    ///
    /// Pass a [`SharedRegistry`](crate::SharedRegistry) so settings changes
    /// apply to the next acquisition without rebuilding the orchestrator.
    #[must_use]
    pub fn config_source(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Use a fixed provider list.
    #[must_use]
    pub fn providers(mut self, providers: Vec<ProviderConfig>) -> Self {
        self.source = Some(Arc::new(providers));
        self
    }

    /// Share an existing budget tracker (e.g. with a usage panel).
    ///
    /// The tracker keeps its own clock; pass the same clock to
    /// [`clock`](Self::clock) so freshness and budgets agree.
    #[must_use]
    pub fn budget_tracker(mut self, tracker: Arc<BudgetTracker>) -> Self {
        self.budget = Some(tracker);
        self
    }

    /// Time source for freshness and for a tracker created by the builder.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub const fn config(mut self, cfg: OrchestratorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Freshness thresholds per resource type.
    #[must_use]
    pub const fn freshness(mut self, freshness: FreshnessConfig) -> Self {
        self.cfg.freshness = freshness;
        self
    }

    /// Deadline for each provider attempt. Expiry falls through to the next provider.
    #[must_use]
    pub const fn provider_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.cfg.provider_timeout = timeout;
        self
    }

    /// Whether a provider's `rate_limited` answer saturates its budget windows.
    #[must_use]
    pub const fn saturate_on_rate_limit(mut self, yes: bool) -> Self {
        self.cfg.saturate_on_rate_limit = yes;
        self
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if no provider source was supplied via
    /// [`config_source`](Self::config_source) or [`providers`](Self::providers),
    /// or if the provider timeout is zero.
    pub fn build(self) -> Result<Orchestrator, RichdadError> {
        let Some(source) = self.source else {
            return Err(RichdadError::invalid_config(
                "no provider source; set one via config_source(...) or providers(...)",
            ));
        };
        if self.cfg.provider_timeout.is_zero() {
            return Err(RichdadError::invalid_config("provider_timeout must be > 0"));
        }
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let budget = self
            .budget
            .unwrap_or_else(|| Arc::new(BudgetTracker::new(Arc::clone(&clock))));
        Ok(Orchestrator {
            source,
            budget,
            sequencer: RequestSequencer::new(),
            freshness: FreshnessEvaluator::new(Arc::clone(&clock), self.cfg.freshness),
            clock,
            cfg: self.cfg,
        })
    }
}

/// Why a single provider attempt failed.
#[derive(Debug, Clone)]
pub(crate) enum AttemptError {
    Provider(FetchError),
    TimedOut { timeout_ms: u64 },
}

impl Orchestrator {
    /// Start building a new orchestrator.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use richdad::{Orchestrator, ProviderRegistry, SharedRegistry};
    ///
    /// let registry = SharedRegistry::new(ProviderRegistry::from_json(SETTINGS)?);
    /// let orchestrator = Orchestrator::builder()
    ///     .config_source(Arc::new(registry.clone()))
    ///     .provider_timeout(std::time::Duration::from_secs(5))
    ///     .build()?;
    /// ```
    #[must_use]
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Wrap a provider future with the per-attempt deadline.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "richdad::core::provider_call_with_timeout",
            skip(fut),
            fields(
                provider = %provider_id,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ),
        )
    )]
    pub(crate) async fn provider_call_with_timeout<T, Fut>(
        provider_id: &ProviderId,
        timeout: std::time::Duration,
        fut: Fut,
    ) -> Result<T, AttemptError>
    where
        Fut: core::future::Future<Output = Result<T, FetchError>>,
    {
        match tokio::time::timeout(timeout, fut).await {
            Ok(res) => res.map_err(AttemptError::Provider),
            Err(_) => Err(AttemptError::TimedOut {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// Read the configuration snapshot and sync budget limits from it.
    ///
    /// Limits are re-applied on every call so tier changes take effect
    /// immediately; the tracker never resets counters on reconfiguration.
    pub(crate) fn chain(&self) -> FallbackChain {
        let chain = FallbackChain::from_snapshot(self.source.snapshot());
        for p in chain.providers() {
            self.budget.configure(&p.id, &p.window_limits());
        }
        chain
    }

    /// The shared budget tracker.
    #[must_use]
    pub const fn budget(&self) -> &Arc<BudgetTracker> {
        &self.budget
    }

    /// Usage meter for one provider.
    #[must_use]
    pub fn usage(&self, provider_id: &ProviderId) -> UsageSnapshot {
        self.budget.snapshot(provider_id)
    }

    /// Usage meters for every provider seen so far, sorted by id.
    #[must_use]
    pub fn usage_all(&self) -> Vec<UsageSnapshot> {
        self.budget.snapshot_all()
    }

    /// Whether `sequence` is still the latest request for `key`.
    #[must_use]
    pub fn is_current(&self, key: &ResourceKey, sequence: u64) -> bool {
        self.sequencer.is_current(key, sequence)
    }

    /// Cancel the in-flight acquisition for `key` (e.g. when its view closes).
    ///
    /// The acquisition resolves as superseded. Returns `true` if one was in flight.
    pub fn cancel(&self, key: &ResourceKey) -> bool {
        self.sequencer.cancel(key)
    }

    /// Number of resource keys with an acquisition in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.sequencer.in_flight()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.cfg
    }

    /// Freshness evaluator, for re-deriving the age of cached results.
    #[must_use]
    pub const fn freshness(&self) -> &FreshnessEvaluator {
        &self.freshness
    }
}
