use std::collections::HashSet;

use richdad_core::{BudgetCheck, BudgetTracker, CapabilityKind, ProviderConfig, ProviderId};

use crate::registry::dense_priorities;

/// A provider passed over because its budget did not permit a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSkip {
    /// Skipped provider.
    pub provider_id: ProviderId,
    /// Budget state at the time of the decision.
    pub check: BudgetCheck,
}

/// Outcome of [`FallbackChain::select_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The next provider to try.
    Candidate {
        /// Provider to call.
        provider: ProviderConfig,
        /// Higher-priority providers skipped for budget on the way.
        budget_skipped: Vec<BudgetSkip>,
    },
    /// No eligible provider remains.
    Exhausted {
        /// Providers skipped for budget during this selection.
        budget_skipped: Vec<BudgetSkip>,
    },
}

/// Immutable, priority-ordered view over one configuration snapshot.
#[derive(Debug, Clone, Default)]
pub struct FallbackChain {
    // Dense 1..=N per kind, sorted by rank.
    providers: Vec<ProviderConfig>,
}

impl FallbackChain {
    /// Normalize a configuration snapshot.
    ///
    /// Invalid entries and later duplicates of an id are dropped. Priorities
    /// are then made dense per kind: ascending by the stored priority, ties in
    /// snapshot order, priority 0 last.
    #[must_use]
    pub fn from_snapshot(configs: Vec<ProviderConfig>) -> Self {
        let mut seen: HashSet<ProviderId> = HashSet::new();
        let mut providers: Vec<ProviderConfig> = Vec::with_capacity(configs.len());
        for cfg in configs {
            if let Err(_e) = cfg.validate() {
                #[cfg(feature = "tracing")]
                tracing::warn!(provider = %cfg.id, error = %_e, "invalid provider in snapshot ignored");
                continue;
            }
            if seen.insert(cfg.id.clone()) {
                providers.push(cfg);
            } else {
                #[cfg(feature = "tracing")]
                tracing::warn!(provider = %cfg.id, "duplicate provider in snapshot ignored");
            }
        }
        dense_priorities(&mut providers);
        providers.sort_by_key(|p| p.priority);
        Self { providers }
    }

    /// All providers in the snapshot, including disabled ones.
    #[must_use]
    pub fn providers(&self) -> &[ProviderConfig] {
        &self.providers
    }

    /// Enabled providers of `kind`, ascending by priority.
    #[must_use]
    pub fn ordered_candidates(&self, kind: CapabilityKind) -> Vec<&ProviderConfig> {
        self.providers
            .iter()
            .filter(|p| p.enabled && p.kind() == kind)
            .collect()
    }

    /// First enabled provider of `kind` outside `excluded` whose budget permits a call.
    #[must_use]
    pub fn select_next(
        &self,
        kind: CapabilityKind,
        excluded: &HashSet<ProviderId>,
        tracker: &BudgetTracker,
    ) -> Selection {
        let mut budget_skipped = Vec::new();
        for p in self.ordered_candidates(kind) {
            if excluded.contains(&p.id) {
                continue;
            }
            let check = tracker.can_call(&p.id);
            if check.allowed {
                return Selection::Candidate {
                    provider: p.clone(),
                    budget_skipped,
                };
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(provider = %p.id, retry_in_ms = ?check.retry_in_ms, "budget exhausted; skipping");
            budget_skipped.push(BudgetSkip {
                provider_id: p.id.clone(),
                check,
            });
        }
        Selection::Exhausted { budget_skipped }
    }
}
