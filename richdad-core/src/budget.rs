//! Per-provider call budgets over fixed, epoch-aligned windows.
//!
//! Windows are created lazily on first consumption and reset lazily: whenever
//! a window is read or charged and `now >= window_start + period`, the start is
//! recomputed as `floor(now / period) * period` and `used` drops to zero. There
//! are no background timers.
//!
//! Lifecycle: create one tracker per application session and share it (via
//! `Arc`) between the orchestrator and any UI code that renders usage meters.
//! Counters live in memory only and are discarded when the tracker is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use richdad_types::{ProviderId, WindowKind, WindowLimit};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone, Copy)]
struct WindowUsage {
    used: u64,
    window_start_ms: i64,
}

impl WindowUsage {
    const fn fresh(kind: WindowKind, now_ms: i64) -> Self {
        Self {
            used: 0,
            window_start_ms: kind.window_start(now_ms),
        }
    }

    fn roll(&mut self, kind: WindowKind, now_ms: i64) {
        if now_ms >= self.window_start_ms + kind.period_ms() {
            *self = Self::fresh(kind, now_ms);
        }
    }

    fn reset_in_ms(&self, kind: WindowKind, now_ms: i64) -> u64 {
        u64::try_from(self.window_start_ms + kind.period_ms() - now_ms).unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct ProviderBudget {
    limits: Vec<WindowLimit>,
    windows: HashMap<WindowKind, WindowUsage>,
}

impl ProviderBudget {
    /// Current usage of `kind`, rolled forward to `now_ms`. Does not create an entry.
    fn usage(&mut self, kind: WindowKind, now_ms: i64) -> WindowUsage {
        match self.windows.get_mut(&kind) {
            Some(w) => {
                w.roll(kind, now_ms);
                *w
            }
            None => WindowUsage::fresh(kind, now_ms),
        }
    }

    fn usage_mut(&mut self, kind: WindowKind, now_ms: i64) -> &mut WindowUsage {
        let w = self
            .windows
            .entry(kind)
            .or_insert_with(|| WindowUsage::fresh(kind, now_ms));
        w.roll(kind, now_ms);
        w
    }

    fn limit_for(&self, kind: WindowKind) -> Option<u64> {
        self.limits.iter().find(|l| l.kind == kind).map(|l| l.limit)
    }
}

/// Remaining allowance of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRemaining {
    /// Window kind.
    pub kind: WindowKind,
    /// Configured limit.
    pub limit: u64,
    /// Calls left before the window blocks.
    pub remaining: u64,
    /// Milliseconds until the window resets.
    pub reset_in_ms: u64,
}

/// Answer to "may this provider be called right now?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetCheck {
    /// True only if every window has `used < limit`.
    pub allowed: bool,
    /// Per-window remaining counts.
    pub windows: Vec<WindowRemaining>,
    /// Milliseconds until the soonest window reset; `None` without windows.
    pub reset_in_ms: Option<u64>,
    /// Milliseconds until every blocking window has reset; `None` when allowed.
    pub retry_in_ms: Option<u64>,
}

impl BudgetCheck {
    /// Remaining calls in a specific window, if the provider owns it.
    #[must_use]
    pub fn remaining(&self, kind: WindowKind) -> Option<u64> {
        self.windows
            .iter()
            .find(|w| w.kind == kind)
            .map(|w| w.remaining)
    }
}

/// Read-only usage view of one window, for usage meters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    /// Window kind.
    pub kind: WindowKind,
    /// Calls consumed in the current window.
    pub used: u64,
    /// Configured limit.
    pub limit: u64,
    /// Start of the current window.
    pub window_start: DateTime<Utc>,
    /// Milliseconds until the window resets.
    pub reset_in_ms: u64,
}

/// Read-only usage view of one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Provider id.
    pub provider_id: ProviderId,
    /// Windows in the order they were configured.
    pub windows: Vec<WindowSnapshot>,
}

impl UsageSnapshot {
    /// Snapshot of a specific window, if the provider owns it.
    #[must_use]
    pub fn window(&self, kind: WindowKind) -> Option<&WindowSnapshot> {
        self.windows.iter().find(|w| w.kind == kind)
    }
}

/// Tracks provider consumption against one or more windows per provider.
///
/// All methods take `&self`; state sits behind a mutex so concurrent
/// acquisitions on different worker threads charge the same provider
/// atomically.
pub struct BudgetTracker {
    clock: Arc<dyn Clock>,
    state: Mutex<HashMap<ProviderId, ProviderBudget>>,
}

impl Default for BudgetTracker {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for BudgetTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BudgetTracker")
            .field("providers", &self.lock().len())
            .finish_non_exhaustive()
    }
}

impl BudgetTracker {
    /// Create a tracker reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the state, recovering from poison; counters stay usable after a panic elsewhere.
    fn lock(&self) -> MutexGuard<'_, HashMap<ProviderId, ProviderBudget>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the limits of a provider.
    ///
    /// Swapping limits (for example after a tier change) never resets the
    /// consumption already recorded in the current windows.
    pub fn configure(&self, provider_id: &ProviderId, limits: &[WindowLimit]) {
        let mut state = self.lock();
        let budget = state.entry(provider_id.clone()).or_default();
        if budget.limits != limits {
            #[cfg(feature = "tracing")]
            tracing::debug!(provider = %provider_id, ?limits, "budget limits updated");
            budget.limits = limits.to_vec();
        }
    }

    /// Charge one call against each named window of the provider.
    ///
    /// Call exactly once per successful provider attempt. Window kinds the
    /// provider has no limit for are ignored.
    pub fn record_call(&self, provider_id: &ProviderId, window_kinds: &[WindowKind]) {
        let now_ms = self.clock.now_ms();
        let mut state = self.lock();
        let Some(budget) = state.get_mut(provider_id) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(provider = %provider_id, "record_call for unconfigured provider ignored");
            return;
        };
        for &kind in window_kinds {
            if budget.limit_for(kind).is_none() {
                #[cfg(feature = "tracing")]
                tracing::debug!(provider = %provider_id, window = %kind, "no limit configured for window; not charged");
                continue;
            }
            let w = budget.usage_mut(kind, now_ms);
            w.used = w.used.saturating_add(1);
        }
    }

    /// Whether the provider may be called now, with per-window remaining counts.
    #[must_use]
    pub fn can_call(&self, provider_id: &ProviderId) -> BudgetCheck {
        let now_ms = self.clock.now_ms();
        let mut state = self.lock();
        let Some(budget) = state.get_mut(provider_id) else {
            return BudgetCheck {
                allowed: true,
                windows: vec![],
                reset_in_ms: None,
                retry_in_ms: None,
            };
        };

        let limits = budget.limits.clone();
        let mut windows = Vec::with_capacity(limits.len());
        let mut retry_in_ms: Option<u64> = None;
        for l in limits {
            let usage = budget.usage(l.kind, now_ms);
            let reset_in_ms = usage.reset_in_ms(l.kind, now_ms);
            let remaining = l.limit.saturating_sub(usage.used);
            if remaining == 0 {
                retry_in_ms = Some(retry_in_ms.map_or(reset_in_ms, |r| r.max(reset_in_ms)));
            }
            windows.push(WindowRemaining {
                kind: l.kind,
                limit: l.limit,
                remaining,
                reset_in_ms,
            });
        }
        drop(state);

        BudgetCheck {
            allowed: retry_in_ms.is_none(),
            reset_in_ms: windows.iter().map(|w| w.reset_in_ms).min(),
            retry_in_ms,
            windows,
        }
    }

    /// Usage view of one provider for display.
    #[must_use]
    pub fn snapshot(&self, provider_id: &ProviderId) -> UsageSnapshot {
        let now_ms = self.clock.now_ms();
        let mut state = self.lock();
        let windows = state
            .get_mut(provider_id)
            .map(|budget| Self::window_snapshots(budget, now_ms))
            .unwrap_or_default();
        UsageSnapshot {
            provider_id: provider_id.clone(),
            windows,
        }
    }

    /// Usage views of every configured provider, sorted by id.
    #[must_use]
    pub fn snapshot_all(&self) -> Vec<UsageSnapshot> {
        let now_ms = self.clock.now_ms();
        let mut state = self.lock();
        let mut out: Vec<UsageSnapshot> = state
            .iter_mut()
            .map(|(id, budget)| UsageSnapshot {
                provider_id: id.clone(),
                windows: Self::window_snapshots(budget, now_ms),
            })
            .collect();
        drop(state);
        out.sort_by(|a, b| a.provider_id.cmp(&b.provider_id));
        out
    }

    fn window_snapshots(budget: &mut ProviderBudget, now_ms: i64) -> Vec<WindowSnapshot> {
        let limits = budget.limits.clone();
        limits
            .into_iter()
            .map(|l| {
                let usage = budget.usage(l.kind, now_ms);
                WindowSnapshot {
                    kind: l.kind,
                    used: usage.used,
                    limit: l.limit,
                    window_start: DateTime::from_timestamp_millis(usage.window_start_ms)
                        .unwrap_or_default(),
                    reset_in_ms: usage.reset_in_ms(l.kind, now_ms),
                }
            })
            .collect()
    }

    /// Mark windows as full until their natural reset.
    ///
    /// Used when a provider rejects a call with a rate-limit error the local
    /// counters did not predict. `None` saturates every configured window.
    pub fn saturate(&self, provider_id: &ProviderId, kind: Option<WindowKind>) {
        let now_ms = self.clock.now_ms();
        let mut state = self.lock();
        let Some(budget) = state.get_mut(provider_id) else {
            return;
        };
        let limits = budget.limits.clone();
        for l in limits {
            if kind.is_some_and(|k| k != l.kind) {
                continue;
            }
            let w = budget.usage_mut(l.kind, now_ms);
            w.used = w.used.max(l.limit);
        }
    }

    /// Drop all state for a provider (e.g. when it is removed from settings).
    pub fn forget(&self, provider_id: &ProviderId) {
        self.lock().remove(provider_id);
    }

    /// Drop all state.
    pub fn clear(&self) {
        self.lock().clear();
    }
}
