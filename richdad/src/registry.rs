//! Settings-owned provider registry.
//!
//! The registry is the mutable side of provider configuration: the settings
//! screen adds, removes, reorders and toggles providers here, and the
//! orchestrator reads an immutable snapshot through [`ConfigSource`] once per
//! acquisition.
//!
//! Priorities are dense per capability kind: after every mutation the
//! providers of each kind carry priorities `1..=N` with no gaps or ties.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use richdad_core::{CapabilityKind, ProviderConfig, ProviderId, RichdadError, Tier};

/// Supplies the provider configuration snapshot read at the start of each acquisition.
pub trait ConfigSource: Send + Sync {
    /// Current provider configuration. Need not be normalized.
    fn snapshot(&self) -> Vec<ProviderConfig>;
}

impl ConfigSource for Vec<ProviderConfig> {
    fn snapshot(&self) -> Vec<ProviderConfig> {
        self.clone()
    }
}

/// Priority used when sorting: 0 means "unranked, append after ranked providers".
const fn sort_rank(priority: u32) -> u32 {
    if priority == 0 { u32::MAX } else { priority }
}

/// Ordered set of provider configurations.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    // Insertion order; doubles as the tie-breaker when priorities collide.
    providers: Vec<ProviderConfig>,
}

impl ConfigSource for ProviderRegistry {
    fn snapshot(&self) -> Vec<ProviderConfig> {
        self.providers.clone()
    }
}

impl ProviderRegistry {
    /// Empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self { providers: vec![] }
    }

    /// Build a registry from loaded settings.
    ///
    /// Stored priorities are honored as an ordering hint (ties fall back to
    /// list order, unranked entries go last) and then made dense.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for an invalid entry and `DuplicateProvider`
    /// when two entries share an id.
    pub fn from_configs(configs: Vec<ProviderConfig>) -> Result<Self, RichdadError> {
        let mut reg = Self::new();
        for cfg in configs {
            cfg.validate()?;
            if reg.get(&cfg.id).is_some() {
                return Err(RichdadError::DuplicateProvider(cfg.id.to_string()));
            }
            reg.providers.push(cfg);
        }
        reg.renormalize();
        Ok(reg)
    }

    /// Parse a JSON array of provider configurations.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when the JSON does not match the provider schema,
    /// plus the errors of [`from_configs`](Self::from_configs).
    pub fn from_json(json: &str) -> Result<Self, RichdadError> {
        let configs: Vec<ProviderConfig> = serde_json::from_str(json)
            .map_err(|e| RichdadError::invalid_config(format!("provider settings: {e}")))?;
        Self::from_configs(configs)
    }

    /// All providers in insertion order.
    #[must_use]
    pub fn providers(&self) -> &[ProviderConfig] {
        &self.providers
    }

    /// Providers of one kind, ascending by priority (disabled ones included).
    #[must_use]
    pub fn providers_for(&self, kind: CapabilityKind) -> Vec<&ProviderConfig> {
        let mut out: Vec<&ProviderConfig> =
            self.providers.iter().filter(|p| p.kind() == kind).collect();
        out.sort_by_key(|p| p.priority);
        out
    }

    /// Look up a provider by id.
    #[must_use]
    pub fn get(&self, id: &ProviderId) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| &p.id == id)
    }

    fn get_mut(&mut self, id: &ProviderId) -> Result<&mut ProviderConfig, RichdadError> {
        self.providers
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| RichdadError::UnknownProvider(id.to_string()))
    }

    /// Number of providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// True when no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Add a provider.
    ///
    /// Priority 0 appends it after the existing providers of its kind; a
    /// non-zero priority inserts it at that rank, shifting the others down.
    ///
    /// # Errors
    /// `InvalidConfig` for an invalid config, `DuplicateProvider` if the id exists.
    pub fn add(&mut self, mut config: ProviderConfig) -> Result<(), RichdadError> {
        config.validate()?;
        if self.get(&config.id).is_some() {
            return Err(RichdadError::DuplicateProvider(config.id.to_string()));
        }
        let kind = config.kind();
        if config.priority == 0 {
            config.priority = u32::try_from(self.count(kind))
                .unwrap_or(u32::MAX - 1)
                .saturating_add(1);
        } else {
            for p in self
                .providers
                .iter_mut()
                .filter(|p| p.kind() == kind && p.priority >= config.priority)
            {
                p.priority = p.priority.saturating_add(1);
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(provider = %config.id, kind = %kind, priority = config.priority, "provider added");
        self.providers.push(config);
        self.renormalize();
        Ok(())
    }

    /// Remove a provider and close the gap it leaves.
    ///
    /// # Errors
    /// `UnknownProvider` if no provider has this id.
    pub fn remove(&mut self, id: &ProviderId) -> Result<ProviderConfig, RichdadError> {
        let idx = self
            .providers
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| RichdadError::UnknownProvider(id.to_string()))?;
        let removed = self.providers.remove(idx);
        self.renormalize();
        Ok(removed)
    }

    /// Reorder the providers of `kind`.
    ///
    /// Listed ids take priorities `1..=ids.len()` in the given order; unlisted
    /// providers of the kind keep their relative order after them.
    ///
    /// # Errors
    /// `UnknownProvider` for an unknown id, `InvalidConfig` for an id of a
    /// different kind or listed twice.
    pub fn reorder(&mut self, kind: CapabilityKind, ids: &[ProviderId]) -> Result<(), RichdadError> {
        for (i, id) in ids.iter().enumerate() {
            let p = self
                .get(id)
                .ok_or_else(|| RichdadError::UnknownProvider(id.to_string()))?;
            if p.kind() != kind {
                return Err(RichdadError::invalid_config(format!(
                    "provider '{id}' is {}, not {kind}",
                    p.kind()
                )));
            }
            if ids[..i].contains(id) {
                return Err(RichdadError::invalid_config(format!(
                    "provider '{id}' listed twice"
                )));
            }
        }

        let listed = u32::try_from(ids.len()).unwrap_or(u32::MAX);
        for p in self.providers.iter_mut().filter(|p| p.kind() == kind) {
            p.priority = match ids.iter().position(|id| id == &p.id) {
                Some(pos) => u32::try_from(pos).unwrap_or(u32::MAX) + 1,
                None => p.priority.saturating_add(listed),
            };
        }
        self.renormalize();
        Ok(())
    }

    /// Move a provider to `priority` within its kind, clamped to `1..=N`.
    ///
    /// # Errors
    /// `UnknownProvider` if no provider has this id.
    pub fn move_to(&mut self, id: &ProviderId, priority: u32) -> Result<(), RichdadError> {
        let kind = self
            .get(id)
            .map(ProviderConfig::kind)
            .ok_or_else(|| RichdadError::UnknownProvider(id.to_string()))?;
        let mut order: Vec<ProviderId> = self
            .providers_for(kind)
            .into_iter()
            .filter(|p| &p.id != id)
            .map(|p| p.id.clone())
            .collect();
        let slot = usize::try_from(priority.max(1) - 1)
            .unwrap_or(usize::MAX)
            .min(order.len());
        order.insert(slot, id.clone());
        self.reorder(kind, &order)
    }

    /// Enable or disable a provider. Disabled providers keep their rank.
    ///
    /// # Errors
    /// `UnknownProvider` if no provider has this id.
    pub fn set_enabled(&mut self, id: &ProviderId, enabled: bool) -> Result<(), RichdadError> {
        self.get_mut(id)?.enabled = enabled;
        Ok(())
    }

    /// Change a provider's tier. Budget counters are unaffected.
    ///
    /// # Errors
    /// `UnknownProvider` if no provider has this id.
    pub fn set_tier(&mut self, id: &ProviderId, tier: Tier) -> Result<(), RichdadError> {
        self.get_mut(id)?.tier = tier;
        Ok(())
    }

    fn count(&self, kind: CapabilityKind) -> usize {
        self.providers.iter().filter(|p| p.kind() == kind).count()
    }

    /// Re-derive dense `1..=N` priorities per kind.
    fn renormalize(&mut self) {
        dense_priorities(&mut self.providers);
    }
}

/// Assign dense per-kind priorities in place, keeping the slice order.
///
/// Within a kind, providers are ranked by current priority; ties (and
/// unranked providers) fall back to slice order.
pub(crate) fn dense_priorities(providers: &mut [ProviderConfig]) {
    for kind in [CapabilityKind::MarketData, CapabilityKind::Ai] {
        let mut idx: Vec<usize> = (0..providers.len())
            .filter(|&i| providers[i].kind() == kind)
            .collect();
        idx.sort_by_key(|&i| (sort_rank(providers[i].priority), i));
        for (rank, i) in idx.into_iter().enumerate() {
            providers[i].priority = u32::try_from(rank + 1).unwrap_or(u32::MAX);
        }
    }
}

/// A registry shared between the settings layer and the orchestrator.
///
/// Cheap to clone; all clones see the same registry. The orchestrator only
/// takes the read lock for the duration of [`ConfigSource::snapshot`].
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<ProviderRegistry>>,
}

impl From<ProviderRegistry> for SharedRegistry {
    fn from(reg: ProviderRegistry) -> Self {
        Self::new(reg)
    }
}

impl SharedRegistry {
    /// Wrap a registry for sharing.
    #[must_use]
    pub fn new(reg: ProviderRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(reg)),
        }
    }

    /// Read access.
    pub fn read(&self) -> RwLockReadGuard<'_, ProviderRegistry> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access.
    pub fn write(&self) -> RwLockWriteGuard<'_, ProviderRegistry> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a mutation under the write lock.
    ///
    /// # Errors
    /// Propagates the error returned by `f`.
    pub fn update<R>(
        &self,
        f: impl FnOnce(&mut ProviderRegistry) -> Result<R, RichdadError>,
    ) -> Result<R, RichdadError> {
        f(&mut self.write())
    }
}

impl ConfigSource for SharedRegistry {
    fn snapshot(&self) -> Vec<ProviderConfig> {
        self.read().snapshot()
    }
}
