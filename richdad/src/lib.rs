//! richdad orchestrates data acquisition across interchangeable providers.
//!
//! Overview
//! - Tries the providers of a capability kind (`market-data` or `ai`) in
//!   priority order until one produces a payload.
//! - Skips providers whose call budget (per-minute and per-day windows) is
//!   exhausted, and charges the budget only for the call that succeeded.
//! - Retires older in-flight requests when a newer one for the same resource
//!   key starts, so a late response never overwrites a newer one.
//! - Annotates every payload with its provenance: provider, fetch time, cache
//!   age, freshness and whether the provider is delayed.
//!
//! Key behaviors and trade-offs
//! - Fallback is strictly sequential. A chain never calls two providers at
//!   once for one key, which keeps free-tier quotas intact at the cost of
//!   latency when the primary is slow.
//! - A provider that fails or times out is not retried within the same
//!   acquisition. The next acquisition starts from the top of the chain again.
//! - A provider that answers `rate_limited` has its windows marked full until
//!   they reset (configurable), so later acquisitions skip it without a call.
//! - Budget counters live in memory only; restarting the application resets
//!   daily counters.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use richdad::{Acquisition, CapabilityKind, FetchError, Orchestrator, ResourceKey};
//!
//! let orchestrator = Orchestrator::builder()
//!     .providers(provider_settings)
//!     .build()?;
//!
//! let key = ResourceKey::chart_interval("AAPL", "1d");
//! match orchestrator
//!     .acquire(&key, CapabilityKind::MarketData, |provider, token| {
//!         Some(client.candles(provider, "AAPL", token))
//!     })
//!     .await?
//! {
//!     Acquisition::Completed(result) => store.apply(result),
//!     Acquisition::Superseded { .. } => {} // a newer request owns this key
//! }
//! ```
//!
//! See `richdad/examples/` for a runnable demonstration using mock providers.
#![warn(missing_docs)]

mod chain;
pub(crate) mod core;
mod registry;
mod router;

pub use chain::{BudgetSkip, FallbackChain, Selection};
pub use core::{Orchestrator, OrchestratorBuilder};
pub use registry::{ConfigSource, ProviderRegistry, SharedRegistry};
pub use router::acquire::{Acquisition, BatchOutcome};

// Re-export core types for convenience
pub use richdad_core::{
    Attempt, AttemptOutcome, AttemptTrail, BudgetCheck, BudgetTracker, CancellationToken,
    CapabilityKind, Clock, CredentialRef, DataSourceDescriptor, FetchError, FetchErrorKind,
    FetchResult, FetcherSet, Freshness, FreshnessConfig, FreshnessEvaluator, ManualClock,
    OrchestratorConfig, ProviderCapability, ProviderConfig, ProviderFetcher, ProviderId,
    RequestHandle, RequestSequencer, ResourceKey, ResourceType, RichdadError, SystemClock, Tier,
    UsageSnapshot, WindowKind, WindowLimit, WindowRemaining, WindowSnapshot,
};
