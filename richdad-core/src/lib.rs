//! richdad-core
//!
//! Synchronous building blocks of the richdad acquisition layer.
//!
//! - `budget`: per-provider call budgets over epoch-aligned windows.
//! - `freshness`: age and delay classification of fetched payloads.
//! - `sequencer`: per-resource sequence ids and cancellation tokens.
//! - `fetcher`: the `ProviderFetcher` trait implemented by provider adapters.
//!
//! Async runtime (Tokio)
//! ---------------------
//! Nothing in this crate spawns tasks. The only Tokio coupling is
//! `CancellationToken`, which is backed by `tokio::sync::watch` so fetchers can
//! `select!` on [`CancellationToken::cancelled`].
//!
//! Every component reads time through the [`Clock`] trait; inject a
//! [`ManualClock`] to cross window boundaries in tests.
#![warn(missing_docs)]

/// Per-provider call budgets.
pub mod budget;
/// Cooperative cancellation token.
pub mod cancel;
/// Wall-clock abstraction.
pub mod clock;
/// Provider fetcher trait and registry.
pub mod fetcher;
/// Payload freshness classification.
pub mod freshness;
/// Per-resource request sequencing.
pub mod sequencer;

pub use budget::{BudgetCheck, BudgetTracker, UsageSnapshot, WindowRemaining, WindowSnapshot};
pub use cancel::CancellationToken;
pub use clock::{Clock, ManualClock, SystemClock};
pub use fetcher::{FetcherSet, ProviderFetcher};
pub use freshness::{Freshness, FreshnessEvaluator};
pub use sequencer::{RequestHandle, RequestSequencer};

pub use richdad_types::*;
