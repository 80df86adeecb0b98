//! Per-resource request sequencing.
//!
//! Each `begin` for a resource key issues a strictly increasing sequence id and
//! a fresh [`CancellationToken`], cancelling the token of the request it
//! replaces. Only the most recently begun request for a key is "current"; late
//! completions of older requests are discarded by the caller after checking
//! [`RequestSequencer::is_current`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use richdad_types::ResourceKey;

use crate::cancel::CancellationToken;

/// Turn issued by [`RequestSequencer::begin`].
#[derive(Debug, Clone)]
pub struct RequestHandle {
    /// Resource the request is for.
    pub key: ResourceKey,
    /// Sequence id, unique per key for the lifetime of the sequencer.
    pub sequence: u64,
    /// Cancelled as soon as a newer request for the same key begins.
    pub token: CancellationToken,
}

#[derive(Debug, Default)]
struct Slot {
    last_seq: u64,
    active: Option<CancellationToken>,
}

/// Issues sequence ids and cancellation tokens per resource key.
///
/// A key's slot is kept after its request completes so its sequence ids never
/// repeat. Memory therefore grows with the number of distinct keys seen in a
/// session (symbols, intervals, topics), which stays small for a terminal.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    slots: Mutex<HashMap<ResourceKey, Slot>>,
}

impl RequestSequencer {
    /// Create an empty sequencer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ResourceKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new request for `key`, retiring any outstanding one.
    pub fn begin(&self, key: &ResourceKey) -> RequestHandle {
        let token = CancellationToken::new();
        let mut slots = self.lock();
        let slot = slots.entry(key.clone()).or_default();
        if let Some(prev) = slot.active.replace(token.clone()) {
            #[cfg(feature = "tracing")]
            tracing::debug!(key = %key, superseded = slot.last_seq, "superseding in-flight request");
            prev.cancel();
        }
        slot.last_seq += 1;
        RequestHandle {
            key: key.clone(),
            sequence: slot.last_seq,
            token,
        }
    }

    /// True only if no later `begin` has been issued for `key` since `sequence`.
    #[must_use]
    pub fn is_current(&self, key: &ResourceKey, sequence: u64) -> bool {
        self.lock()
            .get(key)
            .is_some_and(|slot| slot.last_seq == sequence)
    }

    /// Release a finished handle. No-op if the handle is no longer current.
    pub fn complete(&self, handle: &RequestHandle) {
        let mut slots = self.lock();
        if let Some(slot) = slots.get_mut(&handle.key)
            && slot.last_seq == handle.sequence
        {
            slot.active = None;
        }
    }

    /// Cancel the current request for `key` without starting a new one.
    ///
    /// The sequence counter also advances, so a late completion of the
    /// cancelled request is no longer current. Returns `true` if a request was
    /// in flight.
    pub fn cancel(&self, key: &ResourceKey) -> bool {
        let mut slots = self.lock();
        let Some(slot) = slots.get_mut(key) else {
            return false;
        };
        match slot.active.take() {
            Some(token) => {
                token.cancel();
                slot.last_seq += 1;
                true
            }
            None => false,
        }
    }

    /// Number of keys with an outstanding request.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.lock().values().filter(|s| s.active.is_some()).count()
    }

    /// Last sequence id issued for `key`, or 0 if none.
    #[must_use]
    pub fn last_sequence(&self, key: &ResourceKey) -> u64 {
        self.lock().get(key).map_or(0, |s| s.last_seq)
    }
}
