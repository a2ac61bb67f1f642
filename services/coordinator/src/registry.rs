//! In-memory registry of live entries.
//!
//! Each live entry has a [`RuntimeState`] holding:
//! - The per-entry lock that serializes every read and write of its members
//! - The cached display handle (inside the lock)
//! - The optional cancellation countdown

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use teamo_id::EntryId;
use thiserror::Error;
use tokio::sync::{MutexGuard, OwnedMutexGuard, RwLock};
use tracing::debug;

use crate::countdown::CancelCountdown;
use crate::notifier::DisplayHandle;

/// Errors from registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("entry {0} is already registered")]
    AlreadyRegistered(EntryId),
}

/// State guarded by the entry lock.
#[derive(Debug, Default)]
pub struct EntrySlot {
    pub display: Option<DisplayHandle>,
    /// Set when the entry has been torn down. Anyone who waited on the lock
    /// must treat the entry as gone.
    pub closed: bool,
}

/// Runtime state of one live entry.
#[derive(Debug)]
pub struct RuntimeState {
    id: EntryId,
    slot: Arc<tokio::sync::Mutex<EntrySlot>>,
    countdown: Mutex<Option<CancelCountdown>>,
}

impl RuntimeState {
    fn new(id: EntryId) -> Self {
        Self {
            id,
            slot: Arc::new(tokio::sync::Mutex::new(EntrySlot::default())),
            countdown: Mutex::new(None),
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Acquire the entry lock. Waiters are served in FIFO order.
    pub async fn lock(&self) -> MutexGuard<'_, EntrySlot> {
        self.slot.lock().await
    }

    /// Acquire the entry lock without waiting.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, EntrySlot>> {
        self.slot.try_lock().ok()
    }

    fn countdown(&self) -> std::sync::MutexGuard<'_, Option<CancelCountdown>> {
        self.countdown
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// True while a cancellation countdown is pending.
    pub fn is_cancelling(&self) -> bool {
        self.countdown()
            .as_ref()
            .is_some_and(CancelCountdown::is_pending)
    }

    /// Store a countdown built by `start`, unless one is already pending.
    ///
    /// A countdown that already fired or was cancelled is replaced. Returns
    /// false, without calling `start`, if one is pending.
    pub fn install_countdown<F>(&self, start: F) -> bool
    where
        F: FnOnce() -> CancelCountdown,
    {
        let mut slot = self.countdown();
        if slot.as_ref().is_some_and(CancelCountdown::is_pending) {
            return false;
        }
        *slot = Some(start());
        true
    }

    /// Cancel and clear the countdown. Returns true if one was pending.
    pub fn cancel_countdown(&self) -> bool {
        match self.countdown().take() {
            Some(countdown) => countdown.cancel(),
            None => false,
        }
    }
}

/// Map of live entries.
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<HashMap<EntryId, Arc<RuntimeState>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create fresh runtime state for an entry.
    ///
    /// The state is published with its entry lock already held by the
    /// returned guard, so nobody else can act on the entry until the caller
    /// has finished setting it up.
    pub async fn register(
        &self,
        id: EntryId,
    ) -> Result<(Arc<RuntimeState>, OwnedMutexGuard<EntrySlot>), RegistryError> {
        let state = Arc::new(RuntimeState::new(id));
        let slot = Arc::clone(&state.slot).lock_owned().await;

        let mut entries = self.entries.write().await;
        if entries.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        entries.insert(id, Arc::clone(&state));
        debug!(entry_id = %id, "Entry registered");
        Ok((state, slot))
    }

    pub async fn get(&self, id: EntryId) -> Option<Arc<RuntimeState>> {
        self.entries.read().await.get(&id).cloned()
    }

    /// Drop an entry's runtime state. Callers hold the entry lock.
    pub async fn unregister(&self, id: EntryId) -> Option<Arc<RuntimeState>> {
        let removed = self.entries.write().await.remove(&id);
        if removed.is_some() {
            debug!(entry_id = %id, "Entry unregistered");
        }
        removed
    }

    /// Snapshot of live entry ids.
    pub async fn all_ids(&self) -> Vec<EntryId> {
        self.entries.read().await.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
