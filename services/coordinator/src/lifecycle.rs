//! Entry lifecycle manager.
//!
//! Every operation that reads or writes an entry's members, or decides
//! whether the entry still exists, does so while holding that entry's lock
//! from the [`Registry`]. Operations on different entries never wait on each
//! other.
//!
//! An entry moves through:
//! - `Open`: accepting membership changes
//! - `Cancelling`: a countdown is pending; membership changes still apply
//! - `Deleted`: finished, cancelled, or its display disappeared

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use teamo_id::{CommunityId, EntryId, ParticipantId};
use teamo_teams::form_teams;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::countdown::CancelCountdown;
use crate::display::{EntryView, FinishReport};
use crate::model::{Entry, Member, MembershipChange, MembershipOutcome, NewEntry};
use crate::notifier::{DisplayHandle, Notifier, NotifierError};
use crate::registry::{EntrySlot, Registry, RegistryError, RuntimeState};
use crate::settings::Settings;
use crate::signals::Signal;
use crate::store::{EntryStore, StoreError};

/// Smallest team capacity an entry may have.
pub const MIN_CAPACITY: u32 = 2;

/// Errors from lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("notifier error: {0}")]
    Notifier(#[from] NotifierError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("entry {0} already has a pending cancellation")]
    CancelAlreadyPending(EntryId),

    #[error("entry {0} not found")]
    EntryNotFound(EntryId),

    #[error("capacity must be at least {MIN_CAPACITY}, got {0}")]
    InvalidCapacity(u32),
}

/// Which entry a display refresh is for.
#[derive(Debug, Clone)]
pub enum EntryRef {
    /// Load the entry from the store.
    Id(EntryId),
    /// Entry already loaded under the entry lock.
    Loaded(Entry),
}

impl EntryRef {
    fn id(&self) -> EntryId {
        match self {
            Self::Id(id) => *id,
            Self::Loaded(entry) => entry.id,
        }
    }
}

/// Counters from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries looked at.
    pub processed: usize,
    /// Entries deleted during the sweep.
    pub removed: usize,
    /// Entries whose processing failed; they are retried next sweep.
    pub failed: usize,
    /// Entries left alone, such as ones without runtime state or ones an
    /// earlier sweep is still working on.
    pub skipped: usize,
}

/// The two periodic sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SweepKind {
    Refresh,
    Finish,
}

/// What a sweep did to one entry.
enum Step {
    Kept,
    Removed,
    Skipped,
}

type Claims = Arc<Mutex<HashSet<(SweepKind, EntryId)>>>;

/// Marks a sweep step as running for one entry until dropped.
struct SweepClaim {
    claims: Claims,
    key: (SweepKind, EntryId),
}

impl Drop for SweepClaim {
    fn drop(&mut self) {
        lock(&self.claims).remove(&self.key);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Result of startup reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    /// Stored entries dropped because their display is gone.
    pub removed: usize,
}

/// What a dispatched signal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    Membership(MembershipOutcome),
    /// Whether a countdown was started.
    CancelStarted(bool),
    /// Whether a pending countdown was aborted.
    CancelAborted(bool),
    /// Whether the entry was deleted.
    Removed(bool),
}

/// Coordinates entries, their displays and their cancellation countdowns.
pub struct Lifecycle {
    store: Arc<dyn EntryStore>,
    notifier: Arc<dyn Notifier>,
    registry: Registry,
    rng: Mutex<StdRng>,
    in_flight: Claims,
}

impl Lifecycle {
    pub fn new(store: Arc<dyn EntryStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_rng(store, notifier, StdRng::from_os_rng())
    }

    /// Use a specific RNG for team names.
    pub fn with_rng(store: Arc<dyn EntryStore>, notifier: Arc<dyn Notifier>, rng: StdRng) -> Self {
        Self {
            store,
            notifier,
            registry: Registry::new(),
            rng: Mutex::new(rng),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn EntryStore> {
        &self.store
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        lock(&self.rng)
    }

    /// Current state of a live entry.
    pub async fn entry(&self, entry_id: EntryId) -> Result<Entry, LifecycleError> {
        let state = self
            .registry
            .get(entry_id)
            .await
            .ok_or(LifecycleError::EntryNotFound(entry_id))?;
        let slot = state.lock().await;
        if slot.closed {
            return Err(LifecycleError::EntryNotFound(entry_id));
        }
        self.store
            .get_entry(entry_id)
            .await?
            .ok_or(LifecycleError::EntryNotFound(entry_id))
    }

    /// True while the entry has a pending cancellation countdown.
    pub async fn is_cancelling(&self, entry_id: EntryId) -> bool {
        match self.registry.get(entry_id).await {
            Some(state) => state.is_cancelling(),
            None => false,
        }
    }

    /// Settings for a community, inserting the defaults if it has none.
    pub async fn ensure_settings(&self, community: CommunityId) -> Result<Settings, StoreError> {
        if let Some(settings) = self.store.get_settings(community).await? {
            return Ok(settings);
        }
        let settings = Settings::default();
        self.store.insert_settings(community, &settings).await?;
        debug!(community = %community, "Inserted default settings");
        Ok(settings)
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Open a new entry and materialize its display.
    ///
    /// The display goes to the community's waiting location if one is set. If
    /// the display cannot be created the entry is rolled back.
    #[instrument(skip(self, new), fields(community = %new.community))]
    pub async fn register_entry(&self, new: NewEntry) -> Result<Entry, LifecycleError> {
        if new.capacity < MIN_CAPACITY {
            return Err(LifecycleError::InvalidCapacity(new.capacity));
        }

        let settings = self.store.settings_or_default(new.community).await?;
        let mut entry = Entry {
            id: EntryId::new(),
            location: settings.waiting_location.unwrap_or(new.location),
            community: new.community,
            label: new.label,
            start_time: new.start_time,
            capacity: new.capacity,
            display_id: None,
            members: Vec::new(),
        };

        // The entry lock is held from the moment the entry becomes visible.
        let (state, mut slot) = self.registry.register(entry.id).await?;
        if let Err(e) = self.store.insert_entry(&entry).await {
            slot.closed = true;
            self.registry.unregister(entry.id).await;
            return Err(e.into());
        }

        let view = EntryView::new(&entry, false, settings.cancel_delay(), Utc::now());
        let handle = match self.notifier.materialize(entry.location, &view).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(entry_id = %entry.id, error = %e, "Failed to materialize display, rolling back");
                self.rollback(&state, &mut slot).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.store.set_display(entry.id, handle.display_id).await {
            warn!(entry_id = %entry.id, error = %e, "Failed to record display, rolling back");
            if let Err(remove_err) = self.notifier.remove(&handle).await {
                warn!(entry_id = %entry.id, error = %remove_err, "Failed to remove display");
            }
            self.rollback(&state, &mut slot).await;
            return Err(e.into());
        }

        slot.display = Some(handle);
        entry.display_id = Some(handle.display_id);

        info!(
            entry_id = %entry.id,
            location = %entry.location,
            display_id = %handle.display_id,
            capacity = entry.capacity,
            start_time = %entry.start_time,
            "Entry opened"
        );
        Ok(entry)
    }

    async fn rollback(&self, state: &RuntimeState, slot: &mut EntrySlot) {
        self.discard_row(state.id()).await;
        slot.closed = true;
        self.registry.unregister(state.id()).await;
    }

    async fn discard_row(&self, entry_id: EntryId) {
        if let Err(e) = self.store.delete_entry(entry_id).await {
            error!(entry_id = %entry_id, error = %e, "Failed to delete entry during rollback");
        }
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Register, resize or withdraw a participant.
    ///
    /// Changes to one entry are applied strictly one at a time. A refresh
    /// failure after the change is logged; the change itself stands.
    pub async fn apply_membership_change(
        &self,
        entry_id: EntryId,
        participant: ParticipantId,
        change: MembershipChange,
    ) -> Result<MembershipOutcome, LifecycleError> {
        let Some(state) = self.registry.get(entry_id).await else {
            return Ok(MembershipOutcome::EntryGone);
        };
        let mut slot = state.lock().await;
        if slot.closed {
            return Ok(MembershipOutcome::EntryGone);
        }

        let current = self.store.get_member(entry_id, participant).await?;
        let outcome = match change {
            MembershipChange::SetPartySize(party_size) => match current {
                Some(member) if member.party_size == party_size => {
                    MembershipOutcome::Unchanged { party_size }
                }
                _ => {
                    let member = Member::new(participant, party_size);
                    match self.store.upsert_member(entry_id, member).await? {
                        Some(previous) => MembershipOutcome::Resized { previous },
                        None => MembershipOutcome::Joined,
                    }
                }
            },
            MembershipChange::Withdraw { party_size } => match current {
                Some(member) if party_size.is_none_or(|size| size == member.party_size) => {
                    self.store.delete_member(entry_id, participant).await?;
                    MembershipOutcome::Withdrawn {
                        previous: member.party_size,
                    }
                }
                _ => MembershipOutcome::NotRegistered,
            },
        };

        debug!(
            entry_id = %entry_id,
            participant = %participant,
            outcome = ?outcome,
            "Membership change applied"
        );

        if outcome.is_change() {
            if let Err(e) = self
                .refresh_locked(&state, &mut slot, EntryRef::Id(entry_id))
                .await
            {
                warn!(entry_id = %entry_id, error = %e, "Failed to refresh display after membership change");
            }
        }
        Ok(outcome)
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    /// Start the cancellation countdown.
    ///
    /// Returns false if the entry no longer exists. Fails with
    /// [`LifecycleError::CancelAlreadyPending`] if a countdown is running.
    pub async fn begin_cancel(self: &Arc<Self>, entry_id: EntryId) -> Result<bool, LifecycleError> {
        let Some(state) = self.registry.get(entry_id).await else {
            return Ok(false);
        };
        let mut slot = state.lock().await;
        if slot.closed {
            return Ok(false);
        }
        let Some(entry) = self.store.get_entry(entry_id).await? else {
            self.teardown(&state, &mut slot).await?;
            return Ok(false);
        };

        let delay = self.store.settings_or_default(entry.community).await?.cancel_delay();
        let lifecycle = Arc::clone(self);
        let started = state.install_countdown(|| {
            CancelCountdown::start(delay, async move {
                if let Err(e) = lifecycle.finalize_cancel(entry_id).await {
                    error!(entry_id = %entry_id, error = %e, "Failed to finalize cancellation");
                }
            })
        });
        if !started {
            return Err(LifecycleError::CancelAlreadyPending(entry_id));
        }

        info!(entry_id = %entry_id, delay_secs = delay.as_secs(), "Cancellation countdown started");
        if let Err(e) = self
            .refresh_locked(&state, &mut slot, EntryRef::Loaded(entry))
            .await
        {
            warn!(entry_id = %entry_id, error = %e, "Failed to show cancellation banner");
        }
        Ok(true)
    }

    /// Stop a pending cancellation countdown. Returns false if none was
    /// pending, including when it already fired.
    pub async fn abort_cancel(&self, entry_id: EntryId) -> Result<bool, LifecycleError> {
        let Some(state) = self.registry.get(entry_id).await else {
            return Ok(false);
        };
        if !state.cancel_countdown() {
            return Ok(false);
        }
        info!(entry_id = %entry_id, "Cancellation aborted");

        let mut slot = state.lock().await;
        if !slot.closed {
            if let Err(e) = self
                .refresh_locked(&state, &mut slot, EntryRef::Id(entry_id))
                .await
            {
                warn!(entry_id = %entry_id, error = %e, "Failed to refresh display after abort");
            }
        }
        Ok(true)
    }

    /// Delete a cancelled entry. Runs when the countdown fires.
    pub async fn finalize_cancel(&self, entry_id: EntryId) -> Result<bool, LifecycleError> {
        let Some(state) = self.registry.get(entry_id).await else {
            return Ok(false);
        };
        let mut slot = state.lock().await;
        if slot.closed {
            return Ok(false);
        }
        self.teardown(&state, &mut slot).await?;
        info!(entry_id = %entry_id, "Entry cancelled");
        Ok(true)
    }

    // =========================================================================
    // Displays
    // =========================================================================

    /// Redraw an entry's display.
    ///
    /// Returns false if the entry is gone, including when the display turned
    /// out to be deleted and the entry was removed as a result.
    pub async fn refresh_display(&self, entry: EntryRef) -> Result<bool, LifecycleError> {
        let Some(state) = self.registry.get(entry.id()).await else {
            return Ok(false);
        };
        let mut slot = state.lock().await;
        if slot.closed {
            return Ok(false);
        }
        self.refresh_locked(&state, &mut slot, entry).await
    }

    async fn refresh_locked(
        &self,
        state: &RuntimeState,
        slot: &mut EntrySlot,
        entry: EntryRef,
    ) -> Result<bool, LifecycleError> {
        let entry = match entry {
            EntryRef::Loaded(entry) => entry,
            EntryRef::Id(id) => match self.store.get_entry(id).await? {
                Some(entry) => entry,
                None => {
                    self.teardown(state, slot).await?;
                    return Ok(false);
                }
            },
        };
        let Some(handle) = slot.display else {
            return Ok(true);
        };

        let settings = self.store.settings_or_default(entry.community).await?;
        let view = EntryView::new(
            &entry,
            state.is_cancelling(),
            settings.cancel_delay(),
            Utc::now(),
        );

        match self.notifier.update(&handle, &view).await {
            Ok(()) => Ok(true),
            Err(NotifierError::DisplayNotFound(display_id)) => {
                info!(entry_id = %entry.id, display_id = %display_id, "Display gone, removing entry");
                slot.display = None;
                self.teardown(state, slot).await?;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Re-fetch the cached display handle.
    ///
    /// Returns the current handle, or `None` if the entry is gone. A display
    /// that no longer exists removes the entry.
    pub async fn sync_display(
        &self,
        entry_id: EntryId,
    ) -> Result<Option<DisplayHandle>, LifecycleError> {
        let Some(state) = self.registry.get(entry_id).await else {
            return Ok(None);
        };
        let mut slot = state.lock().await;
        if slot.closed {
            return Ok(None);
        }
        let Some(handle) = slot.display else {
            return Ok(None);
        };

        match self.notifier.sync(&handle).await {
            Ok(synced) => {
                if synced.display_id != handle.display_id {
                    self.store.set_display(entry_id, synced.display_id).await?;
                }
                slot.display = Some(synced);
                Ok(Some(synced))
            }
            Err(NotifierError::DisplayNotFound(_)) => {
                slot.display = None;
                self.teardown(&state, &mut slot).await?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The display was deleted outside the coordinator. Removes the entry
    /// immediately, cancelling any pending countdown.
    pub async fn display_deleted(&self, entry_id: EntryId) -> Result<bool, LifecycleError> {
        let Some(state) = self.registry.get(entry_id).await else {
            return Ok(false);
        };
        let mut slot = state.lock().await;
        if slot.closed {
            return Ok(false);
        }
        slot.display = None;
        self.teardown(&state, &mut slot).await?;
        info!(entry_id = %entry_id, "Entry removed after its display was deleted");
        Ok(true)
    }

    /// Delete the entry everywhere. Caller holds the entry lock.
    async fn teardown(&self, state: &RuntimeState, slot: &mut EntrySlot) -> Result<(), LifecycleError> {
        let entry_id = state.id();
        self.store.delete_entry(entry_id).await?;

        if let Some(handle) = slot.display.take() {
            match self.notifier.remove(&handle).await {
                Ok(()) | Err(NotifierError::DisplayNotFound(_)) => {}
                Err(e) => {
                    warn!(entry_id = %entry_id, display_id = %handle.display_id, error = %e, "Failed to remove display");
                }
            }
        }

        slot.closed = true;
        state.cancel_countdown();
        self.registry.unregister(entry_id).await;
        debug!(entry_id = %entry_id, "Entry torn down");
        Ok(())
    }

    // =========================================================================
    // Sweeps
    // =========================================================================

    /// Redraw every stored entry.
    #[instrument(skip(self))]
    pub async fn refresh_sweep(self: &Arc<Self>) -> Result<SweepReport, LifecycleError> {
        let ids: Vec<EntryId> = self
            .store
            .list_entries()
            .await?
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        let report = self.sweep(SweepKind::Refresh, ids, Utc::now()).await;

        if report.removed > 0 || report.failed > 0 {
            info!(
                processed = report.processed,
                removed = report.removed,
                failed = report.failed,
                skipped = report.skipped,
                "Refresh sweep completed"
            );
        }
        Ok(report)
    }

    /// Form teams for every entry whose start time has passed.
    pub async fn finish_sweep(self: &Arc<Self>) -> Result<SweepReport, LifecycleError> {
        self.finish_due(Utc::now()).await
    }

    /// Form teams for every entry due at `now`.
    #[instrument(skip(self))]
    pub async fn finish_due(
        self: &Arc<Self>,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, LifecycleError> {
        let due: Vec<EntryId> = self
            .store
            .list_entries()
            .await?
            .into_iter()
            .filter(|entry| entry.is_due(now))
            .map(|entry| entry.id)
            .collect();
        let report = self.sweep(SweepKind::Finish, due, now).await;

        if report.processed > 0 {
            info!(
                processed = report.processed,
                finished = report.removed,
                failed = report.failed,
                skipped = report.skipped,
                "Finish sweep completed"
            );
        }
        Ok(report)
    }

    /// Run one step per entry, each in its own task.
    ///
    /// An entry whose step from an earlier sweep of the same kind has not
    /// returned yet is skipped, so a stalled notifier call only holds up the
    /// entry it belongs to.
    async fn sweep(
        self: &Arc<Self>,
        kind: SweepKind,
        ids: Vec<EntryId>,
        now: DateTime<Utc>,
    ) -> SweepReport {
        let mut report = SweepReport::default();
        let mut steps = JoinSet::new();

        for entry_id in ids {
            report.processed += 1;
            let Some(claim) = self.claim(kind, entry_id) else {
                debug!(entry_id = %entry_id, ?kind, "Entry still busy from an earlier sweep");
                report.skipped += 1;
                continue;
            };
            let lifecycle = Arc::clone(self);
            steps.spawn(async move {
                let _claim = claim;
                let result = match kind {
                    SweepKind::Refresh => lifecycle.refresh_step(entry_id).await,
                    SweepKind::Finish => lifecycle.finish_entry(entry_id, now).await,
                };
                (entry_id, result)
            });
        }

        while let Some(joined) = steps.join_next().await {
            match joined {
                Ok((_, Ok(Step::Kept))) => {}
                Ok((_, Ok(Step::Removed))) => report.removed += 1,
                Ok((_, Ok(Step::Skipped))) => report.skipped += 1,
                Ok((entry_id, Err(e))) => {
                    report.failed += 1;
                    warn!(entry_id = %entry_id, ?kind, error = %e, "Sweep step failed");
                }
                Err(e) => {
                    report.failed += 1;
                    error!(?kind, error = %e, "Sweep task panicked");
                }
            }
        }
        report
    }

    fn claim(&self, kind: SweepKind, entry_id: EntryId) -> Option<SweepClaim> {
        let key = (kind, entry_id);
        lock(&self.in_flight).insert(key).then(|| SweepClaim {
            claims: Arc::clone(&self.in_flight),
            key,
        })
    }

    async fn refresh_step(&self, entry_id: EntryId) -> Result<Step, LifecycleError> {
        let Some(state) = self.registry.get(entry_id).await else {
            debug!(entry_id = %entry_id, "Skipping untracked entry");
            return Ok(Step::Skipped);
        };
        let mut slot = state.lock().await;
        if slot.closed {
            return Ok(Step::Skipped);
        }
        if self
            .refresh_locked(&state, &mut slot, EntryRef::Id(entry_id))
            .await?
        {
            Ok(Step::Kept)
        } else {
            Ok(Step::Removed)
        }
    }

    async fn finish_entry(&self, entry_id: EntryId, now: DateTime<Utc>) -> Result<Step, LifecycleError> {
        let Some(state) = self.registry.get(entry_id).await else {
            debug!(entry_id = %entry_id, "Skipping untracked entry");
            return Ok(Step::Skipped);
        };
        let mut slot = state.lock().await;
        if slot.closed {
            return Ok(Step::Skipped);
        }
        let Some(entry) = self.store.get_entry(entry_id).await? else {
            self.teardown(&state, &mut slot).await?;
            return Ok(Step::Removed);
        };
        if !entry.is_due(now) {
            return Ok(Step::Skipped);
        }

        let settings = self.store.settings_or_default(entry.community).await?;
        let teams = form_teams(&entry.members, entry.capacity);
        let report = {
            let mut rng = self.rng();
            FinishReport::new(&entry, teams, settings.end_delete_after(), &mut *rng)
        };
        let target = settings.end_location.unwrap_or(entry.location);

        // The entry stays if the announcement fails so the next sweep retries.
        self.notifier.announce_finish(target, &report).await?;
        self.teardown(&state, &mut slot).await?;

        info!(
            entry_id = %entry_id,
            location = %target,
            teams = report.teams().len(),
            players = entry.player_count(),
            "Entry finished"
        );
        Ok(Step::Removed)
    }

    // =========================================================================
    // Startup and dispatch
    // =========================================================================

    /// Rebuild runtime state from the store.
    ///
    /// Entries whose display no longer exists are deleted in one batch. Every
    /// community with a stored entry gets a settings row.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<RestoreReport, LifecycleError> {
        let mut report = RestoreReport::default();
        let mut stale = Vec::new();
        let mut communities = BTreeSet::new();

        for entry in self.store.list_entries().await? {
            communities.insert(entry.community);
            let Some(display_id) = entry.display_id else {
                stale.push(entry.id);
                continue;
            };

            let stored = DisplayHandle {
                location: entry.location,
                display_id,
            };
            let handle = match self.notifier.sync(&stored).await {
                Ok(synced) => {
                    if synced.display_id != display_id {
                        self.store.set_display(entry.id, synced.display_id).await?;
                    }
                    synced
                }
                Err(NotifierError::DisplayNotFound(_)) => {
                    stale.push(entry.id);
                    continue;
                }
                Err(e) => {
                    warn!(entry_id = %entry.id, error = %e, "Could not sync display, keeping stored handle");
                    stored
                }
            };

            let (_, mut slot) = self.registry.register(entry.id).await?;
            slot.display = Some(handle);
            report.restored += 1;
        }

        if !stale.is_empty() {
            self.store.delete_entries(&stale).await?;
            report.removed = stale.len();
        }

        for community in communities {
            self.ensure_settings(community).await?;
        }

        info!(
            restored = report.restored,
            removed = report.removed,
            "Entries restored"
        );
        Ok(report)
    }

    /// Apply an external signal.
    pub async fn dispatch(self: &Arc<Self>, signal: Signal) -> Result<SignalOutcome, LifecycleError> {
        match signal {
            Signal::PartySize {
                entry_id,
                participant,
                party_size,
            } => self
                .apply_membership_change(
                    entry_id,
                    participant,
                    MembershipChange::SetPartySize(party_size),
                )
                .await
                .map(SignalOutcome::Membership),
            Signal::Withdraw {
                entry_id,
                participant,
                party_size,
            } => self
                .apply_membership_change(
                    entry_id,
                    participant,
                    MembershipChange::Withdraw { party_size },
                )
                .await
                .map(SignalOutcome::Membership),
            Signal::CancelRequested { entry_id } => {
                self.begin_cancel(entry_id).await.map(SignalOutcome::CancelStarted)
            }
            Signal::CancelRetracted { entry_id } => {
                self.abort_cancel(entry_id).await.map(SignalOutcome::CancelAborted)
            }
            Signal::DisplayDeleted { entry_id } => {
                self.display_deleted(entry_id).await.map(SignalOutcome::Removed)
            }
        }
    }
}
