//! Notifier interface and in-process implementations.
//!
//! The notifier is the coordinator's only view of the chat platform:
//! - Materializing, updating and removing an entry's display
//! - Re-fetching a display handle that may have gone stale
//! - Announcing formed teams
//!
//! [`LogNotifier`] writes everything to the log and is what the binary runs
//! with until a platform client is plugged in. [`RecordingNotifier`] keeps
//! every call in memory for tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use teamo_id::{DisplayId, LocationId};
use thiserror::Error;
use tracing::{debug, info};

use crate::display::{EntryView, FinishReport};

/// Errors reported by a notifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifierError {
    /// The display was deleted outside the coordinator.
    #[error("display {0} not found")]
    DisplayNotFound(DisplayId),

    /// The platform could not be reached or refused the request.
    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}

/// Handle to an entry's display on the chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayHandle {
    pub location: LocationId,
    pub display_id: DisplayId,
}

/// Chat-platform side effects.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Create the display for a new entry.
    async fn materialize(
        &self,
        location: LocationId,
        view: &EntryView,
    ) -> Result<DisplayHandle, NotifierError>;

    /// Redraw an entry's display.
    async fn update(&self, handle: &DisplayHandle, view: &EntryView) -> Result<(), NotifierError>;

    /// Delete an entry's display.
    async fn remove(&self, handle: &DisplayHandle) -> Result<(), NotifierError>;

    /// Re-fetch the display behind a possibly stale handle.
    async fn sync(&self, handle: &DisplayHandle) -> Result<DisplayHandle, NotifierError>;

    /// Post the result of team formation.
    async fn announce_finish(
        &self,
        location: LocationId,
        report: &FinishReport,
    ) -> Result<(), NotifierError>;
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// =============================================================================
// Log notifier
// =============================================================================

/// Notifier that only logs.
pub struct LogNotifier {
    next_display: AtomicU64,
    live: Mutex<HashSet<DisplayId>>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self {
            next_display: AtomicU64::new(1),
            live: Mutex::new(HashSet::new()),
        }
    }

    /// Treat an existing display as live, e.g. after a restart.
    pub fn adopt(&self, display_id: DisplayId) {
        lock(&self.live).insert(display_id);
        self.next_display
            .fetch_max(display_id.get().saturating_add(1), Ordering::SeqCst);
    }

    fn check_live(&self, display_id: DisplayId) -> Result<(), NotifierError> {
        if lock(&self.live).contains(&display_id) {
            Ok(())
        } else {
            Err(NotifierError::DisplayNotFound(display_id))
        }
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn materialize(
        &self,
        location: LocationId,
        view: &EntryView,
    ) -> Result<DisplayHandle, NotifierError> {
        let display_id = DisplayId::new(self.next_display.fetch_add(1, Ordering::SeqCst));
        lock(&self.live).insert(display_id);

        info!(
            entry_id = %view.entry_id,
            location = %location,
            display_id = %display_id,
            label = %view.label,
            capacity = view.capacity,
            start_time = %view.start_time,
            "[LOG] Display created"
        );

        Ok(DisplayHandle {
            location,
            display_id,
        })
    }

    async fn update(&self, handle: &DisplayHandle, view: &EntryView) -> Result<(), NotifierError> {
        self.check_live(handle.display_id)?;
        debug!(
            entry_id = %view.entry_id,
            display_id = %handle.display_id,
            members = view.members.len(),
            time_left = %view.time_left,
            cancelling = view.cancelling,
            "[LOG] Display updated"
        );
        Ok(())
    }

    async fn remove(&self, handle: &DisplayHandle) -> Result<(), NotifierError> {
        if !lock(&self.live).remove(&handle.display_id) {
            return Err(NotifierError::DisplayNotFound(handle.display_id));
        }
        info!(display_id = %handle.display_id, "[LOG] Display removed");
        Ok(())
    }

    async fn sync(&self, handle: &DisplayHandle) -> Result<DisplayHandle, NotifierError> {
        self.check_live(handle.display_id)?;
        Ok(*handle)
    }

    async fn announce_finish(
        &self,
        location: LocationId,
        report: &FinishReport,
    ) -> Result<(), NotifierError> {
        let body = serde_json::to_string(report)
            .map_err(|e| NotifierError::Unavailable(format!("encode finish report: {e}")))?;
        info!(
            entry_id = %report.entry_id,
            location = %location,
            teams = report.teams().len(),
            report = %body,
            "[LOG] Teams announced"
        );
        Ok(())
    }
}

// =============================================================================
// Recording notifier
// =============================================================================

/// A call made to a [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub enum NotifierCall {
    Materialize {
        location: LocationId,
        view: EntryView,
    },
    Update {
        handle: DisplayHandle,
        view: EntryView,
    },
    Remove {
        handle: DisplayHandle,
    },
    Sync {
        handle: DisplayHandle,
    },
    AnnounceFinish {
        location: LocationId,
        report: FinishReport,
    },
}

/// In-memory notifier that records every call.
///
/// Displays can be dropped behind the coordinator's back with
/// [`RecordingNotifier::drop_display`], and failures can be switched on to
/// exercise error paths. Updates to a display marked with
/// [`RecordingNotifier::stall_update`] never return.
pub struct RecordingNotifier {
    next_display: AtomicU64,
    live: Mutex<HashSet<DisplayId>>,
    calls: Mutex<Vec<NotifierCall>>,
    fail_materialize: Mutex<bool>,
    fail_announce: Mutex<bool>,
    failing_updates: Mutex<HashSet<DisplayId>>,
    stalled_updates: Mutex<HashSet<DisplayId>>,
    announce_delay: Mutex<Option<Duration>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            next_display: AtomicU64::new(1000),
            live: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            fail_materialize: Mutex::new(false),
            fail_announce: Mutex::new(false),
            failing_updates: Mutex::new(HashSet::new()),
            stalled_updates: Mutex::new(HashSet::new()),
            announce_delay: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> Vec<NotifierCall> {
        lock(&self.calls).clone()
    }

    /// Every finish announcement so far.
    pub fn announcements(&self) -> Vec<(LocationId, FinishReport)> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                NotifierCall::AnnounceFinish { location, report } => {
                    Some((*location, report.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Views pushed through `update`, oldest first.
    pub fn updates(&self) -> Vec<EntryView> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                NotifierCall::Update { view, .. } => Some(view.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of `remove` calls.
    pub fn removals(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| matches!(call, NotifierCall::Remove { .. }))
            .count()
    }

    pub fn is_live(&self, display_id: DisplayId) -> bool {
        lock(&self.live).contains(&display_id)
    }

    /// Mark a display as existing, e.g. one created before a restart.
    pub fn adopt(&self, display_id: DisplayId) {
        lock(&self.live).insert(display_id);
    }

    /// Delete a display without telling the coordinator.
    pub fn drop_display(&self, display_id: DisplayId) {
        lock(&self.live).remove(&display_id);
    }

    pub fn fail_materialize(&self, fail: bool) {
        *lock(&self.fail_materialize) = fail;
    }

    pub fn fail_announce(&self, fail: bool) {
        *lock(&self.fail_announce) = fail;
    }

    /// Make updates to one display fail as unavailable.
    pub fn fail_update(&self, display_id: DisplayId, fail: bool) {
        let mut failing = lock(&self.failing_updates);
        if fail {
            failing.insert(display_id);
        } else {
            failing.remove(&display_id);
        }
    }

    pub fn stall_update(&self, display_id: DisplayId) {
        lock(&self.stalled_updates).insert(display_id);
    }

    /// Sleep before each announcement.
    pub fn delay_announce(&self, delay: Option<Duration>) {
        *lock(&self.announce_delay) = delay;
    }

    fn record(&self, call: NotifierCall) {
        lock(&self.calls).push(call);
    }

    fn check_live(&self, display_id: DisplayId) -> Result<(), NotifierError> {
        if self.is_live(display_id) {
            Ok(())
        } else {
            Err(NotifierError::DisplayNotFound(display_id))
        }
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn materialize(
        &self,
        location: LocationId,
        view: &EntryView,
    ) -> Result<DisplayHandle, NotifierError> {
        self.record(NotifierCall::Materialize {
            location,
            view: view.clone(),
        });
        if *lock(&self.fail_materialize) {
            return Err(NotifierError::Unavailable(
                "materialize disabled".to_string(),
            ));
        }

        let display_id = DisplayId::new(self.next_display.fetch_add(1, Ordering::SeqCst));
        self.adopt(display_id);
        Ok(DisplayHandle {
            location,
            display_id,
        })
    }

    async fn update(&self, handle: &DisplayHandle, view: &EntryView) -> Result<(), NotifierError> {
        self.record(NotifierCall::Update {
            handle: *handle,
            view: view.clone(),
        });
        let stalled = lock(&self.stalled_updates).contains(&handle.display_id);
        if stalled {
            std::future::pending::<()>().await;
        }
        if lock(&self.failing_updates).contains(&handle.display_id) {
            return Err(NotifierError::Unavailable("update disabled".to_string()));
        }
        self.check_live(handle.display_id)
    }

    async fn remove(&self, handle: &DisplayHandle) -> Result<(), NotifierError> {
        self.record(NotifierCall::Remove { handle: *handle });
        if lock(&self.live).remove(&handle.display_id) {
            Ok(())
        } else {
            Err(NotifierError::DisplayNotFound(handle.display_id))
        }
    }

    async fn sync(&self, handle: &DisplayHandle) -> Result<DisplayHandle, NotifierError> {
        self.record(NotifierCall::Sync { handle: *handle });
        self.check_live(handle.display_id)?;
        Ok(*handle)
    }

    async fn announce_finish(
        &self,
        location: LocationId,
        report: &FinishReport,
    ) -> Result<(), NotifierError> {
        let delay = *lock(&self.announce_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *lock(&self.fail_announce) {
            return Err(NotifierError::Unavailable("announce disabled".to_string()));
        }
        self.record(NotifierCall::AnnounceFinish {
            location,
            report: report.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entry;
    use chrono::Utc;
    use std::time::Duration;
    use teamo_id::{CommunityId, EntryId};

    fn view() -> EntryView {
        let entry = Entry {
            id: EntryId::new(),
            location: LocationId::new(1),
            community: CommunityId::new(1),
            label: "Test game".to_string(),
            start_time: Utc::now(),
            capacity: 4,
            display_id: None,
            members: vec![],
        };
        EntryView::new(&entry, false, Duration::from_secs(15), Utc::now())
    }

    #[tokio::test]
    async fn test_log_notifier_display_lifecycle() {
        let notifier = LogNotifier::new();
        let handle = notifier
            .materialize(LocationId::new(9), &view())
            .await
            .unwrap();

        notifier.update(&handle, &view()).await.unwrap();
        assert_eq!(notifier.sync(&handle).await.unwrap(), handle);
        notifier.remove(&handle).await.unwrap();

        assert_eq!(
            notifier.update(&handle, &view()).await,
            Err(NotifierError::DisplayNotFound(handle.display_id))
        );
    }

    #[tokio::test]
    async fn test_recording_notifier_dropped_display() {
        let notifier = RecordingNotifier::new();
        let handle = notifier
            .materialize(LocationId::new(9), &view())
            .await
            .unwrap();
        notifier.drop_display(handle.display_id);

        assert_eq!(
            notifier.sync(&handle).await,
            Err(NotifierError::DisplayNotFound(handle.display_id))
        );
        assert_eq!(notifier.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_recording_notifier_failures() {
        let notifier = RecordingNotifier::new();
        notifier.fail_materialize(true);
        let result = notifier.materialize(LocationId::new(9), &view()).await;
        assert!(matches!(result, Err(NotifierError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_recording_notifier_failing_update_is_per_display() {
        let notifier = RecordingNotifier::new();
        let failing = notifier
            .materialize(LocationId::new(9), &view())
            .await
            .unwrap();
        let healthy = notifier
            .materialize(LocationId::new(9), &view())
            .await
            .unwrap();

        notifier.fail_update(failing.display_id, true);
        assert!(matches!(
            notifier.update(&failing, &view()).await,
            Err(NotifierError::Unavailable(_))
        ));
        notifier.update(&healthy, &view()).await.unwrap();

        notifier.fail_update(failing.display_id, false);
        notifier.update(&failing, &view()).await.unwrap();
    }
}
