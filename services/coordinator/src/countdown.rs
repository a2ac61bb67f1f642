//! Cancellable one-shot countdowns.
//!
//! A [`CancelCountdown`] resolves exactly once: either the delay elapses and
//! the action runs, or [`CancelCountdown::cancel`] wins first and the action
//! never runs. Both sides race on a single compare-and-swap.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// How a countdown resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Pending,
    Fired,
    Cancelled,
}

impl CountdownState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            PENDING => Self::Pending,
            FIRED => Self::Fired,
            _ => Self::Cancelled,
        }
    }
}

/// Handle to a delayed action.
#[derive(Debug)]
pub struct CancelCountdown {
    state: Arc<AtomicU8>,
    task: JoinHandle<()>,
}

impl CancelCountdown {
    /// Spawn a countdown that runs `on_fire` after `delay` unless cancelled.
    ///
    /// Once fired, `on_fire` runs to completion; cancelling afterwards has no
    /// effect.
    pub fn start<F>(delay: Duration, on_fire: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(PENDING));
        let task_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if task_state
                .compare_exchange(PENDING, FIRED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                on_fire.await;
            }
        });

        Self { state, task }
    }

    /// Cancel the countdown. Returns true if it was still pending.
    pub fn cancel(&self) -> bool {
        let won = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.task.abort();
        }
        won
    }

    pub fn state(&self) -> CountdownState {
        CountdownState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn is_pending(&self) -> bool {
        self.state() == CountdownState::Pending
    }
}
