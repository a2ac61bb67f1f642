//! Periodic sweeps over live entries.
//!
//! The sweeper runs two independent drivers, each in its own task:
//! - Refresh redraws every entry's display so the time left stays current
//! - Finish forms teams for entries whose start time has passed
//!
//! Every tick starts a sweep in its own task, so a sweep that is stuck on
//! one entry never delays the next tick of either driver.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::lifecycle::{Lifecycle, SweepKind};

/// Sweep intervals.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Interval between display refreshes. `None` disables them.
    pub refresh_interval: Option<Duration>,

    /// Interval between finish checks.
    pub finish_interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Some(Duration::from_secs(60)),
            finish_interval: Duration::from_secs(5),
        }
    }
}

impl From<&Config> for SweeperConfig {
    fn from(config: &Config) -> Self {
        Self {
            refresh_interval: config.refresh_interval(),
            finish_interval: config.finish_interval(),
        }
    }
}

/// Drives the refresh and finish sweeps.
pub struct Sweeper {
    lifecycle: Arc<Lifecycle>,
    config: SweeperConfig,
}

impl Sweeper {
    pub fn new(lifecycle: Arc<Lifecycle>, config: SweeperConfig) -> Self {
        Self { lifecycle, config }
    }

    /// Run both drivers until shutdown.
    ///
    /// Returns once both drivers have stopped and the sweeps they had in
    /// progress have completed.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) {
        info!(
            refresh_interval_secs = self.config.refresh_interval.map(|d| d.as_secs()),
            finish_interval_secs = self.config.finish_interval.as_secs(),
            "Starting sweeper"
        );

        let mut drivers = JoinSet::new();
        if let Some(period) = self.config.refresh_interval {
            drivers.spawn(drive(
                Arc::clone(&self.lifecycle),
                SweepKind::Refresh,
                period,
                shutdown.clone(),
            ));
        }
        drivers.spawn(drive(
            Arc::clone(&self.lifecycle),
            SweepKind::Finish,
            self.config.finish_interval,
            shutdown,
        ));

        while let Some(result) = drivers.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Sweep driver panicked");
            }
        }
        info!("Sweeper stopped");
    }
}

async fn drive(
    lifecycle: Arc<Lifecycle>,
    kind: SweepKind,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sweeps = JoinSet::new();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let lifecycle = Arc::clone(&lifecycle);
                sweeps.spawn(async move {
                    let result = match kind {
                        SweepKind::Refresh => lifecycle.refresh_sweep().await,
                        SweepKind::Finish => lifecycle.finish_sweep().await,
                    };
                    if let Err(e) = result {
                        error!(?kind, error = %e, "Sweep failed");
                    }
                });
            }
            Some(done) = sweeps.join_next(), if !sweeps.is_empty() => {
                if let Err(e) = done {
                    error!(?kind, error = %e, "Sweep task panicked");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    debug!(?kind, running = sweeps.len(), "Driver stopping, waiting for sweeps");
    while let Some(done) = sweeps.join_next().await {
        if let Err(e) = done {
            error!(?kind, error = %e, "Sweep task panicked");
        }
    }
}
