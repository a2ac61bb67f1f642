//! Teamo coordinator
//!
//! Runs the entry lifecycle against a SQLite store. Until a chat-platform
//! client is wired in, displays and announcements go to the log.
//!
//! ## Architecture
//!
//! - **Restore**: rebuilds runtime state for entries that survived a restart
//! - **Sweeper**: refreshes displays and finishes entries on a timer

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use teamo_coordinator::{
    Config, EntryStore, Lifecycle, LogNotifier, SqliteStore, Sweeper, SweeperConfig,
};

/// How long running sweeps get to complete after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str())),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!(
        database = %config.database_path,
        refresh_interval_secs = config.refresh_interval_secs,
        finish_interval_secs = config.finish_interval_secs,
        "Starting teamo coordinator"
    );

    if let Some(parent) = Path::new(&config.database_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let store = Arc::new(
        SqliteStore::open(&config.database_path)
            .with_context(|| format!("failed to open database {}", config.database_path))?,
    );

    // Displays from a previous run are unknown to the log notifier, so adopt them.
    let notifier = Arc::new(LogNotifier::new());
    for entry in store.list_entries().await? {
        if let Some(display_id) = entry.display_id {
            notifier.adopt(display_id);
        }
    }

    let lifecycle = Arc::new(Lifecycle::new(store, notifier));
    let restored = lifecycle.restore().await?;
    info!(
        restored = restored.restored,
        removed = restored.removed,
        "Startup reconciliation complete"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = Sweeper::new(Arc::clone(&lifecycle), SweeperConfig::from(&config));
    let mut sweeper_handle = tokio::spawn({
        let shutdown_rx = shutdown_rx.clone();
        async move {
            sweeper.run(shutdown_rx).await;
        }
    });

    let sweeper_running = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            true
        }
        result = &mut sweeper_handle => {
            if let Err(e) = result {
                error!(error = %e, "Sweeper task panicked");
            }
            false
        }
    };

    let _ = shutdown_tx.send(true);

    if sweeper_running {
        info!("Waiting for running sweeps to complete...");
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut sweeper_handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Sweeper task panicked"),
            Err(_) => {
                warn!(
                    grace_secs = SHUTDOWN_GRACE.as_secs(),
                    "Sweeps still running after grace period, aborting"
                );
                sweeper_handle.abort();
            }
        }
    }

    info!("Coordinator shutdown complete");
    Ok(())
}
