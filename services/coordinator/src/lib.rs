//! # teamo-coordinator
//!
//! Coordinates time-boxed sign-up entries. An entry opens, participants
//! register with a party size, the entry can be cancelled, and once its start
//! time passes the registered parties are split into teams.
//!
//! ## Architecture
//!
//! - **Lifecycle**: registration, membership changes, cancellation and
//!   finishing, each under the entry's own lock
//! - **Registry**: in-memory runtime state per live entry
//! - **Sweeper**: periodic display refresh and finish checks
//! - **Store**: durable entries, members and community settings (SQLite)
//! - **Notifier**: the chat platform, seen only through a trait
//!
//! Team formation itself lives in `teamo-teams`.

pub mod config;
pub mod countdown;
pub mod display;
pub mod lifecycle;
pub mod model;
pub mod notifier;
pub mod registry;
pub mod settings;
pub mod signals;
pub mod store;
pub mod sweeper;

pub use config::Config;
pub use display::{EntryView, FinishOutcome, FinishReport, FinishedTeam};
pub use lifecycle::{
    EntryRef, Lifecycle, LifecycleError, RestoreReport, SignalOutcome, SweepKind, SweepReport,
};
pub use model::{Entry, Member, MembershipChange, MembershipOutcome, NewEntry};
pub use notifier::{DisplayHandle, LogNotifier, Notifier, NotifierError, RecordingNotifier};
pub use registry::{Registry, RegistryError};
pub use settings::{SettingKey, Settings, SettingsError};
pub use signals::{reaction_choices, Reaction, ReactionEvent, Signal};
pub use store::{EntryStore, SqliteStore, StoreError};
pub use sweeper::{Sweeper, SweeperConfig};
