//! Durable storage for entries, members and community settings.
//!
//! The lifecycle manager only talks to the [`EntryStore`] trait. The SQLite
//! implementation lets the coordinator recover live entries after a restart.

mod sqlite;

use async_trait::async_trait;
use teamo_id::{CommunityId, DisplayId, EntryId, ParticipantId};
use thiserror::Error;

use crate::model::{Entry, Member};
use crate::settings::{SettingKey, Settings, SettingsError};

pub use sqlite::SqliteStore;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    Invalid(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Durable CRUD for entries, members and settings.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Get an entry with its members in registration order.
    async fn get_entry(&self, id: EntryId) -> Result<Option<Entry>, StoreError>;

    /// Insert a new entry together with any members it already has.
    async fn insert_entry(&self, entry: &Entry) -> Result<(), StoreError>;

    /// Record the display that represents an entry.
    async fn set_display(&self, id: EntryId, display: DisplayId) -> Result<(), StoreError>;

    /// Delete an entry and its members. Deleting a missing entry is a no-op.
    async fn delete_entry(&self, id: EntryId) -> Result<(), StoreError>;

    async fn delete_entries(&self, ids: &[EntryId]) -> Result<(), StoreError>;

    /// All entries, oldest first.
    async fn list_entries(&self) -> Result<Vec<Entry>, StoreError>;

    async fn get_member(
        &self,
        entry_id: EntryId,
        participant_id: ParticipantId,
    ) -> Result<Option<Member>, StoreError>;

    /// Insert a member or update its party size. Returns the previous party
    /// size if the participant was already registered.
    async fn upsert_member(
        &self,
        entry_id: EntryId,
        member: Member,
    ) -> Result<Option<u32>, StoreError>;

    async fn delete_member(
        &self,
        entry_id: EntryId,
        participant_id: ParticipantId,
    ) -> Result<(), StoreError>;

    /// Settings for a community, or `None` if it has no row yet.
    async fn get_settings(&self, community: CommunityId)
        -> Result<Option<Settings>, StoreError>;

    async fn insert_settings(
        &self,
        community: CommunityId,
        settings: &Settings,
    ) -> Result<(), StoreError>;

    /// Change one setting, creating the community's row with defaults first
    /// if needed.
    async fn set_setting(
        &self,
        community: CommunityId,
        key: SettingKey,
        value: Option<i64>,
    ) -> Result<(), StoreError>;

    /// One setting's raw value. Communities without a row get the default.
    async fn get_setting(
        &self,
        community: CommunityId,
        key: SettingKey,
    ) -> Result<Option<i64>, StoreError> {
        Ok(self.settings_or_default(community).await?.get(key))
    }

    async fn settings_or_default(&self, community: CommunityId) -> Result<Settings, StoreError> {
        Ok(self.get_settings(community).await?.unwrap_or_default())
    }
}
