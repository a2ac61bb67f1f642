//! SQLite-backed entry store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use teamo_id::{CommunityId, DisplayId, EntryId, LocationId, ParticipantId};
use tracing::debug;

use super::{EntryStore, StoreError};
use crate::model::{Entry, Member};
use crate::settings::{location_from_raw, location_to_raw, SettingKey, Settings};

const ENTRY_COLUMNS: &str =
    "entry_id, location_id, community_id, label, start_time, capacity, display_id";

/// SQLite entry store.
///
/// The connection sits behind a mutex; every call runs one short statement
/// batch and never holds the connection across an await point.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::from_connection(conn)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Invalid("store connection lock poisoned".to_string()))
    }
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            entry_id TEXT PRIMARY KEY,
            location_id INTEGER NOT NULL,
            community_id INTEGER NOT NULL,
            label TEXT NOT NULL,
            start_time INTEGER NOT NULL,
            capacity INTEGER NOT NULL CHECK (capacity >= 2),
            display_id INTEGER,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_entries_start_time ON entries(start_time);

        CREATE TABLE IF NOT EXISTS members (
            entry_id TEXT NOT NULL REFERENCES entries(entry_id) ON DELETE CASCADE,
            participant_id INTEGER NOT NULL,
            party_size INTEGER NOT NULL CHECK (party_size > 0),
            PRIMARY KEY (entry_id, participant_id)
        );

        CREATE TABLE IF NOT EXISTS settings (
            community_id INTEGER PRIMARY KEY,
            use_location INTEGER,
            waiting_location INTEGER,
            end_location INTEGER,
            delete_general_delay INTEGER NOT NULL,
            delete_use_delay INTEGER NOT NULL,
            delete_end_delay INTEGER NOT NULL,
            cancel_delay INTEGER NOT NULL
        );
        "#,
    )?;

    debug!("Entry store schema initialized");
    Ok(())
}

// Snowflakes are stored as signed integers; they fit in 63 bits.
fn raw(id: u64) -> i64 {
    id as i64
}

struct EntryRow {
    entry_id: String,
    location_id: i64,
    community_id: i64,
    label: String,
    start_time: i64,
    capacity: u32,
    display_id: Option<i64>,
}

impl EntryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            entry_id: row.get(0)?,
            location_id: row.get(1)?,
            community_id: row.get(2)?,
            label: row.get(3)?,
            start_time: row.get(4)?,
            capacity: row.get(5)?,
            display_id: row.get(6)?,
        })
    }

    fn into_entry(self, members: Vec<Member>) -> Result<Entry, StoreError> {
        let id = EntryId::parse(&self.entry_id)
            .map_err(|e| StoreError::Invalid(format!("entry id {}: {e}", self.entry_id)))?;
        let start_time = DateTime::<Utc>::from_timestamp_millis(self.start_time).ok_or_else(
            || StoreError::Invalid(format!("entry {id} has start time {}", self.start_time)),
        )?;

        Ok(Entry {
            id,
            location: LocationId::new(self.location_id as u64),
            community: CommunityId::new(self.community_id as u64),
            label: self.label,
            start_time,
            capacity: self.capacity,
            display_id: self.display_id.map(|d| DisplayId::new(d as u64)),
            members,
        })
    }
}

fn load_members(conn: &Connection, entry_id: &str) -> Result<Vec<Member>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT participant_id, party_size FROM members WHERE entry_id = ?1 ORDER BY rowid",
    )?;

    let members = stmt
        .query_map(params![entry_id], |row| {
            let participant: i64 = row.get(0)?;
            Ok(Member::new(
                ParticipantId::new(participant as u64),
                row.get(1)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(members)
}

fn load_entry(conn: &Connection, id: EntryId) -> Result<Option<Entry>, StoreError> {
    let key = id.to_string();
    let row = conn
        .query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE entry_id = ?1"),
            params![key],
            EntryRow::from_row,
        )
        .optional()?;

    match row {
        Some(row) => {
            let members = load_members(conn, &key)?;
            row.into_entry(members).map(Some)
        }
        None => Ok(None),
    }
}

fn load_settings(conn: &Connection, community: CommunityId) -> Result<Option<Settings>, StoreError> {
    conn.query_row(
        "SELECT use_location, waiting_location, end_location, delete_general_delay,
                delete_use_delay, delete_end_delay, cancel_delay
         FROM settings WHERE community_id = ?1",
        params![raw(community.get())],
        |row| {
            Ok(Settings {
                use_location: row.get::<_, Option<i64>>(0)?.map(location_from_raw),
                waiting_location: row.get::<_, Option<i64>>(1)?.map(location_from_raw),
                end_location: row.get::<_, Option<i64>>(2)?.map(location_from_raw),
                delete_general_delay: row.get(3)?,
                delete_use_delay: row.get(4)?,
                delete_end_delay: row.get(5)?,
                cancel_delay: row.get(6)?,
            })
        },
    )
    .optional()
    .map_err(Into::into)
}

fn write_settings(
    conn: &Connection,
    community: CommunityId,
    settings: &Settings,
) -> Result<(), StoreError> {
    conn.execute(
        r#"
        INSERT INTO settings (community_id, use_location, waiting_location, end_location,
                              delete_general_delay, delete_use_delay, delete_end_delay, cancel_delay)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(community_id) DO UPDATE SET
            use_location = excluded.use_location,
            waiting_location = excluded.waiting_location,
            end_location = excluded.end_location,
            delete_general_delay = excluded.delete_general_delay,
            delete_use_delay = excluded.delete_use_delay,
            delete_end_delay = excluded.delete_end_delay,
            cancel_delay = excluded.cancel_delay
        "#,
        params![
            raw(community.get()),
            settings.use_location.map(location_to_raw),
            settings.waiting_location.map(location_to_raw),
            settings.end_location.map(location_to_raw),
            settings.delete_general_delay,
            settings.delete_use_delay,
            settings.delete_end_delay,
            settings.cancel_delay,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl EntryStore for SqliteStore {
    async fn get_entry(&self, id: EntryId) -> Result<Option<Entry>, StoreError> {
        let conn = self.conn()?;
        load_entry(&conn, id)
    }

    async fn insert_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let key = entry.id.to_string();

        tx.execute(
            r#"
            INSERT INTO entries (entry_id, location_id, community_id, label, start_time,
                                 capacity, display_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                key,
                raw(entry.location.get()),
                raw(entry.community.get()),
                entry.label,
                entry.start_time.timestamp_millis(),
                entry.capacity,
                entry.display_id.map(|d| raw(d.get())),
                Utc::now().timestamp_millis(),
            ],
        )?;

        for member in &entry.members {
            tx.execute(
                "INSERT INTO members (entry_id, participant_id, party_size) VALUES (?1, ?2, ?3)",
                params![key, raw(member.participant_id.get()), member.party_size],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    async fn set_display(&self, id: EntryId, display: DisplayId) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE entries SET display_id = ?1 WHERE entry_id = ?2",
            params![raw(display.get()), id.to_string()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("entry {id}")));
        }
        Ok(())
    }

    async fn delete_entry(&self, id: EntryId) -> Result<(), StoreError> {
        self.delete_entries(&[id]).await
    }

    async fn delete_entries(&self, ids: &[EntryId]) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for id in ids {
            let key = id.to_string();
            tx.execute("DELETE FROM members WHERE entry_id = ?1", params![key])?;
            tx.execute("DELETE FROM entries WHERE entry_id = ?1", params![key])?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn list_entries(&self) -> Result<Vec<Entry>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries ORDER BY created_at, rowid"
        ))?;

        let rows = stmt
            .query_map([], EntryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|row| {
                let members = load_members(&conn, &row.entry_id)?;
                row.into_entry(members)
            })
            .collect()
    }

    async fn get_member(
        &self,
        entry_id: EntryId,
        participant_id: ParticipantId,
    ) -> Result<Option<Member>, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT party_size FROM members WHERE entry_id = ?1 AND participant_id = ?2",
            params![entry_id.to_string(), raw(participant_id.get())],
            |row| Ok(Member::new(participant_id, row.get(0)?)),
        )
        .optional()
        .map_err(Into::into)
    }

    async fn upsert_member(
        &self,
        entry_id: EntryId,
        member: Member,
    ) -> Result<Option<u32>, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let key = entry_id.to_string();
        let participant = raw(member.participant_id.get());

        let previous: Option<u32> = tx
            .query_row(
                "SELECT party_size FROM members WHERE entry_id = ?1 AND participant_id = ?2",
                params![key, participant],
                |row| row.get(0),
            )
            .optional()?;

        // ON CONFLICT keeps the original rowid, so display order survives updates.
        tx.execute(
            r#"
            INSERT INTO members (entry_id, participant_id, party_size)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(entry_id, participant_id) DO UPDATE SET
                party_size = excluded.party_size
            "#,
            params![key, participant, member.party_size],
        )?;

        tx.commit()?;
        Ok(previous)
    }

    async fn delete_member(
        &self,
        entry_id: EntryId,
        participant_id: ParticipantId,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM members WHERE entry_id = ?1 AND participant_id = ?2",
            params![entry_id.to_string(), raw(participant_id.get())],
        )?;
        Ok(())
    }

    async fn get_settings(
        &self,
        community: CommunityId,
    ) -> Result<Option<Settings>, StoreError> {
        let conn = self.conn()?;
        load_settings(&conn, community)
    }

    async fn insert_settings(
        &self,
        community: CommunityId,
        settings: &Settings,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        write_settings(&conn, community, settings)
    }

    async fn set_setting(
        &self,
        community: CommunityId,
        key: SettingKey,
        value: Option<i64>,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let mut settings = load_settings(&conn, community)?.unwrap_or_default();
        settings.set(key, value)?;
        write_settings(&conn, community, &settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn test_entry(members: Vec<Member>) -> Entry {
        Entry {
            id: EntryId::new(),
            location: LocationId::new(100),
            community: CommunityId::new(200),
            label: "My Fun Game".to_string(),
            start_time: Utc.with_ymd_and_hms(2026, 10, 19, 18, 30, 0).unwrap(),
            capacity: 5,
            display_id: None,
            members,
        }
    }

    fn member(participant: u64, size: u32) -> Member {
        Member::new(ParticipantId::new(participant), size)
    }

    #[tokio::test]
    async fn test_entry_insert_get_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        let entry = test_entry(vec![member(1, 2), member(2, 1)]);

        store.insert_entry(&entry).await.unwrap();
        let fetched = store.get_entry(entry.id).await.unwrap().unwrap();
        assert_eq!(fetched, entry);

        store.delete_entry(entry.id).await.unwrap();
        assert!(store.get_entry(entry.id).await.unwrap().is_none());
        assert!(store
            .get_member(entry.id, ParticipantId::new(1))
            .await
            .unwrap()
            .is_none());

        // Deleting twice is fine.
        store.delete_entry(entry.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_display() {
        let store = SqliteStore::open_in_memory().unwrap();
        let entry = test_entry(vec![]);
        store.insert_entry(&entry).await.unwrap();

        store.set_display(entry.id, DisplayId::new(77)).await.unwrap();
        let fetched = store.get_entry(entry.id).await.unwrap().unwrap();
        assert_eq!(fetched.display_id, Some(DisplayId::new(77)));

        let missing = store.set_display(EntryId::new(), DisplayId::new(1)).await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upsert_member_reports_previous() {
        let store = SqliteStore::open_in_memory().unwrap();
        let entry = test_entry(vec![]);
        store.insert_entry(&entry).await.unwrap();

        assert_eq!(store.upsert_member(entry.id, member(1, 2)).await.unwrap(), None);
        assert_eq!(
            store.upsert_member(entry.id, member(1, 3)).await.unwrap(),
            Some(2)
        );
        assert_eq!(
            store
                .get_member(entry.id, ParticipantId::new(1))
                .await
                .unwrap(),
            Some(member(1, 3))
        );
    }

    #[tokio::test]
    async fn test_member_order_survives_update() {
        let store = SqliteStore::open_in_memory().unwrap();
        let entry = test_entry(vec![]);
        store.insert_entry(&entry).await.unwrap();

        store.upsert_member(entry.id, member(10, 1)).await.unwrap();
        store.upsert_member(entry.id, member(20, 1)).await.unwrap();
        store.upsert_member(entry.id, member(10, 4)).await.unwrap();

        let fetched = store.get_entry(entry.id).await.unwrap().unwrap();
        assert_eq!(fetched.members, vec![member(10, 4), member(20, 1)]);

        store
            .delete_member(entry.id, ParticipantId::new(10))
            .await
            .unwrap();
        let fetched = store.get_entry(entry.id).await.unwrap().unwrap();
        assert_eq!(fetched.members, vec![member(20, 1)]);
    }

    #[tokio::test]
    async fn test_member_requires_entry() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store.upsert_member(EntryId::new(), member(1, 1)).await;
        assert!(matches!(result, Err(StoreError::Sqlite(_))));
    }

    #[tokio::test]
    async fn test_list_entries_oldest_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = test_entry(vec![member(1, 1)]);
        let mut second = test_entry(vec![]);
        second.start_time = first.start_time - Duration::hours(1);

        store.insert_entry(&first).await.unwrap();
        store.insert_entry(&second).await.unwrap();

        let all = store.list_entries().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[0].members, vec![member(1, 1)]);
        assert_eq!(all[1].id, second.id);

        store.delete_entries(&[first.id, second.id]).await.unwrap();
        assert!(store.list_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settings_default_and_update() {
        let store = SqliteStore::open_in_memory().unwrap();
        let community = CommunityId::new(5);

        assert!(store.get_settings(community).await.unwrap().is_none());
        assert_eq!(
            store
                .get_setting(community, SettingKey::CancelDelay)
                .await
                .unwrap(),
            Some(crate::settings::DEFAULT_CANCEL_DELAY_SECS)
        );

        store
            .set_setting(community, SettingKey::CancelDelay, Some(60))
            .await
            .unwrap();
        store
            .set_setting(community, SettingKey::EndLocation, Some(42))
            .await
            .unwrap();

        let settings = store.get_settings(community).await.unwrap().unwrap();
        assert_eq!(settings.cancel_delay, 60);
        assert_eq!(settings.end_location, Some(LocationId::new(42)));
        assert_eq!(settings.delete_end_delay, -1);
    }

    #[tokio::test]
    async fn test_set_setting_rejects_invalid_value() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store
            .set_setting(CommunityId::new(1), SettingKey::CancelDelay, Some(-1))
            .await;
        assert!(matches!(result, Err(StoreError::Settings(_))));
        assert!(store.get_settings(CommunityId::new(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reopen_keeps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("teamo.db");
        let entry = test_entry(vec![member(3, 2)]);

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_entry(&entry).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let fetched = store.get_entry(entry.id).await.unwrap().unwrap();
        assert_eq!(fetched, entry);
    }
}
