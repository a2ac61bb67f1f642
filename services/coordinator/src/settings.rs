//! Per-community settings.
//!
//! Every community has one settings row. Missing rows behave as
//! [`Settings::default`]. Delays are whole seconds; a negative delete delay
//! means the message is never deleted.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use teamo_id::LocationId;
use thiserror::Error;

/// Cancel countdown length when a community has not configured one.
pub const DEFAULT_CANCEL_DELAY_SECS: i64 = 15;

/// Settings for one community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Only accept commands from this location. `None` accepts any.
    pub use_location: Option<LocationId>,
    /// Post new entries here instead of where the command was issued.
    pub waiting_location: Option<LocationId>,
    /// Post finished teams here instead of the entry's location.
    pub end_location: Option<LocationId>,
    pub delete_general_delay: i64,
    pub delete_use_delay: i64,
    pub delete_end_delay: i64,
    pub cancel_delay: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_location: None,
            waiting_location: None,
            end_location: None,
            delete_general_delay: -1,
            delete_use_delay: -1,
            delete_end_delay: -1,
            cancel_delay: DEFAULT_CANCEL_DELAY_SECS,
        }
    }
}

impl Settings {
    /// How long a cancellation waits before the entry is deleted.
    pub fn cancel_delay(&self) -> Duration {
        Duration::from_secs(self.cancel_delay.max(0) as u64)
    }

    /// Auto-delete delay for finish announcements.
    pub fn end_delete_after(&self) -> Option<Duration> {
        delete_after(self.delete_end_delay)
    }

    /// Auto-delete delay for general bot replies.
    pub fn general_delete_after(&self) -> Option<Duration> {
        delete_after(self.delete_general_delay)
    }

    /// Raw value of a single setting.
    pub fn get(&self, key: SettingKey) -> Option<i64> {
        match key {
            SettingKey::UseLocation => self.use_location.map(location_to_raw),
            SettingKey::WaitingLocation => self.waiting_location.map(location_to_raw),
            SettingKey::EndLocation => self.end_location.map(location_to_raw),
            SettingKey::DeleteGeneralDelay => Some(self.delete_general_delay),
            SettingKey::DeleteUseDelay => Some(self.delete_use_delay),
            SettingKey::DeleteEndDelay => Some(self.delete_end_delay),
            SettingKey::CancelDelay => Some(self.cancel_delay),
        }
    }

    /// Sets a single setting from its raw value.
    ///
    /// Location settings accept `None` to clear the override. Delay settings
    /// require a value.
    pub fn set(&mut self, key: SettingKey, value: Option<i64>) -> Result<(), SettingsError> {
        let required = || value.ok_or(SettingsError::MissingValue(key));
        match key {
            SettingKey::UseLocation => self.use_location = value.map(location_from_raw),
            SettingKey::WaitingLocation => self.waiting_location = value.map(location_from_raw),
            SettingKey::EndLocation => self.end_location = value.map(location_from_raw),
            SettingKey::DeleteGeneralDelay => self.delete_general_delay = required()?,
            SettingKey::DeleteUseDelay => self.delete_use_delay = required()?,
            SettingKey::DeleteEndDelay => self.delete_end_delay = required()?,
            SettingKey::CancelDelay => {
                let secs = required()?;
                if secs < 0 {
                    return Err(SettingsError::Negative(key));
                }
                self.cancel_delay = secs;
            }
        }
        Ok(())
    }
}

fn delete_after(secs: i64) -> Option<Duration> {
    (secs >= 0).then(|| Duration::from_secs(secs as u64))
}

// SQLite integers are signed; snowflakes fit in 63 bits.
pub(crate) fn location_to_raw(id: LocationId) -> i64 {
    id.get() as i64
}

pub(crate) fn location_from_raw(raw: i64) -> LocationId {
    LocationId::new(raw as u64)
}

/// Errors from parsing or applying settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown setting: {0}")]
    UnknownKey(String),

    #[error("setting {0} requires a value")]
    MissingValue(SettingKey),

    #[error("setting {0} cannot be negative")]
    Negative(SettingKey),
}

/// Names of individual settings. The string form is also the column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    UseLocation,
    WaitingLocation,
    EndLocation,
    DeleteGeneralDelay,
    DeleteUseDelay,
    DeleteEndDelay,
    CancelDelay,
}

impl SettingKey {
    pub const ALL: [SettingKey; 7] = [
        Self::UseLocation,
        Self::WaitingLocation,
        Self::EndLocation,
        Self::DeleteGeneralDelay,
        Self::DeleteUseDelay,
        Self::DeleteEndDelay,
        Self::CancelDelay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UseLocation => "use_location",
            Self::WaitingLocation => "waiting_location",
            Self::EndLocation => "end_location",
            Self::DeleteGeneralDelay => "delete_general_delay",
            Self::DeleteUseDelay => "delete_use_delay",
            Self::DeleteEndDelay => "delete_end_delay",
            Self::CancelDelay => "cancel_delay",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| SettingsError::UnknownKey(s.to_string()))
    }
}
