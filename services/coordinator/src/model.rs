//! Entries and their members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use teamo_id::{CommunityId, DisplayId, EntryId, LocationId, ParticipantId};
use teamo_teams::Party;

/// One participant's registration inside an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub participant_id: ParticipantId,
    pub party_size: u32,
}

impl Member {
    pub fn new(participant_id: ParticipantId, party_size: u32) -> Self {
        Self {
            participant_id,
            party_size,
        }
    }
}

impl Party for Member {
    fn party_size(&self) -> u32 {
        self.party_size
    }
}

/// One open sign-up window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    /// Where the entry's display lives.
    pub location: LocationId,
    pub community: CommunityId,
    pub label: String,
    pub start_time: DateTime<Utc>,
    /// Maximum combined party size per team. Always at least 2.
    pub capacity: u32,
    /// Set once the display has been materialized.
    pub display_id: Option<DisplayId>,
    /// Registration order.
    pub members: Vec<Member>,
}

impl Entry {
    pub fn member(&self, participant_id: ParticipantId) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.participant_id == participant_id)
    }

    /// Combined party size of everyone registered.
    pub fn player_count(&self) -> u32 {
        self.members.iter().map(|m| m.party_size).sum()
    }

    /// True once the start time has been reached.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now
    }
}

/// Request to open a new entry.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Where the request came from. The community's waiting location, if
    /// configured, takes precedence.
    pub location: LocationId,
    pub community: CommunityId,
    pub label: String,
    pub start_time: DateTime<Utc>,
    pub capacity: u32,
}

/// A participant's registration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    /// Register, or change the party size of an existing registration.
    SetPartySize(u32),
    /// Withdraw. With `Some(size)` the withdrawal only applies while the
    /// stored party size still matches.
    Withdraw { party_size: Option<u32> },
}

/// What a membership change did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOutcome {
    /// First registration for this participant.
    Joined,
    Resized { previous: u32 },
    /// Same party size as before; nothing was written.
    Unchanged { party_size: u32 },
    Withdrawn { previous: u32 },
    /// Withdrawal for someone not registered, or for a stale party size.
    NotRegistered,
    /// The entry no longer exists.
    EntryGone,
}

impl MembershipOutcome {
    /// Party size stored before the change, if the participant was registered.
    pub fn previous_party_size(&self) -> Option<u32> {
        match self {
            Self::Resized { previous } | Self::Withdrawn { previous } => Some(*previous),
            Self::Unchanged { party_size } => Some(*party_size),
            Self::Joined | Self::NotRegistered | Self::EntryGone => None,
        }
    }

    /// Whether anything visible changed.
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            Self::Joined | Self::Resized { .. } | Self::Withdrawn { .. }
        )
    }
}
