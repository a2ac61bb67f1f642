//! External signals and reaction mapping.
//!
//! The chat platform reports reactions on an entry's display. They are
//! turned into [`Signal`]s which the lifecycle manager dispatches.

use teamo_id::{EntryId, ParticipantId};

/// Largest party size that has a keycap reaction.
pub const MAX_REACTION_PARTY_SIZE: u32 = 10;

const KEYCAPS: [&str; 10] = [
    "1\u{fe0f}\u{20e3}",
    "2\u{fe0f}\u{20e3}",
    "3\u{fe0f}\u{20e3}",
    "4\u{fe0f}\u{20e3}",
    "5\u{fe0f}\u{20e3}",
    "6\u{fe0f}\u{20e3}",
    "7\u{fe0f}\u{20e3}",
    "8\u{fe0f}\u{20e3}",
    "9\u{fe0f}\u{20e3}",
    "\u{1f51f}",
];

const CANCEL: &str = "\u{274c}";

/// A state change request for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Participant registered or changed their party size.
    PartySize {
        entry_id: EntryId,
        participant: ParticipantId,
        party_size: u32,
    },
    /// Participant withdrew. With a party size, only a registration of that
    /// size is withdrawn.
    Withdraw {
        entry_id: EntryId,
        participant: ParticipantId,
        party_size: Option<u32>,
    },
    CancelRequested { entry_id: EntryId },
    CancelRetracted { entry_id: EntryId },
    /// The entry's display was deleted outside the coordinator.
    DisplayDeleted { entry_id: EntryId },
}

impl Signal {
    pub fn entry_id(&self) -> EntryId {
        match self {
            Self::PartySize { entry_id, .. }
            | Self::Withdraw { entry_id, .. }
            | Self::CancelRequested { entry_id }
            | Self::CancelRetracted { entry_id }
            | Self::DisplayDeleted { entry_id } => *entry_id,
        }
    }
}

/// A reaction the coordinator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    PartySize(u32),
    Cancel,
}

impl Reaction {
    /// Map an emoji to a reaction. Unknown emoji map to `None`.
    pub fn parse(emoji: &str) -> Option<Self> {
        if emoji == CANCEL {
            return Some(Self::Cancel);
        }
        KEYCAPS
            .iter()
            .position(|&keycap| keycap == emoji)
            .map(|i| Self::PartySize(i as u32 + 1))
    }

    pub fn emoji(&self) -> Option<&'static str> {
        match self {
            Self::Cancel => Some(CANCEL),
            Self::PartySize(n) => n
                .checked_sub(1)
                .and_then(|i| KEYCAPS.get(i as usize))
                .copied(),
        }
    }
}

/// Reactions to offer on a display for the given team capacity.
///
/// A party must leave room for at least one more player, so sizes run up to
/// `capacity - 1`, capped at the largest keycap.
pub fn reaction_choices(capacity: u32) -> Vec<Reaction> {
    let largest = capacity.saturating_sub(1).min(MAX_REACTION_PARTY_SIZE);
    (1..=largest)
        .map(Reaction::PartySize)
        .chain(std::iter::once(Reaction::Cancel))
        .collect()
}

/// A raw reaction event from the chat platform.
#[derive(Debug, Clone)]
pub struct ReactionEvent {
    pub entry_id: EntryId,
    pub participant: ParticipantId,
    pub emoji: String,
    /// True for an added reaction, false for a removed one.
    pub added: bool,
    /// The reaction was placed by the bot itself.
    pub from_bot: bool,
}

impl ReactionEvent {
    pub fn into_signal(self) -> Option<Signal> {
        if self.from_bot {
            return None;
        }
        let entry_id = self.entry_id;
        let participant = self.participant;

        let signal = match (Reaction::parse(&self.emoji)?, self.added) {
            (Reaction::PartySize(party_size), true) => Signal::PartySize {
                entry_id,
                participant,
                party_size,
            },
            (Reaction::PartySize(party_size), false) => Signal::Withdraw {
                entry_id,
                participant,
                party_size: Some(party_size),
            },
            (Reaction::Cancel, true) => Signal::CancelRequested { entry_id },
            (Reaction::Cancel, false) => Signal::CancelRetracted { entry_id },
        };
        Some(signal)
    }
}
