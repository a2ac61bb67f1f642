//! Structured display snapshots.
//!
//! The coordinator never renders text for the chat platform itself. It hands
//! the notifier an [`EntryView`] or a [`FinishReport`] and the notifier turns
//! those into messages.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use serde::Serialize;
use teamo_id::EntryId;
use teamo_teams::{team_name, Team};

use crate::model::{Entry, Member};

/// Everything a notifier needs to draw a live entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    pub entry_id: EntryId,
    pub label: String,
    pub start_time: DateTime<Utc>,
    pub capacity: u32,
    pub members: Vec<Member>,
    /// Human readable, e.g. "1 h 5 min".
    pub time_left: String,
    /// A cancellation countdown is running.
    pub cancelling: bool,
    pub cancel_delay: Duration,
    pub rendered_at: DateTime<Utc>,
}

impl EntryView {
    pub fn new(entry: &Entry, cancelling: bool, cancel_delay: Duration, now: DateTime<Utc>) -> Self {
        Self {
            entry_id: entry.id,
            label: entry.label.clone(),
            start_time: entry.start_time,
            capacity: entry.capacity,
            members: entry.members.clone(),
            time_left: format_time_left(entry.start_time - now),
            cancelling,
            cancel_delay,
            rendered_at: now,
        }
    }
}

/// Formats the time until start: `<1 min`, `12 min`, `10 h 33 min`,
/// `13 days 1 h 6 min`. Negative spans read as `<1 min`.
pub fn format_time_left(span: TimeDelta) -> String {
    let total_secs = span.num_seconds();
    if total_secs < 60 {
        return "<1 min".to_string();
    }

    let total_mins = total_secs / 60;
    if total_mins < 60 {
        return format!("{total_mins} min");
    }

    let total_hours = total_mins / 60;
    let mins = total_mins % 60;
    if total_hours < 24 {
        return format!("{total_hours} h {mins} min");
    }

    let days = total_hours / 24;
    let hours = total_hours % 24;
    format!("{days} days {hours} h {mins} min")
}

/// A formed team as announced to participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinishedTeam {
    pub name: String,
    pub members: Vec<Member>,
    pub players: u32,
}

/// Result of team formation for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FinishOutcome {
    Teams { teams: Vec<FinishedTeam> },
    /// No one registered.
    NoParticipants,
}

/// Announcement sent when an entry's start time passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinishReport {
    pub entry_id: EntryId,
    pub label: String,
    pub start_time: DateTime<Utc>,
    pub outcome: FinishOutcome,
    /// Delete the announcement after this long, if set.
    pub delete_after: Option<Duration>,
}

impl FinishReport {
    /// Names the formed teams and wraps them up for the notifier.
    pub fn new<R: Rng + ?Sized>(
        entry: &Entry,
        teams: Vec<Team<Member>>,
        delete_after: Option<Duration>,
        rng: &mut R,
    ) -> Self {
        let outcome = if teams.is_empty() {
            FinishOutcome::NoParticipants
        } else {
            FinishOutcome::Teams {
                teams: teams
                    .into_iter()
                    .map(|team| FinishedTeam {
                        name: team_name(rng),
                        players: team.total(),
                        members: team.into_members(),
                    })
                    .collect(),
            }
        };

        Self {
            entry_id: entry.id,
            label: entry.label.clone(),
            start_time: entry.start_time,
            outcome,
            delete_after,
        }
    }

    pub fn teams(&self) -> &[FinishedTeam] {
        match &self.outcome {
            FinishOutcome::Teams { teams } => teams,
            FinishOutcome::NoParticipants => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;
    use teamo_id::{CommunityId, LocationId, ParticipantId};
    use teamo_teams::form_teams;

    #[rstest]
    #[case(TimeDelta::seconds(10), "<1 min")]
    #[case(TimeDelta::seconds(59), "<1 min")]
    #[case(TimeDelta::seconds(60), "1 min")]
    #[case(TimeDelta::minutes(12), "12 min")]
    #[case(TimeDelta::hours(10) + TimeDelta::minutes(33), "10 h 33 min")]
    #[case(TimeDelta::days(13) + TimeDelta::minutes(66), "13 days 1 h 6 min")]
    #[case(TimeDelta::minutes(-5), "<1 min")]
    fn test_format_time_left(#[case] span: TimeDelta, #[case] expected: &str) {
        assert_eq!(format_time_left(span), expected);
    }

    fn entry(sizes: &[u32]) -> Entry {
        Entry {
            id: EntryId::new(),
            location: LocationId::new(1),
            community: CommunityId::new(1),
            label: "OW".to_string(),
            start_time: Utc::now(),
            capacity: 5,
            display_id: None,
            members: sizes
                .iter()
                .enumerate()
                .map(|(i, &s)| Member::new(ParticipantId::new(i as u64), s))
                .collect(),
        }
    }

    #[test]
    fn test_view_copies_entry() {
        let entry = entry(&[2]);
        let now = entry.start_time - TimeDelta::minutes(30);
        let view = EntryView::new(&entry, true, Duration::from_secs(15), now);

        assert_eq!(view.entry_id, entry.id);
        assert_eq!(view.members, entry.members);
        assert_eq!(view.time_left, "30 min");
        assert!(view.cancelling);
    }

    #[test]
    fn test_finish_report_without_members() {
        let entry = entry(&[]);
        let teams = form_teams(&entry.members, entry.capacity);
        let report = FinishReport::new(&entry, teams, None, &mut StdRng::seed_from_u64(1));

        assert_eq!(report.outcome, FinishOutcome::NoParticipants);
        assert!(report.teams().is_empty());
    }

    #[test]
    fn test_finish_report_names_teams() {
        let entry = entry(&[1, 2, 3, 4]);
        let teams = form_teams(&entry.members, entry.capacity);
        let report = FinishReport::new(
            &entry,
            teams,
            Some(Duration::from_secs(60)),
            &mut StdRng::seed_from_u64(1),
        );

        let teams = report.teams();
        assert_eq!(teams.len(), 2);
        assert!(teams.iter().all(|t| t.players == 5 && !t.name.is_empty()));
        assert_eq!(report.delete_after, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_finish_report_serializes_kind() {
        let entry = entry(&[]);
        let report = FinishReport::new(&entry, Vec::new(), None, &mut StdRng::seed_from_u64(1));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["kind"], "no_participants");
    }
}
