//! Team formation.
//!
//! Partitions a list of parties (a participant plus the friends they bring)
//! into teams whose combined size never exceeds a capacity. This is a small
//! bin-packing heuristic tuned for sign-up lists of a few dozen parties.
//!
//! # Algorithm
//!
//! 1. Every party larger than half the capacity founds its own team. Two such
//!    parties can never share a team, so seeding them first avoids
//!    backtracking later.
//! 2. The remaining parties are packed largest first. Each party goes to the
//!    emptiest team it fits in; ties go to the team created earlier.
//! 3. If a pass cannot place every party, the pass is thrown away, one new
//!    team is opened with the first party still in the pool, and packing
//!    restarts with the smaller pool.
//!
//! # Invariants
//!
//! - No team total exceeds the capacity
//! - Every input party appears in exactly one team
//! - The result depends only on the input order and the capacity
//! - Teams are returned in creation order

mod names;

pub use names::{team_name, ADJECTIVES, NOUNS};

/// Anything with a party size can be packed into teams.
pub trait Party {
    /// Number of players this party occupies in a team.
    fn party_size(&self) -> u32;
}

impl Party for u32 {
    fn party_size(&self) -> u32 {
        *self
    }
}

/// A group of parties whose combined size fits the capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team<M> {
    members: Vec<M>,
    total: u32,
}

impl<M: Party> Team<M> {
    fn founded_by(member: M) -> Self {
        Self {
            total: member.party_size(),
            members: vec![member],
        }
    }

    fn push(&mut self, member: M) {
        self.total = self.total.saturating_add(member.party_size());
        self.members.push(member);
    }

    /// Combined party size of the team.
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn members(&self) -> &[M] {
        &self.members
    }

    pub fn into_members(self) -> Vec<M> {
        self.members
    }

    /// Number of parties (not players) in the team.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Partitions `members` into teams of at most `capacity` players.
///
/// Party sizes are expected to be positive and no larger than `capacity`;
/// the registration surface enforces that. An empty input yields no teams.
pub fn form_teams<M>(members: &[M], capacity: u32) -> Vec<Team<M>>
where
    M: Party + Clone,
{
    if members.is_empty() {
        return Vec::new();
    }

    let half = capacity / 2;
    let (large, mut pool): (Vec<M>, Vec<M>) = members
        .iter()
        .cloned()
        .partition(|member| member.party_size() > half);

    let mut teams: Vec<Team<M>> = large.into_iter().map(Team::founded_by).collect();

    // Stable: equal sizes keep their registration order.
    pool.sort_by(|a, b| b.party_size().cmp(&a.party_size()));

    loop {
        if let Some(packed) = pack(&teams, &pool, capacity) {
            return packed;
        }
        // pack() only fails on a non-empty pool
        let founder = pool.remove(0);
        teams.push(Team::founded_by(founder));
    }
}

/// One greedy pass. Returns `None` as soon as a party fits nowhere.
fn pack<M>(teams: &[Team<M>], pool: &[M], capacity: u32) -> Option<Vec<Team<M>>>
where
    M: Party + Clone,
{
    let mut working = teams.to_vec();
    let mut order: Vec<usize> = (0..working.len()).collect();

    for member in pool {
        let size = member.party_size();
        // Index doubles as creation order, which breaks ties.
        order.sort_by_key(|&i| (working[i].total, i));
        let slot = order
            .iter()
            .copied()
            .find(|&i| working[i].total.saturating_add(size) <= capacity)?;
        working[slot].push(member.clone());
    }

    Some(working)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Signup {
        who: u32,
        size: u32,
    }

    impl Party for Signup {
        fn party_size(&self) -> u32 {
            self.size
        }
    }

    fn signups(sizes: &[u32]) -> Vec<Signup> {
        sizes
            .iter()
            .enumerate()
            .map(|(who, &size)| Signup {
                who: who as u32,
                size,
            })
            .collect()
    }

    fn totals<M: Party>(teams: &[Team<M>]) -> Vec<u32> {
        teams.iter().map(Team::total).collect()
    }

    fn sizes_of(team: &Team<Signup>) -> Vec<u32> {
        team.members().iter().map(|m| m.size).collect()
    }

    #[test]
    fn test_empty_input_has_no_teams() {
        let teams = form_teams::<u32>(&[], 5);
        assert!(teams.is_empty());
    }

    #[test]
    fn test_capacity_five_pairs_up_large_and_small() {
        let teams = form_teams(&signups(&[1, 2, 3, 4]), 5);

        assert_eq!(totals(&teams), vec![5, 5]);
        assert_eq!(sizes_of(&teams[0]), vec![3, 2]);
        assert_eq!(sizes_of(&teams[1]), vec![4, 1]);
    }

    #[test]
    fn test_capacity_four_makes_three_even_teams() {
        let teams = form_teams(&signups(&[1, 1, 2, 2, 3]), 4);

        assert_eq!(teams.len(), 3);
        assert!(teams.iter().all(|t| t.total() == 3));
        assert_eq!(sizes_of(&teams[0]), vec![3]);
        assert_eq!(sizes_of(&teams[1]), vec![2, 1]);
        assert_eq!(sizes_of(&teams[2]), vec![2, 1]);
    }

    #[test]
    fn test_capacity_three_with_seven_parties() {
        let teams = form_teams(&signups(&[1, 2, 1, 1, 2, 1, 2]), 3);

        assert_eq!(teams.len(), 4);
        let member_count: usize = teams.iter().map(Team::len).sum();
        assert_eq!(member_count, 7);
        assert_eq!(teams.iter().filter(|t| t.total() == 3).count(), 2);
        assert_eq!(teams.iter().filter(|t| t.total() == 2).count(), 2);
        assert_eq!(sizes_of(&teams[2]), vec![2]);
        assert_eq!(sizes_of(&teams[3]), vec![1, 1]);
    }

    #[test]
    fn test_full_party_is_alone() {
        let teams = form_teams(&signups(&[5]), 5);
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].len(), 1);
        assert_eq!(teams[0].total(), 5);
    }

    #[test]
    fn test_small_parties_open_teams_lazily() {
        // Nothing exceeds half of 6, so there are no seeded teams.
        let teams = form_teams(&signups(&[3, 3, 3, 2, 1]), 6);

        assert_eq!(totals(&teams), vec![6, 6]);
        assert_eq!(sizes_of(&teams[0]), vec![3, 3]);
        assert_eq!(sizes_of(&teams[1]), vec![3, 2, 1]);
    }

    #[test]
    fn test_ties_prefer_older_team() {
        let teams = form_teams(&signups(&[3, 3, 1]), 4);

        // Both seeded teams hold 3; the 1 joins the first one created.
        assert_eq!(sizes_of(&teams[0]), vec![3, 1]);
        assert_eq!(sizes_of(&teams[1]), vec![3]);
    }

    #[test]
    fn test_seeded_teams_keep_registration_order() {
        let members = signups(&[4, 1, 5]);
        let teams = form_teams(&members, 6);

        assert_eq!(teams[0].members()[0].who, 0);
        assert_eq!(teams[1].members()[0].who, 2);
        // The 1 goes to the emptier team, which is the older one here.
        assert_eq!(sizes_of(&teams[0]), vec![4, 1]);
        assert_eq!(sizes_of(&teams[1]), vec![5]);
    }

    #[test]
    fn test_bare_sizes_are_parties() {
        let teams = form_teams(&[2u32, 2, 2], 4);
        assert_eq!(totals(&teams), vec![4, 2]);
    }
}
