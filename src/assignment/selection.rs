use rand::seq::SliceRandom;
use rand::Rng;

use crate::database::models::{Team, MAX_REVIEWERS};

/// Pick up to two reviewers for a new pull request.
///
/// Candidates are the active members of `team` other than the author. When
/// there are more than two, two are drawn uniformly without replacement;
/// otherwise every candidate is returned in random order.
pub fn select_initial_reviewers<R>(team: &Team, author_id: &str, rng: &mut R) -> Vec<String>
where
    R: Rng + ?Sized,
{
    let candidates: Vec<&str> = team
        .members
        .iter()
        .filter(|member| member.is_active && member.user_id != author_id)
        .map(|member| member.user_id.as_str())
        .collect();

    candidates
        .choose_multiple(rng, MAX_REVIEWERS)
        .map(|id| id.to_string())
        .collect()
}

/// Pick one member of `team` to take over from `outgoing_id`.
///
/// The author, the outgoing reviewer, inactive members and anyone already in
/// `current_reviewers` are excluded. `None` means nobody is eligible.
pub fn select_replacement<R>(
    team: &Team,
    author_id: &str,
    current_reviewers: &[String],
    outgoing_id: &str,
    rng: &mut R,
) -> Option<String>
where
    R: Rng + ?Sized,
{
    let candidates: Vec<&str> = team
        .members
        .iter()
        .filter(|member| {
            member.is_active
                && member.user_id != author_id
                && member.user_id != outgoing_id
                && !current_reviewers.contains(&member.user_id)
        })
        .map(|member| member.user_id.as_str())
        .collect();

    candidates.choose(rng).map(|id| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::TeamMember;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn team(members: &[(&str, bool)]) -> Team {
        Team {
            team_name: "core".to_string(),
            members: members
                .iter()
                .map(|(id, active)| TeamMember {
                    user_id: id.to_string(),
                    username: format!("{} name", id),
                    is_active: *active,
                })
                .collect(),
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_initial_selection_size_and_eligibility() {
        let rosters: Vec<Team> = vec![
            team(&[("A", true)]),
            team(&[("A", true), ("B", true)]),
            team(&[("A", true), ("B", true), ("C", false)]),
            team(&[("A", true), ("B", true), ("C", true)]),
            team(&[("A", true), ("B", true), ("C", true), ("D", false), ("E", true)]),
            team(&[("B", true), ("C", true), ("D", true), ("E", true), ("F", true)]),
        ];

        for roster in &rosters {
            let eligible: HashSet<&str> = roster
                .members
                .iter()
                .filter(|m| m.is_active && m.user_id != "A")
                .map(|m| m.user_id.as_str())
                .collect();

            for seed in 0..50 {
                let mut rng = StdRng::seed_from_u64(seed);
                let picked = select_initial_reviewers(roster, "A", &mut rng);

                assert_eq!(picked.len(), eligible.len().min(2));
                let unique: HashSet<&str> = picked.iter().map(|s| s.as_str()).collect();
                assert_eq!(unique.len(), picked.len(), "duplicate reviewer");
                assert!(unique.is_subset(&eligible));
            }
        }
    }

    #[test]
    fn test_empty_pool_gives_empty_list() {
        let roster = team(&[("A", true), ("B", false)]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_initial_reviewers(&roster, "A", &mut rng).is_empty());
    }

    #[test]
    fn test_small_pool_is_returned_whole() {
        let roster = team(&[("A", true), ("B", true), ("C", true)]);
        let mut rng = StdRng::seed_from_u64(9);
        let mut picked = select_initial_reviewers(&roster, "A", &mut rng);
        picked.sort();
        assert_eq!(picked, ids(&["B", "C"]));
    }

    #[test]
    fn test_same_seed_same_selection() {
        let roster = team(&[("A", true), ("B", true), ("C", true), ("D", true), ("E", true)]);
        let first = select_initial_reviewers(&roster, "A", &mut StdRng::seed_from_u64(42));
        let second = select_initial_reviewers(&roster, "A", &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_candidate_can_be_drawn() {
        let roster = team(&[("A", true), ("B", true), ("C", true), ("D", true), ("E", true)]);
        let mut seen = HashSet::new();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            seen.extend(select_initial_reviewers(&roster, "A", &mut rng));
        }
        let expected: HashSet<String> = ids(&["B", "C", "D", "E"]).into_iter().collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_replacement_respects_exclusions() {
        let roster = team(&[
            ("A", true),
            ("B", true),
            ("C", true),
            ("D", true),
            ("E", false),
            ("F", true),
        ]);
        let current = ids(&["B", "C"]);

        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select_replacement(&roster, "A", &current, "B", &mut rng).unwrap();
            assert!(picked == "D" || picked == "F", "unexpected pick {}", picked);
        }
    }

    #[test]
    fn test_replacement_with_mock_rng_takes_first_eligible() {
        let roster = team(&[("A", true), ("B", true), ("C", true), ("D", true), ("F", true)]);
        // a zero stream always lands on index 0
        let mut rng = StepRng::new(0, 0);
        let picked = select_replacement(&roster, "A", &ids(&["B", "C"]), "B", &mut rng);
        assert_eq!(picked.as_deref(), Some("D"));
    }

    #[test]
    fn test_no_replacement_candidate() {
        let roster = team(&[("A", true), ("B", true), ("C", true), ("D", false)]);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(
            select_replacement(&roster, "A", &ids(&["B", "C"]), "B", &mut rng),
            None
        );
    }

    #[test]
    fn test_selection_through_boxed_rng() {
        let roster = team(&[("A", true), ("B", true), ("C", true), ("D", true)]);
        let mut rng: crate::assignment::BoxRng = Box::new(StepRng::new(0, 0));
        let picked = select_replacement(&roster, "A", &ids(&["B"]), "B", rng.as_mut());
        assert_eq!(picked.as_deref(), Some("C"));
    }
}
