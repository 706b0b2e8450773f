//! Resolution of (user, module) pairs from group membership and group
//! assignments.
//!
//! A user reaches a module through every group they belong to that has
//! the module assigned. Those routes are reduced to one pair carrying the
//! earliest deadline and the list of contributing groups.

use std::collections::{BTreeMap, HashMap};

use campus_core::models::progress::{AssignmentRow, MembershipRow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Restricts which memberships and assignments take part in resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairFilter {
    pub user_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub module_id: Option<Uuid>,
}

/// A deduplicated (user, module) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedPair {
    pub user_id: Uuid,
    pub module_id: Uuid,
    /// Groups through which the module reaches the user, sorted.
    pub groups: Vec<Uuid>,
    /// Earliest deadline among the contributing assignments.
    pub deadline: Option<DateTime<Utc>>,
}

/// The earlier of two optional deadlines. A missing deadline never wins
/// over a present one.
pub fn earliest_deadline(
    a: Option<DateTime<Utc>>,
    b: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

impl AssignedPair {
    /// Fold another route to the same pair into this one.
    fn merge(&mut self, group_id: Uuid, deadline: Option<DateTime<Utc>>) {
        if let Err(pos) = self.groups.binary_search(&group_id) {
            self.groups.insert(pos, group_id);
        }
        self.deadline = earliest_deadline(self.deadline, deadline);
    }
}

/// Join memberships with assignments and reduce to one entry per pair,
/// ordered by `(user_id, module_id)`.
pub fn resolve_pairs(
    memberships: &[MembershipRow],
    assignments: &[AssignmentRow],
    filter: &PairFilter,
) -> Vec<AssignedPair> {
    let mut by_group: HashMap<Uuid, Vec<&AssignmentRow>> = HashMap::new();
    for assignment in assignments {
        if filter.group_id.is_some_and(|g| g != assignment.group_id)
            || filter.module_id.is_some_and(|m| m != assignment.module_id)
        {
            continue;
        }
        by_group.entry(assignment.group_id).or_default().push(assignment);
    }

    let mut pairs: BTreeMap<(Uuid, Uuid), AssignedPair> = BTreeMap::new();
    for membership in memberships {
        if filter.user_id.is_some_and(|u| u != membership.user_id) {
            continue;
        }
        let Some(group_assignments) = by_group.get(&membership.group_id) else {
            continue;
        };
        for assignment in group_assignments {
            pairs
                .entry((membership.user_id, assignment.module_id))
                .and_modify(|pair| pair.merge(assignment.group_id, assignment.deadline))
                .or_insert_with(|| AssignedPair {
                    user_id: membership.user_id,
                    module_id: assignment.module_id,
                    groups: vec![assignment.group_id],
                    deadline: assignment.deadline,
                });
        }
    }

    pairs.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn membership(user_id: Uuid, group_id: Uuid) -> MembershipRow {
        MembershipRow { user_id, group_id }
    }

    fn assignment(
        group_id: Uuid,
        module_id: Uuid,
        deadline: Option<DateTime<Utc>>,
    ) -> AssignmentRow {
        AssignmentRow {
            group_id,
            module_id,
            deadline,
        }
    }

    #[test]
    fn module_reached_through_two_groups_appears_once() {
        let (user, sales, onboarding, module) =
            (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let soon = Utc::now() + Duration::days(3);
        let later = Utc::now() + Duration::days(30);

        let pairs = resolve_pairs(
            &[membership(user, sales), membership(user, onboarding)],
            &[
                assignment(sales, module, Some(later)),
                assignment(onboarding, module, Some(soon)),
            ],
            &PairFilter::default(),
        );

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].deadline, Some(soon));
        let mut expected = vec![sales, onboarding];
        expected.sort();
        assert_eq!(pairs[0].groups, expected);
    }

    #[test]
    fn missing_deadline_does_not_erase_a_present_one() {
        let now = Utc::now();
        assert_eq!(earliest_deadline(None, Some(now)), Some(now));
        assert_eq!(earliest_deadline(Some(now), None), Some(now));
        assert_eq!(earliest_deadline(None, None), None);
    }

    #[test]
    fn group_filter_applies_before_reduction() {
        let (user, a, b, module) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let early = Utc::now();
        let late = early + Duration::days(10);

        let pairs = resolve_pairs(
            &[membership(user, a), membership(user, b)],
            &[assignment(a, module, Some(early)), assignment(b, module, Some(late))],
            &PairFilter {
                group_id: Some(b),
                ..Default::default()
            },
        );

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].groups, vec![b]);
        assert_eq!(pairs[0].deadline, Some(late));
    }

    #[test]
    fn users_without_assigned_groups_yield_nothing() {
        let pairs = resolve_pairs(
            &[membership(Uuid::new_v4(), Uuid::new_v4())],
            &[assignment(Uuid::new_v4(), Uuid::new_v4(), None)],
            &PairFilter::default(),
        );
        assert!(pairs.is_empty());
    }
}
