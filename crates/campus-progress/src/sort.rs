//! Ordering rules for dashboards and report tables.

use std::cmp::Ordering;

use campus_core::models::progress::ProgressStatus;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::report::DashboardCard;

/// Dashboard rank: work in flight first, finished work last.
pub fn status_rank(status: ProgressStatus) -> u8 {
    match status {
        ProgressStatus::InProgress => 0,
        ProgressStatus::ReadyForQuiz => 1,
        ProgressStatus::NotStarted => 2,
        ProgressStatus::Completed => 3,
    }
}

/// Earlier deadlines first; no deadline sorts last.
pub fn compare_deadlines(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Case-insensitive title order with the id as a stable tiebreaker.
pub fn compare_titles(a: &str, b: &str, a_id: Uuid, b_id: Uuid) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
        .then_with(|| a_id.cmp(&b_id))
}

pub fn compare_dashboard(a: &DashboardCard, b: &DashboardCard) -> Ordering {
    status_rank(a.progress.status)
        .cmp(&status_rank(b.progress.status))
        .then_with(|| compare_deadlines(a.deadline, b.deadline))
        .then_with(|| compare_titles(&a.title, &b.title, a.module_id, b.module_id))
}

pub fn sort_dashboard(cards: &mut [DashboardCard]) {
    cards.sort_by(compare_dashboard);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::{ProgressFacts, derive_progress};
    use chrono::Duration;

    fn card(title: &str, completed: u32, deadline: Option<DateTime<Utc>>) -> DashboardCard {
        let facts = ProgressFacts {
            total_sections: 2,
            completed_sections: completed,
            ..ProgressFacts::empty(Uuid::new_v4(), Uuid::new_v4())
        };
        DashboardCard {
            module_id: facts.module_id,
            title: title.into(),
            deadline,
            progress: derive_progress(&facts),
        }
    }

    #[test]
    fn in_progress_before_not_started_before_completed() {
        let mut cards = vec![
            card("Done", 2, None),
            card("Fresh", 0, None),
            card("Halfway", 1, None),
        ];
        sort_dashboard(&mut cards);
        let titles: Vec<&str> = cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Halfway", "Fresh", "Done"]);
    }

    #[test]
    fn same_status_orders_by_deadline_then_title() {
        let now = Utc::now();
        let mut cards = vec![
            card("beta", 0, None),
            card("Alpha", 0, None),
            card("Urgent", 0, Some(now + Duration::days(1))),
            card("Later", 0, Some(now + Duration::days(9))),
        ];
        sort_dashboard(&mut cards);
        let titles: Vec<&str> = cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Urgent", "Later", "Alpha", "beta"]);
    }
}
