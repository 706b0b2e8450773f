//! Per-pair status derivation.
//!
//! Pure functions from the facts of one (user, module) pair to its
//! [`ModuleProgress`]. No I/O, no failure modes.

use campus_core::models::progress::{ModuleProgress, ProgressStatus, QuizResult};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// An override recorded for the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideFact {
    pub allow_certificate: bool,
}

/// Everything the deriver needs to know about one (user, module) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressFacts {
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub total_sections: u32,
    pub completed_sections: u32,
    /// Quizzes of the module in position order, with the user's pass state.
    pub quizzes: Vec<QuizResult>,
    /// At least one attempt (passed or not) on one of the module's quizzes.
    pub has_attempt: bool,
    pub progress_override: Option<OverrideFact>,
    pub certificate_issued: bool,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl ProgressFacts {
    /// Facts for a pair with no recorded activity on a module with no content.
    pub fn empty(user_id: Uuid, module_id: Uuid) -> Self {
        Self {
            user_id,
            module_id,
            total_sections: 0,
            completed_sections: 0,
            quizzes: Vec::new(),
            has_attempt: false,
            progress_override: None,
            certificate_issued: false,
            last_accessed_at: None,
        }
    }
}

/// Status state machine. Rules are evaluated in order; the first match wins.
pub fn derive_status(
    completed_sections: u32,
    total_sections: u32,
    has_quizzes: bool,
    all_quizzes_passed: bool,
    has_attempt: bool,
    has_override: bool,
) -> ProgressStatus {
    let sections_done = completed_sections >= total_sections;

    if has_override || (sections_done && all_quizzes_passed) {
        ProgressStatus::Completed
    } else if sections_done && has_quizzes {
        ProgressStatus::ReadyForQuiz
    } else if completed_sections > 0 || has_attempt {
        ProgressStatus::InProgress
    } else {
        ProgressStatus::NotStarted
    }
}

/// `round(100 * completed / total)` with halves rounded up, in integers.
///
/// Returns 0 when `total_steps` is 0. `completed_steps` is clamped to
/// `total_steps`.
pub fn percentage(completed_steps: u32, total_steps: u32) -> u8 {
    if total_steps == 0 {
        return 0;
    }
    let completed = u64::from(completed_steps.min(total_steps));
    let total = u64::from(total_steps);
    let rounded = (200 * completed + total) / (2 * total);
    u8::try_from(rounded).unwrap_or(100)
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Compute the progress record of one pair.
pub fn derive_progress(facts: &ProgressFacts) -> ModuleProgress {
    let total_quizzes = count(facts.quizzes.len());
    let passed_quizzes = count(facts.quizzes.iter().filter(|q| q.passed).count());
    let all_quizzes_passed = passed_quizzes == total_quizzes;
    let naturally_complete =
        facts.completed_sections >= facts.total_sections && all_quizzes_passed;

    let status = derive_status(
        facts.completed_sections,
        facts.total_sections,
        total_quizzes > 0,
        all_quizzes_passed,
        facts.has_attempt,
        facts.progress_override.is_some(),
    );

    let total_steps = facts.total_sections.saturating_add(total_quizzes);
    let completed_steps = facts
        .completed_sections
        .min(facts.total_sections)
        .saturating_add(passed_quizzes);

    let override_allows_certificate = facts
        .progress_override
        .is_some_and(|o| o.allow_certificate);

    ModuleProgress {
        user_id: facts.user_id,
        module_id: facts.module_id,
        total_sections: facts.total_sections,
        completed_sections: facts.completed_sections,
        total_quizzes,
        passed_quizzes,
        total_steps,
        completed_steps,
        percentage: percentage(completed_steps, total_steps),
        status,
        quiz_results: facts.quizzes.clone(),
        has_override: facts.progress_override.is_some(),
        override_allows_certificate,
        certificate_eligible: naturally_complete || override_allows_certificate,
        certificate_issued: facts.certificate_issued,
        last_accessed_at: facts.last_accessed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(passed: bool) -> QuizResult {
        QuizResult {
            quiz_id: Uuid::new_v4(),
            title: "Quiz".into(),
            passed,
        }
    }

    fn facts(total: u32, completed: u32, quizzes: Vec<QuizResult>) -> ProgressFacts {
        ProgressFacts {
            total_sections: total,
            completed_sections: completed,
            has_attempt: !quizzes.is_empty() && quizzes.iter().any(|q| q.passed),
            quizzes,
            ..ProgressFacts::empty(Uuid::new_v4(), Uuid::new_v4())
        }
    }

    #[test]
    fn all_sections_done_quiz_pending_is_ready_for_quiz() {
        let p = derive_progress(&facts(4, 4, vec![quiz(false)]));
        assert_eq!(p.total_steps, 5);
        assert_eq!(p.completed_steps, 4);
        assert_eq!(p.percentage, 80);
        assert_eq!(p.status, ProgressStatus::ReadyForQuiz);
        assert!(!p.certificate_eligible);
    }

    #[test]
    fn passing_the_last_quiz_completes() {
        let p = derive_progress(&facts(4, 4, vec![quiz(true)]));
        assert_eq!(p.completed_steps, 5);
        assert_eq!(p.percentage, 100);
        assert_eq!(p.status, ProgressStatus::Completed);
        assert!(p.certificate_eligible);
    }

    #[test]
    fn empty_module_is_vacuously_completed() {
        let p = derive_progress(&facts(0, 0, vec![]));
        assert_eq!(p.percentage, 0);
        assert_eq!(p.total_steps, 0);
        assert_eq!(p.status, ProgressStatus::Completed);
    }

    #[test]
    fn partial_sections_with_passed_quiz_is_in_progress() {
        let p = derive_progress(&facts(3, 2, vec![quiz(true), quiz(false)]));
        assert_eq!(p.completed_steps, 3);
        assert_eq!(p.total_steps, 5);
        assert_eq!(p.percentage, 60);
        assert_eq!(p.status, ProgressStatus::InProgress);
    }

    #[test]
    fn failed_attempt_alone_counts_as_started() {
        let mut f = facts(3, 0, vec![quiz(false)]);
        f.has_attempt = true;
        assert_eq!(derive_progress(&f).status, ProgressStatus::InProgress);
        f.has_attempt = false;
        assert_eq!(derive_progress(&f).status, ProgressStatus::NotStarted);
    }

    #[test]
    fn override_completes_without_changing_counts() {
        let base = facts(5, 1, vec![quiz(false)]);
        let before = derive_progress(&base);

        let mut overridden = base.clone();
        overridden.progress_override = Some(OverrideFact {
            allow_certificate: false,
        });
        let after = derive_progress(&overridden);

        assert_eq!(after.status, ProgressStatus::Completed);
        assert_eq!(after.percentage, before.percentage);
        assert_eq!(after.completed_steps, before.completed_steps);
        assert!(after.has_override);
        assert!(!after.certificate_eligible);

        overridden.progress_override = Some(OverrideFact {
            allow_certificate: true,
        });
        assert!(derive_progress(&overridden).certificate_eligible);
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 7), 0);
        assert_eq!(percentage(7, 7), 100);
        assert_eq!(percentage(3, 0), 0);
    }

    #[test]
    fn stale_completions_never_exceed_one_hundred() {
        let p = derive_progress(&facts(2, 5, vec![]));
        assert_eq!(p.completed_steps, 2);
        assert_eq!(p.percentage, 100);
        assert_eq!(p.status, ProgressStatus::Completed);
    }
}
