//! Lookup maps over one batch of bulk-read rows.
//!
//! The rows of a batch are indexed once; per-pair facts are then pulled
//! out of the maps without rescanning the raw lists. Absent keys read as
//! zero, empty, or false.

use std::collections::{HashMap, HashSet};

use campus_core::models::progress::{
    AccessRow, AttemptRow, CertificateRow, CompletionRow, OverrideRow, QuizResult, QuizRow,
    SectionCountRow,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::derive::{OverrideFact, ProgressFacts};

/// `(user_id, module_id)`.
pub type Pair = (Uuid, Uuid);

/// Raw rows of one fan-out batch.
#[derive(Debug, Clone, Default)]
pub struct ProgressRows {
    pub section_counts: Vec<SectionCountRow>,
    pub completions: Vec<CompletionRow>,
    pub quizzes: Vec<QuizRow>,
    pub attempts: Vec<AttemptRow>,
    pub overrides: Vec<OverrideRow>,
    pub certificates: Vec<CertificateRow>,
    pub access: Vec<AccessRow>,
}

impl ProgressRows {
    /// Facts for one pair by linear scan over the raw rows.
    ///
    /// This is the unbatched reference computation; [`LookupMaps::facts`]
    /// must agree with it for every pair.
    pub fn facts_for(&self, user_id: Uuid, module_id: Uuid) -> ProgressFacts {
        let total_sections = self
            .section_counts
            .iter()
            .filter(|r| r.module_id == module_id)
            .map(|r| r.total)
            .sum::<u64>();

        let completed: HashSet<Uuid> = self
            .completions
            .iter()
            .filter(|r| r.user_id == user_id && r.module_id == module_id)
            .map(|r| r.section_id)
            .collect();

        let mut quiz_rows: Vec<&QuizRow> = self
            .quizzes
            .iter()
            .filter(|q| q.module_id == module_id)
            .collect();
        quiz_rows.sort_by_key(|q| (q.position, q.quiz_id));
        let mut seen = HashSet::new();
        quiz_rows.retain(|q| seen.insert(q.quiz_id));

        let pair_attempts = || {
            self.attempts
                .iter()
                .filter(move |a| a.user_id == user_id && a.module_id == module_id)
        };

        let quizzes: Vec<QuizResult> = quiz_rows
            .iter()
            .map(|q| QuizResult {
                quiz_id: q.quiz_id,
                title: q.title.clone(),
                passed: pair_attempts().any(|a| a.quiz_id == q.quiz_id && a.passed),
            })
            .collect();

        let has_attempt =
            pair_attempts().any(|a| quiz_rows.iter().any(|q| q.quiz_id == a.quiz_id));

        let progress_override = self
            .overrides
            .iter()
            .find(|o| o.user_id == user_id && o.module_id == module_id)
            .map(|o| OverrideFact {
                allow_certificate: o.allow_certificate,
            });

        let certificate_issued = self
            .certificates
            .iter()
            .any(|c| c.user_id == user_id && c.module_id == module_id);

        let last_accessed_at = self
            .access
            .iter()
            .filter(|a| a.user_id == user_id && a.module_id == module_id)
            .map(|a| a.accessed_at)
            .max();

        ProgressFacts {
            user_id,
            module_id,
            total_sections: clamp_count(total_sections),
            completed_sections: clamp_count(completed.len() as u64),
            quizzes,
            has_attempt,
            progress_override,
            certificate_issued,
            last_accessed_at,
        }
    }
}

fn clamp_count(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Indexed view over a [`ProgressRows`] batch.
#[derive(Debug, Default)]
pub struct LookupMaps {
    section_totals: HashMap<Uuid, u64>,
    completed_sections: HashMap<Pair, HashSet<Uuid>>,
    module_quizzes: HashMap<Uuid, Vec<(Uuid, String)>>,
    passed_quizzes: HashMap<Pair, HashSet<Uuid>>,
    attempted_quizzes: HashMap<Pair, HashSet<Uuid>>,
    overrides: HashMap<Pair, OverrideFact>,
    certificates: HashSet<Pair>,
    last_access: HashMap<Pair, DateTime<Utc>>,
}

impl LookupMaps {
    pub fn build(rows: &ProgressRows) -> Self {
        let mut maps = Self::default();

        for row in &rows.section_counts {
            *maps.section_totals.entry(row.module_id).or_default() += row.total;
        }

        for row in &rows.completions {
            maps.completed_sections
                .entry((row.user_id, row.module_id))
                .or_default()
                .insert(row.section_id);
        }

        let mut ordered: Vec<&QuizRow> = rows.quizzes.iter().collect();
        ordered.sort_by_key(|q| (q.position, q.quiz_id));
        for quiz in ordered {
            let list = maps.module_quizzes.entry(quiz.module_id).or_default();
            if !list.iter().any(|(id, _)| *id == quiz.quiz_id) {
                list.push((quiz.quiz_id, quiz.title.clone()));
            }
        }

        for row in &rows.attempts {
            let pair = (row.user_id, row.module_id);
            maps.attempted_quizzes
                .entry(pair)
                .or_default()
                .insert(row.quiz_id);
            if row.passed {
                maps.passed_quizzes.entry(pair).or_default().insert(row.quiz_id);
            }
        }

        for row in &rows.overrides {
            maps.overrides.entry((row.user_id, row.module_id)).or_insert(OverrideFact {
                allow_certificate: row.allow_certificate,
            });
        }

        maps.certificates = rows
            .certificates
            .iter()
            .map(|c| (c.user_id, c.module_id))
            .collect();

        for row in &rows.access {
            maps.last_access
                .entry((row.user_id, row.module_id))
                .and_modify(|t| *t = (*t).max(row.accessed_at))
                .or_insert(row.accessed_at);
        }

        maps
    }

    pub fn total_sections(&self, module_id: Uuid) -> u32 {
        clamp_count(self.section_totals.get(&module_id).copied().unwrap_or(0))
    }

    pub fn completed_sections(&self, user_id: Uuid, module_id: Uuid) -> u32 {
        self.completed_sections
            .get(&(user_id, module_id))
            .map_or(0, |s| clamp_count(s.len() as u64))
    }

    /// Extract the deriver inputs for one pair.
    pub fn facts(&self, user_id: Uuid, module_id: Uuid) -> ProgressFacts {
        let pair = (user_id, module_id);
        let empty = HashSet::new();
        let passed = self.passed_quizzes.get(&pair).unwrap_or(&empty);
        let attempted = self.attempted_quizzes.get(&pair).unwrap_or(&empty);
        let module_quizzes = self
            .module_quizzes
            .get(&module_id)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let quizzes = module_quizzes
            .iter()
            .map(|(quiz_id, title)| QuizResult {
                quiz_id: *quiz_id,
                title: title.clone(),
                passed: passed.contains(quiz_id),
            })
            .collect();

        ProgressFacts {
            user_id,
            module_id,
            total_sections: self.total_sections(module_id),
            completed_sections: self.completed_sections(user_id, module_id),
            quizzes,
            has_attempt: module_quizzes.iter().any(|(id, _)| attempted.contains(id)),
            progress_override: self.overrides.get(&pair).copied(),
            certificate_issued: self.certificates.contains(&pair),
            last_accessed_at: self.last_access.get(&pair).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_read_as_zero() {
        let maps = LookupMaps::build(&ProgressRows::default());
        let (user, module) = (Uuid::new_v4(), Uuid::new_v4());
        let facts = maps.facts(user, module);
        assert_eq!(facts, ProgressFacts::empty(user, module));
    }

    #[test]
    fn duplicate_completions_count_once() {
        let (user, module, section) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let row = CompletionRow {
            user_id: user,
            module_id: module,
            section_id: section,
        };
        let rows = ProgressRows {
            section_counts: vec![SectionCountRow {
                module_id: module,
                total: 3,
            }],
            completions: vec![row.clone(), row],
            ..Default::default()
        };
        let maps = LookupMaps::build(&rows);
        assert_eq!(maps.completed_sections(user, module), 1);
        assert_eq!(maps.total_sections(module), 3);
        assert_eq!(rows.facts_for(user, module), maps.facts(user, module));
    }

    #[test]
    fn quizzes_follow_position_and_attempts_resolve_per_pair() {
        let (alice, bob, module) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let (q1, q2) = (Uuid::new_v4(), Uuid::new_v4());
        let rows = ProgressRows {
            quizzes: vec![
                QuizRow {
                    quiz_id: q2,
                    module_id: module,
                    title: "Final".into(),
                    position: 2,
                },
                QuizRow {
                    quiz_id: q1,
                    module_id: module,
                    title: "Warm-up".into(),
                    position: 1,
                },
            ],
            attempts: vec![
                AttemptRow {
                    user_id: alice,
                    module_id: module,
                    quiz_id: q1,
                    passed: false,
                },
                AttemptRow {
                    user_id: alice,
                    module_id: module,
                    quiz_id: q1,
                    passed: true,
                },
                AttemptRow {
                    user_id: bob,
                    module_id: module,
                    quiz_id: q2,
                    passed: false,
                },
            ],
            ..Default::default()
        };
        let maps = LookupMaps::build(&rows);

        let alice_facts = maps.facts(alice, module);
        let titles: Vec<&str> = alice_facts.quizzes.iter().map(|q| q.title.as_str()).collect();
        assert_eq!(titles, ["Warm-up", "Final"]);
        assert!(alice_facts.quizzes[0].passed);
        assert!(!alice_facts.quizzes[1].passed);
        assert!(alice_facts.has_attempt);

        let bob_facts = maps.facts(bob, module);
        assert!(bob_facts.quizzes.iter().all(|q| !q.passed));
        assert!(bob_facts.has_attempt);

        assert_eq!(rows.facts_for(alice, module), alice_facts);
        assert_eq!(rows.facts_for(bob, module), bob_facts);
    }

    #[test]
    fn latest_access_wins() {
        let (user, module) = (Uuid::new_v4(), Uuid::new_v4());
        let earlier = Utc::now() - chrono::Duration::hours(3);
        let later = Utc::now();
        let rows = ProgressRows {
            access: vec![
                AccessRow {
                    user_id: user,
                    module_id: module,
                    accessed_at: later,
                },
                AccessRow {
                    user_id: user,
                    module_id: module,
                    accessed_at: earlier,
                },
            ],
            ..Default::default()
        };
        assert_eq!(
            LookupMaps::build(&rows).facts(user, module).last_accessed_at,
            Some(later)
        );
    }
}
