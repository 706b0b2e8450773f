//! Property-based tests for the progress deriver and lookup maps.
//!
//! # How to run
//!
//! ```bash
//! cargo test -p campus-progress --test property_tests
//! PROPTEST_CASES=5000 cargo test -p campus-progress --test property_tests
//! ```
//!
//! Row batches are generated over small id pools so that duplicate
//! completions, repeated attempts and cross-pair rows occur often.

use campus_core::models::progress::{
    AccessRow, AttemptRow, CertificateRow, CompletionRow, OverrideRow, ProgressStatus, QuizResult,
    QuizRow, SectionCountRow,
};
use campus_progress::{
    LookupMaps, OverrideFact, ProgressFacts, ProgressRows, derive_progress, percentage,
};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

fn pool(n: u128) -> Vec<Uuid> {
    (1..=n).map(Uuid::from_u128).collect()
}

fn arb_facts() -> impl Strategy<Value = ProgressFacts> {
    (
        0u32..20,
        0u32..25,
        prop::collection::vec(any::<bool>(), 0..5),
        any::<bool>(),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(total, completed, passes, has_attempt, allow)| ProgressFacts {
            total_sections: total,
            completed_sections: completed,
            quizzes: passes
                .into_iter()
                .enumerate()
                .map(|(i, passed)| QuizResult {
                    quiz_id: Uuid::from_u128(i as u128 + 1),
                    title: format!("Quiz {i}"),
                    passed,
                })
                .collect(),
            has_attempt,
            progress_override: allow.map(|allow_certificate| OverrideFact { allow_certificate }),
            ..ProgressFacts::empty(Uuid::from_u128(7), Uuid::from_u128(9))
        })
}

fn arb_rows() -> impl Strategy<Value = ProgressRows> {
    let users = pool(3);
    let modules = pool(3);
    let sections = pool(6);
    let quizzes = pool(4);

    let u = prop::sample::select(users);
    let m = prop::sample::select(modules);
    let s = prop::sample::select(sections);
    let q = prop::sample::select(quizzes);

    (
        prop::collection::vec((m.clone(), 0u64..5), 0..4),
        prop::collection::vec((u.clone(), m.clone(), s), 0..12),
        prop::collection::vec((q.clone(), m.clone(), 0u32..4), 0..6),
        prop::collection::vec((u.clone(), m.clone(), q, any::<bool>()), 0..12),
        prop::collection::vec((u.clone(), m.clone(), any::<bool>()), 0..3),
        prop::collection::vec((u.clone(), m.clone()), 0..3),
        prop::collection::vec((u, m, 0i64..1_000), 0..6),
    )
        .prop_map(
            |(counts, completions, quizzes, attempts, overrides, certificates, access)| {
                ProgressRows {
                    section_counts: counts
                        .into_iter()
                        .map(|(module_id, total)| SectionCountRow { module_id, total })
                        .collect(),
                    completions: completions
                        .into_iter()
                        .map(|(user_id, module_id, section_id)| CompletionRow {
                            user_id,
                            module_id,
                            section_id,
                        })
                        .collect(),
                    quizzes: quizzes
                        .into_iter()
                        .map(|(quiz_id, module_id, position)| QuizRow {
                            quiz_id,
                            module_id,
                            title: format!("Quiz at {position}"),
                            position,
                        })
                        .collect(),
                    attempts: attempts
                        .into_iter()
                        .map(|(user_id, module_id, quiz_id, passed)| AttemptRow {
                            user_id,
                            module_id,
                            quiz_id,
                            passed,
                        })
                        .collect(),
                    overrides: overrides
                        .into_iter()
                        .map(|(user_id, module_id, allow_certificate)| OverrideRow {
                            user_id,
                            module_id,
                            allow_certificate,
                        })
                        .collect(),
                    certificates: certificates
                        .into_iter()
                        .map(|(user_id, module_id)| CertificateRow { user_id, module_id })
                        .collect(),
                    access: access
                        .into_iter()
                        .map(|(user_id, module_id, minutes)| AccessRow {
                            user_id,
                            module_id,
                            accessed_at: Utc.timestamp_opt(1_700_000_000 + minutes * 60, 0).unwrap(),
                        })
                        .collect(),
                }
            },
        )
}

proptest! {
    /// Percentage never leaves 0..=100 and completed steps never exceed total.
    #[test]
    fn prop_percentage_bounded(facts in arb_facts()) {
        let p = derive_progress(&facts);
        prop_assert!(p.percentage <= 100);
        prop_assert!(p.completed_steps <= p.total_steps);
    }

    /// A module without sections or quizzes always reports 0 percent.
    #[test]
    fn prop_zero_steps_is_zero_percent(completed in 0u32..10, has_attempt in any::<bool>()) {
        let facts = ProgressFacts {
            completed_sections: completed,
            has_attempt,
            ..ProgressFacts::empty(Uuid::new_v4(), Uuid::new_v4())
        };
        let p = derive_progress(&facts);
        prop_assert_eq!(p.total_steps, 0);
        prop_assert_eq!(p.percentage, 0);
    }

    /// Integer rounding matches the half-up rounding of the exact ratio.
    #[test]
    fn prop_percentage_rounds_half_up(total in 1u32..500, completed in 0u32..500) {
        let c = completed.min(total);
        let expected = (100.0 * f64::from(c) / f64::from(total) + 0.5).floor() as u8;
        prop_assert_eq!(percentage(completed, total), expected);
    }

    /// Adding an override completes the pair without touching counts, and
    /// never takes certificate eligibility away.
    #[test]
    fn prop_override_is_monotone(facts in arb_facts(), allow in any::<bool>()) {
        let mut without = facts.clone();
        without.progress_override = None;
        let mut with = facts;
        with.progress_override = Some(OverrideFact { allow_certificate: allow });

        let before = derive_progress(&without);
        let after = derive_progress(&with);

        prop_assert_eq!(after.status, ProgressStatus::Completed);
        prop_assert_eq!(after.percentage, before.percentage);
        prop_assert_eq!(after.completed_steps, before.completed_steps);
        prop_assert!(!before.certificate_eligible || after.certificate_eligible);
    }

    /// Certificate eligibility holds exactly when naturally complete or the
    /// override allows it.
    #[test]
    fn prop_certificate_eligibility(facts in arb_facts()) {
        let p = derive_progress(&facts);
        let natural = p.completed_sections >= p.total_sections && p.passed_quizzes == p.total_quizzes;
        prop_assert_eq!(p.certificate_eligible, natural || p.override_allows_certificate);
    }

    /// Indexed extraction agrees with the per-pair scan for every pair.
    #[test]
    fn prop_lookup_matches_scan(rows in arb_rows()) {
        let maps = LookupMaps::build(&rows);
        for user in pool(3) {
            for module in pool(3) {
                let scanned = rows.facts_for(user, module);
                let indexed = maps.facts(user, module);
                prop_assert_eq!(&indexed, &scanned);
                prop_assert_eq!(derive_progress(&indexed), derive_progress(&scanned));
            }
        }
    }

    /// Deriving twice from the same rows yields identical records.
    #[test]
    fn prop_derivation_idempotent(rows in arb_rows()) {
        let first = LookupMaps::build(&rows);
        let second = LookupMaps::build(&rows);
        for user in pool(3) {
            for module in pool(3) {
                prop_assert_eq!(
                    derive_progress(&first.facts(user, module)),
                    derive_progress(&second.facts(user, module))
                );
            }
        }
    }
}
