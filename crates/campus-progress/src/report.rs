//! Result shapes returned by the progress service, and the per-module
//! summaries of a tenant report.

use std::collections::BTreeMap;

use campus_core::models::progress::{ModuleProgress, ProgressStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::sort;

/// Optional narrowing of a tenant-wide report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TenantProgressQuery {
    pub group_id: Option<Uuid>,
    pub module_id: Option<Uuid>,
}

/// Progress of one assigned (user, module) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantProgressEntry {
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub groups: Vec<Uuid>,
    pub deadline: Option<DateTime<Utc>>,
    pub progress: ModuleProgress,
}

impl TenantProgressEntry {
    /// Past its deadline and not completed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.progress.status != ProgressStatus::Completed
            && self.deadline.is_some_and(|d| d < now)
    }
}

/// Tenant-wide progress with the labels needed to render it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TenantProgressReport {
    pub tenant_id: Uuid,
    /// One entry per pair, ordered by `(user_id, module_id)`.
    pub entries: Vec<TenantProgressEntry>,
    pub user_names: BTreeMap<Uuid, String>,
    pub module_titles: BTreeMap<Uuid, String>,
    pub group_names: BTreeMap<Uuid, String>,
}

/// Aggregate of one module across the users it is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
    pub module_id: Uuid,
    pub title: String,
    pub assigned: u32,
    pub not_started: u32,
    pub in_progress: u32,
    pub ready_for_quiz: u32,
    pub completed: u32,
    pub overdue: u32,
    /// Mean percentage over assigned users, rounded half up.
    pub average_percentage: u8,
}

impl TenantProgressReport {
    /// Per-module aggregates, ordered by title.
    pub fn module_summaries(&self, now: DateTime<Utc>) -> Vec<ModuleSummary> {
        let mut acc: BTreeMap<Uuid, (ModuleSummary, u64)> = BTreeMap::new();

        for entry in &self.entries {
            let (summary, percent_sum) = acc.entry(entry.module_id).or_insert_with(|| {
                (
                    ModuleSummary {
                        module_id: entry.module_id,
                        title: self.module_title(entry.module_id).to_string(),
                        assigned: 0,
                        not_started: 0,
                        in_progress: 0,
                        ready_for_quiz: 0,
                        completed: 0,
                        overdue: 0,
                        average_percentage: 0,
                    },
                    0,
                )
            });

            summary.assigned += 1;
            match entry.progress.status {
                ProgressStatus::NotStarted => summary.not_started += 1,
                ProgressStatus::InProgress => summary.in_progress += 1,
                ProgressStatus::ReadyForQuiz => summary.ready_for_quiz += 1,
                ProgressStatus::Completed => summary.completed += 1,
            }
            if entry.is_overdue(now) {
                summary.overdue += 1;
            }
            *percent_sum += u64::from(entry.progress.percentage);
        }

        let mut summaries: Vec<ModuleSummary> = acc
            .into_values()
            .map(|(mut summary, percent_sum)| {
                let n = u64::from(summary.assigned.max(1));
                summary.average_percentage =
                    u8::try_from((2 * percent_sum + n) / (2 * n)).unwrap_or(100);
                summary
            })
            .collect();
        summaries.sort_by(|a, b| sort::compare_titles(&a.title, &b.title, a.module_id, b.module_id));
        summaries
    }

    /// Entries ordered for an admin table: module title, then user name.
    pub fn entries_for_display(&self) -> Vec<&TenantProgressEntry> {
        let mut rows: Vec<&TenantProgressEntry> = self.entries.iter().collect();
        rows.sort_by(|a, b| {
            sort::compare_titles(
                self.module_title(a.module_id),
                self.module_title(b.module_id),
                a.module_id,
                b.module_id,
            )
            .then_with(|| {
                sort::compare_titles(
                    self.user_name(a.user_id),
                    self.user_name(b.user_id),
                    a.user_id,
                    b.user_id,
                )
            })
        });
        rows
    }

    pub fn module_title(&self, module_id: Uuid) -> &str {
        self.module_titles.get(&module_id).map_or("", String::as_str)
    }

    pub fn user_name(&self, user_id: Uuid) -> &str {
        self.user_names.get(&user_id).map_or("", String::as_str)
    }
}

/// One module on a learner's own dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardCard {
    pub module_id: Uuid,
    pub title: String,
    pub deadline: Option<DateTime<Utc>>,
    pub progress: ModuleProgress,
}
