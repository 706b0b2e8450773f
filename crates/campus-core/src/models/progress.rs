//! Module progress: the derived per-(user, module) record and the raw
//! rows the progress engine reads in bulk.
//!
//! `ModuleProgress` is never persisted; it is recomputed on demand from
//! the rows below.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::module::ModuleStatus;
use super::user::UserStatus;

/// Derived progress status of one user on one module.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    ReadyForQuiz,
    Completed,
}

/// Pass state of a single quiz for one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizResult {
    pub quiz_id: Uuid,
    pub title: String,
    pub passed: bool,
}

/// Computed progress of one user on one module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleProgress {
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub total_sections: u32,
    pub completed_sections: u32,
    pub total_quizzes: u32,
    pub passed_quizzes: u32,
    /// Sections plus quizzes.
    pub total_steps: u32,
    /// Completed sections plus passed quizzes.
    pub completed_steps: u32,
    /// Always within `0..=100`; `0` when the module has no steps.
    pub percentage: u8,
    pub status: ProgressStatus,
    /// One entry per quiz of the module, in quiz position order.
    pub quiz_results: Vec<QuizResult>,
    pub has_override: bool,
    pub override_allows_certificate: bool,
    /// Whether a certificate may be issued for this pair. Always false for
    /// a module id that does not exist in the tenant.
    pub certificate_eligible: bool,
    pub certificate_issued: bool,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Bulk read rows
// ---------------------------------------------------------------------------

/// Number of sections in a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionCountRow {
    pub module_id: Uuid,
    pub total: u64,
}

/// A section completion, carrying its owning module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRow {
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub section_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRow {
    pub quiz_id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub position: u32,
}

/// A distinct `(user, quiz, passed)` outcome. Repeated attempts with the
/// same outcome may be collapsed by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRow {
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub quiz_id: Uuid,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRow {
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub allow_certificate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRow {
    pub user_id: Uuid,
    pub module_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRow {
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub accessed_at: DateTime<Utc>,
}

/// User → group membership edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipRow {
    pub user_id: Uuid,
    pub group_id: Uuid,
}

/// Group → module assignment edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRow {
    pub group_id: Uuid,
    pub module_id: Uuid,
    pub deadline: Option<DateTime<Utc>>,
}

/// Display label and status of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserLabel {
    pub user_id: Uuid,
    pub display_name: String,
    pub status: UserStatus,
}

/// Display label and status of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLabel {
    pub module_id: Uuid,
    pub title: String,
    pub status: ModuleStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLabel {
    pub group_id: Uuid,
    pub name: String,
}
