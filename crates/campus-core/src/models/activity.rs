//! Learner activity: section completions, quiz attempts, module views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marks a section complete for one user. At most one per (user, section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionCompletion {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub section_id: Uuid,
    pub completed_at: DateTime<Utc>,
}

/// One submission of a quiz. A user may attempt a quiz many times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub quiz_id: Uuid,
    pub score: u8,
    pub passed: bool,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordQuizAttempt {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub score: u8,
}

/// Most recent view of a module by a user. Informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleAccess {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub accessed_at: DateTime<Utc>,
}
