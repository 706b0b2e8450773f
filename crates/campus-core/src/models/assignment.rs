//! Group → module assignment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A module assigned to every member of a group, optionally with a
/// completion deadline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleAssignment {
    pub tenant_id: Uuid,
    pub group_id: Uuid,
    pub module_id: Uuid,
    pub deadline: Option<DateTime<Utc>>,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignModule {
    pub tenant_id: Uuid,
    pub group_id: Uuid,
    pub module_id: Uuid,
    pub deadline: Option<DateTime<Utc>>,
}
