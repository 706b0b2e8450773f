//! Administrative progress override.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Force-marks a module complete for a user regardless of section and
/// quiz state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressOverride {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
    /// Whether the override also permits certificate issuance.
    pub allow_certificate: bool,
    pub reason: String,
    /// Administrator who granted the override.
    pub granted_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantOverride {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub allow_certificate: bool,
    pub reason: String,
    pub granted_by: Uuid,
}
