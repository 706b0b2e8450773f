//! Completion certificates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Proof that a user was issued a certificate for a module. Presence is
/// the only fact the progress engine reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueCertificate {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
}
