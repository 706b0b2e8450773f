//! Tenant domain model.
//!
//! A tenant is one customer company. All domain entities (users, groups,
//! modules, learning activity) are scoped to a tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Company name shown to employees.
    pub name: String,
    /// URL-safe unique identifier (e.g., `acme`).
    pub slug: String,
    /// Arbitrary key-value metadata.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub slug: String,
    pub metadata: Option<serde_json::Value>,
}
