//! Error types for the Campus system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CampusError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Tenant context missing or invalid")]
    TenantContext,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CampusResult<T> = Result<T, CampusError>;
