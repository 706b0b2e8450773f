//! Progress engine error types.

use campus_core::error::CampusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("too many modules requested: {requested} (limit {limit})")]
    TooManyModules { requested: usize, limit: usize },

    #[error("request context carries no tenant")]
    MissingTenant,
}

impl From<ProgressError> for CampusError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::TooManyModules { .. } => CampusError::Validation {
                message: err.to_string(),
            },
            ProgressError::MissingTenant => CampusError::TenantContext,
        }
    }
}
