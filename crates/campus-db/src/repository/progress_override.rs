//! SurrealDB implementation of [`OverrideRepository`].

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::progress_override::{GrantOverride, ProgressOverride};
use campus_core::repository::OverrideRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::rows::{CountRow, pair_key, parse_uuid, single, total};
use crate::error::{DbError, statement_error};

#[derive(Debug, SurrealValue)]
struct OverrideRecord {
    tenant_id: String,
    user_id: String,
    module_id: String,
    allow_certificate: bool,
    reason: String,
    granted_by: String,
    created_at: DateTime<Utc>,
}

impl OverrideRecord {
    fn try_into_override(self) -> Result<ProgressOverride, DbError> {
        Ok(ProgressOverride {
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            module_id: parse_uuid("module", &self.module_id)?,
            allow_certificate: self.allow_certificate,
            reason: self.reason,
            granted_by: parse_uuid("granted_by", &self.granted_by)?,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Override repository.
#[derive(Clone)]
pub struct SurrealOverrideRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOverrideRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OverrideRepository for SurrealOverrideRepository<C> {
    async fn grant(&self, input: GrantOverride) -> CampusResult<ProgressOverride> {
        if input.reason.trim().is_empty() {
            return Err(CampusError::Validation {
                message: "override reason must not be empty".into(),
            });
        }

        let mut check = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE id = type::record('user', $user_id) \
                 AND tenant_id = $tenant_id GROUP ALL; \
                 SELECT count() AS total FROM module \
                 WHERE id = type::record('module', $module_id) \
                 AND tenant_id = $tenant_id GROUP ALL;",
            )
            .bind(("user_id", input.user_id.to_string()))
            .bind(("module_id", input.module_id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let users: Vec<CountRow> = check.take(0).map_err(DbError::from)?;
        if total(&users) == 0 {
            return Err(DbError::NotFound {
                entity: "user".into(),
                id: input.user_id.to_string(),
            }
            .into());
        }
        let modules: Vec<CountRow> = check.take(1).map_err(DbError::from)?;
        if total(&modules) == 0 {
            return Err(DbError::NotFound {
                entity: "module".into(),
                id: input.module_id.to_string(),
            }
            .into());
        }

        let key = pair_key(input.user_id, input.module_id);
        let mut result = self
            .db
            .query(
                "UPSERT type::record('progress_override', $key) SET \
                 tenant_id = $tenant_id, user_id = $user_id, \
                 module_id = $module_id, \
                 allow_certificate = $allow_certificate, \
                 reason = $reason, granted_by = $granted_by, \
                 created_at = time::now()",
            )
            .bind(("key", key.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("module_id", input.module_id.to_string()))
            .bind(("allow_certificate", input.allow_certificate))
            .bind(("reason", input.reason))
            .bind(("granted_by", input.granted_by.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("progress_override", e))?;

        let rows: Vec<OverrideRecord> = result.take(0).map_err(DbError::from)?;
        let granted = single(rows, "progress_override", key)?.try_into_override()?;

        info!(
            tenant_id = %granted.tenant_id,
            user_id = %granted.user_id,
            module_id = %granted.module_id,
            granted_by = %granted.granted_by,
            allow_certificate = granted.allow_certificate,
            "Progress override granted"
        );
        Ok(granted)
    }

    async fn revoke(&self, tenant_id: Uuid, user_id: Uuid, module_id: Uuid) -> CampusResult<()> {
        self.db
            .query(
                "DELETE type::record('progress_override', $key) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("key", pair_key(user_id, module_id)))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        info!(%tenant_id, %user_id, %module_id, "Progress override revoked");
        Ok(())
    }

    async fn get(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        module_id: Uuid,
    ) -> CampusResult<Option<ProgressOverride>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('progress_override', $key) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("key", pair_key(user_id, module_id)))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OverrideRecord> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(OverrideRecord::try_into_override)
            .transpose()?)
    }
}
