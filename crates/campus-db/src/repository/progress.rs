//! SurrealDB implementation of [`ProgressSource`].
//!
//! Every method is a single statement filtered by tenant and by the
//! given id lists (`IN $ids`), so the number of round trips of a batch
//! does not depend on how many users or modules it covers. Empty id
//! lists short-circuit without touching the database.

use campus_core::error::CampusResult;
use campus_core::models::progress::{
    AccessRow, AssignmentRow, AttemptRow, CertificateRow, CompletionRow, GroupLabel,
    MembershipRow, ModuleLabel, OverrideRow, QuizRow, SectionCountRow, UserLabel,
};
use campus_core::repository::ProgressSource;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::rows::{id_strings, parse_module_status, parse_user_status, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SectionCountRecord {
    module_id: String,
    total: u64,
}

#[derive(Debug, SurrealValue)]
struct CompletionRecord {
    user_id: String,
    module_id: String,
    section_id: String,
}

#[derive(Debug, SurrealValue)]
struct QuizRecord {
    quiz_id: String,
    module_id: String,
    title: String,
    position: u32,
}

#[derive(Debug, SurrealValue)]
struct AttemptRecord {
    user_id: String,
    module_id: String,
    quiz_id: String,
    passed: bool,
}

#[derive(Debug, SurrealValue)]
struct OverrideRecord {
    user_id: String,
    module_id: String,
    allow_certificate: bool,
}

#[derive(Debug, SurrealValue)]
struct PairRecord {
    user_id: String,
    module_id: String,
}

#[derive(Debug, SurrealValue)]
struct AccessRecord {
    user_id: String,
    module_id: String,
    accessed_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct MembershipRecord {
    user_id: String,
    group_id: String,
}

#[derive(Debug, SurrealValue)]
struct AssignmentRecord {
    group_id: String,
    module_id: String,
    deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, SurrealValue)]
struct UserLabelRecord {
    user_id: String,
    display_name: String,
    status: String,
}

#[derive(Debug, SurrealValue)]
struct ModuleLabelRecord {
    module_id: String,
    title: String,
    status: String,
}

#[derive(Debug, SurrealValue)]
struct GroupLabelRecord {
    group_id: String,
    name: String,
}

/// Bulk reads backing the progress engine.
#[derive(Clone)]
pub struct SurrealProgressSource<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProgressSource<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProgressSource for SurrealProgressSource<C> {
    async fn section_counts(
        &self,
        tenant_id: Uuid,
        module_ids: &[Uuid],
    ) -> CampusResult<Vec<SectionCountRow>> {
        if module_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut result = self
            .db
            .query(
                "SELECT module_id, count() AS total FROM section \
                 WHERE tenant_id = $tenant_id AND module_id IN $module_ids \
                 GROUP BY module_id"
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("module_ids", id_strings(module_ids)))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<SectionCountRecord> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|r| -> Result<_, DbError> {
                Ok(SectionCountRow {
                    module_id: parse_uuid("module", &r.module_id)?,
                    total: r.total,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn completions(
        &self,
        tenant_id: Uuid,
        user_ids: &[Uuid],
        module_ids: &[Uuid],
    ) -> CampusResult<Vec<CompletionRow>> {
        if user_ids.is_empty() || module_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut result = self
            .db
            .query(
                "SELECT user_id, module_id, section_id FROM section_completion \
                 WHERE tenant_id = $tenant_id \
                 AND user_id IN $user_ids AND module_id IN $module_ids"
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("user_ids", id_strings(user_ids)))
            .bind(("module_ids", id_strings(module_ids)))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CompletionRecord> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|r| -> Result<_, DbError> {
                Ok(CompletionRow {
                    user_id: parse_uuid("user", &r.user_id)?,
                    module_id: parse_uuid("module", &r.module_id)?,
                    section_id: parse_uuid("section", &r.section_id)?,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn quizzes(&self, tenant_id: Uuid, module_ids: &[Uuid]) -> CampusResult<Vec<QuizRow>> {
        if module_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS quiz_id, module_id, title, position FROM quiz \
                 WHERE tenant_id = $tenant_id AND module_id IN $module_ids"
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("module_ids", id_strings(module_ids)))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<QuizRecord> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|r| -> Result<_, DbError> {
                Ok(QuizRow {
                    quiz_id: parse_uuid("quiz", &r.quiz_id)?,
                    module_id: parse_uuid("module", &r.module_id)?,
                    title: r.title,
                    position: r.position,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn quiz_attempts(
        &self,
        tenant_id: Uuid,
        user_ids: &[Uuid],
        module_ids: &[Uuid],
    ) -> CampusResult<Vec<AttemptRow>> {
        if user_ids.is_empty() || module_ids.is_empty() {
            return Ok(Vec::new());
        }
        // Repeated attempts with the same outcome collapse into one row.
        let mut result = self
            .db
            .query(
                "SELECT user_id, module_id, quiz_id, passed FROM quiz_attempt \
                 WHERE tenant_id = $tenant_id \
                 AND user_id IN $user_ids AND module_id IN $module_ids \
                 GROUP BY user_id, module_id, quiz_id, passed"
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("user_ids", id_strings(user_ids)))
            .bind(("module_ids", id_strings(module_ids)))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<AttemptRecord> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|r| -> Result<_, DbError> {
                Ok(AttemptRow {
                    user_id: parse_uuid("user", &r.user_id)?,
                    module_id: parse_uuid("module", &r.module_id)?,
                    quiz_id: parse_uuid("quiz", &r.quiz_id)?,
                    passed: r.passed,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn overrides(
        &self,
        tenant_id: Uuid,
        user_ids: &[Uuid],
        module_ids: &[Uuid],
    ) -> CampusResult<Vec<OverrideRow>> {
        if user_ids.is_empty() || module_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut result = self
            .db
            .query(
                "SELECT user_id, module_id, allow_certificate FROM progress_override \
                 WHERE tenant_id = $tenant_id \
                 AND user_id IN $user_ids AND module_id IN $module_ids"
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("user_ids", id_strings(user_ids)))
            .bind(("module_ids", id_strings(module_ids)))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<OverrideRecord> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|r| -> Result<_, DbError> {
                Ok(OverrideRow {
                    user_id: parse_uuid("user", &r.user_id)?,
                    module_id: parse_uuid("module", &r.module_id)?,
                    allow_certificate: r.allow_certificate,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn certificates(
        &self,
        tenant_id: Uuid,
        user_ids: &[Uuid],
        module_ids: &[Uuid],
    ) -> CampusResult<Vec<CertificateRow>> {
        if user_ids.is_empty() || module_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut result = self
            .db
            .query(
                "SELECT user_id, module_id FROM certificate \
                 WHERE tenant_id = $tenant_id \
                 AND user_id IN $user_ids AND module_id IN $module_ids"
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("user_ids", id_strings(user_ids)))
            .bind(("module_ids", id_strings(module_ids)))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<PairRecord> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|r| -> Result<_, DbError> {
                Ok(CertificateRow {
                    user_id: parse_uuid("user", &r.user_id)?,
                    module_id: parse_uuid("module", &r.module_id)?,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn last_access(
        &self,
        tenant_id: Uuid,
        user_ids: &[Uuid],
        module_ids: &[Uuid],
    ) -> CampusResult<Vec<AccessRow>> {
        if user_ids.is_empty() || module_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut result = self
            .db
            .query(
                "SELECT user_id, module_id, accessed_at FROM module_access \
                 WHERE tenant_id = $tenant_id \
                 AND user_id IN $user_ids AND module_id IN $module_ids"
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("user_ids", id_strings(user_ids)))
            .bind(("module_ids", id_strings(module_ids)))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<AccessRecord> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|r| -> Result<_, DbError> {
                Ok(AccessRow {
                    user_id: parse_uuid("user", &r.user_id)?,
                    module_id: parse_uuid("module", &r.module_id)?,
                    accessed_at: r.accessed_at,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn memberships(
        &self,
        tenant_id: Uuid,
        user_id: Option<Uuid>,
    ) -> CampusResult<Vec<MembershipRow>> {
        let sql = match user_id {
            Some(_) => {
                "SELECT meta::id(in) AS user_id, meta::id(out) AS group_id FROM member_of \
                 WHERE in = type::record('user', $user_id) \
                 AND in.tenant_id = $tenant_id AND out.tenant_id = $tenant_id"
            }
            None => {
                "SELECT meta::id(in) AS user_id, meta::id(out) AS group_id FROM member_of \
                 WHERE in.tenant_id = $tenant_id AND out.tenant_id = $tenant_id"
            }
        };

        let mut builder = self.db.query(sql).bind(("tenant_id", tenant_id.to_string()));
        if let Some(user_id) = user_id {
            builder = builder.bind(("user_id", user_id.to_string()));
        }
        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<MembershipRecord> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|r| -> Result<_, DbError> {
                Ok(MembershipRow {
                    user_id: parse_uuid("user", &r.user_id)?,
                    group_id: parse_uuid("group", &r.group_id)?,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn assignments(&self, tenant_id: Uuid) -> CampusResult<Vec<AssignmentRow>> {
        let mut result = self
            .db
            .query(
                "SELECT group_id, module_id, deadline FROM module_assignment \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<AssignmentRecord> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|r| -> Result<_, DbError> {
                Ok(AssignmentRow {
                    group_id: parse_uuid("group", &r.group_id)?,
                    module_id: parse_uuid("module", &r.module_id)?,
                    deadline: r.deadline,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn user_labels(&self, tenant_id: Uuid, user_ids: &[Uuid]) -> CampusResult<Vec<UserLabel>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS user_id, display_name, status FROM user \
                 WHERE tenant_id = $tenant_id AND meta::id(id) IN $ids",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("ids", id_strings(user_ids)))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<UserLabelRecord> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|r| -> Result<_, DbError> {
                Ok(UserLabel {
                    user_id: parse_uuid("user", &r.user_id)?,
                    display_name: r.display_name,
                    status: parse_user_status(&r.status)?,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn module_labels(
        &self,
        tenant_id: Uuid,
        module_ids: &[Uuid],
    ) -> CampusResult<Vec<ModuleLabel>> {
        if module_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS module_id, title, status FROM module \
                 WHERE tenant_id = $tenant_id AND meta::id(id) IN $ids",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("ids", id_strings(module_ids)))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<ModuleLabelRecord> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|r| -> Result<_, DbError> {
                Ok(ModuleLabel {
                    module_id: parse_uuid("module", &r.module_id)?,
                    title: r.title,
                    status: parse_module_status(&r.status)?,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn group_labels(
        &self,
        tenant_id: Uuid,
        group_ids: &[Uuid],
    ) -> CampusResult<Vec<GroupLabel>> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS group_id, name FROM group \
                 WHERE tenant_id = $tenant_id AND meta::id(id) IN $ids",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("ids", id_strings(group_ids)))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<GroupLabelRecord> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|r| -> Result<_, DbError> {
                Ok(GroupLabel {
                    group_id: parse_uuid("group", &r.group_id)?,
                    name: r.name,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
