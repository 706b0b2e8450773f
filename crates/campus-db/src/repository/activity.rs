//! SurrealDB implementation of [`ActivityRepository`].
//!
//! Completions and access markers are keyed by `<user>_<section>` and
//! `<user>_<module>` so that repeating them never creates a second row.

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::activity::{
    ModuleAccess, QuizAttempt, RecordQuizAttempt, SectionCompletion,
};
use campus_core::repository::ActivityRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::rows::{CountRow, pair_key, parse_uuid, single, total};
use crate::error::{DbError, statement_error};

#[derive(Debug, SurrealValue)]
struct ParentRow {
    module_id: String,
}

#[derive(Debug, SurrealValue)]
struct QuizRef {
    module_id: String,
    passing_score: u32,
}

#[derive(Debug, SurrealValue)]
struct CompletionRecord {
    tenant_id: String,
    user_id: String,
    module_id: String,
    section_id: String,
    completed_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AttemptRecord {
    tenant_id: String,
    user_id: String,
    module_id: String,
    quiz_id: String,
    score: u32,
    passed: bool,
    attempted_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AccessRecord {
    tenant_id: String,
    user_id: String,
    module_id: String,
    accessed_at: DateTime<Utc>,
}

/// SurrealDB implementation of the Activity repository.
#[derive(Clone)]
pub struct SurrealActivityRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealActivityRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn ensure_user(&self, tenant_id: Uuid, user_id: Uuid) -> Result<(), DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE id = type::record('user', $id) \
                 AND tenant_id = $tenant_id GROUP ALL",
            )
            .bind(("id", user_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        if total(&rows) == 0 {
            return Err(DbError::NotFound {
                entity: "user".into(),
                id: user_id.to_string(),
            });
        }
        Ok(())
    }
}

impl<C: Connection> ActivityRepository for SurrealActivityRepository<C> {
    async fn complete_section(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        section_id: Uuid,
    ) -> CampusResult<SectionCompletion> {
        self.ensure_user(tenant_id, user_id).await?;

        let mut parent = self
            .db
            .query(
                "SELECT module_id FROM type::record('section', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", section_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<ParentRow> = parent.take(0).map_err(DbError::from)?;
        let module_id = single(rows, "section", section_id.to_string())?.module_id;

        // completed_at is only defaulted on first insert.
        let mut result = self
            .db
            .query(
                "UPSERT type::record('section_completion', $key) SET \
                 tenant_id = $tenant_id, user_id = $user_id, \
                 module_id = $module_id, section_id = $section_id",
            )
            .bind(("key", pair_key(user_id, section_id)))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .bind(("module_id", module_id))
            .bind(("section_id", section_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("section_completion", e))?;

        let rows: Vec<CompletionRecord> = result.take(0).map_err(DbError::from)?;
        let row = single(rows, "section_completion", pair_key(user_id, section_id))?;

        debug!(%tenant_id, %user_id, %section_id, "Section completed");
        Ok(SectionCompletion {
            tenant_id: parse_uuid("tenant", &row.tenant_id)?,
            user_id: parse_uuid("user", &row.user_id)?,
            module_id: parse_uuid("module", &row.module_id)?,
            section_id: parse_uuid("section", &row.section_id)?,
            completed_at: row.completed_at,
        })
    }

    async fn record_quiz_attempt(&self, input: RecordQuizAttempt) -> CampusResult<QuizAttempt> {
        if input.score > 100 {
            return Err(CampusError::Validation {
                message: format!("score {} exceeds 100", input.score),
            });
        }
        self.ensure_user(input.tenant_id, input.user_id).await?;

        let mut quiz = self
            .db
            .query(
                "SELECT module_id, passing_score FROM type::record('quiz', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", input.quiz_id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<QuizRef> = quiz.take(0).map_err(DbError::from)?;
        let quiz = single(rows, "quiz", input.quiz_id.to_string())?;
        let passed = u32::from(input.score) >= quiz.passing_score;

        let id = Uuid::new_v4();
        let mut result = self
            .db
            .query(
                "CREATE type::record('quiz_attempt', $id) SET \
                 tenant_id = $tenant_id, user_id = $user_id, \
                 module_id = $module_id, quiz_id = $quiz_id, \
                 score = $score, passed = $passed",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("module_id", quiz.module_id))
            .bind(("quiz_id", input.quiz_id.to_string()))
            .bind(("score", u32::from(input.score)))
            .bind(("passed", passed))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("quiz_attempt", e))?;

        let rows: Vec<AttemptRecord> = result.take(0).map_err(DbError::from)?;
        let row = single(rows, "quiz_attempt", id.to_string())?;

        debug!(
            tenant_id = %input.tenant_id,
            user_id = %input.user_id,
            quiz_id = %input.quiz_id,
            score = input.score,
            passed,
            "Quiz attempt recorded"
        );
        Ok(QuizAttempt {
            id,
            tenant_id: parse_uuid("tenant", &row.tenant_id)?,
            user_id: parse_uuid("user", &row.user_id)?,
            module_id: parse_uuid("module", &row.module_id)?,
            quiz_id: parse_uuid("quiz", &row.quiz_id)?,
            score: u8::try_from(row.score)
                .map_err(|_| DbError::InvalidRow(format!("score {}", row.score)))?,
            passed: row.passed,
            attempted_at: row.attempted_at,
        })
    }

    async fn record_access(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        module_id: Uuid,
    ) -> CampusResult<ModuleAccess> {
        self.ensure_user(tenant_id, user_id).await?;

        let mut check = self
            .db
            .query(
                "SELECT count() AS total FROM module \
                 WHERE id = type::record('module', $id) \
                 AND tenant_id = $tenant_id GROUP ALL",
            )
            .bind(("id", module_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let modules: Vec<CountRow> = check.take(0).map_err(DbError::from)?;
        if total(&modules) == 0 {
            return Err(DbError::NotFound {
                entity: "module".into(),
                id: module_id.to_string(),
            }
            .into());
        }

        let mut result = self
            .db
            .query(
                "UPSERT type::record('module_access', $key) SET \
                 tenant_id = $tenant_id, user_id = $user_id, \
                 module_id = $module_id, accessed_at = time::now()",
            )
            .bind(("key", pair_key(user_id, module_id)))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .bind(("module_id", module_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("module_access", e))?;

        let rows: Vec<AccessRecord> = result.take(0).map_err(DbError::from)?;
        let row = single(rows, "module_access", pair_key(user_id, module_id))?;

        Ok(ModuleAccess {
            tenant_id: parse_uuid("tenant", &row.tenant_id)?,
            user_id: parse_uuid("user", &row.user_id)?,
            module_id: parse_uuid("module", &row.module_id)?,
            accessed_at: row.accessed_at,
        })
    }
}
