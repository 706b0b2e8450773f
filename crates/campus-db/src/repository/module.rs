//! SurrealDB implementation of [`ModuleRepository`]: modules, their
//! sections and quizzes, and group assignments.

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::assignment::{AssignModule, ModuleAssignment};
use campus_core::models::module::{
    CreateModule, CreateQuiz, CreateSection, Module, Quiz, Section, UpdateModule,
};
use campus_core::repository::{ModuleRepository, PaginatedResult, Pagination};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::rows::{
    CountRow, pair_key, parse_module_status, parse_section_kind, parse_uuid, section_kind_str,
    single, total,
};
use crate::error::{DbError, statement_error};

#[derive(Debug, SurrealValue)]
struct ModuleRowWithId {
    record_id: String,
    tenant_id: String,
    title: String,
    description: String,
    status: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ModuleRowWithId {
    fn try_into_module(self) -> Result<Module, DbError> {
        Ok(Module {
            id: parse_uuid("module", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            title: self.title,
            description: self.description,
            status: parse_module_status(&self.status)?,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct SectionRowWithId {
    record_id: String,
    tenant_id: String,
    module_id: String,
    title: String,
    kind: String,
    position: u32,
    created_at: DateTime<Utc>,
}

impl SectionRowWithId {
    fn try_into_section(self) -> Result<Section, DbError> {
        Ok(Section {
            id: parse_uuid("section", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            module_id: parse_uuid("module", &self.module_id)?,
            title: self.title,
            kind: parse_section_kind(&self.kind)?,
            position: self.position,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct QuizRowWithId {
    record_id: String,
    tenant_id: String,
    module_id: String,
    title: String,
    position: u32,
    passing_score: u32,
    created_at: DateTime<Utc>,
}

impl QuizRowWithId {
    fn try_into_quiz(self) -> Result<Quiz, DbError> {
        let passing_score = u8::try_from(self.passing_score)
            .map_err(|_| DbError::InvalidRow(format!("passing score {}", self.passing_score)))?;
        Ok(Quiz {
            id: parse_uuid("quiz", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            module_id: parse_uuid("module", &self.module_id)?,
            title: self.title,
            position: self.position,
            passing_score,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct AssignmentRecord {
    tenant_id: String,
    group_id: String,
    module_id: String,
    deadline: Option<DateTime<Utc>>,
    assigned_at: DateTime<Utc>,
}

impl AssignmentRecord {
    fn try_into_assignment(self) -> Result<ModuleAssignment, DbError> {
        Ok(ModuleAssignment {
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            group_id: parse_uuid("group", &self.group_id)?,
            module_id: parse_uuid("module", &self.module_id)?,
            deadline: self.deadline,
            assigned_at: self.assigned_at,
        })
    }
}

/// SurrealDB implementation of the Module repository.
#[derive(Clone)]
pub struct SurrealModuleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealModuleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Fail with `NotFound` unless the module exists in the tenant.
    async fn ensure_module(&self, tenant_id: Uuid, module_id: Uuid) -> Result<(), DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM module \
                 WHERE id = type::record('module', $id) \
                 AND tenant_id = $tenant_id GROUP ALL",
            )
            .bind(("id", module_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        if total(&rows) == 0 {
            return Err(DbError::NotFound {
                entity: "module".into(),
                id: module_id.to_string(),
            });
        }
        Ok(())
    }

    async fn fetch_module(&self, tenant_id: Uuid, id: Uuid) -> Result<Module, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM type::record('module', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await?;
        let rows: Vec<ModuleRowWithId> = result.take(0)?;
        single(rows, "module", id_str)?.try_into_module()
    }
}

impl<C: Connection> ModuleRepository for SurrealModuleRepository<C> {
    async fn create(&self, input: CreateModule) -> CampusResult<Module> {
        let id = Uuid::new_v4();
        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        self.db
            .query(
                "CREATE type::record('module', $id) SET \
                 tenant_id = $tenant_id, \
                 title = $title, description = $description, \
                 status = 'Draft', metadata = $metadata",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("title", input.title))
            .bind(("description", input.description))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("module", e))?;

        Ok(self.fetch_module(input.tenant_id, id).await?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> CampusResult<Module> {
        Ok(self.fetch_module(tenant_id, id).await?)
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, input: UpdateModule) -> CampusResult<Module> {
        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('module', $id) SET {} \
             WHERE tenant_id = $tenant_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("module", e))?;

        Ok(self.fetch_module(tenant_id, id).await?)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> CampusResult<PaginatedResult<Module>> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM module \
                 WHERE tenant_id = $tenant_id GROUP ALL; \
                 SELECT meta::id(id) AS record_id, * FROM module \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY title ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let rows: Vec<ModuleRowWithId> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(ModuleRowWithId::try_into_module)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total(&count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn add_section(&self, input: CreateSection) -> CampusResult<Section> {
        self.ensure_module(input.tenant_id, input.module_id).await?;
        let id_str = Uuid::new_v4().to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('section', $id) SET \
                 tenant_id = $tenant_id, module_id = $module_id, \
                 title = $title, kind = $kind, position = $position; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('section', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("module_id", input.module_id.to_string()))
            .bind(("title", input.title))
            .bind(("kind", section_kind_str(input.kind).to_string()))
            .bind(("position", input.position))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("section", e))?;

        let rows: Vec<SectionRowWithId> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, "section", id_str)?.try_into_section()?)
    }

    async fn list_sections(&self, tenant_id: Uuid, module_id: Uuid) -> CampusResult<Vec<Section>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM section \
                 WHERE tenant_id = $tenant_id AND module_id = $module_id \
                 ORDER BY position ASC, record_id ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("module_id", module_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SectionRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(SectionRowWithId::try_into_section)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn delete_section(&self, tenant_id: Uuid, section_id: Uuid) -> CampusResult<()> {
        // Completions only carry the section id, so scope them by tenant too.
        self.db
            .query(
                "DELETE section_completion \
                 WHERE tenant_id = $tenant_id AND section_id = $id; \
                 DELETE type::record('section', $id) WHERE tenant_id = $tenant_id;",
            )
            .bind(("id", section_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(%tenant_id, %section_id, "Section deleted");
        Ok(())
    }

    async fn add_quiz(&self, input: CreateQuiz) -> CampusResult<Quiz> {
        if input.passing_score > 100 {
            return Err(CampusError::Validation {
                message: format!("passing score {} exceeds 100", input.passing_score),
            });
        }
        self.ensure_module(input.tenant_id, input.module_id).await?;
        let id_str = Uuid::new_v4().to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('quiz', $id) SET \
                 tenant_id = $tenant_id, module_id = $module_id, \
                 title = $title, position = $position, \
                 passing_score = $passing_score; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('quiz', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("module_id", input.module_id.to_string()))
            .bind(("title", input.title))
            .bind(("position", input.position))
            .bind(("passing_score", u32::from(input.passing_score)))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("quiz", e))?;

        let rows: Vec<QuizRowWithId> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, "quiz", id_str)?.try_into_quiz()?)
    }

    async fn list_quizzes(&self, tenant_id: Uuid, module_id: Uuid) -> CampusResult<Vec<Quiz>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM quiz \
                 WHERE tenant_id = $tenant_id AND module_id = $module_id \
                 ORDER BY position ASC, record_id ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("module_id", module_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<QuizRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(QuizRowWithId::try_into_quiz)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn delete_quiz(&self, tenant_id: Uuid, quiz_id: Uuid) -> CampusResult<()> {
        self.db
            .query(
                "DELETE quiz_attempt WHERE tenant_id = $tenant_id AND quiz_id = $id; \
                 DELETE type::record('quiz', $id) WHERE tenant_id = $tenant_id;",
            )
            .bind(("id", quiz_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(%tenant_id, %quiz_id, "Quiz deleted");
        Ok(())
    }

    async fn assign_to_group(&self, input: AssignModule) -> CampusResult<ModuleAssignment> {
        self.ensure_module(input.tenant_id, input.module_id).await?;

        let mut check = self
            .db
            .query(
                "SELECT count() AS total FROM group \
                 WHERE id = type::record('group', $group_id) \
                 AND tenant_id = $tenant_id GROUP ALL",
            )
            .bind(("group_id", input.group_id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let groups: Vec<CountRow> = check.take(0).map_err(DbError::from)?;
        if total(&groups) == 0 {
            return Err(DbError::NotFound {
                entity: "group".into(),
                id: input.group_id.to_string(),
            }
            .into());
        }

        // One record per (group, module); re-assigning replaces the deadline
        // and keeps the original assignment time.
        let key = pair_key(input.group_id, input.module_id);
        let mut result = self
            .db
            .query(
                "UPSERT type::record('module_assignment', $key) SET \
                 tenant_id = $tenant_id, group_id = $group_id, \
                 module_id = $module_id, deadline = $deadline",
            )
            .bind(("key", key.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("group_id", input.group_id.to_string()))
            .bind(("module_id", input.module_id.to_string()))
            .bind(("deadline", input.deadline))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("assignment", e))?;

        let rows: Vec<AssignmentRecord> = result.take(0).map_err(DbError::from)?;
        let assignment = single(rows, "module_assignment", key)?.try_into_assignment()?;

        info!(
            tenant_id = %assignment.tenant_id,
            group_id = %assignment.group_id,
            module_id = %assignment.module_id,
            deadline = ?assignment.deadline,
            "Module assigned"
        );
        Ok(assignment)
    }

    async fn unassign_from_group(
        &self,
        tenant_id: Uuid,
        group_id: Uuid,
        module_id: Uuid,
    ) -> CampusResult<()> {
        self.db
            .query(
                "DELETE type::record('module_assignment', $key) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("key", pair_key(group_id, module_id)))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_assignments(
        &self,
        tenant_id: Uuid,
        module_id: Uuid,
    ) -> CampusResult<Vec<ModuleAssignment>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM module_assignment \
                 WHERE tenant_id = $tenant_id AND module_id = $module_id \
                 ORDER BY group_id ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("module_id", module_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AssignmentRecord> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(AssignmentRecord::try_into_assignment)
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
