//! SurrealDB implementation of [`GroupRepository`].
//!
//! Membership is a `member_of` graph edge from `user` to `group`.

use campus_core::error::CampusResult;
use campus_core::models::group::{CreateGroup, Group, UpdateGroup};
use campus_core::models::user::User;
use campus_core::repository::{GroupRepository, PaginatedResult, Pagination};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::rows::{CountRow, parse_uuid, single, total};
use super::user::UserRowWithId;
use crate::error::{DbError, statement_error};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct GroupRow {
    tenant_id: String,
    name: String,
    description: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupRow {
    fn into_group(self, id: Uuid) -> Result<Group, DbError> {
        Ok(Group {
            id,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            name: self.name,
            description: self.description,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct GroupRowWithId {
    record_id: String,
    tenant_id: String,
    name: String,
    description: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupRowWithId {
    fn try_into_group(self) -> Result<Group, DbError> {
        let id = parse_uuid("group", &self.record_id)?;
        GroupRow {
            tenant_id: self.tenant_id,
            name: self.name,
            description: self.description,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_group(id)
    }
}

/// SurrealDB implementation of the Group repository.
#[derive(Clone)]
pub struct SurrealGroupRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGroupRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> GroupRepository for SurrealGroupRepository<C> {
    async fn create(&self, input: CreateGroup) -> CampusResult<Group> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('group', $id) SET \
                 tenant_id = $tenant_id, \
                 name = $name, description = $description, \
                 metadata = $metadata",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| statement_error("group", e))?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "group", id_str)?.into_group(id)?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> CampusResult<Group> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('group', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "group", id_str)?.into_group(id)?)
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, input: UpdateGroup) -> CampusResult<Group> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('group', $id) SET {} \
             WHERE tenant_id = $tenant_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| statement_error("group", e))?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "group", id_str)?.into_group(id)?)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> CampusResult<()> {
        let id_str = id.to_string();

        let mut check = self
            .db
            .query(
                "SELECT count() AS total FROM group \
                 WHERE id = type::record('group', $id) \
                 AND tenant_id = $tenant_id GROUP ALL",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let found: Vec<CountRow> = check.take(0).map_err(DbError::from)?;
        if total(&found) == 0 {
            return Ok(());
        }

        // Edges and assignments go first, then the group record.
        self.db
            .query(
                "DELETE member_of WHERE out = type::record('group', $id); \
                 DELETE module_assignment WHERE group_id = $id; \
                 DELETE type::record('group', $id);",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> CampusResult<PaginatedResult<Group>> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM group \
                 WHERE tenant_id = $tenant_id GROUP ALL; \
                 SELECT meta::id(id) AS record_id, * FROM group \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let rows: Vec<GroupRowWithId> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(GroupRowWithId::try_into_group)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total(&count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn add_member(&self, tenant_id: Uuid, user_id: Uuid, group_id: Uuid) -> CampusResult<()> {
        let user_id_str = user_id.to_string();
        let group_id_str = group_id.to_string();

        // Both ends must belong to the tenant; an existing edge is a no-op.
        let mut check = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE id = type::record('user', $user_id) \
                 AND tenant_id = $tenant_id GROUP ALL; \
                 SELECT count() AS total FROM group \
                 WHERE id = type::record('group', $group_id) \
                 AND tenant_id = $tenant_id GROUP ALL; \
                 SELECT count() AS total FROM member_of \
                 WHERE in = type::record('user', $user_id) \
                 AND out = type::record('group', $group_id) GROUP ALL;",
            )
            .bind(("user_id", user_id_str.clone()))
            .bind(("group_id", group_id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let user_count: Vec<CountRow> = check.take(0).map_err(DbError::from)?;
        if total(&user_count) == 0 {
            return Err(DbError::NotFound {
                entity: "user".into(),
                id: user_id_str,
            }
            .into());
        }

        let group_count: Vec<CountRow> = check.take(1).map_err(DbError::from)?;
        if total(&group_count) == 0 {
            return Err(DbError::NotFound {
                entity: "group".into(),
                id: group_id_str,
            }
            .into());
        }

        let edge_count: Vec<CountRow> = check.take(2).map_err(DbError::from)?;
        if total(&edge_count) > 0 {
            debug!(%user_id, %group_id, "Membership already present");
            return Ok(());
        }

        // RELATE requires literal record ids; both are validated UUIDs.
        let query = format!("RELATE user:`{user_id_str}` -> member_of -> group:`{group_id_str}`;");

        self.db
            .query(query)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("membership", e))?;

        Ok(())
    }

    async fn remove_member(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        group_id: Uuid,
    ) -> CampusResult<()> {
        self.db
            .query(
                "DELETE member_of WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('group', $group_id) AND \
                 out.tenant_id = $tenant_id",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn get_members(
        &self,
        tenant_id: Uuid,
        group_id: Uuid,
        pagination: Pagination,
    ) -> CampusResult<PaginatedResult<User>> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM member_of \
                 WHERE out = type::record('group', $group_id) \
                 AND in.tenant_id = $tenant_id GROUP ALL; \
                 SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE tenant_id = $tenant_id \
                 AND id IN (\
                     SELECT VALUE in FROM member_of \
                     WHERE out = type::record('group', $group_id)\
                 ) \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let rows: Vec<UserRowWithId> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(UserRowWithId::try_into_user)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total(&count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn get_user_groups(&self, tenant_id: Uuid, user_id: Uuid) -> CampusResult<Vec<Group>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM group \
                 WHERE tenant_id = $tenant_id \
                 AND id IN (\
                     SELECT VALUE out FROM member_of \
                     WHERE in = type::record('user', $user_id)\
                 ) \
                 ORDER BY name ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;

        let groups = rows
            .into_iter()
            .map(GroupRowWithId::try_into_group)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(groups)
    }
}
