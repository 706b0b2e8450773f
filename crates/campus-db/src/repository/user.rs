//! SurrealDB implementation of [`UserRepository`].
//!
//! Users are created Active. Deleting a user only marks it Inactive so
//! that its completions and certificates stay attributable.

use campus_core::error::CampusResult;
use campus_core::models::user::{CreateUser, UpdateUser, User};
use campus_core::repository::{PaginatedResult, Pagination, UserRepository};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::rows::{CountRow, parse_user_status, parse_uuid, single, total, user_status_str};
use crate::error::{DbError, statement_error};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    tenant_id: String,
    username: String,
    email: String,
    display_name: String,
    status: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            username: self.username,
            email: self.email,
            display_name: self.display_name,
            status: parse_user_status(&self.status)?,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
pub(crate) struct UserRowWithId {
    record_id: String,
    tenant_id: String,
    username: String,
    email: String,
    display_name: String,
    status: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRowWithId {
    pub(crate) fn try_into_user(self) -> Result<User, DbError> {
        let id = parse_uuid("user", &self.record_id)?;
        UserRow {
            tenant_id: self.tenant_id,
            username: self.username,
            email: self.email,
            display_name: self.display_name,
            status: self.status,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_user(id)
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> CampusResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 tenant_id = $tenant_id, \
                 username = $username, email = $email, \
                 display_name = $display_name, \
                 status = 'Active', \
                 metadata = $metadata",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("username", input.username))
            .bind(("email", input.email))
            .bind(("display_name", input.display_name))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| statement_error("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "user", id_str)?.into_user(id)?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> CampusResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('user', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "user", id_str)?.into_user(id)?)
    }

    async fn get_by_username(&self, tenant_id: Uuid, username: &str) -> CampusResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE tenant_id = $tenant_id AND username = $username",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "user", format!("username={username}"))?.try_into_user()?)
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, input: UpdateUser) -> CampusResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.username.is_some() {
            sets.push("username = $username");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.display_name.is_some() {
            sets.push("display_name = $display_name");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {} \
             WHERE tenant_id = $tenant_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()));

        if let Some(username) = input.username {
            builder = builder.bind(("username", username));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(display_name) = input.display_name {
            builder = builder.bind(("display_name", display_name));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", user_status_str(status).to_string()));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| statement_error("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "user", id_str)?.into_user(id)?)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> CampusResult<()> {
        self.db
            .query(
                "UPDATE type::record('user', $id) SET \
                 status = 'Inactive', updated_at = time::now() \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> CampusResult<PaginatedResult<User>> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE tenant_id = $tenant_id GROUP ALL; \
                 SELECT meta::id(id) AS record_id, * FROM user \
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
}
