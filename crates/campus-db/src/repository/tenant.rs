//! SurrealDB implementation of [`TenantRepository`].
//!
//! Tenants are the isolation boundary of every other table. They are
//! addressed by id internally and by slug from operator tooling.

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::tenant::{CreateTenant, Tenant};
use campus_core::repository::TenantRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::rows::{parse_uuid, single};
use crate::error::{DbError, statement_error};

#[derive(Debug, SurrealValue)]
struct TenantRecord {
    record_id: String,
    name: String,
    slug: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRecord {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id: parse_uuid("tenant", &self.record_id)?,
            name: self.name,
            slug: self.slug,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Slugs appear on the command line and in URLs: lowercase ASCII
/// letters, digits and inner hyphens.
fn valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> CampusResult<Tenant> {
        if !valid_slug(&input.slug) {
            return Err(CampusError::Validation {
                message: format!("invalid tenant slug: {:?}", input.slug),
            });
        }
        let id_str = Uuid::new_v4().to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 name = $name, slug = $slug, metadata = $metadata; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('tenant', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .bind((
                "metadata",
                input
                    .metadata
                    .unwrap_or(serde_json::Value::Object(Default::default())),
            ))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("tenant", e))?;

        let rows: Vec<TenantRecord> = result.take(1).map_err(DbError::from)?;
        let tenant = single(rows, "tenant", id_str)?.try_into_tenant()?;

        info!(tenant_id = %tenant.id, slug = %tenant.slug, "Tenant created");
        Ok(tenant)
    }

    async fn get_by_id(&self, id: Uuid) -> CampusResult<Tenant> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('tenant', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRecord> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "tenant", id.to_string())?.try_into_tenant()?)
    }

    async fn get_by_slug(&self, slug: &str) -> CampusResult<Tenant> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM tenant WHERE slug = $slug")
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRecord> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "tenant", format!("slug={slug}"))?.try_into_tenant()?)
    }
}
