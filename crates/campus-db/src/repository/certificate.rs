//! SurrealDB implementation of [`CertificateRepository`].

use campus_core::error::CampusResult;
use campus_core::models::certificate::{Certificate, IssueCertificate};
use campus_core::repository::CertificateRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::rows::{parse_uuid, single};
use crate::error::{DbError, statement_error};

#[derive(Debug, SurrealValue)]
struct CertificateRowWithId {
    record_id: String,
    tenant_id: String,
    user_id: String,
    module_id: String,
    issued_at: DateTime<Utc>,
}

impl CertificateRowWithId {
    fn try_into_certificate(self) -> Result<Certificate, DbError> {
        Ok(Certificate {
            id: parse_uuid("certificate", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            module_id: parse_uuid("module", &self.module_id)?,
            issued_at: self.issued_at,
        })
    }
}

/// SurrealDB implementation of the Certificate repository.
#[derive(Clone)]
pub struct SurrealCertificateRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCertificateRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        module_id: Uuid,
    ) -> Result<Option<Certificate>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM certificate \
                 WHERE tenant_id = $tenant_id AND user_id = $user_id \
                 AND module_id = $module_id",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .bind(("module_id", module_id.to_string()))
            .await?;

        let rows: Vec<CertificateRowWithId> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(CertificateRowWithId::try_into_certificate)
            .transpose()
    }
}

impl<C: Connection> CertificateRepository for SurrealCertificateRepository<C> {
    async fn issue(&self, input: IssueCertificate) -> CampusResult<Certificate> {
        if let Some(existing) = self
            .find(input.tenant_id, input.user_id, input.module_id)
            .await?
        {
            return Ok(existing);
        }

        let id_str = Uuid::new_v4().to_string();
        let mut result = self
            .db
            .query(
                "CREATE type::record('certificate', $id) SET \
                 tenant_id = $tenant_id, user_id = $user_id, \
                 module_id = $module_id; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('certificate', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("module_id", input.module_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("certificate", e))?;

        let rows: Vec<CertificateRowWithId> = result.take(1).map_err(DbError::from)?;
        let certificate = single(rows, "certificate", id_str)?.try_into_certificate()?;

        info!(
            tenant_id = %certificate.tenant_id,
            user_id = %certificate.user_id,
            module_id = %certificate.module_id,
            "Certificate issued"
        );
        Ok(certificate)
    }

    async fn list_for_user(&self, tenant_id: Uuid, user_id: Uuid) -> CampusResult<Vec<Certificate>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM certificate \
                 WHERE tenant_id = $tenant_id AND user_id = $user_id \
                 ORDER BY issued_at ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CertificateRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(CertificateRowWithId::try_into_certificate)
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
