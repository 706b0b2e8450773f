//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "catalog_and_membership",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "learner_activity",
        sql: SCHEMA_V2,
    },
];

// -----------------------------------------------------------------------
// Schema v1 — tenants, users, groups and the module catalog
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants (global scope)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD slug ON TABLE tenant TYPE string;
DEFINE FIELD metadata ON TABLE tenant TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_slug ON TABLE tenant COLUMNS slug UNIQUE;

-- =======================================================================
-- Users (tenant scope)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE user TYPE string;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD display_name ON TABLE user TYPE string;
DEFINE FIELD status ON TABLE user TYPE string \
    ASSERT $value IN ['Active', 'Inactive', 'Locked', \
    'PendingVerification'];
DEFINE FIELD metadata ON TABLE user TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_tenant_username ON TABLE user \
    COLUMNS tenant_id, username UNIQUE;
DEFINE INDEX idx_user_tenant_email ON TABLE user \
    COLUMNS tenant_id, email UNIQUE;

-- =======================================================================
-- Groups (tenant scope)
-- =======================================================================
DEFINE TABLE group SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE group TYPE string;
DEFINE FIELD name ON TABLE group TYPE string;
DEFINE FIELD description ON TABLE group TYPE string;
DEFINE FIELD metadata ON TABLE group TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE group TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE group TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_group_tenant_name ON TABLE group \
    COLUMNS tenant_id, name UNIQUE;

-- User -> Group membership
DEFINE TABLE member_of TYPE RELATION SCHEMAFULL;
DEFINE INDEX idx_member_of_pair ON TABLE member_of COLUMNS in, out UNIQUE;

-- =======================================================================
-- Modules (tenant scope)
-- =======================================================================
DEFINE TABLE module SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE module TYPE string;
DEFINE FIELD title ON TABLE module TYPE string;
DEFINE FIELD description ON TABLE module TYPE string;
DEFINE FIELD status ON TABLE module TYPE string \
    ASSERT $value IN ['Draft', 'Published', 'Archived'];
DEFINE FIELD metadata ON TABLE module TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE module TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE module TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_module_tenant_status ON TABLE module \
    COLUMNS tenant_id, status;

-- =======================================================================
-- Sections and quizzes (tenant scope, per module)
-- =======================================================================
DEFINE TABLE section SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE section TYPE string;
DEFINE FIELD module_id ON TABLE section TYPE string;
DEFINE FIELD title ON TABLE section TYPE string;
DEFINE FIELD kind ON TABLE section TYPE string \
    ASSERT $value IN ['Text', 'Video'];
DEFINE FIELD position ON TABLE section TYPE int ASSERT $value >= 0;
DEFINE FIELD created_at ON TABLE section TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_section_module ON TABLE section \
    COLUMNS tenant_id, module_id;

DEFINE TABLE quiz SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE quiz TYPE string;
DEFINE FIELD module_id ON TABLE quiz TYPE string;
DEFINE FIELD title ON TABLE quiz TYPE string;
DEFINE FIELD position ON TABLE quiz TYPE int ASSERT $value >= 0;
DEFINE FIELD passing_score ON TABLE quiz TYPE int \
    ASSERT $value >= 0 AND $value <= 100;
DEFINE FIELD created_at ON TABLE quiz TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_quiz_module ON TABLE quiz \
    COLUMNS tenant_id, module_id;

-- =======================================================================
-- Group -> Module assignments (record id: <group>_<module>)
-- =======================================================================
DEFINE TABLE module_assignment SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE module_assignment TYPE string;
DEFINE FIELD group_id ON TABLE module_assignment TYPE string;
DEFINE FIELD module_id ON TABLE module_assignment TYPE string;
DEFINE FIELD deadline ON TABLE module_assignment TYPE option<datetime>;
DEFINE FIELD assigned_at ON TABLE module_assignment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_assignment_tenant ON TABLE module_assignment \
    COLUMNS tenant_id, module_id;
";

// -----------------------------------------------------------------------
// Schema v2 — learner activity
// -----------------------------------------------------------------------

const SCHEMA_V2: &str = "\
-- Section completions (record id: <user>_<section>)
DEFINE TABLE section_completion SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE section_completion TYPE string;
DEFINE FIELD user_id ON TABLE section_completion TYPE string;
DEFINE FIELD module_id ON TABLE section_completion TYPE string;
DEFINE FIELD section_id ON TABLE section_completion TYPE string;
DEFINE FIELD completed_at ON TABLE section_completion TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_completion_pair ON TABLE section_completion \
    COLUMNS tenant_id, user_id, module_id;
DEFINE INDEX idx_completion_section ON TABLE section_completion \
    COLUMNS section_id;

-- Quiz attempts (append-only)
DEFINE TABLE quiz_attempt SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE quiz_attempt TYPE string;
DEFINE FIELD user_id ON TABLE quiz_attempt TYPE string;
DEFINE FIELD module_id ON TABLE quiz_attempt TYPE string;
DEFINE FIELD quiz_id ON TABLE quiz_attempt TYPE string;
DEFINE FIELD score ON TABLE quiz_attempt TYPE int \
    ASSERT $value >= 0 AND $value <= 100;
DEFINE FIELD passed ON TABLE quiz_attempt TYPE bool;
DEFINE FIELD attempted_at ON TABLE quiz_attempt TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_attempt_pair ON TABLE quiz_attempt \
    COLUMNS tenant_id, user_id, module_id;
DEFINE INDEX idx_attempt_quiz ON TABLE quiz_attempt COLUMNS quiz_id;

-- Latest module access (record id: <user>_<module>)
DEFINE TABLE module_access SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE module_access TYPE string;
DEFINE FIELD user_id ON TABLE module_access TYPE string;
DEFINE FIELD module_id ON TABLE module_access TYPE string;
DEFINE FIELD accessed_at ON TABLE module_access TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_access_pair ON TABLE module_access \
    COLUMNS tenant_id, user_id, module_id;

-- Manual progress overrides (record id: <user>_<module>)
DEFINE TABLE progress_override SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE progress_override TYPE string;
DEFINE FIELD user_id ON TABLE progress_override TYPE string;
DEFINE FIELD module_id ON TABLE progress_override TYPE string;
DEFINE FIELD allow_certificate ON TABLE progress_override TYPE bool;
DEFINE FIELD reason ON TABLE progress_override TYPE string;
DEFINE FIELD granted_by ON TABLE progress_override TYPE string;
DEFINE FIELD created_at ON TABLE progress_override TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_override_pair ON TABLE progress_override \
    COLUMNS tenant_id, user_id, module_id UNIQUE;

-- Issued certificates
DEFINE TABLE certificate SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE certificate TYPE string;
DEFINE FIELD user_id ON TABLE certificate TYPE string;
DEFINE FIELD module_id ON TABLE certificate TYPE string;
DEFINE FIELD issued_at ON TABLE certificate TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_certificate_pair ON TABLE certificate \
    COLUMNS tenant_id, user_id, module_id UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client and
/// return how many were applied.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<usize, DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    let mut applied = 0;
    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
            applied += 1;
        }
    }

    if applied == 0 {
        debug!(version = current_version, "Schema up to date");
    }
    Ok(applied)
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

/// Highest migration version known to this build.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_migration_defines_tables() {
        for migration in MIGRATIONS {
            assert!(migration.sql.contains("DEFINE TABLE"), "{}", migration.name);
        }
        assert_eq!(latest_version(), 2);
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
