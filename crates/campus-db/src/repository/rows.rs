//! Row helpers shared by the SurrealDB repositories.
//!
//! UUIDs are stored as strings, so every row coming back from the
//! database goes through [`parse_uuid`] before it becomes a domain value.

use campus_core::models::module::{ModuleStatus, SectionKind};
use campus_core::models::user::UserStatus;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}

pub(crate) fn total(rows: &[CountRow]) -> u64 {
    rows.first().map(|r| r.total).unwrap_or(0)
}

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::InvalidRow(format!("invalid {field} UUID: {e}")))
}

pub(crate) fn id_strings(ids: &[Uuid]) -> Vec<String> {
    ids.iter().map(Uuid::to_string).collect()
}

/// Record key for tables holding at most one row per pair of ids.
pub(crate) fn pair_key(a: Uuid, b: Uuid) -> String {
    format!("{a}_{b}")
}

/// First row of a result set, or `NotFound`.
pub(crate) fn single<T>(rows: Vec<T>, entity: &str, id: impl Into<String>) -> Result<T, DbError> {
    rows.into_iter().next().ok_or_else(|| DbError::NotFound {
        entity: entity.into(),
        id: id.into(),
    })
}

pub(crate) fn parse_user_status(s: &str) -> Result<UserStatus, DbError> {
    match s {
        "Active" => Ok(UserStatus::Active),
        "Inactive" => Ok(UserStatus::Inactive),
        "Locked" => Ok(UserStatus::Locked),
        "PendingVerification" => Ok(UserStatus::PendingVerification),
        other => Err(DbError::InvalidRow(format!("unknown user status: {other}"))),
    }
}

pub(crate) fn user_status_str(s: UserStatus) -> &'static str {
    match s {
        UserStatus::Active => "Active",
        UserStatus::Inactive => "Inactive",
        UserStatus::Locked => "Locked",
        UserStatus::PendingVerification => "PendingVerification",
    }
}

pub(crate) fn parse_module_status(s: &str) -> Result<ModuleStatus, DbError> {
    ModuleStatus::parse(s).ok_or_else(|| DbError::InvalidRow(format!("unknown module status: {s}")))
}

pub(crate) fn parse_section_kind(s: &str) -> Result<SectionKind, DbError> {
    match s {
        "Text" => Ok(SectionKind::Text),
        "Video" => Ok(SectionKind::Video),
        other => Err(DbError::InvalidRow(format!("unknown section kind: {other}"))),
    }
}

pub(crate) fn section_kind_str(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::Text => "Text",
        SectionKind::Video => "Video",
    }
}
