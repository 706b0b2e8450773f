//! Training module domain models: modules, their sections and quizzes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication lifecycle of a module.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModuleStatus {
    Draft,
    Published,
    Archived,
}

impl ModuleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleStatus::Draft => "Draft",
            ModuleStatus::Published => "Published",
            ModuleStatus::Archived => "Archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Draft" => Some(ModuleStatus::Draft),
            "Published" => Some(ModuleStatus::Published),
            "Archived" => Some(ModuleStatus::Archived),
            _ => None,
        }
    }
}

/// A unit of training content composed of ordered sections and optional
/// quizzes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: ModuleStatus,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateModule {
    pub tenant_id: Uuid,
    pub title: String,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateModule {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ModuleStatus>,
    pub metadata: Option<serde_json::Value>,
}

/// Content kind of a section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SectionKind {
    Text,
    Video,
}

/// An atomic content unit within a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub kind: SectionKind,
    /// Ordering within the module, ascending.
    pub position: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSection {
    pub tenant_id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub kind: SectionKind,
    pub position: u32,
}

/// An assessable unit within a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub position: u32,
    /// Minimum score (0–100) an attempt needs to pass.
    pub passing_score: u8,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuiz {
    pub tenant_id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub position: u32,
    pub passing_score: u8,
}
