//! Campus Progress — batched module-progress aggregation.
//!
//! Bulk reads from a [`ProgressSource`](campus_core::repository::ProgressSource)
//! are indexed once into [`LookupMaps`], then every (user, module) pair is
//! run through the pure [`derive_progress`] state machine.

pub mod assignment;
pub mod config;
pub mod derive;
pub mod error;
pub mod lookup;
pub mod report;
pub mod service;
pub mod sort;

pub use config::ProgressConfig;
pub use derive::{OverrideFact, ProgressFacts, derive_progress, derive_status, percentage};
pub use error::ProgressError;
pub use lookup::{LookupMaps, ProgressRows};
pub use report::{
    DashboardCard, ModuleSummary, TenantProgressEntry, TenantProgressQuery, TenantProgressReport,
};
pub use service::ProgressService;
