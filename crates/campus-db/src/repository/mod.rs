//! SurrealDB repository implementations.

mod activity;
mod certificate;
mod group;
mod module;
mod progress;
mod progress_override;
pub(crate) mod rows;
mod tenant;
mod user;

pub use activity::SurrealActivityRepository;
pub use certificate::SurrealCertificateRepository;
pub use group::SurrealGroupRepository;
pub use module::SurrealModuleRepository;
pub use progress::SurrealProgressSource;
pub use progress_override::SurrealOverrideRepository;
pub use tenant::SurrealTenantRepository;
pub use user::SurrealUserRepository;
