//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories
//! require a `tenant_id` parameter to enforce data isolation.

use uuid::Uuid;

use crate::error::CampusResult;
use crate::models::{
    activity::{ModuleAccess, QuizAttempt, RecordQuizAttempt, SectionCompletion},
    assignment::{AssignModule, ModuleAssignment},
    certificate::{Certificate, IssueCertificate},
    group::{CreateGroup, Group, UpdateGroup},
    module::{CreateModule, CreateQuiz, CreateSection, Module, Quiz, Section, UpdateModule},
    progress::{
        AccessRow, AssignmentRow, AttemptRow, CertificateRow, CompletionRow, GroupLabel,
        MembershipRow, ModuleLabel, OverrideRow, QuizRow, SectionCountRow, UserLabel,
    },
    progress_override::{GrantOverride, ProgressOverride},
    tenant::{CreateTenant, Tenant},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Tenants (global scope)
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = CampusResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CampusResult<Tenant>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = CampusResult<Tenant>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = CampusResult<User>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = CampusResult<User>> + Send;
    fn get_by_username(
        &self,
        tenant_id: Uuid,
        username: &str,
    ) -> impl Future<Output = CampusResult<User>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = CampusResult<User>> + Send;
    /// Soft-delete: sets status to Inactive.
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = CampusResult<()>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = CampusResult<PaginatedResult<User>>> + Send;
}

pub trait GroupRepository: Send + Sync {
    fn create(&self, input: CreateGroup) -> impl Future<Output = CampusResult<Group>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = CampusResult<Group>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateGroup,
    ) -> impl Future<Output = CampusResult<Group>> + Send;
    /// Deletes the group together with its memberships and assignments.
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = CampusResult<()>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = CampusResult<PaginatedResult<Group>>> + Send;

    /// Add a user to a group (creates a `member_of` edge).
    fn add_member(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        group_id: Uuid,
    ) -> impl Future<Output = CampusResult<()>> + Send;

    /// Remove a user from a group.
    fn remove_member(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        group_id: Uuid,
    ) -> impl Future<Output = CampusResult<()>> + Send;

    /// Get all members of a group.
    fn get_members(
        &self,
        tenant_id: Uuid,
        group_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = CampusResult<PaginatedResult<User>>> + Send;

    /// Get all groups a user belongs to.
    fn get_user_groups(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = CampusResult<Vec<Group>>> + Send;
}

// ---------------------------------------------------------------------------
// Training content (tenant-scoped)
// ---------------------------------------------------------------------------

pub trait ModuleRepository: Send + Sync {
    fn create(&self, input: CreateModule) -> impl Future<Output = CampusResult<Module>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = CampusResult<Module>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateModule,
    ) -> impl Future<Output = CampusResult<Module>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = CampusResult<PaginatedResult<Module>>> + Send;

    fn add_section(&self, input: CreateSection)
    -> impl Future<Output = CampusResult<Section>> + Send;
    /// Sections of a module in position order.
    fn list_sections(
        &self,
        tenant_id: Uuid,
        module_id: Uuid,
    ) -> impl Future<Output = CampusResult<Vec<Section>>> + Send;
    /// Deletes a section and every completion recorded against it.
    fn delete_section(
        &self,
        tenant_id: Uuid,
        section_id: Uuid,
    ) -> impl Future<Output = CampusResult<()>> + Send;

    fn add_quiz(&self, input: CreateQuiz) -> impl Future<Output = CampusResult<Quiz>> + Send;
    /// Quizzes of a module in position order.
    fn list_quizzes(
        &self,
        tenant_id: Uuid,
        module_id: Uuid,
    ) -> impl Future<Output = CampusResult<Vec<Quiz>>> + Send;
    /// Deletes a quiz and every attempt recorded against it.
    fn delete_quiz(
        &self,
        tenant_id: Uuid,
        quiz_id: Uuid,
    ) -> impl Future<Output = CampusResult<()>> + Send;

    /// Assign a module to a group. Re-assigning replaces the deadline.
    fn assign_to_group(
        &self,
        input: AssignModule,
    ) -> impl Future<Output = CampusResult<ModuleAssignment>> + Send;
    fn unassign_from_group(
        &self,
        tenant_id: Uuid,
        group_id: Uuid,
        module_id: Uuid,
    ) -> impl Future<Output = CampusResult<()>> + Send;
    /// All assignments of a module.
    fn list_assignments(
        &self,
        tenant_id: Uuid,
        module_id: Uuid,
    ) -> impl Future<Output = CampusResult<Vec<ModuleAssignment>>> + Send;
}

// ---------------------------------------------------------------------------
// Learner activity (tenant-scoped)
// ---------------------------------------------------------------------------

pub trait ActivityRepository: Send + Sync {
    /// Mark a section complete. Completing it again is a no-op that
    /// returns the original completion.
    fn complete_section(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        section_id: Uuid,
    ) -> impl Future<Output = CampusResult<SectionCompletion>> + Send;

    /// Record a quiz attempt; it passes when the score reaches the quiz's
    /// passing score.
    fn record_quiz_attempt(
        &self,
        input: RecordQuizAttempt,
    ) -> impl Future<Output = CampusResult<QuizAttempt>> + Send;

    /// Record that a user viewed a module (overwrites the previous marker).
    fn record_access(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        module_id: Uuid,
    ) -> impl Future<Output = CampusResult<ModuleAccess>> + Send;
}

pub trait OverrideRepository: Send + Sync {
    /// Grant (or replace) an override for a (user, module) pair.
    fn grant(
        &self,
        input: GrantOverride,
    ) -> impl Future<Output = CampusResult<ProgressOverride>> + Send;
    fn revoke(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        module_id: Uuid,
    ) -> impl Future<Output = CampusResult<()>> + Send;
    fn get(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        module_id: Uuid,
    ) -> impl Future<Output = CampusResult<Option<ProgressOverride>>> + Send;
}

pub trait CertificateRepository: Send + Sync {
    /// Issue a certificate. Issuing twice returns the existing one.
    fn issue(
        &self,
        input: IssueCertificate,
    ) -> impl Future<Output = CampusResult<Certificate>> + Send;
    fn list_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = CampusResult<Vec<Certificate>>> + Send;
}

// ---------------------------------------------------------------------------
// Bulk reads for the progress engine
// ---------------------------------------------------------------------------

/// Read-only bulk queries consumed by the progress engine.
///
/// Each method issues a fixed number of queries regardless of how many
/// ids it is given. Rows outside `tenant_id` are never returned.
pub trait ProgressSource: Send + Sync {
    fn section_counts(
        &self,
        tenant_id: Uuid,
        module_ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<Vec<SectionCountRow>>> + Send;

    fn completions(
        &self,
        tenant_id: Uuid,
        user_ids: &[Uuid],
        module_ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<Vec<CompletionRow>>> + Send;

    fn quizzes(
        &self,
        tenant_id: Uuid,
        module_ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<Vec<QuizRow>>> + Send;

    fn quiz_attempts(
        &self,
        tenant_id: Uuid,
        user_ids: &[Uuid],
        module_ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<Vec<AttemptRow>>> + Send;

    fn overrides(
        &self,
        tenant_id: Uuid,
        user_ids: &[Uuid],
        module_ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<Vec<OverrideRow>>> + Send;

    fn certificates(
        &self,
        tenant_id: Uuid,
        user_ids: &[Uuid],
        module_ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<Vec<CertificateRow>>> + Send;

    fn last_access(
        &self,
        tenant_id: Uuid,
        user_ids: &[Uuid],
        module_ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<Vec<AccessRow>>> + Send;

    /// Membership edges of the tenant, optionally restricted to one user.
    fn memberships(
        &self,
        tenant_id: Uuid,
        user_id: Option<Uuid>,
    ) -> impl Future<Output = CampusResult<Vec<MembershipRow>>> + Send;

    /// Every group → module assignment of the tenant.
    fn assignments(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = CampusResult<Vec<AssignmentRow>>> + Send;

    fn user_labels(
        &self,
        tenant_id: Uuid,
        user_ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<Vec<UserLabel>>> + Send;

    fn module_labels(
        &self,
        tenant_id: Uuid,
        module_ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<Vec<ModuleLabel>>> + Send;

    fn group_labels(
        &self,
        tenant_id: Uuid,
        group_ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<Vec<GroupLabel>>> + Send;
}
