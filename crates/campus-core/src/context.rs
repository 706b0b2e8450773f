//! Explicit request context.
//!
//! Every engine operation receives the caller's tenant, identity and role
//! as a value instead of reading them from ambient state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CampusError, CampusResult};

/// Role of the caller within its tenant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

impl Role {
    /// Managers and admins may read other users' progress.
    pub fn can_view_others(self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}

/// Who is asking, and on behalf of which tenant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestContext {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
}

impl RequestContext {
    pub fn new(tenant_id: Uuid, user_id: Uuid, role: Role) -> Self {
        Self {
            tenant_id,
            user_id,
            role,
        }
    }

    /// Allow access to `user_id`'s data: the caller itself, or a manager/admin.
    pub fn ensure_can_view_user(&self, user_id: Uuid) -> CampusResult<()> {
        if user_id == self.user_id || self.role.can_view_others() {
            Ok(())
        } else {
            Err(CampusError::AuthorizationDenied {
                reason: format!("role {:?} cannot view progress of another user", self.role),
            })
        }
    }

    /// Tenant-wide reads are reserved for managers and admins.
    pub fn ensure_can_view_tenant(&self) -> CampusResult<()> {
        if self.role.can_view_others() {
            Ok(())
        } else {
            Err(CampusError::AuthorizationDenied {
                reason: format!("role {:?} cannot view tenant reports", self.role),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_sees_only_self() {
        let ctx = RequestContext::new(Uuid::new_v4(), Uuid::new_v4(), Role::Employee);
        assert!(ctx.ensure_can_view_user(ctx.user_id).is_ok());
        assert!(matches!(
            ctx.ensure_can_view_user(Uuid::new_v4()),
            Err(CampusError::AuthorizationDenied { .. })
        ));
        assert!(ctx.ensure_can_view_tenant().is_err());
    }

    #[test]
    fn manager_sees_tenant() {
        let ctx = RequestContext::new(Uuid::new_v4(), Uuid::new_v4(), Role::Manager);
        assert!(ctx.ensure_can_view_user(Uuid::new_v4()).is_ok());
        assert!(ctx.ensure_can_view_tenant().is_ok());
    }
}
