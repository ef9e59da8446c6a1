use intraportal_auth::{Principal, Role};
use intraportal_core::{DepartmentId, UserId};

/// Principal context for a request (verified identity, role and department).
///
/// Inserted by the auth middleware; handlers pass the inner [`Principal`]
/// explicitly into every service call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.id
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn department_id(&self) -> Option<DepartmentId> {
        self.principal.department_id
    }
}
