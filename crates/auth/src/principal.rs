use serde::{Deserialize, Serialize};

use intraportal_core::{DepartmentId, UserId};

use crate::Role;

/// A fully resolved principal for authorization decisions.
///
/// Supplied per request by the session provider and passed explicitly into
/// every policy and filter call. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
    pub department_id: Option<DepartmentId>,
}

impl Principal {
    pub fn new(id: UserId, role: Role, department_id: Option<DepartmentId>) -> Self {
        Self {
            id,
            role,
            department_id,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_department_head(&self) -> bool {
        self.role == Role::DepartmentHead
    }

    /// True when the principal belongs to `department` (both sides present).
    pub fn in_department(&self, department: Option<DepartmentId>) -> bool {
        matches!((self.department_id, department), (Some(mine), Some(theirs)) if mine == theirs)
    }

    /// True when the principal heads `department`.
    pub fn heads(&self, department: Option<DepartmentId>) -> bool {
        self.is_department_head() && self.in_department(department)
    }
}
