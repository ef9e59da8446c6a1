//! Access policy evaluator.
//!
//! - No IO
//! - No panics
//! - No errors: every function answers `true`/`false`; callers turn `false`
//!   into `Forbidden`.

use serde::Serialize;

use intraportal_core::{AnnouncementScope, DepartmentId, UserId};

use crate::{Principal, Role};

/// The policy-relevant projection of a content item or event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentScope {
    pub author_id: UserId,
    pub department_id: Option<DepartmentId>,
    pub is_public: bool,
    /// `status == APPROVED`, or always true for kinds without moderation.
    pub approved: bool,
    /// System-wide announcement (no department; admin-only write/moderation).
    pub system_wide: bool,
}

/// What a principal is trying to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateTarget {
    Document,
    Post,
    Event,
    Announcement(AnnouncementScope),
    Department,
    User,
}

pub fn can_read(principal: &Principal, item: &ContentScope) -> bool {
    principal.is_admin()
        || principal.in_department(item.department_id)
        || (item.is_public && item.approved)
        || principal.id == item.author_id
}

pub fn can_write(principal: &Principal, item: &ContentScope) -> bool {
    if item.system_wide {
        return principal.is_admin();
    }
    principal.is_admin() || principal.id == item.author_id || principal.heads(item.department_id)
}

pub fn can_moderate(principal: &Principal, item: &ContentScope) -> bool {
    // A system-wide item has no department, so `heads` is false for it.
    principal.is_admin() || principal.heads(item.department_id)
}

pub fn can_create(principal: &Principal, target: CreateTarget) -> bool {
    match target {
        CreateTarget::Post => true,
        CreateTarget::Document
        | CreateTarget::Event
        | CreateTarget::Announcement(AnnouncementScope::Department) => {
            matches!(principal.role, Role::Admin | Role::DepartmentHead)
        }
        CreateTarget::Announcement(AnnouncementScope::System)
        | CreateTarget::Department
        | CreateTarget::User => principal.is_admin(),
    }
}

/// Moderators of a department's queue: admins, and the head of that department.
pub fn can_moderate_department(principal: &Principal, department: Option<DepartmentId>) -> bool {
    principal.is_admin() || principal.heads(department)
}
