//! Read receipts for announcements.
//!
//! A receipt row `(content_id, user_id)` means "read"; its absence means
//! "unread". Marking is idempotent in both directions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use intraportal_auth::{can_read, Principal};
use intraportal_core::{AnnouncementScope, ContentId, ContentKind, DomainError, DomainResult, UserId};

use crate::item::ContentItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub content_id: ContentId,
    pub user_id: UserId,
    pub read_at: DateTime<Utc>,
}

impl ReadReceipt {
    pub fn new(content_id: ContentId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            content_id,
            user_id,
            read_at: now,
        }
    }
}

/// Result of a mark/unmark request. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadOutcome {
    Marked,
    AlreadyRead,
    Unmarked,
    AlreadyUnread,
}

impl ReadOutcome {
    /// Outcome of an insert that reported whether a row was created.
    pub fn from_insert(inserted: bool) -> Self {
        if inserted { ReadOutcome::Marked } else { ReadOutcome::AlreadyRead }
    }

    /// Outcome of a delete that reported whether a row existed.
    pub fn from_delete(deleted: bool) -> Self {
        if deleted { ReadOutcome::Unmarked } else { ReadOutcome::AlreadyUnread }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, ReadOutcome::Marked | ReadOutcome::AlreadyRead)
    }

    pub fn message(&self) -> &'static str {
        match self {
            ReadOutcome::Marked => "marked as read",
            ReadOutcome::AlreadyRead => "already read",
            ReadOutcome::Unmarked => "marked as unread",
            ReadOutcome::AlreadyUnread => "already unread",
        }
    }
}

/// Check that `item` is an announcement of the `expected` sub-kind that the
/// principal can read.
pub fn check_target(item: &ContentItem, expected: AnnouncementScope, principal: &Principal) -> DomainResult<()> {
    let Some(actual) = item.announcement_scope() else {
        return Err(DomainError::not_found("announcement"));
    };
    if actual != expected {
        return Err(DomainError::validation(format!(
            "{actual} announcement cannot be used through the {expected} announcement endpoint"
        )));
    }
    if !can_read(principal, &item.scope()) {
        return Err(DomainError::forbidden("cannot read this announcement"));
    }
    Ok(())
}

/// Receipts only make sense for announcements.
pub fn tracks_receipts(kind: ContentKind) -> bool {
    kind == ContentKind::Announcement
}

#[cfg(test)]
mod tests {
    use intraportal_auth::Role;
    use intraportal_core::DepartmentId;

    use super::*;
    use crate::item::tests::{draft, principal};
    use crate::item::NewContent;

    fn system_announcement() -> ContentItem {
        let admin = principal(Role::Admin, None);
        let input = NewContent {
            scope: Some(AnnouncementScope::System),
            ..draft("Maintenance window", true)
        };
        let mut item = ContentItem::create(ContentKind::Announcement, &admin, input, Utc::now()).unwrap();
        item.status = crate::ModerationStatus::Approved;
        item
    }

    #[test]
    fn outcomes_are_idempotent_successes() {
        assert_eq!(ReadOutcome::from_insert(true), ReadOutcome::Marked);
        assert_eq!(ReadOutcome::from_insert(false), ReadOutcome::AlreadyRead);
        assert_eq!(ReadOutcome::from_delete(false), ReadOutcome::AlreadyUnread);
        assert!(ReadOutcome::AlreadyRead.is_read());
        assert!(!ReadOutcome::Unmarked.is_read());
    }

    #[test]
    fn scope_mismatch_is_a_validation_error() {
        let item = system_announcement();
        let emp = principal(Role::Employee, Some(DepartmentId::new()));
        assert!(check_target(&item, AnnouncementScope::System, &emp).is_ok());
        let err = check_target(&item, AnnouncementScope::Department, &emp).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn non_announcements_are_not_found() {
        let head = principal(Role::DepartmentHead, Some(DepartmentId::new()));
        let doc = ContentItem::create(ContentKind::Document, &head, draft("Doc", false), Utc::now()).unwrap();
        let err = check_target(&doc, AnnouncementScope::Department, &head).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn unreadable_announcements_are_forbidden() {
        let head = principal(Role::DepartmentHead, Some(DepartmentId::new()));
        let item = ContentItem::create(ContentKind::Announcement, &head, draft("Team", false), Utc::now()).unwrap();
        let outsider = principal(Role::Employee, Some(DepartmentId::new()));
        let err = check_target(&item, AnnouncementScope::Department, &outsider).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}
