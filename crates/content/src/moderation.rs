//! Moderation workflow: the PENDING / APPROVED / REJECTED state machine.
//!
//! Decision logic (`decide`) is separated from state mutation
//! (`Review::apply`) so a transition can be inspected, logged and persisted
//! together with its review comment before the item is touched.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use intraportal_auth::{can_moderate, can_write, Principal};
use intraportal_core::{DomainError, DomainResult, UserId};

use crate::item::ContentItem;

/// Moderation status of a content item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "PENDING",
            ModerationStatus::Approved => "APPROVED",
            ModerationStatus::Rejected => "REJECTED",
        }
    }
}

impl core::fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(ModerationStatus::Pending),
            "APPROVED" => Ok(ModerationStatus::Approved),
            "REJECTED" => Ok(ModerationStatus::Rejected),
            other => Err(DomainError::validation(format!(
                "unknown status '{other}' (expected PENDING, APPROVED or REJECTED)"
            ))),
        }
    }
}

/// Action submitted to the moderation endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Approve,
    Reject,
    Delete,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Approve => "approve",
            ModerationAction::Reject => "reject",
            ModerationAction::Delete => "delete",
        }
    }
}

impl core::fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approve" | "approved" => Ok(ModerationAction::Approve),
            "reject" | "rejected" => Ok(ModerationAction::Reject),
            "delete" => Ok(ModerationAction::Delete),
            other => Err(DomainError::validation(format!(
                "unknown action '{other}' (expected approve, reject or delete)"
            ))),
        }
    }
}

/// A moderation request against one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationCommand {
    pub action: ModerationAction,
    /// Explicit visibility for `approve`; `None` keeps the current value.
    pub make_public: Option<bool>,
}

/// A recorded status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub from: ModerationStatus,
    pub to: ModerationStatus,
    pub reviewer: UserId,
    pub reviewed_at: DateTime<Utc>,
    pub is_public: bool,
}

impl Review {
    pub fn apply(&self, item: &mut ContentItem) {
        item.status = self.to;
        item.is_public = self.is_public;
        item.reviewed_by_id = Some(self.reviewer);
        item.reviewed_at = Some(self.reviewed_at);
        item.updated_at = self.reviewed_at;
    }

    /// True when the status did not change (e.g. approving twice).
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Result of a moderation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Review(Review),
    Delete,
}

/// Status assigned at creation: private content needs no review.
pub fn initial_status(is_public: bool) -> ModerationStatus {
    if is_public {
        ModerationStatus::Pending
    } else {
        ModerationStatus::Approved
    }
}

/// Status after an edit.
///
/// - private + pending → approved (nothing left to review)
/// - public, edited by a non-moderator → pending
/// - public + rejected, edited by a moderator → pending
pub fn status_after_edit(current: ModerationStatus, is_public: bool, editor_moderates: bool) -> ModerationStatus {
    match (is_public, editor_moderates, current) {
        (false, _, ModerationStatus::Pending) => ModerationStatus::Approved,
        (false, _, status) => status,
        (true, false, _) => ModerationStatus::Pending,
        (true, true, ModerationStatus::Rejected) => ModerationStatus::Pending,
        (true, true, status) => status,
    }
}

/// Decide what a moderation command does to `item`.
pub fn decide(
    item: &ContentItem,
    principal: &Principal,
    command: &ModerationCommand,
    now: DateTime<Utc>,
) -> DomainResult<Decision> {
    let scope = item.scope();
    match command.action {
        ModerationAction::Delete => {
            if can_write(principal, &scope) || can_moderate(principal, &scope) {
                Ok(Decision::Delete)
            } else {
                Err(DomainError::forbidden(format!("cannot delete this {}", item.kind)))
            }
        }
        ModerationAction::Approve => {
            if !can_moderate(principal, &scope) {
                return Err(DomainError::forbidden(format!("cannot moderate this {}", item.kind)));
            }
            Ok(Decision::Review(Review {
                from: item.status,
                to: ModerationStatus::Approved,
                reviewer: principal.id,
                reviewed_at: now,
                is_public: command.make_public.unwrap_or(item.is_public),
            }))
        }
        ModerationAction::Reject => {
            if !can_moderate(principal, &scope) {
                return Err(DomainError::forbidden(format!("cannot moderate this {}", item.kind)));
            }
            Ok(Decision::Review(Review {
                from: item.status,
                to: ModerationStatus::Rejected,
                reviewer: principal.id,
                reviewed_at: now,
                is_public: false,
            }))
        }
    }
}

/// Send an item back to review (`* → PENDING`).
///
/// The author needs no moderation rights for this; anyone else needs write
/// access.
pub fn resubmit(item: &mut ContentItem, principal: &Principal, now: DateTime<Utc>) -> DomainResult<()> {
    if principal.id != item.author_id && !can_write(principal, &item.scope()) {
        return Err(DomainError::forbidden(format!("cannot resubmit this {}", item.kind)));
    }
    item.status = ModerationStatus::Pending;
    item.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use intraportal_auth::Role;
    use intraportal_core::{ContentKind, DepartmentId};
    use proptest::prelude::*;

    use super::*;
    use crate::item::tests::{draft, principal};

    fn pending_post(dept: DepartmentId) -> (Principal, ContentItem) {
        let author = principal(Role::Employee, Some(dept));
        let item = ContentItem::create(ContentKind::Post, &author, draft("Post", true), Utc::now()).unwrap();
        (author, item)
    }

    fn approve() -> ModerationCommand {
        ModerationCommand {
            action: ModerationAction::Approve,
            make_public: None,
        }
    }

    fn reject() -> ModerationCommand {
        ModerationCommand {
            action: ModerationAction::Reject,
            make_public: None,
        }
    }

    fn run(item: &mut ContentItem, who: &Principal, cmd: &ModerationCommand, now: DateTime<Utc>) -> Review {
        match decide(item, who, cmd, now).unwrap() {
            Decision::Review(review) => {
                review.apply(item);
                review
            }
            Decision::Delete => panic!("expected a review"),
        }
    }

    #[test]
    fn head_approves_pending_post_in_own_department() {
        let dept = DepartmentId::new();
        let (_, mut item) = pending_post(dept);
        let head = principal(Role::DepartmentHead, Some(dept));
        let review = run(&mut item, &head, &approve(), Utc::now());

        assert_eq!(review.from, ModerationStatus::Pending);
        assert_eq!(item.status, ModerationStatus::Approved);
        assert_eq!(item.reviewed_by_id, Some(head.id));
        assert!(item.is_public);
    }

    #[test]
    fn head_of_other_department_is_forbidden() {
        let (_, item) = pending_post(DepartmentId::new());
        let head = principal(Role::DepartmentHead, Some(DepartmentId::new()));
        let err = decide(&item, &head, &approve(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn approving_twice_is_a_noop_that_advances_reviewed_at() {
        let dept = DepartmentId::new();
        let (_, mut item) = pending_post(dept);
        let admin = principal(Role::Admin, None);
        let t1 = Utc::now();
        run(&mut item, &admin, &approve(), t1);
        let t2 = t1 + Duration::seconds(30);
        let second = run(&mut item, &admin, &approve(), t2);

        assert!(second.is_noop());
        assert_eq!(item.status, ModerationStatus::Approved);
        assert_eq!(item.reviewed_at, Some(t2));
    }

    #[test]
    fn approve_can_publish_explicitly() {
        let dept = DepartmentId::new();
        let head = principal(Role::DepartmentHead, Some(dept));
        let mut item = ContentItem::create(ContentKind::Document, &head, draft("Doc", false), Utc::now()).unwrap();
        let cmd = ModerationCommand {
            action: ModerationAction::Approve,
            make_public: Some(true),
        };
        run(&mut item, &head, &cmd, Utc::now());
        assert!(item.is_public);
    }

    #[test]
    fn author_may_delete_but_not_approve() {
        let dept = DepartmentId::new();
        let (author, item) = pending_post(dept);
        assert!(decide(&item, &author, &approve(), Utc::now()).is_err());
        let cmd = ModerationCommand {
            action: ModerationAction::Delete,
            make_public: None,
        };
        assert_eq!(decide(&item, &author, &cmd, Utc::now()).unwrap(), Decision::Delete);
    }

    #[test]
    fn author_resubmits_rejected_post() {
        let dept = DepartmentId::new();
        let (author, mut item) = pending_post(dept);
        run(&mut item, &principal(Role::Admin, None), &reject(), Utc::now());
        assert_eq!(item.status, ModerationStatus::Rejected);

        resubmit(&mut item, &author, Utc::now()).unwrap();
        assert_eq!(item.status, ModerationStatus::Pending);

        let stranger = principal(Role::Employee, Some(dept));
        assert!(resubmit(&mut item, &stranger, Utc::now()).is_err());
    }

    #[test]
    fn parse_actions_and_statuses() {
        assert_eq!("Approve".parse::<ModerationAction>().unwrap(), ModerationAction::Approve);
        assert!(matches!("archive".parse::<ModerationAction>(), Err(DomainError::Validation(_))));
        assert_eq!("pending".parse::<ModerationStatus>().unwrap(), ModerationStatus::Pending);
        assert!("DRAFT".parse::<ModerationStatus>().is_err());
    }

    #[test]
    fn edit_transitions() {
        use ModerationStatus::*;
        assert_eq!(status_after_edit(Pending, false, false), Approved);
        assert_eq!(status_after_edit(Rejected, false, false), Rejected);
        assert_eq!(status_after_edit(Approved, true, false), Pending);
        assert_eq!(status_after_edit(Approved, true, true), Approved);
        assert_eq!(status_after_edit(Rejected, true, true), Pending);
    }

    proptest! {
        #[test]
        fn rejecting_always_makes_private(
            was_public in any::<bool>(),
            start in prop_oneof![
                Just(ModerationStatus::Pending),
                Just(ModerationStatus::Approved),
                Just(ModerationStatus::Rejected),
            ],
        ) {
            let dept = DepartmentId::new();
            let (_, mut item) = pending_post(dept);
            item.is_public = was_public;
            item.status = start;
            run(&mut item, &principal(Role::DepartmentHead, Some(dept)), &reject(), Utc::now());
            prop_assert!(!item.is_public);
            prop_assert_eq!(item.status, ModerationStatus::Rejected);
        }
    }
}
