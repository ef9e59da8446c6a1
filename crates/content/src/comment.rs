//! Review comments: the append-only moderation trail of a content item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use intraportal_auth::{can_moderate, can_write, Principal};
use intraportal_core::{CommentId, ContentId, DomainError, DomainResult, UserId};

use crate::item::ContentItem;

const MAX_COMMENT_LEN: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewComment {
    pub id: CommentId,
    pub content_id: ContentId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ReviewComment {
    pub fn new(content_id: ContentId, user_id: UserId, text: &str, now: DateTime<Utc>) -> DomainResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::validation("comment cannot be empty"));
        }
        if text.chars().count() > MAX_COMMENT_LEN {
            return Err(DomainError::validation(format!(
                "comment is longer than {MAX_COMMENT_LEN} characters"
            )));
        }
        Ok(Self {
            id: CommentId::new(),
            content_id,
            user_id,
            content: text.to_string(),
            created_at: now,
        })
    }

    /// Optional comment attached to a moderation action; blank means none.
    pub fn optional(
        content_id: ContentId,
        user_id: UserId,
        text: Option<&str>,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<Self>> {
        match text.map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => Self::new(content_id, user_id, text, now).map(Some),
        }
    }
}

/// Moderators and the author take part in the review thread.
pub fn can_comment(principal: &Principal, item: &ContentItem) -> bool {
    principal.id == item.author_id || can_moderate(principal, &item.scope())
}

pub fn can_view_comments(principal: &Principal, item: &ContentItem) -> bool {
    let scope = item.scope();
    can_write(principal, &scope) || can_moderate(principal, &scope)
}

#[cfg(test)]
mod tests {
    use intraportal_auth::Role;
    use intraportal_core::{ContentKind, DepartmentId};

    use super::*;
    use crate::item::tests::{draft, principal};

    #[test]
    fn blank_comments_are_rejected_or_skipped() {
        let id = ContentId::new();
        let user = UserId::new();
        assert!(ReviewComment::new(id, user, "   ", Utc::now()).is_err());
        assert_eq!(ReviewComment::optional(id, user, Some("  "), Utc::now()).unwrap(), None);
        let c = ReviewComment::optional(id, user, Some(" looks good "), Utc::now()).unwrap().unwrap();
        assert_eq!(c.content, "looks good");
    }

    #[test]
    fn thread_participants() {
        let dept = DepartmentId::new();
        let author = principal(Role::Employee, Some(dept));
        let item = ContentItem::create(ContentKind::Post, &author, draft("Post", true), Utc::now()).unwrap();

        assert!(can_comment(&author, &item));
        assert!(can_comment(&principal(Role::DepartmentHead, Some(dept)), &item));
        assert!(!can_comment(&principal(Role::Employee, Some(dept)), &item));
        assert!(!can_view_comments(&principal(Role::Employee, Some(dept)), &item));
    }
}
