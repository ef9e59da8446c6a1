//! Documents, posts and announcements: the moderated content items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use intraportal_auth::{can_create, can_moderate, can_write, ContentScope, CreateTarget, Principal};
use intraportal_core::{AnnouncementScope, ContentId, ContentKind, DepartmentId, DomainError, DomainResult, Entity, UserId};

use crate::moderation::{initial_status, status_after_edit, ModerationStatus};

/// File metadata attached to a document. The bytes live with the upload
/// collaborator (disk or media host); only the contract is stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub file_url: String,
    pub file_type: String,
    pub file_size: u64,
}

impl Attachment {
    fn validate(self) -> DomainResult<Self> {
        if self.filename.trim().is_empty() || self.file_url.trim().is_empty() {
            return Err(DomainError::validation("attachment needs a filename and fileUrl"));
        }
        Ok(Self {
            filename: self.filename.trim().to_string(),
            file_url: self.file_url.trim().to_string(),
            file_type: self.file_type.trim().to_string(),
            file_size: self.file_size,
        })
    }
}

/// A document, post or announcement.
///
/// # Invariants
/// - `status == Rejected` implies `!is_public` (enforced when rejecting).
/// - An announcement without a department is a system announcement.
/// - `tags` are only carried by posts, `attachment` only by documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: ContentId,
    pub kind: ContentKind,
    pub title: String,
    pub body: String,
    pub author_id: UserId,
    pub department_id: Option<DepartmentId>,
    pub is_public: bool,
    pub status: ModerationStatus,
    pub reviewed_by_id: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for ContentItem {
    type Id = ContentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Input for creating a content item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContent {
    pub title: String,
    #[serde(default, alias = "content", alias = "description")]
    pub body: String,
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub attachment: Option<Attachment>,
    /// Announcements only; defaults to `department`.
    pub scope: Option<AnnouncementScope>,
}

/// Partial edit of a content item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPatch {
    pub title: Option<String>,
    #[serde(alias = "content", alias = "description")]
    pub body: Option<String>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub attachment: Option<Attachment>,
    /// Announcements only; must agree with the stored sub-kind when present.
    pub scope: Option<AnnouncementScope>,
}

fn normalize_title(title: &str) -> DomainResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title is required"));
    }
    Ok(title.to_string())
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Decide which department a new item belongs to.
///
/// Admins may target any department (or none, when `required` is false);
/// everyone else is pinned to their own department.
pub(crate) fn resolve_department(
    principal: &Principal,
    requested: Option<DepartmentId>,
    required: bool,
) -> DomainResult<Option<DepartmentId>> {
    let resolved = if principal.is_admin() {
        requested.or(principal.department_id)
    } else {
        match requested {
            Some(d) if Some(d) != principal.department_id => {
                return Err(DomainError::forbidden("cannot create content for another department"));
            }
            _ => principal.department_id,
        }
    };
    if required && resolved.is_none() {
        return Err(DomainError::validation("departmentId is required"));
    }
    Ok(resolved)
}

impl ContentItem {
    /// Validate input, check the create allowlist and build a new item.
    pub fn create(kind: ContentKind, principal: &Principal, input: NewContent, now: DateTime<Utc>) -> DomainResult<Self> {
        let title = normalize_title(&input.title)?;
        let body = input.body.trim().to_string();

        let target = match kind {
            ContentKind::Document => CreateTarget::Document,
            ContentKind::Post => CreateTarget::Post,
            ContentKind::Announcement => {
                CreateTarget::Announcement(input.scope.unwrap_or(AnnouncementScope::Department))
            }
        };
        if !can_create(principal, target) {
            return Err(DomainError::forbidden(format!("your role cannot create this {kind}")));
        }

        if body.is_empty() && kind != ContentKind::Document {
            return Err(DomainError::validation(format!("{kind} content is required")));
        }

        let department_id = match target {
            CreateTarget::Announcement(AnnouncementScope::System) => {
                if input.department_id.is_some() {
                    return Err(DomainError::validation("system announcements cannot target a department"));
                }
                None
            }
            CreateTarget::Announcement(AnnouncementScope::Department) => {
                resolve_department(principal, input.department_id, true)?
            }
            _ => resolve_department(principal, input.department_id, false)?,
        };

        let tags = if kind == ContentKind::Post {
            normalize_tags(input.tags)
        } else {
            Vec::new()
        };
        let attachment = match (kind, input.attachment) {
            (ContentKind::Document, Some(a)) => Some(a.validate()?),
            _ => None,
        };

        Ok(Self {
            id: ContentId::new(),
            kind,
            title,
            body,
            author_id: principal.id,
            department_id,
            is_public: input.is_public,
            status: initial_status(input.is_public),
            reviewed_by_id: None,
            reviewed_at: None,
            tags,
            attachment,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply an edit on behalf of `editor`, re-entering review when needed.
    pub fn apply_edit(&mut self, editor: &Principal, patch: ContentPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let scope = self.scope();
        if !can_write(editor, &scope) {
            return Err(DomainError::forbidden(format!("cannot edit this {}", self.kind)));
        }
        if let (Some(requested), Some(actual)) = (patch.scope, self.announcement_scope()) {
            if requested != actual {
                return Err(DomainError::validation(format!(
                    "scope '{requested}' does not match this {actual} announcement"
                )));
            }
        }

        if let Some(title) = patch.title {
            self.title = normalize_title(&title)?;
        }
        if let Some(body) = patch.body {
            let body = body.trim().to_string();
            if body.is_empty() && self.kind != ContentKind::Document {
                return Err(DomainError::validation(format!("{} content is required", self.kind)));
            }
            self.body = body;
        }
        if let Some(tags) = patch.tags {
            if self.kind == ContentKind::Post {
                self.tags = normalize_tags(tags);
            }
        }
        if let Some(attachment) = patch.attachment {
            if self.kind == ContentKind::Document {
                self.attachment = Some(attachment.validate()?);
            }
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }

        self.status = status_after_edit(self.status, self.is_public, can_moderate(editor, &scope));
        self.updated_at = now;
        Ok(())
    }

    pub fn is_system_announcement(&self) -> bool {
        self.kind == ContentKind::Announcement && self.department_id.is_none()
    }

    /// Sub-kind for announcements, `None` for other kinds.
    pub fn announcement_scope(&self) -> Option<AnnouncementScope> {
        match (self.kind, self.department_id) {
            (ContentKind::Announcement, None) => Some(AnnouncementScope::System),
            (ContentKind::Announcement, Some(_)) => Some(AnnouncementScope::Department),
            _ => None,
        }
    }

    pub fn scope(&self) -> ContentScope {
        ContentScope {
            author_id: self.author_id,
            department_id: self.department_id,
            is_public: self.is_public,
            approved: self.status == ModerationStatus::Approved,
            system_wide: self.is_system_announcement(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use intraportal_auth::Role;

    use super::*;

    pub(crate) fn principal(role: Role, dept: Option<DepartmentId>) -> Principal {
        Principal::new(UserId::new(), role, dept)
    }

    pub(crate) fn draft(title: &str, is_public: bool) -> NewContent {
        NewContent {
            title: title.to_string(),
            body: "body text".to_string(),
            is_public,
            ..Default::default()
        }
    }

    #[test]
    fn public_items_start_pending_private_items_start_approved() {
        let head = principal(Role::DepartmentHead, Some(DepartmentId::new()));
        let public = ContentItem::create(ContentKind::Document, &head, draft("Policy", true), Utc::now()).unwrap();
        assert_eq!(public.status, ModerationStatus::Pending);

        let private = ContentItem::create(ContentKind::Document, &head, draft("Notes", false), Utc::now()).unwrap();
        assert_eq!(private.status, ModerationStatus::Approved);
        assert_eq!(private.department_id, head.department_id);
    }

    #[test]
    fn employees_cannot_create_documents_but_can_post() {
        let emp = principal(Role::Employee, Some(DepartmentId::new()));
        let err = ContentItem::create(ContentKind::Document, &emp, draft("Doc", false), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let post = ContentItem::create(ContentKind::Post, &emp, draft("Hello", true), Utc::now()).unwrap();
        assert_eq!(post.author_id, emp.id);
        assert_eq!(post.status, ModerationStatus::Pending);
    }

    #[test]
    fn department_head_is_pinned_to_own_department() {
        let head = principal(Role::DepartmentHead, Some(DepartmentId::new()));
        let mut input = draft("Doc", false);
        input.department_id = Some(DepartmentId::new());
        let err = ContentItem::create(ContentKind::Document, &head, input, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn system_announcements_have_no_department() {
        let admin = principal(Role::Admin, Some(DepartmentId::new()));
        let mut input = draft("Holiday", false);
        input.scope = Some(AnnouncementScope::System);
        let item = ContentItem::create(ContentKind::Announcement, &admin, input, Utc::now()).unwrap();
        assert!(item.is_system_announcement());
        assert_eq!(item.announcement_scope(), Some(AnnouncementScope::System));
        assert!(!item.is_public);

        let head = principal(Role::DepartmentHead, Some(DepartmentId::new()));
        let mut input = draft("Holiday", false);
        input.scope = Some(AnnouncementScope::System);
        assert!(ContentItem::create(ContentKind::Announcement, &head, input, Utc::now()).is_err());
    }

    #[test]
    fn department_announcement_requires_a_department() {
        let admin = principal(Role::Admin, None);
        let err = ContentItem::create(ContentKind::Announcement, &admin, draft("Hi", false), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated_for_posts_only() {
        let emp = principal(Role::Employee, Some(DepartmentId::new()));
        let mut input = draft("Tagged", false);
        input.tags = vec![" rust ".into(), "rust".into(), "".into(), "Ops".into()];
        let post = ContentItem::create(ContentKind::Post, &emp, input.clone(), Utc::now()).unwrap();
        assert_eq!(post.tags, vec!["rust".to_string(), "Ops".to_string()]);

        let head = principal(Role::DepartmentHead, emp.department_id);
        let doc = ContentItem::create(ContentKind::Document, &head, input, Utc::now()).unwrap();
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn author_edit_of_public_content_reenters_review() {
        let dept = Some(DepartmentId::new());
        let emp = principal(Role::Employee, dept);
        let mut post = ContentItem::create(ContentKind::Post, &emp, draft("Hello", false), Utc::now()).unwrap();
        assert_eq!(post.status, ModerationStatus::Approved);

        let patch = ContentPatch {
            is_public: Some(true),
            ..Default::default()
        };
        post.apply_edit(&emp, patch, Utc::now()).unwrap();
        assert_eq!(post.status, ModerationStatus::Pending);
    }

    #[test]
    fn outsiders_cannot_edit() {
        let emp = principal(Role::Employee, Some(DepartmentId::new()));
        let mut post = ContentItem::create(ContentKind::Post, &emp, draft("Hello", false), Utc::now()).unwrap();
        let other = principal(Role::Employee, emp.department_id);
        let err = post.apply_edit(&other, ContentPatch::default(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn edit_with_contradicting_scope_is_a_validation_error() {
        let admin = principal(Role::Admin, None);
        let mut input = draft("Notice", false);
        input.scope = Some(AnnouncementScope::System);
        let mut item = ContentItem::create(ContentKind::Announcement, &admin, input, Utc::now()).unwrap();
        let patch = ContentPatch {
            scope: Some(AnnouncementScope::Department),
            ..Default::default()
        };
        let err = item.apply_edit(&admin, patch, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
