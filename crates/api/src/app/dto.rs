use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use intraportal_auth::{Role, UserQuery};
use intraportal_content::{
    ContentItem, ContentQuery, EventFilter, ModerationAction, ModerationCommand, ModerationStatus, ParticipantStatus,
};
use intraportal_core::{
    AnnouncementScope, ContentId, ContentKind, DepartmentId, DomainError, DomainResult, PageRequest, UserId,
};

// -------------------------
// Query strings
// -------------------------

/// Common listing parameters for content endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(alias = "q")]
    pub search: Option<String>,
    pub status: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub is_public: Option<bool>,
    pub author_id: Option<UserId>,
    /// Content type for admin listings, announcement scope for announcements.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub scope: Option<String>,
}

impl ListParams {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn status(&self) -> DomainResult<Option<ModerationStatus>> {
        parse_optional(self.status.as_deref())
    }

    pub fn scope(&self) -> DomainResult<Option<AnnouncementScope>> {
        parse_optional(self.scope.as_deref())
    }

    /// Explicit filters; `kind` and `announcement_scope` are set by the caller.
    pub fn query(&self) -> DomainResult<ContentQuery> {
        Ok(ContentQuery {
            kind: None,
            search: self.search.clone(),
            status: self.status()?,
            department_id: self.department_id,
            is_public: self.is_public,
            announcement_scope: None,
            author_id: self.author_id,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(alias = "q")]
    pub search: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub is_public: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl EventListParams {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn apply(&self, filter: EventFilter) -> EventFilter {
        EventFilter {
            department_id: self.department_id,
            is_public: self.is_public,
            from: self.from,
            to: self.to,
            ..filter.with_search(self.search.as_deref())
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(alias = "q")]
    pub search: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub role: Option<String>,
}

impl UserListParams {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn query(&self) -> DomainResult<UserQuery> {
        Ok(UserQuery {
            department_id: self.department_id,
            role: parse_optional::<Role>(self.role.as_deref())?,
            search: self.search.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListParams {
    pub content_id: ContentId,
}

// -------------------------
// Request bodies
// -------------------------

/// Moderation request. The per-type approve endpoints accept `status` as an
/// alias of `action` and default to approving.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateRequest {
    #[serde(alias = "id")]
    pub content_id: ContentId,
    pub content_type: Option<String>,
    #[serde(alias = "status")]
    pub action: Option<String>,
    pub comment: Option<String>,
    pub is_public: Option<bool>,
}

impl ModerateRequest {
    pub fn command(&self, default: Option<ModerationAction>) -> DomainResult<ModerationCommand> {
        let action = match (self.action.as_deref(), default) {
            (Some(raw), _) => raw.parse()?,
            (None, Some(action)) => action,
            (None, None) => return Err(DomainError::validation("action is required")),
        };
        Ok(ModerationCommand {
            action,
            make_public: self.is_public,
        })
    }

    pub fn content_type(&self) -> DomainResult<Option<ContentKind>> {
        parse_optional(self.content_type.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub content_id: Option<ContentId>,
    #[serde(alias = "comment")]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationRequest {
    pub user_id: Option<UserId>,
    pub status: ParticipantStatus,
}

// -------------------------
// Responses
// -------------------------

/// An announcement decorated with the caller's read state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementView {
    #[serde(flatten)]
    pub item: ContentItem,
    pub is_read: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadStateResponse {
    pub status: &'static str,
    pub is_read: bool,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn parse_optional<T>(raw: Option<&str>) -> DomainResult<Option<T>>
where
    T: core::str::FromStr<Err = DomainError>,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value.parse().map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_parse_lowercase_status() {
        let params = ListParams {
            status: Some("pending".to_string()),
            search: Some("  ".to_string()),
            ..Default::default()
        };
        let query = params.query().unwrap();
        assert_eq!(query.status, Some(ModerationStatus::Pending));

        let bad = ListParams {
            status: Some("archived".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad.query(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn approve_endpoints_default_to_approve() {
        let req: ModerateRequest = serde_json::from_value(serde_json::json!({
            "id": ContentId::new(),
            "comment": "looks good",
        }))
        .unwrap();
        let command = req.command(Some(ModerationAction::Approve)).unwrap();
        assert_eq!(command.action, ModerationAction::Approve);
        assert!(req.command(None).is_err());

        let req: ModerateRequest = serde_json::from_value(serde_json::json!({
            "contentId": ContentId::new(),
            "status": "REJECTED",
        }))
        .unwrap();
        assert_eq!(req.command(None).unwrap().action, ModerationAction::Reject);
    }

    #[test]
    fn announcement_view_flattens_item() {
        let principal = intraportal_auth::Principal::new(UserId::new(), Role::Admin, Some(DepartmentId::new()));
        let item = ContentItem::create(
            ContentKind::Announcement,
            &principal,
            intraportal_content::NewContent {
                title: "Hello".to_string(),
                body: "World".to_string(),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        let json = serde_json::to_value(AnnouncementView { item, is_read: true }).unwrap();
        assert_eq!(json["title"], "Hello");
        assert_eq!(json["isRead"], true);
    }
}
