//! SQLx row types and their conversion into domain records.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

use intraportal_auth::{Role, User};
use intraportal_content::{
    Attachment, ContentItem, Department, DepartmentSummary, Event, EventParticipant, ModerationStatus,
    ParticipantStatus, ReviewComment,
};
use intraportal_core::{CommentId, ContentId, ContentKind, DepartmentId, EventId, UserId};

use crate::store::StoreError;

fn corrupt(table: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{table}: {err}"))
}

#[derive(Debug)]
pub(crate) struct ContentRow {
    id: Uuid,
    kind: String,
    title: String,
    body: String,
    author_id: Uuid,
    department_id: Option<Uuid>,
    is_public: bool,
    status: String,
    reviewed_by_id: Option<Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
    tags: Vec<String>,
    attachment: Option<Json<Attachment>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ContentRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ContentRow {
            id: row.try_get("id")?,
            kind: row.try_get("kind")?,
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            author_id: row.try_get("author_id")?,
            department_id: row.try_get("department_id")?,
            is_public: row.try_get("is_public")?,
            status: row.try_get("status")?,
            reviewed_by_id: row.try_get("reviewed_by_id")?,
            reviewed_at: row.try_get("reviewed_at")?,
            tags: row.try_get("tags")?,
            attachment: row.try_get("attachment")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ContentRow> for ContentItem {
    type Error = StoreError;

    fn try_from(row: ContentRow) -> Result<Self, Self::Error> {
        let kind: ContentKind = row.kind.parse().map_err(|e| corrupt("content.kind", e))?;
        let status: ModerationStatus = row.status.parse().map_err(|e| corrupt("content.status", e))?;
        Ok(ContentItem {
            id: ContentId::from_uuid(row.id),
            kind,
            title: row.title,
            body: row.body,
            author_id: UserId::from_uuid(row.author_id),
            department_id: row.department_id.map(DepartmentId::from_uuid),
            is_public: row.is_public,
            status,
            reviewed_by_id: row.reviewed_by_id.map(UserId::from_uuid),
            reviewed_at: row.reviewed_at,
            tags: row.tags,
            attachment: row.attachment.map(|Json(a)| a),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn comment_from_row(row: &PgRow) -> Result<ReviewComment, sqlx::Error> {
    Ok(ReviewComment {
        id: CommentId::from_uuid(row.try_get("id")?),
        content_id: ContentId::from_uuid(row.try_get("content_id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) fn department_from_row(row: &PgRow) -> Result<Department, sqlx::Error> {
    Ok(Department {
        id: DepartmentId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) fn department_summary_from_row(row: &PgRow) -> Result<DepartmentSummary, sqlx::Error> {
    let user_count: i64 = row.try_get("user_count")?;
    Ok(DepartmentSummary {
        department: department_from_row(row)?,
        user_count: user_count.max(0) as u64,
    })
}

pub(crate) fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let role: String = row.try_get("role").map_err(|e| corrupt("users", e))?;
    let role: Role = role.parse().map_err(|e| corrupt("users.role", e))?;
    let department_id: Option<Uuid> = row.try_get("department_id").map_err(|e| corrupt("users", e))?;
    let read = || -> Result<User, sqlx::Error> {
        Ok(User {
            id: UserId::from_uuid(row.try_get("id")?),
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            role,
            department_id: department_id.map(DepartmentId::from_uuid),
            position: row.try_get("position")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    };
    read().map_err(|e| corrupt("users", e))
}

pub(crate) fn event_from_row(row: &PgRow) -> Result<Event, sqlx::Error> {
    Ok(Event {
        id: EventId::from_uuid(row.try_get("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        location: row.try_get("location")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        is_public: row.try_get("is_public")?,
        department_id: DepartmentId::from_uuid(row.try_get("department_id")?),
        created_by_id: UserId::from_uuid(row.try_get("created_by_id")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) fn participant_from_row(row: &PgRow) -> Result<EventParticipant, StoreError> {
    let status: String = row.try_get("status").map_err(|e| corrupt("event_participants", e))?;
    let status: ParticipantStatus = status.parse().map_err(|e| corrupt("event_participants.status", e))?;
    let read = || -> Result<EventParticipant, sqlx::Error> {
        Ok(EventParticipant {
            event_id: EventId::from_uuid(row.try_get("event_id")?),
            user_id: UserId::from_uuid(row.try_get("user_id")?),
            status,
            updated_at: row.try_get("updated_at")?,
        })
    };
    read().map_err(|e| corrupt("event_participants", e))
}
