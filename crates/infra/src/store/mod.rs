//! Repository boundary for portal data.
//!
//! The traits are storage-agnostic. Listing methods take the same
//! [`Predicate`]/[`EventFilter`]/[`UserQuery`] values the domain builds, so
//! visibility rules are decided once and interpreted per backend.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use intraportal_auth::{User, UserQuery};
use intraportal_content::{
    ContentItem, Department, DepartmentSummary, Event, EventFilter, EventParticipant, Predicate, ReadReceipt,
    ReviewComment,
};
use intraportal_core::{ContentId, DepartmentId, EventId, UserId, Window};

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Documents, posts, announcements and their review comments.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn insert_content(&self, item: &ContentItem) -> StoreResult<()>;

    async fn get_content(&self, id: ContentId) -> StoreResult<Option<ContentItem>>;

    /// Replace the stored item. Returns `false` if it no longer exists.
    async fn update_content(&self, item: &ContentItem) -> StoreResult<bool>;

    /// Delete the item with its review comments and read receipts.
    async fn delete_content(&self, id: ContentId) -> StoreResult<bool>;

    /// Matching items, newest first.
    async fn list_content(&self, predicate: &Predicate, window: Window) -> StoreResult<Vec<ContentItem>>;

    async fn count_content(&self, predicate: &Predicate) -> StoreResult<u64>;

    /// Persist a moderation transition together with its optional comment.
    async fn record_review(&self, item: &ContentItem, comment: Option<&ReviewComment>) -> StoreResult<()>;

    async fn add_comment(&self, comment: &ReviewComment) -> StoreResult<()>;

    /// Comments on one item, oldest first.
    async fn list_comments(&self, content_id: ContentId) -> StoreResult<Vec<ReviewComment>>;
}

/// Announcement read receipts.
#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    /// Returns `true` if a new receipt was created.
    async fn mark_read(&self, receipt: &ReadReceipt) -> StoreResult<bool>;

    /// Returns `true` if a receipt existed.
    async fn mark_unread(&self, content_id: ContentId, user_id: UserId) -> StoreResult<bool>;

    /// The subset of `content_ids` the user has read.
    async fn read_set(&self, user_id: UserId, content_ids: &[ContentId]) -> StoreResult<HashSet<ContentId>>;
}

#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    async fn insert_department(&self, department: &Department) -> StoreResult<()>;

    async fn get_department(&self, id: DepartmentId) -> StoreResult<Option<Department>>;

    async fn find_department_by_name(&self, name: &str) -> StoreResult<Option<Department>>;

    async fn update_department(&self, department: &Department) -> StoreResult<bool>;

    async fn delete_department(&self, id: DepartmentId) -> StoreResult<bool>;

    /// All departments ordered by name, with their user counts.
    async fn list_departments(&self) -> StoreResult<Vec<DepartmentSummary>>;

    async fn count_department_users(&self, id: DepartmentId) -> StoreResult<u64>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Lookup by normalized (lowercased) email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn update_user(&self, user: &User) -> StoreResult<bool>;

    async fn delete_user(&self, id: UserId) -> StoreResult<bool>;

    /// Matching users ordered by name.
    async fn list_users(&self, query: &UserQuery, window: Window) -> StoreResult<Vec<User>>;

    async fn count_users(&self, query: &UserQuery) -> StoreResult<u64>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn insert_event(&self, event: &Event) -> StoreResult<()>;

    async fn get_event(&self, id: EventId) -> StoreResult<Option<Event>>;

    async fn update_event(&self, event: &Event) -> StoreResult<bool>;

    /// Delete the event with its participants.
    async fn delete_event(&self, id: EventId) -> StoreResult<bool>;

    /// Matching events ordered by start date.
    async fn list_events(&self, filter: &EventFilter, window: Window) -> StoreResult<Vec<Event>>;

    async fn count_events(&self, filter: &EventFilter) -> StoreResult<u64>;

    /// Insert or replace the (event, user) participation row.
    async fn upsert_participant(&self, participant: &EventParticipant) -> StoreResult<()>;

    async fn list_participants(&self, event_id: EventId) -> StoreResult<Vec<EventParticipant>>;
}

/// Everything the services need from storage.
pub trait Store: ContentRepository + ReceiptRepository + DepartmentRepository + UserRepository + EventRepository {}

impl<T> Store for T where T: ContentRepository + ReceiptRepository + DepartmentRepository + UserRepository + EventRepository {}

pub type SharedStore = Arc<dyn Store>;
