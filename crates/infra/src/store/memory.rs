//! In-memory store for tests/dev.
//!
//! All tables sit behind one `RwLock`, so every trait method (including the
//! multi-row `record_review` and `delete_content`) runs atomically with
//! respect to the others. Constraint checks mirror the Postgres schema.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use intraportal_auth::{User, UserQuery};
use intraportal_content::{
    newest_first, ContentItem, Department, DepartmentSummary, Event, EventFilter, EventParticipant, Predicate,
    ReadReceipt, ReviewComment,
};
use intraportal_core::{ContentId, DepartmentId, EventId, UserId, Window};

use super::{
    ContentRepository, DepartmentRepository, EventRepository, ReceiptRepository, StoreError, StoreResult,
    UserRepository,
};

#[derive(Debug, Default)]
struct Tables {
    content: HashMap<ContentId, ContentItem>,
    comments: Vec<ReviewComment>,
    receipts: HashMap<(ContentId, UserId), ReadReceipt>,
    departments: HashMap<DepartmentId, Department>,
    users: HashMap<UserId, User>,
    events: HashMap<EventId, Event>,
    participants: BTreeMap<(EventId, UserId), EventParticipant>,
}

impl Tables {
    fn users_in(&self, department_id: DepartmentId) -> u64 {
        self.users
            .values()
            .filter(|u| u.department_id == Some(department_id))
            .count() as u64
    }

    fn email_taken(&self, email: &str, except: UserId) -> bool {
        self.users.values().any(|u| u.email == email && u.id != except)
    }

    fn department_name_taken(&self, name: &str, except: DepartmentId) -> bool {
        self.departments.values().any(|d| d.name == name && d.id != except)
    }

    fn check_department_exists(&self, department_id: Option<DepartmentId>) -> StoreResult<()> {
        match department_id {
            Some(id) if !self.departments.contains_key(&id) => {
                Err(StoreError::ForeignKeyViolation("department".to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

fn page<T>(rows: Vec<T>, window: Window) -> Vec<T> {
    let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(window.limit as usize).collect()
}

#[async_trait]
impl ContentRepository for InMemoryStore {
    async fn insert_content(&self, item: &ContentItem) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.content.contains_key(&item.id) {
            return Err(StoreError::UniqueViolation("content id".to_string()));
        }
        t.content.insert(item.id, item.clone());
        Ok(())
    }

    async fn get_content(&self, id: ContentId) -> StoreResult<Option<ContentItem>> {
        Ok(self.read()?.content.get(&id).cloned())
    }

    async fn update_content(&self, item: &ContentItem) -> StoreResult<bool> {
        let mut t = self.write()?;
        match t.content.get_mut(&item.id) {
            Some(slot) => {
                *slot = item.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_content(&self, id: ContentId) -> StoreResult<bool> {
        let mut t = self.write()?;
        if t.content.remove(&id).is_none() {
            return Ok(false);
        }
        t.comments.retain(|c| c.content_id != id);
        t.receipts.retain(|(content_id, _), _| *content_id != id);
        Ok(true)
    }

    async fn list_content(&self, predicate: &Predicate, window: Window) -> StoreResult<Vec<ContentItem>> {
        let t = self.read()?;
        let mut rows: Vec<ContentItem> = t.content.values().filter(|i| predicate.matches(i)).cloned().collect();
        rows.sort_by(newest_first);
        Ok(page(rows, window))
    }

    async fn count_content(&self, predicate: &Predicate) -> StoreResult<u64> {
        let t = self.read()?;
        Ok(t.content.values().filter(|i| predicate.matches(i)).count() as u64)
    }

    async fn record_review(&self, item: &ContentItem, comment: Option<&ReviewComment>) -> StoreResult<()> {
        let mut t = self.write()?;
        let Some(slot) = t.content.get_mut(&item.id) else {
            return Err(StoreError::Query(format!("content {} disappeared during review", item.id)));
        };
        *slot = item.clone();
        if let Some(comment) = comment {
            t.comments.push(comment.clone());
        }
        Ok(())
    }

    async fn add_comment(&self, comment: &ReviewComment) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.content.contains_key(&comment.content_id) {
            return Err(StoreError::ForeignKeyViolation("content".to_string()));
        }
        t.comments.push(comment.clone());
        Ok(())
    }

    async fn list_comments(&self, content_id: ContentId) -> StoreResult<Vec<ReviewComment>> {
        let t = self.read()?;
        let mut rows: Vec<ReviewComment> = t.comments.iter().filter(|c| c.content_id == content_id).cloned().collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }
}

#[async_trait]
impl ReceiptRepository for InMemoryStore {
    async fn mark_read(&self, receipt: &ReadReceipt) -> StoreResult<bool> {
        let mut t = self.write()?;
        if !t.content.contains_key(&receipt.content_id) {
            return Err(StoreError::ForeignKeyViolation("announcement".to_string()));
        }
        let key = (receipt.content_id, receipt.user_id);
        if t.receipts.contains_key(&key) {
            return Ok(false);
        }
        t.receipts.insert(key, receipt.clone());
        Ok(true)
    }

    async fn mark_unread(&self, content_id: ContentId, user_id: UserId) -> StoreResult<bool> {
        Ok(self.write()?.receipts.remove(&(content_id, user_id)).is_some())
    }

    async fn read_set(&self, user_id: UserId, content_ids: &[ContentId]) -> StoreResult<HashSet<ContentId>> {
        let t = self.read()?;
        Ok(content_ids
            .iter()
            .copied()
            .filter(|id| t.receipts.contains_key(&(*id, user_id)))
            .collect())
    }
}

#[async_trait]
impl DepartmentRepository for InMemoryStore {
    async fn insert_department(&self, department: &Department) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.department_name_taken(&department.name, department.id) {
            return Err(StoreError::UniqueViolation("department name".to_string()));
        }
        t.departments.insert(department.id, department.clone());
        Ok(())
    }

    async fn get_department(&self, id: DepartmentId) -> StoreResult<Option<Department>> {
        Ok(self.read()?.departments.get(&id).cloned())
    }

    async fn find_department_by_name(&self, name: &str) -> StoreResult<Option<Department>> {
        Ok(self.read()?.departments.values().find(|d| d.name == name).cloned())
    }

    async fn update_department(&self, department: &Department) -> StoreResult<bool> {
        let mut t = self.write()?;
        if !t.departments.contains_key(&department.id) {
            return Ok(false);
        }
        if t.department_name_taken(&department.name, department.id) {
            return Err(StoreError::UniqueViolation("department name".to_string()));
        }
        t.departments.insert(department.id, department.clone());
        Ok(true)
    }

    async fn delete_department(&self, id: DepartmentId) -> StoreResult<bool> {
        let mut t = self.write()?;
        if t.users_in(id) > 0 {
            return Err(StoreError::ForeignKeyViolation("department".to_string()));
        }
        Ok(t.departments.remove(&id).is_some())
    }

    async fn list_departments(&self) -> StoreResult<Vec<DepartmentSummary>> {
        let t = self.read()?;
        let mut rows: Vec<DepartmentSummary> = t
            .departments
            .values()
            .map(|d| DepartmentSummary {
                department: d.clone(),
                user_count: t.users_in(d.id),
            })
            .collect();
        rows.sort_by(|a, b| a.department.name.cmp(&b.department.name));
        Ok(rows)
    }

    async fn count_department_users(&self, id: DepartmentId) -> StoreResult<u64> {
        Ok(self.read()?.users_in(id))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.email_taken(&user.email, user.id) {
            return Err(StoreError::UniqueViolation("email".to_string()));
        }
        t.check_department_exists(user.department_id)?;
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let mut t = self.write()?;
        if !t.users.contains_key(&user.id) {
            return Ok(false);
        }
        if t.email_taken(&user.email, user.id) {
            return Err(StoreError::UniqueViolation("email".to_string()));
        }
        t.check_department_exists(user.department_id)?;
        t.users.insert(user.id, user.clone());
        Ok(true)
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        Ok(self.write()?.users.remove(&id).is_some())
    }

    async fn list_users(&self, query: &UserQuery, window: Window) -> StoreResult<Vec<User>> {
        let t = self.read()?;
        let mut rows: Vec<User> = t.users.values().filter(|u| query.matches(u)).cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(page(rows, window))
    }

    async fn count_users(&self, query: &UserQuery) -> StoreResult<u64> {
        Ok(self.read()?.users.values().filter(|u| query.matches(u)).count() as u64)
    }
}

#[async_trait]
impl EventRepository for InMemoryStore {
    async fn insert_event(&self, event: &Event) -> StoreResult<()> {
        self.write()?.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn get_event(&self, id: EventId) -> StoreResult<Option<Event>> {
        Ok(self.read()?.events.get(&id).cloned())
    }

    async fn update_event(&self, event: &Event) -> StoreResult<bool> {
        let mut t = self.write()?;
        match t.events.get_mut(&event.id) {
            Some(slot) => {
                *slot = event.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_event(&self, id: EventId) -> StoreResult<bool> {
        let mut t = self.write()?;
        if t.events.remove(&id).is_none() {
            return Ok(false);
        }
        t.participants.retain(|(event_id, _), _| *event_id != id);
        Ok(true)
    }

    async fn list_events(&self, filter: &EventFilter, window: Window) -> StoreResult<Vec<Event>> {
        let t = self.read()?;
        let mut rows: Vec<Event> = t.events.values().filter(|e| filter.matches(e)).cloned().collect();
        rows.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));
        Ok(page(rows, window))
    }

    async fn count_events(&self, filter: &EventFilter) -> StoreResult<u64> {
        Ok(self.read()?.events.values().filter(|e| filter.matches(e)).count() as u64)
    }

    async fn upsert_participant(&self, participant: &EventParticipant) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.events.contains_key(&participant.event_id) {
            return Err(StoreError::ForeignKeyViolation("event".to_string()));
        }
        t.participants
            .insert((participant.event_id, participant.user_id), participant.clone());
        Ok(())
    }

    async fn list_participants(&self, event_id: EventId) -> StoreResult<Vec<EventParticipant>> {
        let t = self.read()?;
        Ok(t.participants
            .values()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use intraportal_auth::{NewUser, Principal, Role};
    use intraportal_content::{ContentQuery, NewContent, NewDepartment, ModerationStatus, build_predicate};
    use intraportal_core::ContentKind;

    use super::*;

    fn post(author: &Principal, title: &str, is_public: bool) -> ContentItem {
        let input = NewContent {
            title: title.to_string(),
            body: "body".to_string(),
            is_public,
            ..Default::default()
        };
        ContentItem::create(ContentKind::Post, author, input, Utc::now()).unwrap()
    }

    fn department(name: &str) -> Department {
        Department::create(
            NewDepartment {
                name: name.to_string(),
                description: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn user(email: &str, department_id: Option<DepartmentId>) -> User {
        User::create(
            NewUser {
                email: email.to_string(),
                name: email.to_string(),
                role: None,
                department_id,
                position: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn listing_applies_predicate_window_and_order() {
        let store = InMemoryStore::new();
        let author = Principal::new(UserId::new(), Role::Employee, Some(DepartmentId::new()));
        let base = Utc::now();
        for i in 0..15 {
            let mut item = post(&author, &format!("post {i}"), false);
            item.updated_at = base + Duration::seconds(i);
            store.insert_content(&item).await.unwrap();
        }

        let predicate = build_predicate(&author, &ContentQuery::of_kind(ContentKind::Post));
        assert_eq!(store.count_content(&predicate).await.unwrap(), 15);

        let second = store.list_content(&predicate, Window { offset: 10, limit: 10 }).await.unwrap();
        assert_eq!(second.len(), 5);
        assert_eq!(second[0].title, "post 4");
    }

    #[tokio::test]
    async fn review_and_delete_are_atomic_with_comments_and_receipts() {
        let store = InMemoryStore::new();
        let author = Principal::new(UserId::new(), Role::Employee, Some(DepartmentId::new()));
        let mut item = post(&author, "pending", true);
        store.insert_content(&item).await.unwrap();

        item.status = ModerationStatus::Approved;
        let comment = ReviewComment::new(item.id, UserId::new(), "ok", Utc::now()).unwrap();
        store.record_review(&item, Some(&comment)).await.unwrap();
        assert_eq!(store.list_comments(item.id).await.unwrap().len(), 1);
        assert_eq!(
            store.get_content(item.id).await.unwrap().unwrap().status,
            ModerationStatus::Approved
        );

        let receipt = ReadReceipt::new(item.id, author.id, Utc::now());
        assert!(store.mark_read(&receipt).await.unwrap());
        assert!(!store.mark_read(&receipt).await.unwrap());

        assert!(store.delete_content(item.id).await.unwrap());
        assert!(store.list_comments(item.id).await.unwrap().is_empty());
        assert!(store.read_set(author.id, &[item.id]).await.unwrap().is_empty());
        assert!(!store.delete_content(item.id).await.unwrap());
    }

    #[tokio::test]
    async fn unique_names_and_emails() {
        let store = InMemoryStore::new();
        store.insert_department(&department("Engineering")).await.unwrap();
        assert!(matches!(
            store.insert_department(&department("Engineering")).await,
            Err(StoreError::UniqueViolation(_))
        ));

        store.insert_user(&user("a@example.com", None)).await.unwrap();
        assert!(matches!(
            store.insert_user(&user("a@example.com", None)).await,
            Err(StoreError::UniqueViolation(_))
        ));
    }

    #[tokio::test]
    async fn departments_with_users_cannot_be_deleted() {
        let store = InMemoryStore::new();
        let dept = department("Sales");
        store.insert_department(&dept).await.unwrap();
        let member = user("s@example.com", Some(dept.id));
        store.insert_user(&member).await.unwrap();

        let summaries = store.list_departments().await.unwrap();
        assert_eq!(summaries[0].user_count, 1);
        assert!(matches!(
            store.delete_department(dept.id).await,
            Err(StoreError::ForeignKeyViolation(_))
        ));

        store.delete_user(member.id).await.unwrap();
        assert!(store.delete_department(dept.id).await.unwrap());
    }

    #[tokio::test]
    async fn users_must_reference_existing_departments() {
        let store = InMemoryStore::new();
        let err = store
            .insert_user(&user("ghost@example.com", Some(DepartmentId::new())))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }
}
