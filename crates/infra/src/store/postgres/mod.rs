//! Postgres-backed store.
//!
//! Listing filters are rendered with `QueryBuilder` (see [`sql`]); every
//! multi-row write (`record_review`, `delete_content`, `delete_event`) runs in
//! one transaction.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use intraportal_auth::{User, UserQuery};
use intraportal_content::{
    ContentItem, Department, DepartmentSummary, Event, EventFilter, EventParticipant, Predicate, ReadReceipt,
    ReviewComment,
};
use intraportal_core::{ContentId, DepartmentId, EventId, UserId, Window};

use super::error::map_sqlx_error;
use super::{
    ContentRepository, DepartmentRepository, EventRepository, ReceiptRepository, StoreError, StoreResult,
    UserRepository,
};

mod rows;
pub(crate) mod sql;

use rows::{
    comment_from_row, department_from_row, department_summary_from_row, event_from_row, participant_from_row,
    user_from_row, ContentRow,
};
use sql::{push_event_filter, push_predicate, push_user_query};

const SCHEMA: &str = include_str!("../../../migrations/0001_init.sql");

const CONTENT_COLUMNS: &str = "id, kind, title, body, author_id, department_id, is_public, status, \
     reviewed_by_id, reviewed_at, tags, attachment, created_at, updated_at";
const EVENT_COLUMNS: &str =
    "id, title, description, location, start_date, end_date, is_public, department_id, created_by_id, created_at, updated_at";
const USER_COLUMNS: &str = "id, email, name, role, department_id, position, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Open a connection pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the bundled schema. Statements are idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn begin(&self, operation: &str) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| map_sqlx_error(operation, e))
    }
}

fn limit_offset(qb: &mut QueryBuilder<'_, Postgres>, window: Window) {
    qb.push(" LIMIT ")
        .push_bind(i64::from(window.limit))
        .push(" OFFSET ")
        .push_bind(i64::try_from(window.offset).unwrap_or(i64::MAX));
}

fn count_of(row: &sqlx::postgres::PgRow, operation: &str) -> StoreResult<u64> {
    let total: i64 = row
        .try_get("total")
        .map_err(|e| StoreError::Corrupt(format!("{operation}: {e}")))?;
    Ok(total.max(0) as u64)
}

async fn write_content(
    tx: &mut Transaction<'_, Postgres>,
    item: &ContentItem,
    operation: &str,
) -> StoreResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE content SET
            title = $2,
            body = $3,
            department_id = $4,
            is_public = $5,
            status = $6,
            reviewed_by_id = $7,
            reviewed_at = $8,
            tags = $9,
            attachment = $10,
            updated_at = $11
        WHERE id = $1
        "#,
    )
    .bind(item.id.as_uuid())
    .bind(&item.title)
    .bind(&item.body)
    .bind(item.department_id.map(|d| *d.as_uuid()))
    .bind(item.is_public)
    .bind(item.status.as_str())
    .bind(item.reviewed_by_id.map(|u| *u.as_uuid()))
    .bind(item.reviewed_at)
    .bind(&item.tags)
    .bind(item.attachment.as_ref().map(Json))
    .bind(item.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error(operation, e))?;
    Ok(result.rows_affected() == 1)
}

async fn insert_comment(
    tx: &mut Transaction<'_, Postgres>,
    comment: &ReviewComment,
    operation: &str,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO review_comments (id, content_id, user_id, content, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(comment.id.as_uuid())
    .bind(comment.content_id.as_uuid())
    .bind(comment.user_id.as_uuid())
    .bind(&comment.content)
    .bind(comment.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error(operation, e))?;
    Ok(())
}

#[async_trait]
impl ContentRepository for PostgresStore {
    #[instrument(skip(self, item), fields(content_id = %item.id, kind = %item.kind), err)]
    async fn insert_content(&self, item: &ContentItem) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO content (
                id, kind, title, body, author_id, department_id, is_public, status,
                reviewed_by_id, reviewed_at, tags, attachment, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.kind.as_str())
        .bind(&item.title)
        .bind(&item.body)
        .bind(item.author_id.as_uuid())
        .bind(item.department_id.map(|d| *d.as_uuid()))
        .bind(item.is_public)
        .bind(item.status.as_str())
        .bind(item.reviewed_by_id.map(|u| *u.as_uuid()))
        .bind(item.reviewed_at)
        .bind(&item.tags)
        .bind(item.attachment.as_ref().map(Json))
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_content", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get_content(&self, id: ContentId) -> StoreResult<Option<ContentItem>> {
        let row = sqlx::query(&format!("SELECT {CONTENT_COLUMNS} FROM content WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_content", e))?;
        row.map(|r| {
            ContentRow::from_row(&r)
                .map_err(|e| StoreError::Corrupt(format!("content: {e}")))
                .and_then(ContentItem::try_from)
        })
        .transpose()
    }

    #[instrument(skip(self, item), fields(content_id = %item.id), err)]
    async fn update_content(&self, item: &ContentItem) -> StoreResult<bool> {
        let mut tx = self.begin("update_content").await?;
        let updated = write_content(&mut tx, item, "update_content").await?;
        tx.commit().await.map_err(|e| map_sqlx_error("update_content", e))?;
        Ok(updated)
    }

    #[instrument(skip(self), err)]
    async fn delete_content(&self, id: ContentId) -> StoreResult<bool> {
        let mut tx = self.begin("delete_content").await?;
        for table in ["review_comments", "read_receipts"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE content_id = $1"))
                .bind(id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("delete_content", e))?;
        }
        let result = sqlx::query("DELETE FROM content WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_content", e))?;
        tx.commit().await.map_err(|e| map_sqlx_error("delete_content", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, predicate), fields(offset = window.offset, limit = window.limit), err)]
    async fn list_content(&self, predicate: &Predicate, window: Window) -> StoreResult<Vec<ContentItem>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {CONTENT_COLUMNS} FROM content WHERE "));
        push_predicate(&mut qb, predicate);
        qb.push(" ORDER BY updated_at DESC, id DESC");
        limit_offset(&mut qb, window);

        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_content", e))?;
        rows.iter()
            .map(|r| {
                ContentRow::from_row(r)
                    .map_err(|e| StoreError::Corrupt(format!("content: {e}")))
                    .and_then(ContentItem::try_from)
            })
            .collect()
    }

    #[instrument(skip(self, predicate), err)]
    async fn count_content(&self, predicate: &Predicate) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS total FROM content WHERE ");
        push_predicate(&mut qb, predicate);
        let row = qb
            .build()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_content", e))?;
        count_of(&row, "count_content")
    }

    #[instrument(skip(self, item, comment), fields(content_id = %item.id, status = %item.status), err)]
    async fn record_review(&self, item: &ContentItem, comment: Option<&ReviewComment>) -> StoreResult<()> {
        let mut tx = self.begin("record_review").await?;
        if !write_content(&mut tx, item, "record_review").await? {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::Query(format!("content {} disappeared during review", item.id)));
        }
        if let Some(comment) = comment {
            insert_comment(&mut tx, comment, "record_review").await?;
        }
        tx.commit().await.map_err(|e| map_sqlx_error("record_review", e))?;
        Ok(())
    }

    #[instrument(skip(self, comment), fields(content_id = %comment.content_id), err)]
    async fn add_comment(&self, comment: &ReviewComment) -> StoreResult<()> {
        let mut tx = self.begin("add_comment").await?;
        insert_comment(&mut tx, comment, "add_comment").await?;
        tx.commit().await.map_err(|e| map_sqlx_error("add_comment", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_comments(&self, content_id: ContentId) -> StoreResult<Vec<ReviewComment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, content_id, user_id, content, created_at
            FROM review_comments
            WHERE content_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(content_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_comments", e))?;
        rows.iter()
            .map(|r| comment_from_row(r).map_err(|e| StoreError::Corrupt(format!("review_comments: {e}"))))
            .collect()
    }
}

#[async_trait]
impl ReceiptRepository for PostgresStore {
    #[instrument(skip(self, receipt), fields(content_id = %receipt.content_id, user_id = %receipt.user_id), err)]
    async fn mark_read(&self, receipt: &ReadReceipt) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO read_receipts (content_id, user_id, read_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (content_id, user_id) DO NOTHING
            "#,
        )
        .bind(receipt.content_id.as_uuid())
        .bind(receipt.user_id.as_uuid())
        .bind(receipt.read_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("mark_read", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), err)]
    async fn mark_unread(&self, content_id: ContentId, user_id: UserId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM read_receipts WHERE content_id = $1 AND user_id = $2")
            .bind(content_id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("mark_unread", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, content_ids), fields(count = content_ids.len()), err)]
    async fn read_set(&self, user_id: UserId, content_ids: &[ContentId]) -> StoreResult<HashSet<ContentId>> {
        if content_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<Uuid> = content_ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query("SELECT content_id FROM read_receipts WHERE user_id = $1 AND content_id = ANY($2)")
            .bind(user_id.as_uuid())
            .bind(&ids)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("read_set", e))?;
        rows.iter()
            .map(|r| {
                r.try_get::<Uuid, _>("content_id")
                    .map(ContentId::from_uuid)
                    .map_err(|e| StoreError::Corrupt(format!("read_receipts: {e}")))
            })
            .collect()
    }
}

#[async_trait]
impl DepartmentRepository for PostgresStore {
    #[instrument(skip(self, department), fields(department_id = %department.id), err)]
    async fn insert_department(&self, department: &Department) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO departments (id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(department.id.as_uuid())
        .bind(&department.name)
        .bind(&department.description)
        .bind(department.created_at)
        .bind(department.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_department", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get_department(&self, id: DepartmentId) -> StoreResult<Option<Department>> {
        let row = sqlx::query("SELECT id, name, description, created_at, updated_at FROM departments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_department", e))?;
        row.map(|r| department_from_row(&r).map_err(|e| StoreError::Corrupt(format!("departments: {e}"))))
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_department_by_name(&self, name: &str) -> StoreResult<Option<Department>> {
        let row = sqlx::query("SELECT id, name, description, created_at, updated_at FROM departments WHERE name = $1")
            .bind(name)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_department_by_name", e))?;
        row.map(|r| department_from_row(&r).map_err(|e| StoreError::Corrupt(format!("departments: {e}"))))
            .transpose()
    }

    #[instrument(skip(self, department), fields(department_id = %department.id), err)]
    async fn update_department(&self, department: &Department) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE departments SET name = $2, description = $3, updated_at = $4 WHERE id = $1")
            .bind(department.id.as_uuid())
            .bind(&department.name)
            .bind(&department.description)
            .bind(department.updated_at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_department", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), err)]
    async fn delete_department(&self, id: DepartmentId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_department", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), err)]
    async fn list_departments(&self) -> StoreResult<Vec<DepartmentSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT d.id, d.name, d.description, d.created_at, d.updated_at, COUNT(u.id) AS user_count
            FROM departments d
            LEFT JOIN users u ON u.department_id = d.id
            GROUP BY d.id
            ORDER BY d.name ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_departments", e))?;
        rows.iter()
            .map(|r| department_summary_from_row(r).map_err(|e| StoreError::Corrupt(format!("departments: {e}"))))
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn count_department_users(&self, id: DepartmentId) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM users WHERE department_id = $1")
            .bind(id.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_department_users", e))?;
        count_of(&row, "count_department_users")
    }
}

#[async_trait]
impl UserRepository for PostgresStore {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, role, department_id, position, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.department_id.map(|d| *d.as_uuid()))
        .bind(&user.position)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        row.map(|r| user_from_row(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.map(|r| user_from_row(&r)).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                name = $3,
                role = $4,
                department_id = $5,
                position = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.department_id.map(|d| *d.as_uuid()))
        .bind(&user.position)
        .bind(user.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), err)]
    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, query), err)]
    async fn list_users(&self, query: &UserQuery, window: Window) -> StoreResult<Vec<User>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE "));
        push_user_query(&mut qb, query);
        qb.push(" ORDER BY name ASC, id ASC");
        limit_offset(&mut qb, window);
        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self, query), err)]
    async fn count_users(&self, query: &UserQuery) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS total FROM users WHERE ");
        push_user_query(&mut qb, query);
        let row = qb
            .build()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_users", e))?;
        count_of(&row, "count_users")
    }
}

#[async_trait]
impl EventRepository for PostgresStore {
    #[instrument(skip(self, event), fields(event_id = %event.id), err)]
    async fn insert_event(&self, event: &Event) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO events (
                id, title, description, location, start_date, end_date,
                is_public, department_id, created_by_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.is_public)
        .bind(event.department_id.as_uuid())
        .bind(event.created_by_id.as_uuid())
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_event", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get_event(&self, id: EventId) -> StoreResult<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_event", e))?;
        row.map(|r| event_from_row(&r).map_err(|e| StoreError::Corrupt(format!("events: {e}"))))
            .transpose()
    }

    #[instrument(skip(self, event), fields(event_id = %event.id), err)]
    async fn update_event(&self, event: &Event) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events SET
                title = $2,
                description = $3,
                location = $4,
                start_date = $5,
                end_date = $6,
                is_public = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.is_public)
        .bind(event.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_event", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), err)]
    async fn delete_event(&self, id: EventId) -> StoreResult<bool> {
        let mut tx = self.begin("delete_event").await?;
        sqlx::query("DELETE FROM event_participants WHERE event_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_event", e))?;
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_event", e))?;
        tx.commit().await.map_err(|e| map_sqlx_error("delete_event", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, filter), fields(offset = window.offset, limit = window.limit), err)]
    async fn list_events(&self, filter: &EventFilter, window: Window) -> StoreResult<Vec<Event>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {EVENT_COLUMNS} FROM events WHERE "));
        push_event_filter(&mut qb, filter);
        qb.push(" ORDER BY start_date ASC, id ASC");
        limit_offset(&mut qb, window);
        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_events", e))?;
        rows.iter()
            .map(|r| event_from_row(r).map_err(|e| StoreError::Corrupt(format!("events: {e}"))))
            .collect()
    }

    #[instrument(skip(self, filter), err)]
    async fn count_events(&self, filter: &EventFilter) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS total FROM events WHERE ");
        push_event_filter(&mut qb, filter);
        let row = qb
            .build()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_events", e))?;
        count_of(&row, "count_events")
    }

    #[instrument(skip(self, participant), fields(event_id = %participant.event_id, user_id = %participant.user_id), err)]
    async fn upsert_participant(&self, participant: &EventParticipant) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO event_participants (event_id, user_id, status, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (event_id, user_id)
            DO UPDATE SET
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(participant.event_id.as_uuid())
        .bind(participant.user_id.as_uuid())
        .bind(participant.status.as_str())
        .bind(participant.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_participant", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_participants(&self, event_id: EventId) -> StoreResult<Vec<EventParticipant>> {
        let rows = sqlx::query(
            r#"
            SELECT event_id, user_id, status, updated_at
            FROM event_participants
            WHERE event_id = $1
            ORDER BY user_id ASC
            "#,
        )
        .bind(event_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_participants", e))?;
        rows.iter().map(participant_from_row).collect()
    }
}
