//! Department and system announcements with per-user read receipts.

use std::collections::HashSet;

use tracing::{info, instrument};

use intraportal_auth::Principal;
use intraportal_content::{
    build_predicate, check_target, ContentItem, ContentPatch, ContentQuery, ModerationStatus, NewContent,
    ReadOutcome, ReadReceipt,
};
use intraportal_core::{AnnouncementScope, ContentId, ContentKind, DomainError, DomainResult, Page, PageRequest};

use super::{now, AppServices};
use crate::app::dto::AnnouncementView;

impl AppServices {
    /// Load an announcement through an endpoint of the `expected` sub-kind.
    async fn announcement(
        &self,
        principal: &Principal,
        id: ContentId,
        expected: AnnouncementScope,
    ) -> DomainResult<ContentItem> {
        let item = self
            .store
            .get_content(id)
            .await?
            .ok_or_else(|| DomainError::not_found("announcement"))?;
        check_target(&item, expected, principal)?;
        Ok(item)
    }

    async fn decorate(&self, principal: &Principal, items: Vec<ContentItem>) -> DomainResult<Vec<AnnouncementView>> {
        let ids: Vec<ContentId> = items.iter().map(|i| i.id).collect();
        let read: HashSet<ContentId> = if ids.is_empty() {
            HashSet::new()
        } else {
            self.store.read_set(principal.id, &ids).await?
        };
        Ok(items
            .into_iter()
            .map(|item| AnnouncementView {
                is_read: read.contains(&item.id),
                item,
            })
            .collect())
    }

    /// Announcements visible to the principal. `scope = None` lists both sub-kinds.
    pub async fn list_announcements(
        &self,
        principal: &Principal,
        scope: Option<AnnouncementScope>,
        mut query: ContentQuery,
        page: PageRequest,
    ) -> DomainResult<Page<AnnouncementView>> {
        query.kind = Some(ContentKind::Announcement);
        query.announcement_scope = scope.or(query.announcement_scope);
        let result = self.paginate(&build_predicate(principal, &query), page).await?;
        let items = self.decorate(principal, result.items).await?;
        Ok(Page {
            items,
            total: result.total,
            page: result.page,
            limit: result.limit,
            total_pages: result.total_pages,
        })
    }

    /// The company-wide feed: approved public system announcements.
    pub async fn public_system_feed(
        &self,
        principal: &Principal,
        page: PageRequest,
    ) -> DomainResult<Page<AnnouncementView>> {
        let query = ContentQuery {
            is_public: Some(true),
            status: Some(ModerationStatus::Approved),
            ..Default::default()
        };
        self.list_announcements(principal, Some(AnnouncementScope::System), query, page)
            .await
    }

    pub async fn get_announcement(
        &self,
        principal: &Principal,
        id: ContentId,
        scope: AnnouncementScope,
    ) -> DomainResult<AnnouncementView> {
        let item = self.announcement(principal, id, scope).await?;
        let mut views = self.decorate(principal, vec![item]).await?;
        views
            .pop()
            .ok_or_else(|| DomainError::internal("announcement vanished while decorating"))
    }

    /// Create an announcement. `route_scope` is the sub-kind implied by the
    /// endpoint; an explicit `scope` in the body must agree with it.
    pub async fn create_announcement(
        &self,
        principal: &Principal,
        route_scope: Option<AnnouncementScope>,
        mut input: NewContent,
    ) -> DomainResult<ContentItem> {
        match (route_scope, input.scope) {
            (Some(route), Some(requested)) if route != requested => {
                return Err(DomainError::validation(format!(
                    "scope '{requested}' contradicts the {route} announcement endpoint"
                )));
            }
            (Some(route), _) => input.scope = Some(route),
            (None, _) => {}
        }
        self.create_content(principal, ContentKind::Announcement, input).await
    }

    #[instrument(skip_all, fields(content_id = %id, scope = %scope, user_id = %principal.id))]
    pub async fn update_announcement(
        &self,
        principal: &Principal,
        id: ContentId,
        scope: AnnouncementScope,
        patch: ContentPatch,
    ) -> DomainResult<ContentItem> {
        let mut item = self.announcement(principal, id, scope).await?;
        self.save_edit(principal, &mut item, patch).await?;
        Ok(item)
    }

    #[instrument(skip_all, fields(content_id = %id, scope = %scope, user_id = %principal.id))]
    pub async fn delete_announcement(
        &self,
        principal: &Principal,
        id: ContentId,
        scope: AnnouncementScope,
    ) -> DomainResult<()> {
        let item = self.announcement(principal, id, scope).await?;
        self.remove(principal, &item).await
    }

    #[instrument(skip_all, fields(content_id = %id, user_id = %principal.id))]
    pub async fn mark_read(
        &self,
        principal: &Principal,
        id: ContentId,
        scope: AnnouncementScope,
    ) -> DomainResult<ReadOutcome> {
        let item = self.announcement(principal, id, scope).await?;
        let inserted = self
            .store
            .mark_read(&ReadReceipt::new(item.id, principal.id, now()))
            .await?;
        let outcome = ReadOutcome::from_insert(inserted);
        info!(outcome = outcome.message(), "read receipt");
        Ok(outcome)
    }

    #[instrument(skip_all, fields(content_id = %id, user_id = %principal.id))]
    pub async fn mark_unread(
        &self,
        principal: &Principal,
        id: ContentId,
        scope: AnnouncementScope,
    ) -> DomainResult<ReadOutcome> {
        let item = self.announcement(principal, id, scope).await?;
        let deleted = self.store.mark_unread(item.id, principal.id).await?;
        let outcome = ReadOutcome::from_delete(deleted);
        info!(outcome = outcome.message(), "read receipt");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{admin, department, employee, head};
    use super::*;

    fn notice(title: &str, is_public: bool) -> NewContent {
        NewContent {
            title: title.to_string(),
            body: "Please read".to_string(),
            is_public,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn private_system_announcement_stays_out_of_the_feed_until_public() {
        let services = AppServices::in_memory();
        let dept = department(&services, "HR").await;
        let root = admin();
        let reader = employee(dept.id);

        let item = services
            .create_announcement(&root, Some(AnnouncementScope::System), notice("Holiday", false))
            .await
            .unwrap();
        assert!(item.department_id.is_none());

        let feed = services.public_system_feed(&reader, PageRequest::default()).await.unwrap();
        assert_eq!(feed.total, 0);

        services
            .update_announcement(&root, item.id, AnnouncementScope::System, ContentPatch {
                is_public: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();

        let feed = services.public_system_feed(&reader, PageRequest::default()).await.unwrap();
        assert_eq!(feed.total, 1);
        assert!(!feed.items[0].is_read);
    }

    #[tokio::test]
    async fn marking_read_is_idempotent_both_ways() {
        let services = AppServices::in_memory();
        let dept = department(&services, "Finance").await;
        let reader = employee(dept.id);
        let item = services
            .create_announcement(&head(dept.id), None, notice("Budget", false))
            .await
            .unwrap();
        let scope = AnnouncementScope::Department;

        assert_eq!(services.mark_read(&reader, item.id, scope).await.unwrap(), ReadOutcome::Marked);
        assert_eq!(services.mark_read(&reader, item.id, scope).await.unwrap(), ReadOutcome::AlreadyRead);
        assert!(services.get_announcement(&reader, item.id, scope).await.unwrap().is_read);

        assert_eq!(services.mark_unread(&reader, item.id, scope).await.unwrap(), ReadOutcome::Unmarked);
        assert_eq!(services.mark_unread(&reader, item.id, scope).await.unwrap(), ReadOutcome::AlreadyUnread);
    }

    #[tokio::test]
    async fn sub_kind_mismatch_is_a_validation_error() {
        let services = AppServices::in_memory();
        let dept = department(&services, "IT").await;
        let item = services
            .create_announcement(&head(dept.id), None, notice("Patch day", false))
            .await
            .unwrap();

        let err = services
            .mark_read(&employee(dept.id), item.id, AnnouncementScope::System)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let mut body = notice("Contradiction", false);
        body.scope = Some(AnnouncementScope::Department);
        let err = services
            .create_announcement(&admin(), Some(AnnouncementScope::System), body)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
