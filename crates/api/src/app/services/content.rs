//! Documents, posts and the moderation workflow.

use tracing::{info, instrument};

use intraportal_auth::{can_read, Principal};
use intraportal_content::{
    build_predicate, can_comment, can_view_comments, combined_windows, decide, merge_newest_first, moderation_queue,
    resubmit, ContentItem, ContentPatch, ContentQuery, ContentTypeFilter, Decision, ModerationAction,
    ModerationCommand, ModerationStatus, NewContent, Predicate, ReviewComment,
};
use intraportal_core::{ContentId, ContentKind, DomainError, DomainResult, Page, PageRequest};

use super::{now, AppServices};

/// Result of a moderation action.
#[derive(Debug, Clone)]
pub enum Moderated {
    Reviewed(ContentItem),
    Deleted(ContentId),
}

impl AppServices {
    /// Load an item of the given kind; any other kind is `NotFound`.
    pub(super) async fn load_content(&self, kind: ContentKind, id: ContentId) -> DomainResult<ContentItem> {
        match self.store.get_content(id).await? {
            Some(item) if item.kind == kind => Ok(item),
            _ => Err(DomainError::not_found(kind.as_str())),
        }
    }

    async fn load_any_content(&self, id: ContentId, kind: Option<ContentKind>) -> DomainResult<ContentItem> {
        match kind {
            Some(kind) => self.load_content(kind, id).await,
            None => self
                .store
                .get_content(id)
                .await?
                .ok_or_else(|| DomainError::not_found("content")),
        }
    }

    pub(super) async fn paginate(&self, predicate: &Predicate, page: PageRequest) -> DomainResult<Page<ContentItem>> {
        let total = self.store.count_content(predicate).await?;
        let items = self.store.list_content(predicate, page.window()).await?;
        Ok(Page::new(items, total, page))
    }

    #[instrument(skip_all, fields(kind = %kind, user_id = %principal.id))]
    pub async fn create_content(
        &self,
        principal: &Principal,
        kind: ContentKind,
        input: NewContent,
    ) -> DomainResult<ContentItem> {
        if let (true, Some(department_id)) = (principal.is_admin(), input.department_id) {
            self.require_department(department_id).await?;
        }
        let item = ContentItem::create(kind, principal, input, now())?;
        self.store.insert_content(&item).await?;
        info!(content_id = %item.id, status = %item.status, "content created");
        Ok(item)
    }

    pub async fn get_content(&self, principal: &Principal, kind: ContentKind, id: ContentId) -> DomainResult<ContentItem> {
        let item = self.load_content(kind, id).await?;
        if !can_read(principal, &item.scope()) {
            return Err(DomainError::forbidden(format!("cannot read this {kind}")));
        }
        Ok(item)
    }

    #[instrument(skip_all, fields(kind = %kind, content_id = %id, user_id = %principal.id))]
    pub async fn update_content(
        &self,
        principal: &Principal,
        kind: ContentKind,
        id: ContentId,
        patch: ContentPatch,
    ) -> DomainResult<ContentItem> {
        let mut item = self.load_content(kind, id).await?;
        self.save_edit(principal, &mut item, patch).await?;
        Ok(item)
    }

    pub(super) async fn save_edit(
        &self,
        principal: &Principal,
        item: &mut ContentItem,
        patch: ContentPatch,
    ) -> DomainResult<()> {
        item.apply_edit(principal, patch, now())?;
        if !self.store.update_content(item).await? {
            return Err(DomainError::not_found(item.kind.as_str()));
        }
        info!(content_id = %item.id, status = %item.status, "content updated");
        Ok(())
    }

    #[instrument(skip_all, fields(kind = %kind, content_id = %id, user_id = %principal.id))]
    pub async fn delete_content(&self, principal: &Principal, kind: ContentKind, id: ContentId) -> DomainResult<()> {
        let item = self.load_content(kind, id).await?;
        self.remove(principal, &item).await
    }

    pub(super) async fn remove(&self, principal: &Principal, item: &ContentItem) -> DomainResult<()> {
        let command = ModerationCommand {
            action: ModerationAction::Delete,
            make_public: None,
        };
        decide(item, principal, &command, now())?;
        if !self.store.delete_content(item.id).await? {
            return Err(DomainError::not_found(item.kind.as_str()));
        }
        info!(content_id = %item.id, "content deleted");
        Ok(())
    }

    /// Role-scoped listing of one content kind.
    pub async fn list_content(
        &self,
        principal: &Principal,
        kind: ContentKind,
        mut query: ContentQuery,
        page: PageRequest,
    ) -> DomainResult<Page<ContentItem>> {
        query.kind = Some(kind);
        self.paginate(&build_predicate(principal, &query), page).await
    }

    /// Admin content listing; `all` interleaves documents and posts.
    pub async fn admin_listing(
        &self,
        principal: &Principal,
        filter: ContentTypeFilter,
        query: ContentQuery,
        page: PageRequest,
    ) -> DomainResult<Page<ContentItem>> {
        if !(principal.is_admin() || principal.is_department_head()) {
            return Err(DomainError::forbidden("content administration is limited to admins and department heads"));
        }
        if let ContentTypeFilter::Only(kind) = filter {
            return self.list_content(principal, kind, query, page).await;
        }

        let mut total = 0;
        let mut sets = Vec::with_capacity(2);
        for (kind, window) in combined_windows(page) {
            let predicate = build_predicate(
                principal,
                &ContentQuery {
                    kind: Some(kind),
                    ..query.clone()
                },
            );
            total += self.store.count_content(&predicate).await?;
            if window.limit > 0 {
                sets.push(self.store.list_content(&predicate, window).await?);
            }
        }
        Ok(Page::new(merge_newest_first(sets, page.limit), total, page))
    }

    /// Moderation queue. `force_pending` ignores a caller-supplied status.
    pub async fn moderation_queue(
        &self,
        principal: &Principal,
        kind: Option<ContentKind>,
        mut query: ContentQuery,
        page: PageRequest,
        force_pending: bool,
    ) -> DomainResult<Page<ContentItem>> {
        query.kind = kind;
        if force_pending {
            query.status = Some(ModerationStatus::Pending);
        }
        let predicate = moderation_queue(principal, &query)?;
        self.paginate(&predicate, page).await
    }

    /// Approve, reject or delete an item, recording an optional comment.
    #[instrument(skip_all, fields(content_id = %id, action = %command.action, user_id = %principal.id))]
    pub async fn moderate(
        &self,
        principal: &Principal,
        id: ContentId,
        kind: Option<ContentKind>,
        command: ModerationCommand,
        comment: Option<&str>,
    ) -> DomainResult<Moderated> {
        let mut item = self.load_any_content(id, kind).await?;
        let at = now();
        match decide(&item, principal, &command, at)? {
            Decision::Delete => {
                if !self.store.delete_content(item.id).await? {
                    return Err(DomainError::not_found(item.kind.as_str()));
                }
                info!("content deleted by moderator");
                Ok(Moderated::Deleted(item.id))
            }
            Decision::Review(review) => {
                let comment = ReviewComment::optional(item.id, principal.id, comment, at)?;
                review.apply(&mut item);
                self.store.record_review(&item, comment.as_ref()).await?;
                info!(
                    from = %review.from,
                    to = %review.to,
                    noop = review.is_noop(),
                    commented = comment.is_some(),
                    "content reviewed"
                );
                Ok(Moderated::Reviewed(item))
            }
        }
    }

    #[instrument(skip_all, fields(content_id = %id, user_id = %principal.id))]
    pub async fn resubmit_content(&self, principal: &Principal, id: ContentId) -> DomainResult<ContentItem> {
        let mut item = self.load_any_content(id, None).await?;
        resubmit(&mut item, principal, now())?;
        if !self.store.update_content(&item).await? {
            return Err(DomainError::not_found(item.kind.as_str()));
        }
        info!("content resubmitted for review");
        Ok(item)
    }

    pub async fn get_any_content(&self, principal: &Principal, id: ContentId) -> DomainResult<ContentItem> {
        let item = self.load_any_content(id, None).await?;
        if !can_read(principal, &item.scope()) {
            return Err(DomainError::forbidden(format!("cannot read this {}", item.kind)));
        }
        Ok(item)
    }

    #[instrument(skip_all, fields(content_id = %id, user_id = %principal.id))]
    pub async fn add_comment(
        &self,
        principal: &Principal,
        id: ContentId,
        kind: Option<ContentKind>,
        text: &str,
    ) -> DomainResult<ReviewComment> {
        let item = self.load_any_content(id, kind).await?;
        if !can_comment(principal, &item) {
            return Err(DomainError::forbidden(format!("cannot comment on this {}", item.kind)));
        }
        let comment = ReviewComment::new(item.id, principal.id, text, now())?;
        self.store.add_comment(&comment).await?;
        info!(comment_id = %comment.id, "review comment added");
        Ok(comment)
    }

    pub async fn list_comments(
        &self,
        principal: &Principal,
        id: ContentId,
        kind: Option<ContentKind>,
    ) -> DomainResult<Vec<ReviewComment>> {
        let item = self.load_any_content(id, kind).await?;
        if !can_view_comments(principal, &item) {
            return Err(DomainError::forbidden(format!("cannot view review comments of this {}", item.kind)));
        }
        Ok(self.store.list_comments(item.id).await?)
    }
}

#[cfg(test)]
mod tests {
    use intraportal_core::DepartmentId;

    use super::super::fixtures::{admin, department, employee, head};
    use super::*;

    fn public_doc(title: &str) -> NewContent {
        NewContent {
            title: title.to_string(),
            is_public: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn approve_records_comment_and_reject_forces_private() {
        let services = AppServices::in_memory();
        let dept = department(&services, "Engineering").await;
        let dh = head(dept.id);

        let doc = services
            .create_content(&dh, ContentKind::Document, public_doc("Runbook"))
            .await
            .unwrap();
        assert_eq!(doc.status, ModerationStatus::Pending);

        let approve = ModerationCommand {
            action: ModerationAction::Approve,
            make_public: None,
        };
        let Moderated::Reviewed(approved) = services
            .moderate(&dh, doc.id, Some(ContentKind::Document), approve, Some("ship it"))
            .await
            .unwrap()
        else {
            panic!("expected a review");
        };
        assert_eq!(approved.status, ModerationStatus::Approved);
        assert!(approved.is_public);
        assert_eq!(approved.reviewed_by_id, Some(dh.id));

        let comments = services.list_comments(&dh, doc.id, None).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "ship it");

        let reject = ModerationCommand {
            action: ModerationAction::Reject,
            make_public: Some(true),
        };
        let Moderated::Reviewed(rejected) = services.moderate(&dh, doc.id, None, reject, None).await.unwrap() else {
            panic!("expected a review");
        };
        assert_eq!(rejected.status, ModerationStatus::Rejected);
        assert!(!rejected.is_public);
    }

    #[tokio::test]
    async fn department_head_cannot_moderate_other_departments() {
        let services = AppServices::in_memory();
        let d1 = department(&services, "Sales").await;
        let d2 = department(&services, "Legal").await;

        let doc = services
            .create_content(&head(d1.id), ContentKind::Document, public_doc("Pricing"))
            .await
            .unwrap();
        let command = ModerationCommand {
            action: ModerationAction::Approve,
            make_public: None,
        };
        let err = services
            .moderate(&head(d2.id), doc.id, None, command, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn moderator_delete_removes_item_and_comments() {
        let services = AppServices::in_memory();
        let dept = department(&services, "Field").await;
        let other = department(&services, "Office").await;
        let dh = head(dept.id);
        let post = services
            .create_content(&employee(dept.id), ContentKind::Post, NewContent {
                title: "Offsite".to_string(),
                body: "Bus at nine".to_string(),
                is_public: true,
                ..Default::default()
            })
            .await
            .unwrap();
        services.add_comment(&dh, post.id, None, "needs a date").await.unwrap();

        let delete = || ModerationCommand {
            action: ModerationAction::Delete,
            make_public: None,
        };
        let err = services
            .moderate(&head(other.id), post.id, None, delete(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        assert!(services.get_any_content(&admin(), post.id).await.is_ok());

        let outcome = services
            .moderate(&dh, post.id, Some(ContentKind::Post), delete(), None)
            .await
            .unwrap();
        assert!(matches!(outcome, Moderated::Deleted(id) if id == post.id));

        assert_eq!(
            services.get_any_content(&admin(), post.id).await.unwrap_err(),
            DomainError::not_found("content")
        );
        assert_eq!(
            services.list_comments(&admin(), post.id, None).await.unwrap_err(),
            DomainError::not_found("content")
        );
        assert!(services.store.list_comments(post.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn wrong_kind_is_not_found() {
        let services = AppServices::in_memory();
        let dept = department(&services, "Ops").await;
        let post = services
            .create_content(
                &employee(dept.id),
                ContentKind::Post,
                NewContent {
                    title: "Hi".to_string(),
                    body: "there".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let err = services
            .get_content(&admin(), ContentKind::Document, post.id)
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("document"));
    }

    #[tokio::test]
    async fn admin_listing_splits_page_between_documents_and_posts() {
        let services = AppServices::in_memory();
        let dept = department(&services, "Marketing").await;
        let dh = head(dept.id);
        for i in 0..4 {
            services
                .create_content(&dh, ContentKind::Document, NewContent {
                    title: format!("doc {i}"),
                    ..Default::default()
                })
                .await
                .unwrap();
            services
                .create_content(&dh, ContentKind::Post, NewContent {
                    title: format!("post {i}"),
                    body: "body".to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let page = services
            .admin_listing(&admin(), ContentTypeFilter::All, ContentQuery::default(), PageRequest::new(Some(1), Some(5)))
            .await
            .unwrap();
        assert_eq!(page.total, 8);
        assert_eq!(page.items.len(), 5);
        let documents = page.items.iter().filter(|i| i.kind == ContentKind::Document).count();
        assert_eq!(documents, 3);

        let err = services
            .admin_listing(&employee(dept.id), ContentTypeFilter::All, ContentQuery::default(), PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn admin_must_target_an_existing_department() {
        let services = AppServices::in_memory();
        let err = services
            .create_content(&admin(), ContentKind::Document, NewContent {
                title: "Orphan".to_string(),
                department_id: Some(DepartmentId::new()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("department"));
    }
}
