use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use intraportal_content::{ContentItem, ContentTypeFilter, ReviewComment};
use intraportal_core::{ContentKind, DomainError, Page};

use crate::app::dto::{CommentRequest, ListParams, MessageResponse, ModerateRequest, ReviewListParams};
use crate::app::errors::{parse_id, ApiResult, JsonBody, QueryParams};
use crate::app::services::{AppServices, Moderated};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/content", get(list_content))
        .route("/content/pending", get(pending_content))
        .route("/content/moderate", get(moderation_queue).post(moderate_content))
        .route("/content/review", post(add_review))
        .route("/content/reviews", get(list_reviews))
        .route("/content/:id", get(get_content))
        .route("/content/:id/resubmit", post(resubmit_content))
}

/// Reviewed items are returned as-is; deletions answer with a message.
pub fn moderation_response(outcome: Moderated) -> Response {
    match outcome {
        Moderated::Reviewed(item) => Json(item).into_response(),
        Moderated::Deleted(id) => Json(MessageResponse::new(format!("content {id} deleted"))).into_response(),
    }
}

/// `type` for queues: absent or `all` covers every kind.
fn queue_kind(params: &ListParams) -> Result<Option<ContentKind>, DomainError> {
    match params.kind.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) if raw.eq_ignore_ascii_case("all") => Ok(None),
        Some(raw) => raw.parse().map(Some),
    }
}

pub async fn list_content(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Json<Page<ContentItem>>> {
    let filter = match params.kind.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw.parse::<ContentTypeFilter>()?,
        _ => ContentTypeFilter::All,
    };
    let page = services
        .admin_listing(principal.principal(), filter, params.query()?, params.page())
        .await?;
    Ok(Json(page))
}

pub async fn pending_content(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Json<Page<ContentItem>>> {
    let page = services
        .moderation_queue(principal.principal(), queue_kind(&params)?, params.query()?, params.page(), true)
        .await?;
    Ok(Json(page))
}

pub async fn moderation_queue(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Json<Page<ContentItem>>> {
    let page = services
        .moderation_queue(principal.principal(), queue_kind(&params)?, params.query()?, params.page(), false)
        .await?;
    Ok(Json(page))
}

pub async fn moderate_content(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<ModerateRequest>,
) -> ApiResult<Response> {
    let command = body.command(None)?;
    let outcome = services
        .moderate(
            principal.principal(),
            body.content_id,
            body.content_type()?,
            command,
            body.comment.as_deref(),
        )
        .await?;
    Ok(moderation_response(outcome))
}

pub async fn add_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<CommentRequest>,
) -> ApiResult<(StatusCode, Json<ReviewComment>)> {
    let content_id = body
        .content_id
        .ok_or_else(|| DomainError::validation("contentId is required"))?;
    let comment = services
        .add_comment(principal.principal(), content_id, None, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(params): QueryParams<ReviewListParams>,
) -> ApiResult<Json<Vec<ReviewComment>>> {
    let comments = services
        .list_comments(principal.principal(), params.content_id, None)
        .await?;
    Ok(Json(comments))
}

pub async fn get_content(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<ContentItem>> {
    let item = services.get_any_content(principal.principal(), parse_id(&id)?).await?;
    Ok(Json(item))
}

pub async fn resubmit_content(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<ContentItem>> {
    let item = services.resubmit_content(principal.principal(), parse_id(&id)?).await?;
    Ok(Json(item))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_type_all_means_every_kind() {
        let mut params = ListParams::default();
        assert_eq!(queue_kind(&params).unwrap(), None);
        params.kind = Some("ALL".to_string());
        assert_eq!(queue_kind(&params).unwrap(), None);
        params.kind = Some("posts".to_string());
        assert_eq!(queue_kind(&params).unwrap(), Some(ContentKind::Post));
        params.kind = Some("videos".to_string());
        assert!(queue_kind(&params).is_err());
    }
}
