use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use intraportal_content::{ContentItem, ContentPatch, ModerationAction, NewContent, ReviewComment};
use intraportal_core::{ContentKind, Page};

use crate::app::dto::{CommentRequest, ListParams, MessageResponse, ModerateRequest};
use crate::app::errors::{parse_id, ApiResult, JsonBody, QueryParams};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

use super::admin::moderation_response;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/approve", post(approve_post))
        .route("/:id", get(get_post).put(update_post).delete(delete_post))
        .route("/:id/review", post(add_review).get(list_reviews))
}

pub async fn list_posts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Json<Page<ContentItem>>> {
    let page = services
        .list_content(principal.principal(), ContentKind::Post, params.query()?, params.page())
        .await?;
    Ok(Json(page))
}

pub async fn create_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewContent>,
) -> ApiResult<(StatusCode, Json<ContentItem>)> {
    let item = services
        .create_content(principal.principal(), ContentKind::Post, body)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<ContentItem>> {
    let item = services
        .get_content(principal.principal(), ContentKind::Post, parse_id(&id)?)
        .await?;
    Ok(Json(item))
}

pub async fn update_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ContentPatch>,
) -> ApiResult<Json<ContentItem>> {
    let item = services
        .update_content(principal.principal(), ContentKind::Post, parse_id(&id)?, body)
        .await?;
    Ok(Json(item))
}

pub async fn delete_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    services
        .delete_content(principal.principal(), ContentKind::Post, parse_id(&id)?)
        .await?;
    Ok(Json(MessageResponse::new("post deleted")))
}

pub async fn approve_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<ModerateRequest>,
) -> ApiResult<axum::response::Response> {
    let command = body.command(Some(ModerationAction::Approve))?;
    let outcome = services
        .moderate(
            principal.principal(),
            body.content_id,
            Some(ContentKind::Post),
            command,
            body.comment.as_deref(),
        )
        .await?;
    Ok(moderation_response(outcome))
}

pub async fn add_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<CommentRequest>,
) -> ApiResult<(StatusCode, Json<ReviewComment>)> {
    let comment = services
        .add_comment(principal.principal(), parse_id(&id)?, Some(ContentKind::Post), &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ReviewComment>>> {
    let comments = services
        .list_comments(principal.principal(), parse_id(&id)?, Some(ContentKind::Post))
        .await?;
    Ok(Json(comments))
}
