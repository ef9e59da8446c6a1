use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use intraportal_content::{ContentItem, ContentPatch, ModerationAction, NewContent};
use intraportal_core::{ContentKind, Page};

use crate::app::dto::{ListParams, MessageResponse, ModerateRequest};
use crate::app::errors::{parse_id, ApiResult, JsonBody, QueryParams};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

use super::admin::moderation_response;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_documents).post(create_document))
        .route("/approve", post(approve_document))
        .route("/:id", get(get_document).patch(update_document).delete(delete_document))
}

pub async fn list_documents(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Json<Page<ContentItem>>> {
    let page = services
        .list_content(principal.principal(), ContentKind::Document, params.query()?, params.page())
        .await?;
    Ok(Json(page))
}

pub async fn create_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewContent>,
) -> ApiResult<(StatusCode, Json<ContentItem>)> {
    let item = services
        .create_content(principal.principal(), ContentKind::Document, body)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<ContentItem>> {
    let item = services
        .get_content(principal.principal(), ContentKind::Document, parse_id(&id)?)
        .await?;
    Ok(Json(item))
}

pub async fn update_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ContentPatch>,
) -> ApiResult<Json<ContentItem>> {
    let item = services
        .update_content(principal.principal(), ContentKind::Document, parse_id(&id)?, body)
        .await?;
    Ok(Json(item))
}

pub async fn delete_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    services
        .delete_content(principal.principal(), ContentKind::Document, parse_id(&id)?)
        .await?;
    Ok(Json(MessageResponse::new("document deleted")))
}

pub async fn approve_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<ModerateRequest>,
) -> ApiResult<axum::response::Response> {
    let command = body.command(Some(ModerationAction::Approve))?;
    let outcome = services
        .moderate(
            principal.principal(),
            body.content_id,
            Some(ContentKind::Document),
            command,
            body.comment.as_deref(),
        )
        .await?;
    Ok(moderation_response(outcome))
}
