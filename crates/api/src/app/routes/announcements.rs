//! `/announcements` operates on department announcements (its list shows
//! both sub-kinds); `/announcements/system` on system announcements.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use intraportal_content::{ContentItem, ContentPatch, NewContent, ReadOutcome};
use intraportal_core::{AnnouncementScope, Page};

use crate::app::dto::{AnnouncementView, ListParams, MessageResponse, PageParams, ReadStateResponse};
use crate::app::errors::{parse_id, ApiResult, JsonBody, QueryParams};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

const SYSTEM: AnnouncementScope = AnnouncementScope::System;
const DEPARTMENT: AnnouncementScope = AnnouncementScope::Department;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_all).post(create_any))
        .route("/system", get(list_system).post(create_system))
        .route("/system/public", get(public_feed))
        .route(
            "/system/:id",
            get(get_system).put(update_system).delete(delete_system),
        )
        .route("/system/:id/read", post(mark_system_read).delete(mark_system_unread))
        .route(
            "/:id",
            get(get_department).put(update_department).delete(delete_department),
        )
        .route("/:id/read", post(mark_department_read).delete(mark_department_unread))
}

fn read_state(outcome: ReadOutcome) -> Json<ReadStateResponse> {
    let status = match outcome {
        ReadOutcome::Marked | ReadOutcome::Unmarked => "updated",
        ReadOutcome::AlreadyRead | ReadOutcome::AlreadyUnread => "unchanged",
    };
    Json(ReadStateResponse {
        status,
        is_read: outcome.is_read(),
        message: outcome.message(),
    })
}

// -------------------------
// Listings and creation
// -------------------------

pub async fn list_all(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Json<Page<AnnouncementView>>> {
    let page = services
        .list_announcements(principal.principal(), params.scope()?, params.query()?, params.page())
        .await?;
    Ok(Json(page))
}

pub async fn list_system(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Json<Page<AnnouncementView>>> {
    let page = services
        .list_announcements(principal.principal(), Some(SYSTEM), params.query()?, params.page())
        .await?;
    Ok(Json(page))
}

pub async fn public_feed(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(params): QueryParams<PageParams>,
) -> ApiResult<Json<Page<AnnouncementView>>> {
    let page = services
        .public_system_feed(principal.principal(), params.page())
        .await?;
    Ok(Json(page))
}

pub async fn create_any(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewContent>,
) -> ApiResult<(StatusCode, Json<ContentItem>)> {
    let item = services
        .create_announcement(principal.principal(), None, body)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn create_system(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewContent>,
) -> ApiResult<(StatusCode, Json<ContentItem>)> {
    let item = services
        .create_announcement(principal.principal(), Some(SYSTEM), body)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

// -------------------------
// Single items
// -------------------------

async fn get_scoped(
    services: Arc<AppServices>,
    principal: PrincipalContext,
    id: String,
    scope: AnnouncementScope,
) -> ApiResult<Json<AnnouncementView>> {
    let view = services
        .get_announcement(principal.principal(), parse_id(&id)?, scope)
        .await?;
    Ok(Json(view))
}

async fn update_scoped(
    services: Arc<AppServices>,
    principal: PrincipalContext,
    id: String,
    scope: AnnouncementScope,
    patch: ContentPatch,
) -> ApiResult<Json<ContentItem>> {
    let item = services
        .update_announcement(principal.principal(), parse_id(&id)?, scope, patch)
        .await?;
    Ok(Json(item))
}

async fn delete_scoped(
    services: Arc<AppServices>,
    principal: PrincipalContext,
    id: String,
    scope: AnnouncementScope,
) -> ApiResult<Json<MessageResponse>> {
    services
        .delete_announcement(principal.principal(), parse_id(&id)?, scope)
        .await?;
    Ok(Json(MessageResponse::new(format!("{scope} announcement deleted"))))
}

async fn toggle_read(
    services: Arc<AppServices>,
    principal: PrincipalContext,
    id: String,
    scope: AnnouncementScope,
    read: bool,
) -> ApiResult<Json<ReadStateResponse>> {
    let id = parse_id(&id)?;
    let outcome = if read {
        services.mark_read(principal.principal(), id, scope).await?
    } else {
        services.mark_unread(principal.principal(), id, scope).await?
    };
    Ok(read_state(outcome))
}

pub async fn get_department(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<AnnouncementView>> {
    get_scoped(services, principal, id, DEPARTMENT).await
}

pub async fn get_system(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<AnnouncementView>> {
    get_scoped(services, principal, id, SYSTEM).await
}

pub async fn update_department(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ContentPatch>,
) -> ApiResult<Json<ContentItem>> {
    update_scoped(services, principal, id, DEPARTMENT, body).await
}

pub async fn update_system(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ContentPatch>,
) -> ApiResult<Json<ContentItem>> {
    update_scoped(services, principal, id, SYSTEM, body).await
}

pub async fn delete_department(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    delete_scoped(services, principal, id, DEPARTMENT).await
}

pub async fn delete_system(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    delete_scoped(services, principal, id, SYSTEM).await
}

pub async fn mark_department_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReadStateResponse>> {
    toggle_read(services, principal, id, DEPARTMENT, true).await
}

pub async fn mark_department_unread(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReadStateResponse>> {
    toggle_read(services, principal, id, DEPARTMENT, false).await
}

pub async fn mark_system_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReadStateResponse>> {
    toggle_read(services, principal, id, SYSTEM, true).await
}

pub async fn mark_system_unread(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReadStateResponse>> {
    toggle_read(services, principal, id, SYSTEM, false).await
}
