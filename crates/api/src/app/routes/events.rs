use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use intraportal_content::{Event, EventFilter, EventParticipant, EventPatch, NewEvent};
use intraportal_core::Page;

use crate::app::dto::{EventListParams, MessageResponse, ParticipationRequest};
use crate::app::errors::{parse_id, ApiResult, JsonBody, QueryParams};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/:id", get(get_event).put(update_event).delete(delete_event))
        .route("/:id/participants", get(list_participants).post(set_participation))
}

pub async fn list_events(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(params): QueryParams<EventListParams>,
) -> ApiResult<Json<Page<Event>>> {
    let filter = params.apply(EventFilter::for_principal(principal.principal()));
    let page = services.list_events(filter, params.page()).await?;
    Ok(Json(page))
}

pub async fn create_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewEvent>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let event = services.create_event(principal.principal(), body).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn get_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    let event = services.get_event(principal.principal(), parse_id(&id)?).await?;
    Ok(Json(event))
}

pub async fn update_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<EventPatch>,
) -> ApiResult<Json<Event>> {
    let event = services
        .update_event(principal.principal(), parse_id(&id)?, body)
        .await?;
    Ok(Json(event))
}

pub async fn delete_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    services.delete_event(principal.principal(), parse_id(&id)?).await?;
    Ok(Json(MessageResponse::new("event deleted")))
}

pub async fn list_participants(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<EventParticipant>>> {
    let participants = services
        .list_participants(principal.principal(), parse_id(&id)?)
        .await?;
    Ok(Json(participants))
}

pub async fn set_participation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ParticipationRequest>,
) -> ApiResult<Json<EventParticipant>> {
    let participant = services
        .set_participation(principal.principal(), parse_id(&id)?, body.user_id, body.status)
        .await?;
    Ok(Json(participant))
}
