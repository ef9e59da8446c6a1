use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use intraportal_auth::{NewUser, ProfileUpdate, User, UserPatch};
use intraportal_core::Page;

use crate::app::dto::{MessageResponse, UserListParams};
use crate::app::errors::{parse_id, ApiResult, JsonBody, QueryParams};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/profile", put(update_profile))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(params): QueryParams<UserListParams>,
) -> ApiResult<Json<Page<User>>> {
    let page = services
        .list_users(principal.principal(), params.query()?, params.page())
        .await?;
    Ok(Json(page))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = services.create_user(principal.principal(), body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(services.get_user(principal.principal(), parse_id(&id)?).await?))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UserPatch>,
) -> ApiResult<Json<User>> {
    let user = services
        .update_user(principal.principal(), parse_id(&id)?, body)
        .await?;
    Ok(Json(user))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    services.delete_user(principal.principal(), parse_id(&id)?).await?;
    Ok(Json(MessageResponse::new("user deleted")))
}

pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    Ok(Json(services.update_profile(principal.principal(), body).await?))
}
