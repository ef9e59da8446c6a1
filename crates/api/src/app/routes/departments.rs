use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use intraportal_auth::User;
use intraportal_content::{Department, DepartmentPatch, DepartmentSummary, NewDepartment};
use intraportal_core::Page;

use crate::app::dto::{MessageResponse, PageParams};
use crate::app::errors::{parse_id, ApiResult, JsonBody, QueryParams};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_departments).post(create_department))
        .route("/:id", get(get_department).put(update_department).delete(delete_department))
        .route("/:id/users", get(department_users))
}

pub async fn list_departments(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<Vec<DepartmentSummary>>> {
    Ok(Json(services.list_departments().await?))
}

pub async fn create_department(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewDepartment>,
) -> ApiResult<(StatusCode, Json<Department>)> {
    let department = services.create_department(principal.principal(), body).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn get_department(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DepartmentSummary>> {
    Ok(Json(services.get_department(parse_id(&id)?).await?))
}

pub async fn update_department(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<DepartmentPatch>,
) -> ApiResult<Json<Department>> {
    let department = services
        .update_department(principal.principal(), parse_id(&id)?, body)
        .await?;
    Ok(Json(department))
}

pub async fn delete_department(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    services
        .delete_department(principal.principal(), parse_id(&id)?)
        .await?;
    Ok(Json(MessageResponse::new("department deleted")))
}

pub async fn department_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    QueryParams(params): QueryParams<PageParams>,
) -> ApiResult<Json<Page<User>>> {
    let page = services
        .department_users(principal.principal(), parse_id(&id)?, params.page())
        .await?;
    Ok(Json(page))
}
