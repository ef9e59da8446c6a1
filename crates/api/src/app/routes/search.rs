use std::sync::Arc;

use axum::{extract::Extension, Json};

use intraportal_content::{SearchRequest, SearchResults};

use crate::app::dto::SearchParams;
use crate::app::errors::{ApiResult, QueryParams};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn search(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(params): QueryParams<SearchParams>,
) -> ApiResult<Json<SearchResults>> {
    let request = SearchRequest::parse(params.q.as_deref(), params.kind.as_deref(), params.limit)?;
    Ok(Json(services.search(principal.principal(), request).await?))
}
