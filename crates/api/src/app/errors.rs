use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::json;

use intraportal_core::DomainError;
use intraportal_infra::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Handler error: a domain error rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        domain_error_to_response(self.0)
    }
}

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Unauthenticated => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Validation(_) | DomainError::InvalidId(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    let status = status_for(&err);
    let message = match &err {
        DomainError::Internal(detail) => {
            tracing::error!(error = %detail, "request failed");
            "internal server error".to_string()
        }
        DomainError::Unauthenticated => "missing or invalid bearer token".to_string(),
        DomainError::Forbidden(msg)
        | DomainError::Validation(msg)
        | DomainError::InvalidId(msg)
        | DomainError::Conflict(msg) => msg.clone(),
        DomainError::NotFound(_) => err.to_string(),
    };
    json_error(status, err.kind(), message)
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// `Json<T>` whose rejections use the portal's error payload.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

/// `Query<T>` whose rejections use the portal's error payload.
pub struct QueryParams<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => Err(query_rejection(rejection)),
        }
    }
}

fn query_rejection(rejection: QueryRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
}

/// Parse a path or body identifier, mapping failures to `InvalidId`.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.trim().parse().map_err(ApiError)
}

#[cfg(test)]
mod tests {
    use intraportal_core::ContentId;

    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(status_for(&DomainError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&DomainError::forbidden("x")), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&DomainError::not_found("post")), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&DomainError::invalid_id("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&DomainError::conflict("x")), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let response = domain_error_to_response(DomainError::internal("connection reset by peer"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bad_ids_are_invalid_id_errors() {
        let err = parse_id::<ContentId>("not-a-uuid").unwrap_err();
        assert_eq!(err.0.kind(), "invalid_id");
        assert!(parse_id::<ContentId>(&ContentId::new().to_string()).is_ok());
    }
}
