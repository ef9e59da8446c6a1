use axum::{routing::get, Router};

pub mod admin;
pub mod announcements;
pub mod departments;
pub mod documents;
pub mod events;
pub mod posts;
pub mod search;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/search", get(search::search))
        .nest("/announcements", announcements::router())
        .nest("/documents", documents::router())
        .nest("/posts", posts::router())
        .nest("/events", events::router())
        .nest("/departments", departments::router())
        .nest("/users", users::router())
        .nest("/admin", admin::router())
}
