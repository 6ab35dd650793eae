pub mod data;
pub mod health;
pub mod pages;
pub mod progress;

use axum::handler::HandlerWithoutStateExt;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::services::ServeDir;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let paths = state.paths().clone();
    let public = ServeDir::new(&paths.public_dir).not_found_service(page_not_found.into_service());

    Router::new()
        .merge(pages::router())
        .nest("/api/data", data::router())
        .nest("/api/progress", progress::router())
        .nest("/health", health::router())
        .nest_service("/views", ServeDir::new(&paths.views_dir))
        .nest_service("/data", ServeDir::new(&paths.data_dir))
        .fallback_service(public)
        .with_state(state)
}

pub(crate) async fn page_not_found() -> Response {
    (StatusCode::NOT_FOUND, "Page not found").into_response()
}
