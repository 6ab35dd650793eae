use std::path::{Path, PathBuf};

use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

use super::page_not_found;

pub const GAME_SLUGS: [&str; 8] = [
    "terminal-velocity",
    "prompt-escape-rooms",
    "copy-pasta-chef",
    "error-quest",
    "prompt-battles",
    "build-races",
    "ai-tool-olympics",
    "architects-blueprint",
];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/dashboard", get(dashboard))
        .route("/learn", get(learn))
        .route("/games", get(games_hub))
        .route("/games/:slug", get(game))
        .route("/curriculum", get(curriculum))
        .route("/curriculum/:week/:day", get(lesson))
}

async fn dashboard(State(state): State<AppState>) -> Response {
    send_file(&view_path(&state, &["dashboard", "index.html"])).await
}

/// Old bookmarks pointed at `/learn`.
async fn learn() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

async fn games_hub(State(state): State<AppState>) -> Response {
    send_file(&view_path(&state, &["games", "index.html"])).await
}

async fn game(State(state): State<AppState>, UrlPath(slug): UrlPath<String>) -> Response {
    if !GAME_SLUGS.contains(&slug.as_str()) {
        return page_not_found().await;
    }
    send_file(&view_path(&state, &["games", &slug, "index.html"])).await
}

async fn curriculum(State(state): State<AppState>) -> Response {
    send_file(&view_path(&state, &["curriculum", "index.html"])).await
}

async fn lesson(
    State(state): State<AppState>,
    UrlPath((week, day)): UrlPath<(String, String)>,
) -> Response {
    let (Some(week), Some(day)) = (
        numbered_segment(&week, "week"),
        numbered_segment(&day, "day"),
    ) else {
        return page_not_found().await;
    };

    let path = view_path(
        &state,
        &["curriculum", &format!("week{week}"), &format!("day{day}.html")],
    );
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return (StatusCode::NOT_FOUND, "Lesson not found").into_response();
    }
    send_file(&path).await
}

/// `week3` with prefix `week` yields `3`; anything else is rejected.
fn numbered_segment<'a>(segment: &'a str, prefix: &str) -> Option<&'a str> {
    let digits = segment.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits)
}

fn view_path(state: &AppState, parts: &[&str]) -> PathBuf {
    let mut path = state.paths().views_dir.clone();
    path.extend(parts);
    path
}

pub(crate) async fn send_file(path: &Path) -> Response {
    match tokio::fs::read(path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(path))], bytes).into_response(),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "page file not readable");
            page_not_found().await
        }
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}
