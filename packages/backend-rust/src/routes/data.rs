use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

use super::pages::send_file;

pub fn router() -> Router<AppState> {
    Router::new().route("/:filename", get(data_file))
}

async fn data_file(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    if !is_plain_file_name(&filename) {
        return data_not_found();
    }

    let path = state.paths().data_dir.join(&filename);
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return data_not_found();
    }
    send_file(&path).await
}

fn data_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Data file not found" })),
    )
        .into_response()
}

/// Only names that stay inside the data directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !name.starts_with("..")
}

#[cfg(test)]
mod tests {
    use super::is_plain_file_name;

    #[test]
    fn rejects_names_that_escape_the_directory() {
        assert!(is_plain_file_name("levels.json"));
        assert!(is_plain_file_name("week1.json"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("../secret.json"));
        assert!(!is_plain_file_name("nested/file.json"));
        assert!(!is_plain_file_name("..\\windows.ini"));
    }
}
