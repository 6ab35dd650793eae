#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use bootcamp_backend::state::{AppState, SitePaths};
use bootcamp_progress::{Catalog, ManualClock, MemoryStorage};
use chrono::{FixedOffset, TimeZone};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub dir: TempDir,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub storage: MemoryStorage,
}

impl TestApp {
    pub fn router(&self) -> Router {
        bootcamp_backend::create_app(self.state.clone())
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.post_raw(uri, "application/json", body.to_string()).await
    }

    pub async fn post_raw(&self, uri: &str, content_type: &str, body: String) -> Response<Body> {
        self.router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

pub fn create_test_app() -> TestApp {
    build_test_app(MemoryStorage::new())
}

pub fn create_test_app_with_quota(quota: usize) -> TestApp {
    build_test_app(MemoryStorage::with_quota(quota))
}

fn build_test_app(storage: MemoryStorage) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    write_site(dir.path());

    let paths = SitePaths {
        public_dir: dir.path().join("public"),
        views_dir: dir.path().join("views"),
        data_dir: dir.path().join("data"),
    };
    let clock = Arc::new(ManualClock::new(
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 2, 12, 0, 0)
            .unwrap(),
    ));
    let state = AppState::new(
        paths,
        Arc::new(storage.clone()),
        clock.clone(),
        Catalog::builtin(),
    )
    .unwrap();

    TestApp {
        dir,
        state,
        clock,
        storage,
    }
}

fn write_site(root: &Path) {
    let files = [
        ("views/dashboard/index.html", "<h1>Dashboard</h1>"),
        ("views/games/index.html", "<h1>Games Hub</h1>"),
        ("views/games/terminal-velocity/index.html", "<h1>Terminal Velocity</h1>"),
        ("views/curriculum/index.html", "<h1>Curriculum</h1>"),
        ("views/curriculum/week1/day2.html", "<h1>Week 1 Day 2</h1>"),
        ("data/levels.json", r#"{"levels":[1,2,3]}"#),
        ("public/css/site.css", "body { margin: 0; }"),
        ("secret.json", r#"{"token":"nope"}"#),
    ];
    for (relative, contents) in files {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

pub fn assert_status(response: &Response<Body>, status: StatusCode) {
    assert_eq!(response.status(), status, "unexpected status");
}
