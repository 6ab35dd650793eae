use axum::http::{header, StatusCode};
use serde_json::json;

mod common;

use common::{assert_status, body_json, body_string, create_test_app};

#[tokio::test]
async fn test_dashboard_served_at_root_and_dashboard() {
    let app = create_test_app();

    for uri in ["/", "/dashboard"] {
        let response = app.get(uri).await;
        assert_status(&response, StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(body_string(response).await, "<h1>Dashboard</h1>");
    }
}

#[tokio::test]
async fn test_learn_redirects_home() {
    let app = create_test_app();

    let response = app.get("/learn").await;
    assert_status(&response, StatusCode::FOUND);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
}

#[tokio::test]
async fn test_games_hub_and_known_game() {
    let app = create_test_app();

    let response = app.get("/games").await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(body_string(response).await, "<h1>Games Hub</h1>");

    let response = app.get("/games/terminal-velocity").await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(body_string(response).await, "<h1>Terminal Velocity</h1>");
}

#[tokio::test]
async fn test_unknown_game_is_not_found() {
    let app = create_test_app();

    let response = app.get("/games/minesweeper").await;
    assert_status(&response, StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "Page not found");
}

#[tokio::test]
async fn test_curriculum_lessons() {
    let app = create_test_app();

    let response = app.get("/curriculum").await;
    assert_status(&response, StatusCode::OK);

    let response = app.get("/curriculum/week1/day2").await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(body_string(response).await, "<h1>Week 1 Day 2</h1>");

    let response = app.get("/curriculum/week1/day9").await;
    assert_status(&response, StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "Lesson not found");

    let response = app.get("/curriculum/intro/outro").await;
    assert_status(&response, StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "Page not found");
}

#[tokio::test]
async fn test_data_api() {
    let app = create_test_app();

    let response = app.get("/api/data/levels.json").await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "levels": [1, 2, 3] }));

    let response = app.get("/api/data/missing.json").await;
    assert_status(&response, StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({ "error": "Data file not found" }));
}

#[tokio::test]
async fn test_data_api_rejects_traversal() {
    let app = create_test_app();

    let response = app.get("/api/data/..%2Fsecret.json").await;
    assert_status(&response, StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({ "error": "Data file not found" }));
}

#[tokio::test]
async fn test_static_mounts() {
    let app = create_test_app();

    let response = app.get("/css/site.css").await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(body_string(response).await, "body { margin: 0; }");

    let response = app.get("/views/games/index.html").await;
    assert_status(&response, StatusCode::OK);

    let response = app.get("/data/levels.json").await;
    assert_status(&response, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_path_is_page_not_found() {
    let app = create_test_app();

    let response = app.get("/no/such/page").await;
    assert_status(&response, StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "Page not found");
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app();

    let response = app.get("/health").await;
    assert_status(&response, StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["uptime"].is_u64());
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_fresh_progress_stats() {
    let app = create_test_app();

    let response = app.get("/api/progress").await;
    assert_status(&response, StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["totalXP"], 0);
    assert_eq!(body["data"]["level"], 1);
    assert_eq!(body["data"]["levelTitle"], "Curious Beginner");
    assert_eq!(body["data"]["totalAchievements"], 20);
}

#[tokio::test]
async fn test_award_xp_levels_up_and_updates_display() {
    let app = create_test_app();

    let response = app
        .post_json("/api/progress/xp", json!({ "amount": 150, "reason": "test" }))
        .await;
    assert_status(&response, StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["totalXP"], 150);
    assert_eq!(body["data"]["level"], 2);
    assert_eq!(body["data"]["levelTitle"], "Prompt Apprentice");

    let body = body_json(app.get("/api/progress/display").await).await;
    assert_eq!(body["data"]["xp"], "150");
    assert_eq!(body["data"]["level"], "2");
    assert_eq!(body["data"]["progressFill"], "0%");
    assert_eq!(body["data"]["progressText"], "0 / 250 XP");
}

#[tokio::test]
async fn test_unlock_achievement() {
    let app = create_test_app();

    let response = app.post_json("/api/progress/achievements/first-steps", json!({})).await;
    assert_status(&response, StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["newlyUnlocked"], true);
    assert_eq!(body["data"]["achievement"]["name"], "First Steps");

    let body = body_json(
        app.post_json("/api/progress/achievements/first-steps", json!({}))
            .await,
    )
    .await;
    assert_eq!(body["data"]["newlyUnlocked"], false);

    let body = body_json(app.get("/api/progress").await).await;
    assert_eq!(body["data"]["totalXP"], 50);
    assert_eq!(body["data"]["achievementsUnlocked"], 1);
}

#[tokio::test]
async fn test_unknown_achievement_is_not_found() {
    let app = create_test_app();

    let response = app.post_json("/api/progress/achievements/nope", json!({})).await;
    assert_status(&response, StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_achievement_list_marks_unlocked() {
    let app = create_test_app();
    app.post_json("/api/progress/achievements/first-steps", json!({}))
        .await;

    let body = body_json(app.get("/api/progress/achievements").await).await;
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 20);
    let first = list.iter().find(|a| a["id"] == "first-steps").unwrap();
    assert_eq!(first["unlocked"], true);
    assert!(first["unlockedAt"].is_i64());
}

#[tokio::test]
async fn test_game_scores_keep_best() {
    let app = create_test_app();

    app.post_json("/api/progress/games/copy-pasta-chef", json!({ "score": 80 }))
        .await;
    let body = body_json(
        app.post_json("/api/progress/games/copy-pasta-chef", json!({ "score": 40 }))
            .await,
    )
    .await;
    assert_eq!(body["data"]["highScore"], 80);

    let body = body_json(app.get("/api/progress/games/copy-pasta-chef").await).await;
    assert_eq!(body["data"]["completed"], true);
    assert_eq!(body["data"]["highScore"], 80);

    let body = body_json(app.get("/api/progress/games/error-quest").await).await;
    assert_eq!(body["data"]["completed"], false);
    assert_eq!(body["data"]["highScore"], 0);
}

#[tokio::test]
async fn test_lesson_completion_pays_once() {
    let app = create_test_app();

    let body = body_json(app.post_json("/api/progress/lessons/week1-day1", json!({})).await).await;
    assert_eq!(body["data"]["alreadyCompleted"], false);
    assert_eq!(body["data"]["totalXP"], 50);

    let body = body_json(app.post_json("/api/progress/lessons/week1-day1", json!({})).await).await;
    assert_eq!(body["data"]["alreadyCompleted"], true);
    assert_eq!(body["data"]["totalXP"], 50);

    let body = body_json(app.get("/api/progress/weeks/1").await).await;
    assert_eq!(body["data"]["completion"], 20);

    let body = body_json(app.get("/api/progress").await).await;
    assert_eq!(body["data"]["currentStreak"], 1);
}

#[tokio::test]
async fn test_easter_eggs() {
    let app = create_test_app();

    for egg in ["konami", "logo-click", "secret-footer"] {
        let response = app
            .post_json(&format!("/api/progress/easter-eggs/{egg}"), json!({}))
            .await;
        assert_status(&response, StatusCode::OK);
    }
    let body = body_json(
        app.post_json("/api/progress/easter-eggs/konami", json!({}))
            .await,
    )
    .await;
    assert_eq!(body["data"]["newlyFound"], false);
    assert_eq!(body["data"]["eggsFound"], 3);

    let record = body_json(app.get("/api/progress/record").await).await;
    let achievements = record["data"]["achievements"].as_array().unwrap();
    assert!(achievements.contains(&json!("explorer")));
}

#[tokio::test]
async fn test_export_is_an_attachment() {
    let app = create_test_app();
    app.post_json("/api/progress/xp", json!({ "amount": 30, "reason": "warmup" }))
        .await;

    let response = app.get("/api/progress/export").await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"bootcamp-progress-2026-03-02.json\""
    );
    let body = body_json(response).await;
    assert_eq!(body["totalXP"], 30);
}

#[tokio::test]
async fn test_import_replaces_record_and_rejects_garbage() {
    let app = create_test_app();

    let response = app
        .post_raw(
            "/api/progress/import",
            "application/json",
            json!({ "totalXP": 500, "achievements": ["first-steps"] }).to_string(),
        )
        .await;
    assert_status(&response, StatusCode::OK);

    let body = body_json(app.get("/api/progress").await).await;
    assert_eq!(body["data"]["totalXP"], 500);
    assert_eq!(body["data"]["level"], 3);

    let display = body_json(app.get("/api/progress/display").await).await;
    assert_eq!(display["data"]["xp"], "500");

    let response = app
        .post_raw("/api/progress/import", "application/json", "{not json".to_string())
        .await;
    assert_status(&response, StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Error importing progress"));

    let body = body_json(app.get("/api/progress").await).await;
    assert_eq!(body["data"]["totalXP"], 500);
}

#[tokio::test]
async fn test_reset_requires_confirmation() {
    let app = create_test_app();
    app.post_json("/api/progress/xp", json!({ "amount": 200, "reason": "x" }))
        .await;

    let body = body_json(app.post_json("/api/progress/reset", json!({})).await).await;
    assert_eq!(body["data"]["reset"], false);
    let stats = body_json(app.get("/api/progress").await).await;
    assert_eq!(stats["data"]["totalXP"], 200);

    let body = body_json(
        app.post_json("/api/progress/reset", json!({ "confirm": true }))
            .await,
    )
    .await;
    assert_eq!(body["data"]["reset"], true);
    let stats = body_json(app.get("/api/progress").await).await;
    assert_eq!(stats["data"]["totalXP"], 0);
}

#[tokio::test]
async fn test_quota_exceeded_maps_to_insufficient_storage() {
    let app = common::create_test_app_with_quota(1024);

    let reason = "x".repeat(2048);
    let response = app
        .post_json("/api/progress/xp", json!({ "amount": 10, "reason": reason }))
        .await;
    assert_status(&response, StatusCode::INSUFFICIENT_STORAGE);
    let body = body_json(response).await;
    assert_eq!(body["code"], "STORAGE_QUOTA_EXCEEDED");

    let stats = body_json(app.get("/api/progress").await).await;
    assert_eq!(stats["data"]["totalXP"], 0);
}
