use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use bootcamp_progress::{AchievementDefinition, DisplayBoard, ProgressRecord, ProgressStats};

use crate::response::AppError;
use crate::state::AppState;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

impl<T> SuccessResponse<T> {
    fn new(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AwardXpRequest {
    amount: i64,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct GameScoreRequest {
    #[serde(default)]
    score: i64,
}

#[derive(Debug, Deserialize)]
struct ResetRequest {
    #[serde(default)]
    confirm: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct XpAwardedData {
    #[serde(rename = "totalXP")]
    total_xp: i64,
    level: u32,
    level_title: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AchievementStatus {
    #[serde(flatten)]
    achievement: AchievementDefinition,
    unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    unlocked_at: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UnlockData {
    newly_unlocked: bool,
    achievement: AchievementDefinition,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GameData {
    game_id: String,
    completed: bool,
    high_score: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LessonData {
    lesson_id: String,
    already_completed: bool,
    #[serde(rename = "totalXP")]
    total_xp: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EasterEggData {
    egg_id: String,
    newly_found: bool,
    eggs_found: usize,
}

#[derive(Serialize)]
struct WeekData {
    week: u32,
    completion: u32,
}

#[derive(Serialize)]
struct ResetData {
    reset: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(stats))
        .route("/record", get(record))
        .route("/display", get(display))
        .route("/activity", post(daily_activity))
        .route("/xp", post(award_xp))
        .route("/achievements", get(achievements))
        .route("/achievements/:id", post(unlock_achievement))
        .route("/games/:id", get(game).post(complete_game))
        .route("/lessons/:id", post(complete_lesson))
        .route("/weeks/:week", get(week_completion))
        .route("/easter-eggs/:id", post(found_easter_egg))
        .route("/export", get(export_progress))
        .route("/import", post(import_progress))
        .route("/reset", post(reset_progress))
}

async fn stats(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<ProgressStats>>, AppError> {
    let session = state.progress();
    Ok(SuccessResponse::new(session.tracker.stats()?))
}

async fn record(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<ProgressRecord>>, AppError> {
    let session = state.progress();
    Ok(SuccessResponse::new(session.engine.record()?))
}

async fn display(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<DisplayBoard>>, AppError> {
    let mut session = state.progress();
    session.display.pump()?;
    Ok(SuccessResponse::new(session.display.surface().clone()))
}

async fn daily_activity(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<ProgressRecord>>, AppError> {
    let mut session = state.progress();
    session.engine.update_daily_activity()?;
    session.display.pump()?;
    Ok(SuccessResponse::new(session.engine.record()?))
}

async fn award_xp(
    State(state): State<AppState>,
    Json(body): Json<AwardXpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = state.progress();
    let total_xp = session.engine.award_xp(body.amount, &body.reason)?;
    session.display.pump()?;

    Ok(SuccessResponse::new(XpAwardedData {
        total_xp,
        level: session.engine.current_level()?,
        level_title: session.engine.level_title()?,
    }))
}

async fn achievements(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let session = state.progress();
    let record = session.engine.record()?;
    let list: Vec<AchievementStatus> = session
        .engine
        .catalog()
        .achievements()
        .iter()
        .map(|achievement| AchievementStatus {
            unlocked: record.has_achievement(&achievement.id),
            unlocked_at: record.achievement_unlock_dates.get(&achievement.id).copied(),
            achievement: achievement.clone(),
        })
        .collect();

    Ok(SuccessResponse::new(list))
}

async fn unlock_achievement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = state.progress();
    let Some(achievement) = session.engine.catalog().achievement(&id).cloned() else {
        return Err(AppError::not_found(format!("Achievement not found: {id}")));
    };

    let newly_unlocked = session.engine.unlock_achievement(&id)?.is_some();
    session.display.pump()?;

    Ok(SuccessResponse::new(UnlockData {
        newly_unlocked,
        achievement,
    }))
}

async fn game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.progress();
    Ok(SuccessResponse::new(GameData {
        completed: session.tracker.is_game_completed(&id)?,
        high_score: session.tracker.game_high_score(&id)?,
        game_id: id,
    }))
}

async fn complete_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<GameScoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = state.progress();
    session.engine.complete_game(&id, body.score)?;
    session.display.pump()?;

    Ok(SuccessResponse::new(GameData {
        completed: true,
        high_score: session.tracker.game_high_score(&id)?,
        game_id: id,
    }))
}

/// Marks the lesson done and pays the lesson bonus, the same as the
/// "complete" button on a lesson page. Repeat submissions pay nothing.
async fn complete_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = state.progress();
    let already_completed = session.tracker.is_lesson_completed(&id)?;
    if !already_completed {
        session.tracker.complete_current_lesson(&id)?;
        session.display.pump()?;
    }

    Ok(SuccessResponse::new(LessonData {
        lesson_id: id,
        already_completed,
        total_xp: session.engine.record()?.total_xp,
    }))
}

async fn week_completion(
    State(state): State<AppState>,
    Path(week): Path<u32>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.progress();
    Ok(SuccessResponse::new(WeekData {
        week,
        completion: session.tracker.week_completion(week)?,
    }))
}

async fn found_easter_egg(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = state.progress();
    let newly_found = session.engine.found_easter_egg(&id)?;
    session.display.pump()?;

    Ok(SuccessResponse::new(EasterEggData {
        eggs_found: session.engine.record()?.easter_eggs_found.len(),
        egg_id: id,
        newly_found,
    }))
}

async fn export_progress(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let session = state.progress();
    let export = session.tracker.export_progress()?;
    let disposition = format!("attachment; filename=\"{}\"", export.file_name);

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.json,
    ))
}

async fn import_progress(
    State(state): State<AppState>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let mut session = state.progress();
    let record = session.tracker.import_progress(&body)?;
    session.display.pump()?;
    Ok(SuccessResponse::new(record))
}

async fn reset_progress(
    State(state): State<AppState>,
    Json(body): Json<ResetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = state.progress();
    let reset = session.tracker.reset_progress(body.confirm)?;
    if reset {
        session.display.pump()?;
    }
    Ok(SuccessResponse::new(ResetData { reset }))
}
