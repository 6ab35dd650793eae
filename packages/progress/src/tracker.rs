use std::sync::Arc;

use chrono::DateTime;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::engine::{EngineError, ProgressEngine, XpProgress};
use crate::events::ProgressEvent;
use crate::record::ProgressRecord;
use crate::store::StoreError;

const LESSONS_PER_WEEK: u32 = 5;
pub const LESSON_COMPLETION_XP: i64 = 50;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Error importing progress: {0}")]
    Import(#[from] serde_json::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<StoreError> for TrackerError {
    fn from(err: StoreError) -> Self {
        TrackerError::Engine(EngineError::Store(err))
    }
}

/// A downloadable copy of the progress record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressExport {
    pub file_name: String,
    pub json: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    #[serde(rename = "totalXP")]
    pub total_xp: i64,
    pub level: u32,
    pub level_title: String,
    #[serde(rename = "xpToNextLevel")]
    pub xp_to_next_level: XpProgress,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub lessons_completed: usize,
    pub games_completed: usize,
    pub achievements_unlocked: usize,
    pub total_achievements: usize,
    pub days_active: usize,
    pub start_date: String,
}

/// Page-level conveniences and the export/import/reset boundary.
pub struct ProgressTracker {
    engine: Arc<ProgressEngine>,
}

impl ProgressTracker {
    pub fn new(engine: Arc<ProgressEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<ProgressEngine> {
        &self.engine
    }

    pub fn complete_current_lesson(&self, lesson_id: &str) -> Result<(), EngineError> {
        self.engine.complete_lesson(lesson_id)?;
        self.engine
            .award_xp(LESSON_COMPLETION_XP, &format!("Completed {lesson_id}"))?;
        Ok(())
    }

    /// Share of `week<N>-day1..5` lessons completed, floored to a percentage.
    pub fn week_completion(&self, week: u32) -> Result<u32, EngineError> {
        let record = self.engine.record()?;
        let completed = (1..=LESSONS_PER_WEEK)
            .filter(|day| record.has_lesson(&format!("week{week}-day{day}")))
            .count() as u32;
        Ok(completed * 100 / LESSONS_PER_WEEK)
    }

    pub fn is_lesson_completed(&self, lesson_id: &str) -> Result<bool, EngineError> {
        Ok(self.engine.record()?.has_lesson(lesson_id))
    }

    pub fn is_game_completed(&self, game_id: &str) -> Result<bool, EngineError> {
        Ok(self.engine.record()?.has_game(game_id))
    }

    pub fn game_high_score(&self, game_id: &str) -> Result<i64, EngineError> {
        Ok(self.engine.record()?.game_score(game_id))
    }

    pub fn stats(&self) -> Result<ProgressStats, EngineError> {
        let record = self.engine.record()?;
        let catalog = self.engine.catalog();
        let level = catalog.levels().level_for(record.total_xp);

        let offset = *self.engine.store().clock().now().offset();
        let start_date = DateTime::from_timestamp_millis(record.start_date)
            .map(|ts| ts.with_timezone(&offset).date_naive().to_string())
            .unwrap_or_default();

        Ok(ProgressStats {
            total_xp: record.total_xp,
            level: level.level,
            level_title: level.title.clone(),
            xp_to_next_level: XpProgress::for_xp(catalog.levels(), record.total_xp),
            current_streak: record.current_streak,
            longest_streak: record.longest_streak,
            lessons_completed: record.lessons_completed.len(),
            games_completed: record.games_completed.len(),
            achievements_unlocked: record.achievements.len(),
            total_achievements: catalog.achievements().len(),
            days_active: record.daily_activity.len(),
            start_date,
        })
    }

    pub fn export_progress(&self) -> Result<ProgressExport, TrackerError> {
        let record = self.engine.record()?;
        let json = serde_json::to_string_pretty(&record).map_err(StoreError::Serialize)?;
        let today = self.engine.store().clock().today();
        Ok(ProgressExport {
            file_name: format!("bootcamp-progress-{}.json", today.format("%Y-%m-%d")),
            json,
        })
    }

    /// Replaces the stored record wholesale. A document that does not parse
    /// leaves storage untouched.
    pub fn import_progress(&self, json: &str) -> Result<ProgressRecord, TrackerError> {
        let record: ProgressRecord = serde_json::from_str(json)?;
        self.engine.store().save(&record)?;
        info!(total_xp = record.total_xp, "Progress imported");
        self.engine.events().publish(ProgressEvent::ProgressImported {
            total_xp: record.total_xp,
        });
        Ok(record)
    }

    /// Deletes all progress when `confirmed`; returns whether it did.
    pub fn reset_progress(&self, confirmed: bool) -> Result<bool, TrackerError> {
        if !confirmed {
            return Ok(false);
        }
        self.engine.store().clear()?;
        info!("Progress reset");
        self.engine.events().publish(ProgressEvent::ProgressReset);
        Ok(true)
    }
}
