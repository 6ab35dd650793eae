use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::catalog::{AchievementDefinition, Catalog, LevelTable, EXPLORER, STREAK_KEEPER};
use crate::events::{EventBus, EventEnvelope, ProgressEvent};
use crate::record::{date_key, DailyActivity, HistoryEntry, ProgressRecord};
use crate::store::{ProgressStore, StoreError};

pub const EASTER_EGG_XP: i64 = 25;
pub const EXPLORER_EGG_COUNT: usize = 3;
pub const STREAK_KEEPER_DAYS: u32 = 7;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Position inside the current level band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct XpProgress {
    pub current: i64,
    pub needed: i64,
    pub percentage: u32,
}

impl XpProgress {
    pub fn for_xp(levels: &LevelTable, total_xp: i64) -> Self {
        let level = levels.level_for(total_xp);
        let Some(next) = levels.get(level.level + 1) else {
            return Self {
                current: total_xp,
                needed: total_xp,
                percentage: 100,
            };
        };

        let current = total_xp - level.xp;
        let needed = next.xp - level.xp;
        let percentage = (current.saturating_mul(100)).div_euclid(needed).clamp(0, 100);

        Self {
            current,
            needed,
            percentage: percentage as u32,
        }
    }
}

/// Domain rules over the persisted progress record.
///
/// Each mutating call loads the record, applies one change, saves it and then
/// publishes its events on the engine's [`EventBus`]. Calls that cascade
/// (an achievement awarding XP, a lesson completing a streak) run the nested
/// operation after the outer save, so every step sees the previous one's
/// write.
pub struct ProgressEngine {
    store: ProgressStore,
    catalog: Arc<Catalog>,
    bus: EventBus,
}

impl ProgressEngine {
    pub fn new(store: ProgressStore, catalog: Arc<Catalog>) -> Self {
        Self {
            store,
            catalog,
            bus: EventBus::new(),
        }
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.bus.subscribe()
    }

    pub fn record(&self) -> Result<ProgressRecord, EngineError> {
        Ok(self.store.load()?)
    }

    pub fn award_xp(&self, amount: i64, reason: &str) -> Result<i64, EngineError> {
        let mut record = self.store.load()?;
        let levels = self.catalog.levels();
        let old_level = levels.level_for(record.total_xp).level;

        record.total_xp = record.total_xp.saturating_add(amount);
        record.history.push(HistoryEntry {
            timestamp: self.store.clock().now_millis(),
            xp_delta: amount,
            reason: reason.to_string(),
        });
        self.store.save(&record)?;

        let new_total = record.total_xp;
        let new_level = levels.level_for(new_total);
        debug!(amount, reason, new_total, "XP awarded");

        self.bus.publish(ProgressEvent::XpAwarded {
            amount,
            reason: reason.to_string(),
            new_total,
        });

        if new_level.level > old_level {
            info!(level = new_level.level, title = %new_level.title, "Level up");
            self.bus.publish(ProgressEvent::LevelUp {
                new_level: new_level.level,
                title: new_level.title.clone(),
            });
        }

        Ok(new_total)
    }

    /// Unlocks `id` once. Returns the definition only when this call did the
    /// unlocking; unknown and already-unlocked ids are no-ops.
    pub fn unlock_achievement(
        &self,
        id: &str,
    ) -> Result<Option<AchievementDefinition>, EngineError> {
        let Some(achievement) = self.catalog.achievement(id).cloned() else {
            warn!(achievement_id = id, "Achievement not found");
            return Ok(None);
        };

        let mut record = self.store.load()?;
        if record.has_achievement(id) {
            return Ok(None);
        }

        record.achievements.push(id.to_string());
        record
            .achievement_unlock_dates
            .insert(id.to_string(), self.store.clock().now_millis());
        self.store.save(&record)?;

        info!(achievement_id = id, xp = achievement.xp, "Achievement unlocked");
        self.award_xp(achievement.xp, &format!("Achievement: {}", achievement.name))?;

        self.bus.publish(ProgressEvent::AchievementUnlocked {
            achievement: achievement.clone(),
        });

        Ok(Some(achievement))
    }

    pub fn current_level(&self) -> Result<u32, EngineError> {
        let record = self.store.load()?;
        Ok(self.catalog.levels().level_for(record.total_xp).level)
    }

    pub fn level_title(&self) -> Result<String, EngineError> {
        let record = self.store.load()?;
        Ok(self.catalog.levels().level_for(record.total_xp).title.clone())
    }

    pub fn xp_to_next_level(&self) -> Result<XpProgress, EngineError> {
        let record = self.store.load()?;
        Ok(XpProgress::for_xp(self.catalog.levels(), record.total_xp))
    }

    /// Marks a game completed and keeps the best score seen.
    pub fn complete_game(&self, game_id: &str, score: i64) -> Result<(), EngineError> {
        let mut record = self.store.load()?;

        if !record.has_game(game_id) {
            record.games_completed.push(game_id.to_string());
        }
        record
            .game_scores
            .entry(game_id.to_string())
            .and_modify(|best| *best = (*best).max(score))
            .or_insert(score);
        self.store.save(&record)?;

        self.bus.publish(ProgressEvent::GameCompleted {
            game_id: game_id.to_string(),
            score,
        });
        Ok(())
    }

    /// Returns `false` without side effects when the lesson was already
    /// completed.
    pub fn complete_lesson(&self, lesson_id: &str) -> Result<bool, EngineError> {
        let mut record = self.store.load()?;
        if record.has_lesson(lesson_id) {
            return Ok(false);
        }

        record.lessons_completed.push(lesson_id.to_string());
        let streak_reached = apply_daily_activity(&mut record, self.store.clock().today());
        self.store.save(&record)?;

        self.bus.publish(ProgressEvent::LessonCompleted {
            lesson_id: lesson_id.to_string(),
        });

        if streak_reached {
            self.unlock_achievement(STREAK_KEEPER)?;
        }
        Ok(true)
    }

    pub fn update_daily_activity(&self) -> Result<(), EngineError> {
        let mut record = self.store.load()?;
        let streak_reached = apply_daily_activity(&mut record, self.store.clock().today());
        self.store.save(&record)?;

        if streak_reached {
            self.unlock_achievement(STREAK_KEEPER)?;
        }
        Ok(())
    }

    /// Returns `false` when the egg had already been found.
    pub fn found_easter_egg(&self, egg_id: &str) -> Result<bool, EngineError> {
        let mut record = self.store.load()?;
        if record.has_easter_egg(egg_id) {
            return Ok(false);
        }

        record.easter_eggs_found.push(egg_id.to_string());
        let found = record.easter_eggs_found.len();
        self.store.save(&record)?;

        self.award_xp(EASTER_EGG_XP, "Easter egg discovered!")?;

        if found >= EXPLORER_EGG_COUNT {
            self.unlock_achievement(EXPLORER)?;
        }
        Ok(true)
    }
}

/// Counts a lesson for `today` and moves the streak. Returns whether the
/// streak now stands at the streak-keeper length.
fn apply_daily_activity(record: &mut ProgressRecord, today: NaiveDate) -> bool {
    let key = date_key(today);
    record
        .daily_activity
        .entry(key.clone())
        .or_insert_with(|| DailyActivity {
            date: key,
            xp_earned: 0,
            lessons_completed: 0,
        })
        .lessons_completed += 1;

    match record.last_active_date {
        None => record.current_streak = 1,
        Some(last) => match (today - last).num_days() {
            0 => {}
            1 => record.current_streak += 1,
            gap if gap > 1 => record.current_streak = 1,
            gap => {
                warn!(%last, %today, gap, "clock moved backwards, streak left unchanged");
                return false;
            }
        },
    }

    record.last_active_date = Some(today);
    record.longest_streak = record.longest_streak.max(record.current_streak);

    record.current_streak == STREAK_KEEPER_DAYS
}
