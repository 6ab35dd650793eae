use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Timelike;
use serde::Serialize;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{debug, warn};

use crate::catalog::{AchievementDefinition, EARLY_BIRD, NIGHT_OWL};
use crate::engine::{EngineError, ProgressEngine, XpProgress};
use crate::events::{EventEnvelope, ProgressEvent};
use crate::store::StorageChange;

const EARLY_BIRD_BEFORE_HOUR: u32 = 8;
const NIGHT_OWL_FROM_HOUR: u32 = 22;

/// Named output points a page exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayTarget {
    Xp,
    Level,
    LevelTitle,
    Streak,
    ProgressFill,
    ProgressText,
    LessonsCompleted,
    GamesCompleted,
    AchievementsUnlocked,
}

impl DisplayTarget {
    pub const ALL: [DisplayTarget; 9] = [
        DisplayTarget::Xp,
        DisplayTarget::Level,
        DisplayTarget::LevelTitle,
        DisplayTarget::Streak,
        DisplayTarget::ProgressFill,
        DisplayTarget::ProgressText,
        DisplayTarget::LessonsCompleted,
        DisplayTarget::GamesCompleted,
        DisplayTarget::AchievementsUnlocked,
    ];

    /// Page attribute marking elements bound to this target.
    pub fn attribute(&self) -> &'static str {
        match self {
            DisplayTarget::Xp => "data-xp",
            DisplayTarget::Level => "data-level",
            DisplayTarget::LevelTitle => "data-level-title",
            DisplayTarget::Streak => "data-streak",
            DisplayTarget::ProgressFill => "data-progress-bar",
            DisplayTarget::ProgressText => "data-progress-text",
            DisplayTarget::LessonsCompleted => "data-lessons-completed",
            DisplayTarget::GamesCompleted => "data-games-completed",
            DisplayTarget::AchievementsUnlocked => "data-achievements-unlocked",
        }
    }
}

pub trait DisplaySurface: Send {
    fn write(&mut self, target: DisplayTarget, value: &str);
}

/// Toast and sound primitives. All optional; the defaults do nothing.
pub trait Presenter: Send {
    fn show_xp(&mut self, _amount: i64, _reason: &str) {}

    fn show_level_up(&mut self, _level: u32, _title: &str) {}

    fn show_achievement(&mut self, _achievement: &AchievementDefinition) {}

    fn play_sound(&mut self, _name: &str) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPresenter;

impl Presenter for NoopPresenter {}

/// Surface that just remembers the last value written to each target.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DisplayBoard {
    values: BTreeMap<DisplayTarget, String>,
}

impl DisplayBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: DisplayTarget) -> Option<&str> {
        self.values.get(&target).map(String::as_str)
    }
}

impl DisplaySurface for DisplayBoard {
    fn write(&mut self, target: DisplayTarget, value: &str) {
        self.values.insert(target, value.to_string());
    }
}

/// Keeps a [`DisplaySurface`] in step with the engine.
///
/// It listens to the engine's events and to storage changes made by other
/// contexts, and only ever reads progress, with one exception: the
/// time-of-day achievements checked in [`DisplaySync::init`].
pub struct DisplaySync<S, P> {
    engine: Arc<ProgressEngine>,
    events: Receiver<EventEnvelope>,
    storage: Receiver<StorageChange>,
    surface: S,
    presenter: P,
}

impl<S: DisplaySurface, P: Presenter> DisplaySync<S, P> {
    pub fn new(engine: Arc<ProgressEngine>, surface: S, presenter: P) -> Self {
        let events = engine.subscribe();
        let storage = engine.store().subscribe_changes();
        Self {
            engine,
            events,
            storage,
            surface,
            presenter,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn init(&mut self) -> Result<(), EngineError> {
        self.refresh()?;
        self.check_time_achievements()?;
        self.pump()?;
        Ok(())
    }

    /// Drains pending events and storage changes, hands notifications to the
    /// presenter and refreshes once if anything arrived. Returns how many
    /// messages were handled.
    pub fn pump(&mut self) -> Result<usize, EngineError> {
        let mut handled = 0usize;
        let mut stale = false;

        loop {
            match self.events.try_recv() {
                Ok(envelope) => {
                    self.present(&envelope.event);
                    handled += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "display sync lagged behind progress events");
                    stale = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        let store = self.engine.store();
        loop {
            match self.storage.try_recv() {
                Ok(change) => {
                    if change.key == store.key() && change.origin != store.context_id() {
                        debug!(key = %change.key, origin = %change.origin, "progress changed in another context");
                        handled += 1;
                    }
                }
                Err(TryRecvError::Lagged(_)) => stale = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        if handled > 0 || stale {
            self.refresh()?;
        }
        Ok(handled)
    }

    pub fn refresh(&mut self) -> Result<(), EngineError> {
        let record = self.engine.record()?;
        let levels = self.engine.catalog().levels();
        let level = levels.level_for(record.total_xp);
        let progress = XpProgress::for_xp(levels, record.total_xp);

        let writes = [
            (DisplayTarget::Xp, format_thousands(record.total_xp)),
            (DisplayTarget::Level, level.level.to_string()),
            (DisplayTarget::LevelTitle, level.title.clone()),
            (DisplayTarget::Streak, record.current_streak.to_string()),
            (DisplayTarget::ProgressFill, format!("{}%", progress.percentage)),
            (
                DisplayTarget::ProgressText,
                format!("{} / {} XP", progress.current, progress.needed),
            ),
            (
                DisplayTarget::LessonsCompleted,
                record.lessons_completed.len().to_string(),
            ),
            (
                DisplayTarget::GamesCompleted,
                record.games_completed.len().to_string(),
            ),
            (
                DisplayTarget::AchievementsUnlocked,
                record.achievements.len().to_string(),
            ),
        ];

        for (target, value) in writes {
            self.surface.write(target, &value);
        }
        Ok(())
    }

    fn check_time_achievements(&mut self) -> Result<(), EngineError> {
        let hour = self.engine.store().clock().now().hour();

        if hour < EARLY_BIRD_BEFORE_HOUR {
            self.engine.unlock_achievement(EARLY_BIRD)?;
        }
        if hour >= NIGHT_OWL_FROM_HOUR {
            self.engine.unlock_achievement(NIGHT_OWL)?;
        }
        Ok(())
    }

    fn present(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::XpAwarded { amount, reason, .. } => {
                self.presenter.show_xp(*amount, reason);
            }
            ProgressEvent::LevelUp { new_level, title } => {
                self.presenter.show_level_up(*new_level, title);
                self.presenter.play_sound("levelup");
            }
            ProgressEvent::AchievementUnlocked { achievement } => {
                self.presenter.show_achievement(achievement);
                self.presenter.play_sound("achievement");
            }
            ProgressEvent::GameCompleted { .. }
            | ProgressEvent::LessonCompleted { .. }
            | ProgressEvent::ProgressImported { .. }
            | ProgressEvent::ProgressReset => {}
        }
    }
}

/// `12345` -> `12,345`.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
