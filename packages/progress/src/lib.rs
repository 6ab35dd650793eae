//! Progress tracking for the AI Mastery Bootcamp.
//!
//! The crate is split along the flow of a single action:
//! [`ProgressEngine`] applies the domain rules (XP, levels, achievements,
//! streaks) to a [`ProgressRecord`] held by a [`ProgressStore`], publishes a
//! [`ProgressEvent`] on its own [`EventBus`], and [`DisplaySync`] drains those
//! events to keep a [`DisplaySurface`] current. Nothing in here renders UI.

pub mod catalog;
pub mod clock;
pub mod display;
pub mod engine;
pub mod events;
pub mod games;
pub mod record;
pub mod store;
pub mod tracker;

pub use catalog::{AchievementDefinition, Catalog, CatalogError, LevelDefinition, LevelTable};
pub use clock::{Clock, ManualClock, SystemClock};
pub use display::{
    DisplayBoard, DisplaySurface, DisplaySync, DisplayTarget, NoopPresenter, Presenter,
};
pub use engine::{EngineError, ProgressEngine, XpProgress};
pub use events::{EventBus, EventEnvelope, ProgressEvent};
pub use games::{format_time, GameTimer};
pub use record::{DailyActivity, HistoryEntry, ProgressRecord};
pub use store::{
    FileStorage, MemoryStorage, ProgressStore, StorageBackend, StorageChange, StoreError,
    PROGRESS_KEY,
};
pub use tracker::{ProgressExport, ProgressStats, ProgressTracker, TrackerError};
