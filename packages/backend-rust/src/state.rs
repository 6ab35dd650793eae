use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::info;

use bootcamp_progress::{
    AchievementDefinition, Catalog, CatalogError, Clock, DisplayBoard, DisplaySync, EngineError,
    FileStorage, Presenter, ProgressEngine, ProgressStore, ProgressTracker, StorageBackend,
    StoreError, SystemClock,
};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("progress storage error: {0}")]
    Store(#[from] StoreError),
    #[error("progress engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Where pages, static assets and data files are served from.
#[derive(Debug, Clone)]
pub struct SitePaths {
    pub public_dir: PathBuf,
    pub views_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl SitePaths {
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_dir: config.public_dir.clone(),
            views_dir: config.views_dir.clone(),
            data_dir: config.data_dir.clone(),
        }
    }
}

/// Presenter for a headless server: notifications become log lines.
#[derive(Debug, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn show_xp(&mut self, amount: i64, reason: &str) {
        info!(amount, reason, "XP notification");
    }

    fn show_level_up(&mut self, level: u32, title: &str) {
        info!(level, title, "Level up notification");
    }

    fn show_achievement(&mut self, achievement: &AchievementDefinition) {
        info!(achievement_id = %achievement.id, name = %achievement.name, "Achievement notification");
    }
}

pub struct ProgressSession {
    pub engine: Arc<ProgressEngine>,
    pub tracker: ProgressTracker,
    pub display: DisplaySync<DisplayBoard, LogPresenter>,
}

impl ProgressSession {
    pub fn new(engine: Arc<ProgressEngine>) -> Result<Self, EngineError> {
        let tracker = ProgressTracker::new(Arc::clone(&engine));
        let mut display = DisplaySync::new(Arc::clone(&engine), DisplayBoard::new(), LogPresenter);
        display.init()?;
        Ok(Self {
            engine,
            tracker,
            display,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    paths: Arc<SitePaths>,
    progress: Arc<Mutex<ProgressSession>>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let catalog = match &config.achievement_catalog {
            Some(path) => Catalog::from_file(path)?,
            None => Catalog::builtin(),
        };
        let backend = FileStorage::open(&config.progress_dir, config.progress_quota_bytes)?;
        info!(dir = %config.progress_dir.display(), "progress storage opened");

        Self::new(
            SitePaths::from_config(config),
            Arc::new(backend),
            Arc::new(SystemClock),
            catalog,
        )
    }

    pub fn new(
        paths: SitePaths,
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        catalog: Catalog,
    ) -> Result<Self, StartupError> {
        let store = ProgressStore::new(backend, clock);
        let engine = Arc::new(ProgressEngine::new(store, Arc::new(catalog)));
        let session = ProgressSession::new(engine)?;

        Ok(Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            paths: Arc::new(paths),
            progress: Arc::new(Mutex::new(session)),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn paths(&self) -> &SitePaths {
        &self.paths
    }

    /// Exclusive access to the progress engine; operations on one record are
    /// serialized through this lock.
    pub fn progress(&self) -> MutexGuard<'_, ProgressSession> {
        self.progress.lock()
    }
}
