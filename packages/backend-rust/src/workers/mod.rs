mod nightly_report;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::config::Config;

const DEFAULT_REPORT_SCHEDULE: &str = "0 0 22 * * *";

pub struct WorkerManager {
    scheduler: Mutex<JobScheduler>,
    shutdown_tx: broadcast::Sender<()>,
    nutrition_db_path: Arc<PathBuf>,
    running: AtomicBool,
}

impl WorkerManager {
    pub async fn new(config: &Config) -> Result<Self, WorkerError> {
        let scheduler = JobScheduler::new().await.map_err(WorkerError::Scheduler)?;
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            scheduler: Mutex::new(scheduler),
            shutdown_tx,
            nutrition_db_path: Arc::new(config.nutrition_db_path.clone()),
            running: AtomicBool::new(false),
        })
    }

    pub async fn start(&self) -> Result<(), WorkerError> {
        let enable_nutrition_report = std::env::var("ENABLE_NUTRITION_REPORT_WORKER")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        if !enable_nutrition_report {
            info!("ENABLE_NUTRITION_REPORT_WORKER not set, skipping worker startup");
            return Ok(());
        }

        let scheduler = self.scheduler.lock().await;

        let schedule = std::env::var("NUTRITION_REPORT_SCHEDULE")
            .unwrap_or_else(|_| DEFAULT_REPORT_SCHEDULE.to_string());
        let db_path = Arc::clone(&self.nutrition_db_path);
        let shutdown_rx = self.shutdown_tx.subscribe();
        let job = Job::new_async(&schedule, move |_uuid, _lock| {
            let db_path = Arc::clone(&db_path);
            let mut rx = shutdown_rx.resubscribe();
            Box::pin(async move {
                tokio::select! {
                    _ = rx.recv() => {},
                    result = nightly_report::run(db_path) => {
                        if let Err(e) = result {
                            error!(error = %e, "Nutrition report worker error");
                        }
                    }
                }
            })
        })
        .map_err(WorkerError::Scheduler)?;
        scheduler.add(job).await.map_err(WorkerError::Scheduler)?;
        info!(schedule = %schedule, "Nutrition report worker scheduled");

        scheduler.start().await.map_err(WorkerError::Scheduler)?;
        self.running.store(true, Ordering::Relaxed);
        info!("All workers started");
        Ok(())
    }

    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::Relaxed) {
            return;
        }

        info!("Stopping workers...");
        let _ = self.shutdown_tx.send(());

        let mut scheduler = self.scheduler.lock().await;
        if let Err(e) = scheduler.shutdown().await {
            warn!(error = %e, "Error shutting down scheduler");
        }

        info!("Workers stopped");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
    #[error("Nutrition report error: {0}")]
    Nutrition(#[from] crate::nutrition::NutritionError),
}
