use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::nutrition::{self, NutritionTargets};

use super::WorkerError;

pub async fn run(db_path: Arc<PathBuf>) -> Result<(), WorkerError> {
    let date = nutrition::report_date();
    let report = nutrition::generate_report(&db_path, date, &NutritionTargets::default()).await?;
    info!(date = %date, "Nightly nutrition report\n{report}");
    Ok(())
}
