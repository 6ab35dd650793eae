//! Prints today's nutrition accountability report to stdout. Logs go to
//! stderr so the report can be piped.

use bootcamp_backend::config::Config;
use bootcamp_backend::logging::{init_tracing, Console, LogSettings};
use bootcamp_backend::nutrition::{self, NutritionTargets};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&LogSettings::from_env(
        &config.log_level,
        "nutrition-report.log",
        Console::Stderr,
    ));

    let date = nutrition::report_date();
    tracing::info!(%date, db = %config.nutrition_db_path.display(), "generating nutrition report");
    match nutrition::generate_report(&config.nutrition_db_path, date, &NutritionTargets::default()).await {
        Ok(report) => println!("{report}"),
        Err(err) => {
            tracing::error!(error = %err, "failed to generate nutrition report");
            std::process::exit(1);
        }
    }
}
