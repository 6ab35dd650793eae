use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use super::{NutritionEntry, NutritionError};

/// Opens the tracker database without creating it; a missing file is an
/// error rather than an empty report.
pub async fn open_pool(path: &Path) -> Result<SqlitePool, NutritionError> {
    let db_url = format!("sqlite:{}", path.display());
    let options = SqliteConnectOptions::from_str(&db_url)
        .map_err(|e| NutritionError::Config(e.to_string()))?
        .create_if_missing(false)
        .read_only(true)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

pub async fn fetch_entries(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<NutritionEntry>, NutritionError> {
    let rows = sqlx::query_as::<_, NutritionEntry>(
        r#"
        SELECT food_name,
               meal_type,
               CAST(calories AS REAL) AS calories,
               CAST(protein AS REAL) AS protein,
               CAST(carbs AS REAL) AS carbs,
               CAST(fat AS REAL) AS fat
        FROM nutrition_entries
        WHERE date = ?
        ORDER BY meal_type, created_at
        "#,
    )
    .bind(date.format("%Y-%m-%d").to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
