//! End-of-day nutrition accountability report.
//!
//! Entries come from the local nutrition tracker's sqlite database; the
//! report itself is plain text meant for a terminal or a chat message.

pub mod db;

use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;

pub use db::{fetch_entries, open_pool};

const RULE: &str = "═══════════════════════════════════════════";

const MEAL_ORDER: [&str; 4] = ["breakfast", "lunch", "dinner", "snack"];

const NOTHING_LOGGED: &str = "🚨 NO FOOD LOGGED TODAY\n\nWhat happened? Forgot to track or actually didn't eat?\n\nLog your meals tomorrow or I'll start asking uncomfortable questions.";

#[derive(Debug, Error)]
pub enum NutritionError {
    #[error("invalid database path: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct NutritionEntry {
    pub food_name: String,
    pub meal_type: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Daily goals in kcal and grams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutritionTargets {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Default for NutritionTargets {
    fn default() -> Self {
        Self {
            calories: 1600.0,
            protein: 150.0,
            carbs: 150.0,
            fat: 70.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Totals {
    pub fn sum<'a>(entries: impl IntoIterator<Item = &'a NutritionEntry>) -> Self {
        entries.into_iter().fold(Self::default(), |acc, entry| Self {
            calories: acc.calories + entry.calories,
            protein: acc.protein + entry.protein,
            carbs: acc.carbs + entry.carbs,
            fat: acc.fat + entry.fat,
        })
    }
}

pub fn meal_emoji(meal_type: &str) -> &'static str {
    match meal_type {
        "breakfast" => "🌅",
        "lunch" => "☀️",
        "dinner" => "🌙",
        "snack" => "🍿",
        _ => "🍽️",
    }
}

/// One line per observation, newline separated.
pub fn generate_analysis(totals: &Totals, targets: &NutritionTargets) -> String {
    let cal_diff = totals.calories - targets.calories;
    let carb_diff = totals.carbs - targets.carbs;
    let fat_diff = totals.fat - targets.fat;

    let mut lines = Vec::new();

    if cal_diff > 200.0 {
        lines.push(format!(
            "📈 Over by {cal_diff} calories. Tomorrow: lighter breakfast or skip the snack."
        ));
    } else if cal_diff < -300.0 {
        lines.push(format!(
            "📉 Under by {} calories. You're in deficit mode — good for fat loss, but don't starve.",
            cal_diff.abs()
        ));
    } else {
        lines.push("✅ On target with calories. Disciplined.".to_string());
    }

    if totals.protein >= targets.protein {
        lines.push("💪 Hit protein goal. Muscles fed.".to_string());
    } else if totals.protein >= targets.protein * 0.8 {
        lines.push(format!(
            "🟡 Close on protein ({}g). Add Greek yogurt or shake tomorrow.",
            totals.protein
        ));
    } else {
        lines.push(format!(
            "⚠️ Low on protein ({}g). Prioritize protein at every meal tomorrow.",
            totals.protein
        ));
    }

    if carb_diff > 30.0 {
        lines.push("🍞 High carbs today. Watch the sugars tomorrow.".to_string());
    }
    if fat_diff < -20.0 {
        lines.push("🥑 Low fat intake. Add nuts, avocado, or olive oil.".to_string());
    }

    lines.join("\n")
}

fn signed(actual: f64, target: f64) -> String {
    let diff = actual - target;
    if actual >= target {
        format!("+{diff}")
    } else {
        diff.to_string()
    }
}

/// Entries are expected in `meal_type, created_at` order, as `fetch_entries`
/// returns them.
pub fn render_report(date: NaiveDate, entries: &[NutritionEntry], targets: &NutritionTargets) -> String {
    if entries.is_empty() {
        return NOTHING_LOGGED.to_string();
    }

    let totals = Totals::sum(entries);
    let mut report = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(report, "🌙 NUTRITION ACCOUNTABILITY REPORT");
    let _ = writeln!(report, "📅 Date: {}", date.format("%Y-%m-%d"));
    let _ = writeln!(report, "⏰ Time: 10:00 PM (End of Day)\n");

    for meal in MEAL_ORDER {
        let items: Vec<&NutritionEntry> = entries.iter().filter(|e| e.meal_type == meal).collect();
        if items.is_empty() {
            continue;
        }
        let meal_calories: f64 = items.iter().fold(0.0, |acc, e| acc + e.calories);
        let _ = writeln!(
            report,
            "{} {} ({meal_calories} cal):",
            meal_emoji(meal),
            meal.to_uppercase()
        );
        for item in items {
            let _ = writeln!(report, "   • {}", item.food_name);
            let _ = writeln!(
                report,
                "     └─ {} cal | P:{}g C:{}g F:{}g",
                item.calories, item.protein, item.carbs, item.fat
            );
        }
        report.push('\n');
    }

    let _ = writeln!(report, "{RULE}");
    let _ = writeln!(report, "📊 FINAL SCORECARD");
    let _ = writeln!(report, "{RULE}");
    let _ = writeln!(
        report,
        "Calories: {} / {}  ({})",
        totals.calories,
        targets.calories,
        signed(totals.calories, targets.calories)
    );
    let _ = writeln!(
        report,
        "Protein:  {}g / {}g  ({}g)",
        totals.protein,
        targets.protein,
        signed(totals.protein, targets.protein)
    );
    let _ = writeln!(
        report,
        "Carbs:    {}g / {}g  ({}g)",
        totals.carbs,
        targets.carbs,
        signed(totals.carbs, targets.carbs)
    );
    let _ = writeln!(
        report,
        "Fat:      {}g / {}g    ({}g)",
        totals.fat,
        targets.fat,
        signed(totals.fat, targets.fat)
    );
    let _ = writeln!(report, "{RULE}\n");

    let _ = writeln!(report, "💡 GILFOYLE'S ANALYSIS:");
    report.push_str(&generate_analysis(&totals, targets));
    report.push_str("\n\n");

    let remaining_calories = targets.calories - totals.calories;
    if remaining_calories > 0.0 {
        let _ = writeln!(report, "📋 TOMORROW'S GOAL:");
        let _ = writeln!(
            report,
            "Make up {remaining_calories} calories, {}g protein.",
            targets.protein - totals.protein
        );
    }

    report.push_str("\nSleep well. Tomorrow we train — body and mind.\n");
    report.push_str("— Gilfoyle 😈");
    report
}

/// Reads `date`'s entries from the database at `db_path` and renders them.
pub async fn generate_report(
    db_path: &Path,
    date: NaiveDate,
    targets: &NutritionTargets,
) -> Result<String, NutritionError> {
    let pool = open_pool(db_path).await?;
    let entries = fetch_entries(&pool, date).await;
    pool.close().await;
    Ok(render_report(date, &entries?, targets))
}

/// The report date: the current UTC calendar day.
pub fn report_date() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
