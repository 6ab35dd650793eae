use bootcamp_progress::{ProgressRecord, ProgressTracker, StorageBackend, TrackerError, PROGRESS_KEY};

mod common;

use chrono::{FixedOffset, TimeZone};
use common::Harness;

#[test]
fn test_complete_current_lesson_awards_lesson_xp() {
    let h = Harness::new();
    let tracker = ProgressTracker::new(h.engine.clone());

    tracker.complete_current_lesson("week1-day1").unwrap();
    tracker.complete_current_lesson("week1-day2").unwrap();

    let record = h.engine.record().unwrap();
    assert_eq!(record.total_xp, 100);
    assert_eq!(record.history[1].reason, "Completed week1-day2");
    assert!(tracker.is_lesson_completed("week1-day1").unwrap());
    assert!(!tracker.is_lesson_completed("week2-day1").unwrap());
    assert_eq!(tracker.week_completion(1).unwrap(), 40);
    assert_eq!(tracker.week_completion(2).unwrap(), 0);
}

#[test]
fn test_game_lookups() {
    let h = Harness::new();
    let tracker = ProgressTracker::new(h.engine.clone());

    h.engine.complete_game("build-races", 42).unwrap();
    assert!(tracker.is_game_completed("build-races").unwrap());
    assert_eq!(tracker.game_high_score("build-races").unwrap(), 42);
    assert_eq!(tracker.game_high_score("prompt-battles").unwrap(), 0);
}

#[test]
fn test_stats_summarize_record() {
    let h = Harness::new();
    let tracker = ProgressTracker::new(h.engine.clone());

    h.engine.complete_lesson("week1-day1").unwrap();
    h.engine.unlock_achievement("first-steps").unwrap();
    h.engine.award_xp(100, "catch up").unwrap();

    let stats = tracker.stats().unwrap();
    assert_eq!(stats.total_xp, 150);
    assert_eq!(stats.level, 2);
    assert_eq!(stats.level_title, "Prompt Apprentice");
    assert_eq!(stats.xp_to_next_level.current, 0);
    assert_eq!(stats.lessons_completed, 1);
    assert_eq!(stats.achievements_unlocked, 1);
    assert_eq!(stats.total_achievements, 20);
    assert_eq!(stats.days_active, 1);
    assert_eq!(stats.current_streak, 1);
    assert!(!stats.start_date.is_empty());

    let value = serde_json::to_value(&stats).unwrap();
    assert_eq!(value["totalXP"], 150);
    assert_eq!(value["xpToNextLevel"]["needed"], 250);
}

#[test]
fn test_export_then_import_restores_record() {
    let h = Harness::new();
    let tracker = ProgressTracker::new(h.engine.clone());
    h.engine.found_easter_egg("konami").unwrap();

    let export = tracker.export_progress().unwrap();
    assert_eq!(export.file_name, "bootcamp-progress-2026-03-02.json");
    let exported: ProgressRecord = serde_json::from_str(&export.json).unwrap();

    tracker.reset_progress(true).unwrap();
    assert_eq!(h.engine.record().unwrap().total_xp, 0);

    let imported = tracker.import_progress(&export.json).unwrap();
    assert_eq!(imported, exported);
    assert_eq!(h.engine.record().unwrap(), exported);
}

#[test]
fn test_malformed_import_leaves_storage_untouched() {
    let h = Harness::new();
    let tracker = ProgressTracker::new(h.engine.clone());
    h.engine.award_xp(75, "before").unwrap();
    let before = h.backend.get_item(PROGRESS_KEY).unwrap();

    let err = tracker.import_progress("{\"totalXP\": ").unwrap_err();
    assert!(matches!(err, TrackerError::Import(_)));
    assert!(err.to_string().starts_with("Error importing progress"));
    assert_eq!(h.backend.get_item(PROGRESS_KEY).unwrap(), before);
}

#[test]
fn test_reset_requires_confirmation() {
    let h = Harness::new();
    let tracker = ProgressTracker::new(h.engine.clone());
    h.engine.award_xp(300, "kept").unwrap();

    assert!(!tracker.reset_progress(false).unwrap());
    assert_eq!(h.engine.record().unwrap().total_xp, 300);

    assert!(tracker.reset_progress(true).unwrap());
    assert!(h.backend.get_item(PROGRESS_KEY).unwrap().is_none());
    assert_eq!(h.engine.record().unwrap().total_xp, 0);
}

#[test]
fn test_start_date_uses_clock_offset() {
    // 08:30 at +09:00 is still the previous day in UTC.
    let tokyo = FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(2026, 3, 3, 8, 30, 0)
        .unwrap();
    let h = Harness::starting_at(tokyo);
    let tracker = ProgressTracker::new(h.engine.clone());

    assert_eq!(tracker.stats().unwrap().start_date, "2026-03-03");
}

#[test]
fn test_legacy_import_then_lesson_counts_one_active_day() {
    let h = Harness::new();
    let tracker = ProgressTracker::new(h.engine.clone());

    tracker
        .import_progress(
            r#"{"totalXP": 40, "dailyActivity": {"Mon Mar 02 2026": {"date": "Mon Mar 02 2026", "xpEarned": 40, "lessonsCompleted": 0}}}"#,
        )
        .unwrap();
    tracker.complete_current_lesson("week1-day1").unwrap();

    let stats = tracker.stats().unwrap();
    assert_eq!(stats.days_active, 1);
    let bucket = &h.engine.record().unwrap().daily_activity["2026-03-02"];
    assert_eq!(bucket.xp_earned, 40);
    assert_eq!(bucket.lessons_completed, 1);
}
