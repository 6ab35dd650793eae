use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Date form written by older browser builds, e.g. `Mon Oct 19 2026`.
const LEGACY_DATE_FORMAT: &str = "%a %b %d %Y";

/// Calendar key used for `daily_activity` buckets.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, LEGACY_DATE_FORMAT))
        .ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub date: String,
    #[serde(default)]
    pub xp_earned: i64,
    #[serde(default)]
    pub lessons_completed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: i64,
    #[serde(rename = "xp", alias = "xpDelta")]
    pub xp_delta: i64,
    #[serde(default)]
    pub reason: String,
}

/// The single persisted progress blob.
///
/// Keys are camelCase so exports stay interchangeable with the JSON the
/// browser build writes. Every field defaults, which lets older blobs that
/// predate a field (`gameScores` for one) load cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressRecord {
    #[serde(rename = "totalXP")]
    pub total_xp: i64,
    pub achievements: Vec<String>,
    pub achievement_unlock_dates: BTreeMap<String, i64>,
    pub games_completed: Vec<String>,
    pub game_scores: BTreeMap<String, i64>,
    pub lessons_completed: Vec<String>,
    #[serde(deserialize_with = "daily_buckets::deserialize")]
    pub daily_activity: BTreeMap<String, DailyActivity>,
    pub current_streak: u32,
    pub longest_streak: u32,
    #[serde(with = "optional_date")]
    pub last_active_date: Option<NaiveDate>,
    pub start_date: i64,
    pub history: Vec<HistoryEntry>,
    pub easter_eggs_found: Vec<String>,
}

impl ProgressRecord {
    pub fn new(start_date: i64) -> Self {
        Self {
            start_date,
            ..Self::default()
        }
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a == id)
    }

    pub fn has_lesson(&self, id: &str) -> bool {
        self.lessons_completed.iter().any(|l| l == id)
    }

    pub fn has_game(&self, id: &str) -> bool {
        self.games_completed.iter().any(|g| g == id)
    }

    pub fn has_easter_egg(&self, id: &str) -> bool {
        self.easter_eggs_found.iter().any(|e| e == id)
    }

    pub fn game_score(&self, id: &str) -> i64 {
        self.game_scores.get(id).copied().unwrap_or(0)
    }
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            total_xp: 0,
            achievements: Vec::new(),
            achievement_unlock_dates: BTreeMap::new(),
            games_completed: Vec::new(),
            game_scores: BTreeMap::new(),
            lessons_completed: Vec::new(),
            daily_activity: BTreeMap::new(),
            current_streak: 0,
            longest_streak: 0,
            last_active_date: None,
            start_date: 0,
            history: Vec::new(),
            easter_eggs_found: Vec::new(),
        }
    }
}

mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{date_key, parse_date};

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date_key(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(raw) => parse_date(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}"))),
        }
    }
}

/// Rekeys buckets to `YYYY-MM-DD`, folding legacy-keyed buckets into the
/// ISO bucket for the same day. Keys that parse as no date are kept.
mod daily_buckets {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer};

    use super::{date_key, parse_date, DailyActivity};

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<BTreeMap<String, DailyActivity>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, DailyActivity>::deserialize(deserializer)?;
        let mut buckets: BTreeMap<String, DailyActivity> = BTreeMap::new();

        for (key, mut bucket) in raw {
            let key = parse_date(&key)
                .or_else(|| parse_date(&bucket.date))
                .map(date_key)
                .unwrap_or(key);
            bucket.date = key.clone();

            buckets
                .entry(key)
                .and_modify(|merged| {
                    merged.xp_earned += bucket.xp_earned;
                    merged.lessons_completed += bucket.lessons_completed;
                })
                .or_insert(bucket);
        }
        Ok(buckets)
    }
}
