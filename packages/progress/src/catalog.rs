use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const STREAK_KEEPER: &str = "streak-keeper";
pub const EARLY_BIRD: &str = "early-bird";
pub const NIGHT_OWL: &str = "night-owl";
pub const EXPLORER: &str = "explorer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub xp: i64,
}

impl AchievementDefinition {
    fn new(id: &str, name: &str, description: &str, icon: &str, xp: i64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            xp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub level: u32,
    pub xp: i64,
    pub title: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level table is empty")]
    EmptyLevels,
    #[error("level {level} has number out of sequence, expected {expected}")]
    LevelSequence { level: u32, expected: u32 },
    #[error("level {level} threshold {xp} does not exceed the previous threshold")]
    ThresholdOrder { level: u32, xp: i64 },
    #[error("duplicate achievement id: {0}")]
    DuplicateAchievement(String),
}

/// Level thresholds, ascending and strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LevelTable {
    levels: Vec<LevelDefinition>,
}

impl LevelTable {
    pub fn new(levels: Vec<LevelDefinition>) -> Result<Self, CatalogError> {
        if levels.is_empty() {
            return Err(CatalogError::EmptyLevels);
        }

        for (idx, def) in levels.iter().enumerate() {
            let expected = idx as u32 + 1;
            if def.level != expected {
                return Err(CatalogError::LevelSequence {
                    level: def.level,
                    expected,
                });
            }
            if idx > 0 && def.xp <= levels[idx - 1].xp {
                return Err(CatalogError::ThresholdOrder {
                    level: def.level,
                    xp: def.xp,
                });
            }
        }

        Ok(Self { levels })
    }

    pub fn builtin() -> Self {
        let levels = [
            (1, 0, "Curious Beginner"),
            (2, 150, "Prompt Apprentice"),
            (3, 400, "Code Whisperer"),
            (4, 750, "Tool Wielder"),
            (5, 1200, "Vibe Coder"),
            (6, 1800, "Application Architect"),
            (7, 2500, "AI Native"),
            (8, 3500, "Shipping Legend"),
        ]
        .into_iter()
        .map(|(level, xp, title)| LevelDefinition {
            level,
            xp,
            title: title.to_string(),
        })
        .collect();

        Self { levels }
    }

    /// Highest level whose threshold is at or below `xp`; level 1 when `xp`
    /// sits below every threshold.
    pub fn level_for(&self, xp: i64) -> &LevelDefinition {
        self.levels
            .iter()
            .take_while(|def| xp >= def.xp)
            .last()
            .unwrap_or(&self.levels[0])
    }

    pub fn get(&self, level: u32) -> Option<&LevelDefinition> {
        self.levels.iter().find(|def| def.level == level)
    }

    pub fn max_level(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelDefinition> {
        self.levels.iter()
    }
}

impl<'de> Deserialize<'de> for LevelTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let levels = Vec::<LevelDefinition>::deserialize(deserializer)?;
        LevelTable::new(levels).map_err(serde::de::Error::custom)
    }
}

/// Achievement and level tables, loaded once and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    achievements: Vec<AchievementDefinition>,
    levels: LevelTable,
}

impl Catalog {
    pub fn new(
        achievements: Vec<AchievementDefinition>,
        levels: LevelTable,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for def in &achievements {
            if !seen.insert(def.id.as_str()) {
                return Err(CatalogError::DuplicateAchievement(def.id.clone()));
            }
        }
        Ok(Self {
            achievements,
            levels,
        })
    }

    pub fn builtin() -> Self {
        let achievements = vec![
            AchievementDefinition::new("first-steps", "First Steps", "Complete Day 1", "🎯", 50),
            AchievementDefinition::new("week-warrior", "Week Warrior", "Complete Week 1", "⚔️", 200),
            AchievementDefinition::new("halfway-hero", "Halfway Hero", "Complete Week 2", "🦸", 300),
            AchievementDefinition::new("final-stretch", "Final Stretch", "Complete Week 3", "🏃", 400),
            AchievementDefinition::new("graduate", "Graduate", "Complete the bootcamp", "🎓", 500),
            AchievementDefinition::new(
                "matrix-escapee",
                "Matrix Escapee",
                "Complete Terminal Velocity",
                "🔓",
                150,
            ),
            AchievementDefinition::new(
                "escape-artist",
                "Escape Artist",
                "Complete all Prompt Escape Rooms",
                "🗝️",
                200,
            ),
            AchievementDefinition::new(
                "battle-champion",
                "Battle Champion",
                "Win 10 Prompt Battles",
                "⚡",
                100,
            ),
            AchievementDefinition::new(
                "speed-demon",
                "Speed Demon",
                "Complete any Build Race under target time",
                "🚀",
                150,
            ),
            AchievementDefinition::new(
                "bug-hunter",
                "Bug Hunter",
                "Complete all Error Quest challenges",
                "🐛",
                200,
            ),
            AchievementDefinition::new("olympian", "Olympian", "Complete AI Tool Olympics", "🏅", 100),
            AchievementDefinition::new(
                "master-planner",
                "Master Planner",
                "Complete The Architect's Blueprint",
                "📐",
                150,
            ),
            AchievementDefinition::new("code-reader", "Code Reader", "Complete Copy Pasta Chef", "📖", 100),
            AchievementDefinition::new(STREAK_KEEPER, "Streak Keeper", "7-day learning streak", "🔥", 100),
            AchievementDefinition::new(
                EARLY_BIRD,
                "Early Bird",
                "Complete a lesson before 8 AM",
                "🌅",
                50,
            ),
            AchievementDefinition::new(
                NIGHT_OWL,
                "Night Owl",
                "Complete a lesson after 10 PM",
                "🦉",
                50,
            ),
            AchievementDefinition::new(
                "perfectionist",
                "Perfectionist",
                "Score 100% on any game",
                "💯",
                100,
            ),
            AchievementDefinition::new(
                "speedrunner",
                "Speedrunner",
                "Complete bootcamp in under 3 weeks",
                "⏱️",
                300,
            ),
            AchievementDefinition::new(EXPLORER, "Explorer", "Find 3 easter eggs", "🔍", 150),
            AchievementDefinition::new(
                "comeback-kid",
                "Comeback Kid",
                "Resume after 3+ day break",
                "💪",
                75,
            ),
        ];

        Self {
            achievements,
            levels: LevelTable::builtin(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        #[derive(Deserialize)]
        struct RawCatalog {
            achievements: Vec<AchievementDefinition>,
            levels: LevelTable,
        }

        let parsed: RawCatalog = serde_json::from_str(raw)?;
        Self::new(parsed.achievements, parsed.levels)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn achievement(&self, id: &str) -> Option<&AchievementDefinition> {
        self.achievements.iter().find(|def| def.id == id)
    }

    pub fn achievements(&self) -> &[AchievementDefinition] {
        &self.achievements
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
