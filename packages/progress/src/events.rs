use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::catalog::AchievementDefinition;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ProgressEvent {
    #[serde(rename_all = "camelCase")]
    XpAwarded {
        amount: i64,
        reason: String,
        new_total: i64,
    },

    #[serde(rename_all = "camelCase")]
    LevelUp { new_level: u32, title: String },

    AchievementUnlocked { achievement: AchievementDefinition },

    #[serde(rename_all = "camelCase")]
    GameCompleted { game_id: String, score: i64 },

    #[serde(rename_all = "camelCase")]
    LessonCompleted { lesson_id: String },

    /// The whole record was swapped out by an import.
    #[serde(rename_all = "camelCase")]
    ProgressImported {
        #[serde(rename = "totalXP")]
        total_xp: i64,
    },

    ProgressReset,
}

impl ProgressEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            ProgressEvent::XpAwarded { .. } => "xpAwarded",
            ProgressEvent::LevelUp { .. } => "levelUp",
            ProgressEvent::AchievementUnlocked { .. } => "achievementUnlocked",
            ProgressEvent::GameCompleted { .. } => "gameCompleted",
            ProgressEvent::LessonCompleted { .. } => "lessonCompleted",
            ProgressEvent::ProgressImported { .. } => "progressImported",
            ProgressEvent::ProgressReset => "progressReset",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub id: String,
    pub event: ProgressEvent,
}

impl EventEnvelope {
    pub fn new(event: ProgressEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event,
        }
    }
}

/// Per-engine event fan-out. Publishing never blocks; subscribers that fall
/// more than the channel capacity behind observe a lag on their receiver.
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: ProgressEvent) {
        let envelope = EventEnvelope::new(event);
        let event_type = envelope.event.event_type();
        let event_id = envelope.id.clone();

        match self.sender.send(envelope) {
            Ok(sent_to) => debug!(%event_id, event_type, sent_to, "Event published"),
            Err(_) => debug!(%event_id, event_type, "No subscribers for event"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
