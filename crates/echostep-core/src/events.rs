use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Gameplay events emitted by a tick, for hosts that drive audio, UI or logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    JumpStarted,
    CoinCollected { coin: EntityId, score: i32 },
    EnemyHit { enemy: EntityId, score: i32 },
    ClonePlaced { clone: EntityId },
    CloneActivated { clone: EntityId },
    CloneBlink { clone: EntityId, stage: u8 },
    CloneDestroyed { clone: EntityId },
    PlayerFell,
    LevelComplete { level: usize },
    LevelLoaded { level: usize },
}

impl GameEvent {
    /// Short stable name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JumpStarted => "jump_started",
            Self::CoinCollected { .. } => "coin_collected",
            Self::EnemyHit { .. } => "enemy_hit",
            Self::ClonePlaced { .. } => "clone_placed",
            Self::CloneActivated { .. } => "clone_activated",
            Self::CloneBlink { .. } => "clone_blink",
            Self::CloneDestroyed { .. } => "clone_destroyed",
            Self::PlayerFell => "player_fell",
            Self::LevelComplete { .. } => "level_complete",
            Self::LevelLoaded { .. } => "level_loaded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_snake_case() {
        let events = [
            GameEvent::JumpStarted,
            GameEvent::CoinCollected { coin: 1, score: 10 },
            GameEvent::CloneBlink { clone: 2, stage: 1 },
            GameEvent::LevelLoaded { level: 0 },
        ];
        for event in events {
            let name = event.name();
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
