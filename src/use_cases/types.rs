// Use-case level inputs/outputs for bots and game sessions.

use std::fmt;
use std::str::FromStr;

use crate::domain::{NodeId, Outcome};

pub type BotId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameModeKind {
    TargetPractice,
    Whackamole,
    SearchAndDestroy,
    ZombieHorde,
}

impl GameModeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GameModeKind::TargetPractice => "target_practice",
            GameModeKind::Whackamole => "whackamole",
            GameModeKind::SearchAndDestroy => "search_and_destroy",
            GameModeKind::ZombieHorde => "zombie_horde",
        }
    }
}

impl fmt::Display for GameModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameModeKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "target_practice" => Ok(GameModeKind::TargetPractice),
            "whackamole" => Ok(GameModeKind::Whackamole),
            "search_and_destroy" => Ok(GameModeKind::SearchAndDestroy),
            "zombie_horde" => Ok(GameModeKind::ZombieHorde),
            other => Err(format!("unknown game mode: {other}")),
        }
    }
}

// Sent by a bot to its session once, after its terminal animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotEvent {
    pub bot_id: BotId,
    pub outcome: Outcome,
}

// What a mode policy learns about a bot that just left the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishedBot {
    pub bot_id: BotId,
    pub spawn_waypoint: NodeId,
    pub waypoint: NodeId,
}

// Broadcast to whoever drives the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started { mode: GameModeKind },
    BotSpawned { bot_id: BotId, waypoint: NodeId },
    BotDied { bot_id: BotId },
    BotMissed { bot_id: BotId },
    BotReachedTarget { bot_id: BotId },
    TargetHp { hp: i32 },
    Won,
    Stopped,
}
