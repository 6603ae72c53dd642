// Gameplay tuning knobs (not runtime/server constants). Every field has a default so a
// partial toml file only overrides what it names.

use serde::Deserialize;
use std::time::Duration;

use crate::domain::graph::WayPointConfig;

pub const DEFAULT_BOT_HP: i32 = 200;
pub const DEFAULT_BOT_MODEL: &str = "artifact:2133418241777730301";
pub const SEARCH_AND_DESTROY_MODEL: &str = "artifact:2135579602205016539";
pub const ZOMBIE_MODEL: &str = "artifact:2135579602599281117";
pub const EDGE_MODEL: &str = "artifact:2133046878856544441";

// Negative and NaN read as zero; values past what a Duration holds saturate.
fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(Duration::MAX)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotTuning {
    // Movement speed in meters per second.
    pub speed: f32,
    pub spawn_animation_secs: f32,
    pub death_animation_secs: f32,
    pub missed_animation_secs: f32,
}

impl Default for BotTuning {
    fn default() -> Self {
        Self {
            speed: 1.0,
            spawn_animation_secs: 1.0,
            death_animation_secs: 1.0,
            missed_animation_secs: 1.0,
        }
    }
}

impl BotTuning {
    pub fn spawn_animation(&self) -> Duration {
        secs(self.spawn_animation_secs)
    }

    pub fn death_animation(&self) -> Duration {
        secs(self.death_animation_secs)
    }

    pub fn missed_animation(&self) -> Duration {
        secs(self.missed_animation_secs)
    }

    /// Travel time for a hop; a non-positive speed makes the hop instant.
    pub fn hop_duration(&self, distance: f32) -> Duration {
        if self.speed <= 0.0 {
            return Duration::ZERO;
        }
        secs(distance / self.speed)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetPracticeTuning {
    pub respawn: bool,
    pub respawn_delay_secs: f32,
    pub hp: i32,
    pub model: String,
}

impl Default for TargetPracticeTuning {
    fn default() -> Self {
        Self {
            respawn: false,
            respawn_delay_secs: 3.0,
            hp: DEFAULT_BOT_HP,
            model: DEFAULT_BOT_MODEL.to_string(),
        }
    }
}

impl TargetPracticeTuning {
    pub fn respawn_delay(&self) -> Duration {
        secs(self.respawn_delay_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WhackamoleTuning {
    pub moving: bool,
    pub spawn_interval_secs: f32,
    // Zero disables expiry.
    pub ttl_secs: f32,
    pub hp: i32,
    pub model: String,
}

impl Default for WhackamoleTuning {
    fn default() -> Self {
        Self {
            moving: false,
            spawn_interval_secs: 3.0,
            ttl_secs: 5.0,
            hp: DEFAULT_BOT_HP,
            model: DEFAULT_BOT_MODEL.to_string(),
        }
    }
}

impl WhackamoleTuning {
    pub fn spawn_interval(&self) -> Duration {
        secs(self.spawn_interval_secs)
    }

    pub fn ttl(&self) -> Duration {
        secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchAndDestroyTuning {
    pub hp: i32,
    pub model: String,
}

impl Default for SearchAndDestroyTuning {
    fn default() -> Self {
        Self {
            hp: DEFAULT_BOT_HP,
            model: SEARCH_AND_DESTROY_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetTuning {
    pub resource_id: String,
    pub position: [f32; 3],
    pub hp: i32,
    // Target hp lost for each bot that reaches it.
    pub damage_per_bot: i32,
}

impl Default for TargetTuning {
    fn default() -> Self {
        Self {
            resource_id: DEFAULT_BOT_MODEL.to_string(),
            position: [0.0, 0.0, 0.0],
            hp: DEFAULT_BOT_HP,
            damage_per_bot: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ZombieHordeTuning {
    pub spawn_interval_secs: f32,
    pub hp: i32,
    pub model: String,
    pub target: TargetTuning,
}

impl Default for ZombieHordeTuning {
    fn default() -> Self {
        Self {
            spawn_interval_secs: 3.0,
            hp: DEFAULT_BOT_HP,
            model: ZOMBIE_MODEL.to_string(),
            target: TargetTuning::default(),
        }
    }
}

impl ZombieHordeTuning {
    pub fn spawn_interval(&self) -> Duration {
        secs(self.spawn_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphTuning {
    pub waypoint: WayPointConfig,
    pub edge_resource_id: String,
    // Reference length of the edge prop.
    pub edge_length: f32,
}

impl Default for GraphTuning {
    fn default() -> Self {
        Self {
            waypoint: WayPointConfig::default(),
            edge_resource_id: EDGE_MODEL.to_string(),
            edge_length: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessTuning {
    pub moderator_roles: Vec<String>,
}

impl Default for AccessTuning {
    fn default() -> Self {
        Self {
            moderator_roles: vec!["moderator".to_string()],
        }
    }
}

/// Every tuning section of the range, as read from the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RangeTuning {
    pub bot: BotTuning,
    pub target_practice: TargetPracticeTuning,
    pub whackamole: WhackamoleTuning,
    pub search_and_destroy: SearchAndDestroyTuning,
    pub zombie_horde: ZombieHordeTuning,
    pub graph: GraphTuning,
    pub access: AccessTuning,
}
