use serde::{Deserialize, Serialize};

use echostep_core::time::DEFAULT_MAX_FRAME_DT;

use crate::frozen_clone::CloneConfig;
use crate::physics::{PlayerPhysicsConfig, TILE_SIZE};

/// Env var naming the TOML config file.
pub const CONFIG_ENV: &str = "ECHOSTEP_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/echostep.toml";

/// Top-level game configuration, loaded from `config/echostep.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchostepConfig {
    pub physics: PlayerPhysicsConfig,
    pub clone: CloneConfig,
    pub scoring: ScoringConfig,
    pub enemy: EnemyConfig,
    pub level: LevelConfig,
    /// Upper bound on a single simulation step, in seconds.
    pub max_frame_dt: f32,
}

impl Default for EchostepConfig {
    fn default() -> Self {
        Self {
            physics: PlayerPhysicsConfig::default(),
            clone: CloneConfig::default(),
            scoring: ScoringConfig::default(),
            enemy: EnemyConfig::default(),
            level: LevelConfig::default(),
            max_frame_dt: DEFAULT_MAX_FRAME_DT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub coin_value: i32,
    /// Subtracted on every enemy contact. The score may go negative.
    pub enemy_penalty: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            coin_value: 10,
            enemy_penalty: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Knockback speed applied to the player on contact.
    pub bounce_strength: f32,
    pub patrol_speed: f32,
    /// Max distance from the spawn x before turning around.
    pub patrol_range: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            bounce_strength: 450.0,
            patrol_speed: 60.0,
            patrol_range: 64.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub tile_size: f32,
    /// Pause between completing a level and loading the next one.
    pub transition_delay: f32,
    /// Suspension after any level load before simulation resumes.
    pub settle_delay: f32,
    /// Distance below the lowest platform at which the player is reset.
    pub kill_plane_margin: f32,
    pub enforce_one_way_platforms: bool,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            transition_delay: 1.0,
            settle_delay: 0.25,
            kill_plane_margin: 400.0,
            enforce_one_way_platforms: false,
        }
    }
}

impl EchostepConfig {
    /// Load from the file named by `ECHOSTEP_CONFIG` (or the default path),
    /// falling back to defaults if it is missing or unparseable.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let config = match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<EchostepConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!(path = %path, "Loaded configuration");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse {path}: {e}, using defaults");
                    EchostepConfig::default()
                },
            },
            Err(_) => {
                tracing::debug!(path = %path, "No config file found, using defaults");
                EchostepConfig::default()
            },
        };
        config.validated()
    }

    /// Replace out-of-range values with their defaults, logging each one.
    pub fn validated(mut self) -> Self {
        let defaults = EchostepConfig::default();
        if !(self.max_frame_dt.is_finite() && self.max_frame_dt > 0.0) {
            tracing::warn!(
                value = self.max_frame_dt,
                "max_frame_dt must be > 0, using default"
            );
            self.max_frame_dt = defaults.max_frame_dt;
        }
        if !(self.level.tile_size.is_finite() && self.level.tile_size > 0.0) {
            tracing::warn!(
                value = self.level.tile_size,
                "level.tile_size must be > 0, using default"
            );
            self.level.tile_size = defaults.level.tile_size;
        }
        if self.level.settle_delay < 0.0 {
            tracing::warn!("level.settle_delay must be >= 0, using default");
            self.level.settle_delay = defaults.level.settle_delay;
        }
        if self.level.transition_delay < 0.0 {
            tracing::warn!("level.transition_delay must be >= 0, using default");
            self.level.transition_delay = defaults.level.transition_delay;
        }
        if !(self.physics.friction >= 0.0 && self.physics.friction <= 1.0) {
            tracing::warn!(
                value = self.physics.friction,
                "physics.friction must be within [0, 1], using default"
            );
            self.physics.friction = defaults.physics.friction;
        }
        if self.clone.first_blink_speed <= 0.0 {
            tracing::warn!("clone.first_blink_speed must be > 0, using default");
            self.clone.first_blink_speed = defaults.clone.first_blink_speed;
        }
        self
    }
}
