use serde::{Deserialize, Serialize};

use echostep_core::animation::{AnimationSignal, Animator};
use echostep_core::entity::{Entity, EntityBase, EntityId};
use echostep_core::geometry::Bounds;

/// Delay before a fresh clone becomes solid, so the player is not
/// ejected from the clone they just left behind.
pub const GRACE_PERIOD: f32 = 0.35;
/// Solid time before the clone starts blinking out.
pub const CLONE_LIFETIME: f32 = 4.0;
pub const BLINK_COUNT: u8 = 3;
/// Seconds per blink frame in the first blink stage.
pub const FIRST_BLINK_SPEED: f32 = 0.25;
/// Each blink stage runs this much faster than the last.
pub const BLINK_SPEED_FACTOR: f32 = 0.6;
pub const PLACE_COOLDOWN: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneConfig {
    pub grace_period: f32,
    pub lifetime: f32,
    pub blink_count: u8,
    pub first_blink_speed: f32,
    pub blink_speed_factor: f32,
    pub place_cooldown: f32,
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            grace_period: GRACE_PERIOD,
            lifetime: CLONE_LIFETIME,
            blink_count: BLINK_COUNT,
            first_blink_speed: FIRST_BLINK_SPEED,
            blink_speed_factor: BLINK_SPEED_FACTOR,
            place_cooldown: PLACE_COOLDOWN,
        }
    }
}

impl CloneConfig {
    /// Frame speed for a 1-based blink stage.
    pub fn blink_speed(&self, stage: u8) -> f32 {
        let exponent = i32::from(stage.saturating_sub(1));
        self.first_blink_speed * self.blink_speed_factor.powi(exponent)
    }
}

/// Lifecycle of a placed clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloneStage {
    /// Placed but not yet solid.
    Arming,
    Active,
    /// Blinking out; 1-based stage number.
    Blinking(u8),
    Destroyed,
}

/// What the owner must react to after a clone update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneSignal {
    Blink(u8),
    /// Last blink stage finished; the owner should destroy the clone.
    Expired,
}

/// Snapshot of the player left behind as a temporary platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrozenClone {
    base: EntityBase,
    pub stage: CloneStage,
    pub remaining_lifetime: f32,
    pub visible: bool,
    config: CloneConfig,
    animator: Animator<()>,
}

impl FrozenClone {
    /// Spawned with bounds disabled; [`FrozenClone::activate`] makes it solid.
    pub fn new(
        id: EntityId,
        x: f32,
        y: f32,
        size: (f32, f32),
        bounds: Bounds,
        config: &CloneConfig,
    ) -> Self {
        let mut base = EntityBase::new(id, x, y, size.0, size.1).with_bounds(bounds);
        base.bounds_enabled = false;
        Self {
            base,
            stage: CloneStage::Arming,
            remaining_lifetime: config.lifetime,
            visible: true,
            config: config.clone(),
            animator: Animator::still(),
        }
    }

    pub fn is_solid(&self) -> bool {
        self.base.bounds_enabled
    }

    pub fn is_destroyed(&self) -> bool {
        self.stage == CloneStage::Destroyed
    }

    /// Grace period over: enable bounds. Returns false if the clone was
    /// already solid or has been destroyed.
    pub fn activate(&mut self) -> bool {
        if self.is_destroyed() || self.base.bounds_enabled {
            return false;
        }
        self.base.bounds_enabled = true;
        if self.stage == CloneStage::Arming {
            self.stage = CloneStage::Active;
        }
        true
    }

    pub fn update(&mut self, dt: f32) -> Option<CloneSignal> {
        match self.stage {
            CloneStage::Arming | CloneStage::Active => {
                self.remaining_lifetime -= dt;
                if self.remaining_lifetime > 0.0 {
                    return None;
                }
                if self.config.blink_count == 0 {
                    return Some(CloneSignal::Expired);
                }
                self.enter_blink(1);
                Some(CloneSignal::Blink(1))
            },
            CloneStage::Blinking(stage) => {
                let signal = self.animator.update(dt);
                self.visible = self.animator.frame() == 0;
                match signal {
                    Some(AnimationSignal::Looped) if stage >= self.config.blink_count => {
                        Some(CloneSignal::Expired)
                    },
                    Some(AnimationSignal::Looped) => {
                        self.enter_blink(stage + 1);
                        Some(CloneSignal::Blink(stage + 1))
                    },
                    _ => None,
                }
            },
            CloneStage::Destroyed => None,
        }
    }

    /// Idempotent: only the first call returns true.
    pub fn mark_destroyed(&mut self) -> bool {
        if self.is_destroyed() {
            return false;
        }
        self.stage = CloneStage::Destroyed;
        self.base.bounds_enabled = false;
        self.visible = false;
        true
    }

    fn enter_blink(&mut self, stage: u8) {
        self.stage = CloneStage::Blinking(stage);
        self.animator.restart_idle(2, self.config.blink_speed(stage));
        self.visible = true;
    }
}

impl Entity for FrozenClone {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn animation_frame(&self) -> u32 {
        self.animator.frame()
    }
}
