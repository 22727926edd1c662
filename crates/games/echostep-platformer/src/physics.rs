use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use echostep_core::animation::{Animator, LoopAnimation};
use echostep_core::entity::{Entity, EntityBase, EntityId};
use echostep_core::game_trait::Direction;
use echostep_core::geometry::Bounds;

/// Tile size in world pixels.
pub const TILE_SIZE: f32 = 32.0;
/// Player sprite width.
pub const PLAYER_WIDTH: f32 = 32.0;
/// Player sprite height.
pub const PLAYER_HEIGHT: f32 = 40.0;
/// Horizontal speed cap (px/s). Also caps the magnitude of bounce results.
pub const MAX_SPEED: f32 = 300.0;
/// Horizontal acceleration while a direction is held (px/s^2).
pub const ACCELERATION: f32 = 2400.0;
/// Per-tick multiplicative horizontal decay without valid input.
pub const FRICTION: f32 = 0.8;
/// Initial vertical velocity of a jump (negative is up).
pub const JUMP_VELOCITY: f32 = -620.0;
/// Gravity while rising with the jump key held (px/s^2).
pub const JUMP_GRAVITY: f32 = 1100.0;
/// Gravity while falling, or rising after the key is released (px/s^2).
pub const FALL_GRAVITY: f32 = 2400.0;
/// Seconds to blend from jump gravity to fall gravity after release.
pub const GRAVITY_TRANSITION_TIME: f32 = 0.12;
/// Terminal downward velocity (px/s).
pub const MAX_FALL_SPEED: f32 = 900.0;
/// Jump grace period after walking off a ledge (seconds).
pub const COYOTE_TIME: f32 = 0.1;
/// Below this horizontal speed, friction stops the player outright.
const STOP_SPEED: f32 = 1.0;
/// Idle/run cycle frame count.
const PLAYER_FRAMES: u32 = 4;
/// Seconds per idle/run frame.
const PLAYER_FRAME_SPEED: f32 = 0.15;

/// Configurable player physics parameters, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerPhysicsConfig {
    pub width: f32,
    pub height: f32,
    pub bounds_width: f32,
    pub bounds_height: f32,
    pub bounds_offset_x: f32,
    pub bounds_offset_y: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    pub friction: f32,
    pub jump_velocity: f32,
    pub jump_gravity: f32,
    pub fall_gravity: f32,
    pub gravity_transition_time: f32,
    pub max_fall_speed: f32,
    pub coyote_time: f32,
}

impl Default for PlayerPhysicsConfig {
    fn default() -> Self {
        Self {
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            bounds_width: PLAYER_WIDTH - 4.0,
            bounds_height: PLAYER_HEIGHT,
            bounds_offset_x: 2.0,
            bounds_offset_y: 0.0,
            max_speed: MAX_SPEED,
            acceleration: ACCELERATION,
            friction: FRICTION,
            jump_velocity: JUMP_VELOCITY,
            jump_gravity: JUMP_GRAVITY,
            fall_gravity: FALL_GRAVITY,
            gravity_transition_time: GRAVITY_TRANSITION_TIME,
            max_fall_speed: MAX_FALL_SPEED,
            coyote_time: COYOTE_TIME,
        }
    }
}

impl PlayerPhysicsConfig {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(
            self.bounds_width,
            self.bounds_height,
            self.bounds_offset_x,
            self.bounds_offset_y,
        )
    }
}

/// Grounded state and the gravity applied on the last tick.
///
/// `on_ground` is cleared at the start of every player update; only
/// collision resolution sets it again.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Physics {
    pub on_ground: bool,
    pub gravity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Signals produced by one player update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerTick {
    /// A jump started this tick while not already mid-jump.
    pub jump_started: bool,
}

/// The input-driven, dynamic entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    base: EntityBase,
    pub physics: Physics,
    pub velocity: Velocity,
    pub tuning: PlayerPhysicsConfig,
    pub facing: Facing,
    pub is_running: bool,
    pub jump_key_held: bool,
    pub coyote_timer: f32,
    pub mid_jump: bool,
    pub gravity_blend_timer: f32,
    /// Directions held this tick; cleared at the end of every update.
    pub active_directions: BTreeSet<Direction>,
    was_on_ground: bool,
    animator: Animator<()>,
}

impl Player {
    pub fn new(id: EntityId, x: f32, y: f32, tuning: PlayerPhysicsConfig) -> Self {
        let base =
            EntityBase::new(id, x, y, tuning.width, tuning.height).with_bounds(tuning.bounds());
        Self {
            base,
            physics: Physics {
                on_ground: false,
                gravity: tuning.fall_gravity,
            },
            velocity: Velocity::default(),
            tuning,
            facing: Facing::Right,
            is_running: false,
            jump_key_held: false,
            coyote_timer: 0.0,
            mid_jump: false,
            gravity_blend_timer: 0.0,
            active_directions: BTreeSet::new(),
            was_on_ground: false,
            animator: Animator::new(LoopAnimation::new(PLAYER_FRAMES, PLAYER_FRAME_SPEED)),
        }
    }

    /// Put the player back at a spawn point with all motion state cleared.
    pub fn respawn(&mut self, x: f32, y: f32) {
        *self = Self::new(self.base.id, x, y, self.tuning.clone());
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.base.x = x;
        self.base.y = y;
    }

    /// Queue a held direction for the next update.
    pub fn apply_input(&mut self, direction: Direction) {
        self.active_directions.insert(direction);
        if direction == Direction::Up {
            self.jump_key_held = true;
        }
    }

    /// Jump key released: start blending toward fall gravity.
    pub fn release_jump(&mut self) {
        self.jump_key_held = false;
        self.gravity_blend_timer = 0.0;
    }

    pub fn can_jump(&self) -> bool {
        self.physics.on_ground || self.coyote_timer > 0.0
    }

    /// Advance one tick: coyote bookkeeping, grounded reset, horizontal
    /// response, jump, variable gravity, then integrate and round.
    pub fn update(&mut self, dt: f32) -> PlayerTick {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut tick = PlayerTick::default();

        let grounded = self.physics.on_ground;
        if grounded {
            self.coyote_timer = 0.0;
            self.mid_jump = false;
        } else if self.was_on_ground {
            self.coyote_timer = self.tuning.coyote_time;
        } else {
            self.coyote_timer = (self.coyote_timer - dt).max(0.0);
        }

        self.was_on_ground = grounded;
        self.physics.on_ground = false;

        self.apply_horizontal(dt);

        if self.active_directions.contains(&Direction::Up) && (grounded || self.coyote_timer > 0.0)
        {
            tick.jump_started = self.jump();
        }

        self.apply_gravity(dt);

        self.active_directions.clear();
        self.jump_key_held = false;

        self.base.x = (self.base.x + self.velocity.x * dt).round();
        self.base.y = (self.base.y + self.velocity.y * dt).round();

        self.animator.update(dt);
        tick
    }

    fn apply_horizontal(&mut self, dt: f32) {
        let left = self.active_directions.contains(&Direction::Left);
        let right = self.active_directions.contains(&Direction::Right);
        let input = match (left, right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        let unopposed =
            input != 0.0 && (self.velocity.x == 0.0 || self.velocity.x.signum() == input);

        if input != 0.0 {
            self.velocity.x += input * self.tuning.acceleration * dt;
            self.facing = if input < 0.0 {
                Facing::Left
            } else {
                Facing::Right
            };
        }

        let max = self.tuning.max_speed.max(0.0);
        self.velocity.x = self.velocity.x.clamp(-max, max);

        if !unopposed {
            self.velocity.x *= self.tuning.friction.clamp(0.0, 1.0);
            if self.velocity.x.abs() < STOP_SPEED {
                self.velocity.x = 0.0;
            }
        }
        self.is_running = unopposed;
    }

    /// Returns true on the rising edge of a jump.
    fn jump(&mut self) -> bool {
        self.velocity.y = self.tuning.jump_velocity;
        self.physics.on_ground = false;
        // Next tick must not read this tick as grounded and arm coyote time.
        self.was_on_ground = false;
        self.coyote_timer = 0.0;
        self.gravity_blend_timer = 0.0;
        let rising_edge = !self.mid_jump;
        self.mid_jump = true;
        rising_edge
    }

    fn apply_gravity(&mut self, dt: f32) {
        let tuning = &self.tuning;
        let gravity = if self.velocity.y < 0.0 {
            if self.jump_key_held {
                self.gravity_blend_timer = 0.0;
                tuning.jump_gravity
            } else {
                let progress = if tuning.gravity_transition_time > 0.0 {
                    (self.gravity_blend_timer / tuning.gravity_transition_time).min(1.0)
                } else {
                    1.0
                };
                self.gravity_blend_timer += dt;
                tuning.jump_gravity + (tuning.fall_gravity - tuning.jump_gravity) * smoothstep(progress)
            }
        } else {
            tuning.fall_gravity
        };
        self.physics.gravity = gravity;
        self.velocity.y = (self.velocity.y + gravity * dt).min(tuning.max_fall_speed);
    }

    /// Add an impulse, then rescale the resulting speed to at most `max_speed`.
    pub fn apply_bounce(&mut self, impulse_x: f32, impulse_y: f32) {
        self.velocity.x += impulse_x;
        self.velocity.y += impulse_y;
        let speed = self.velocity.x.hypot(self.velocity.y);
        let max = self.tuning.max_speed;
        if speed > max && speed > 0.0 {
            let scale = max / speed;
            self.velocity.x *= scale;
            self.velocity.y *= scale;
        }
    }
}

impl Entity for Player {
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

fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
