use serde::{Deserialize, Serialize};

use echostep_core::animation::{AnimationSignal, Animator, CustomAnimation, LoopAnimation};
use echostep_core::entity::{Entity, EntityBase, EntityId};
use echostep_core::game_trait::Direction;
use echostep_core::geometry::{Bounds, Rect};

use crate::frozen_clone::FrozenClone;

/// Coin sprite size.
pub const COIN_SIZE: f32 = 32.0;
/// Coin pickup box, centred in the sprite.
const COIN_HITBOX: f32 = 16.0;
/// Spin cycle frame count.
const COIN_SPIN_FRAMES: u32 = 6;
const COIN_SPIN_SPEED: f32 = 0.1;
/// Collect animation occupies the frames after the spin cycle.
const COIN_COLLECT_START: u32 = COIN_SPIN_FRAMES;
const COIN_COLLECT_FRAMES: u32 = 4;
const COIN_COLLECT_SPEED: f32 = 0.05;
/// Enemy sprite size.
pub const ENEMY_SIZE: f32 = 32.0;
const ENEMY_FRAMES: u32 = 2;
const ENEMY_FRAME_SPEED: f32 = 0.2;

/// Tag used to dispatch collision responses and for render snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Platform,
    Coin,
    Enemy,
    FrozenClone,
    Anchor,
}

/// How a platform blocks the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionType {
    #[default]
    Solid,
    OneWayUp,
    OneWayDown,
    OneWayLeft,
    OneWayRight,
    /// Rendered with a coin requirement; resolves as a plain solid.
    Numbered,
}

/// Static level geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    base: EntityBase,
    pub collision_type: CollisionType,
    pub required_coins: Option<u32>,
}

impl Platform {
    pub fn new(id: EntityId, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            base: EntityBase::new(id, x, y, width, height),
            collision_type: CollisionType::Solid,
            required_coins: None,
        }
    }

    pub fn with_collision_type(mut self, collision_type: CollisionType) -> Self {
        self.collision_type = collision_type;
        self
    }

    pub fn with_required_coins(mut self, required_coins: Option<u32>) -> Self {
        self.required_coins = required_coins;
        self
    }

    /// Whether this platform blocks a player that resolution would push out
    /// toward `push`. One-way platforms only block from their open side:
    /// `OneWayUp` only holds up a player landing from above.
    pub fn should_collide(&self, push: Direction) -> bool {
        match self.collision_type {
            CollisionType::Solid | CollisionType::Numbered => true,
            CollisionType::OneWayUp => push == Direction::Up,
            CollisionType::OneWayDown => push == Direction::Down,
            CollisionType::OneWayLeft => push == Direction::Left,
            CollisionType::OneWayRight => push == Direction::Right,
        }
    }
}

impl Entity for Platform {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinAnimation {
    Collected,
}

/// Collectible that spins until touched, then plays its collect animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    base: EntityBase,
    pub collected: bool,
    animator: Animator<CoinAnimation>,
}

impl Coin {
    pub fn new(id: EntityId, x: f32, y: f32) -> Self {
        let inset = (COIN_SIZE - COIN_HITBOX) / 2.0;
        Self {
            base: EntityBase::new(id, x, y, COIN_SIZE, COIN_SIZE)
                .with_bounds(Bounds::new(COIN_HITBOX, COIN_HITBOX, inset, inset)),
            collected: false,
            animator: Animator::new(LoopAnimation::new(COIN_SPIN_FRAMES, COIN_SPIN_SPEED)),
        }
    }

    /// Stop colliding and start the collect animation. Returns false if the
    /// coin was already collected.
    pub fn collect(&mut self) -> bool {
        if self.collected {
            return false;
        }
        self.collected = true;
        self.base.bounds_enabled = false;
        self.animator.play_custom(CustomAnimation::once(
            COIN_COLLECT_START,
            COIN_COLLECT_FRAMES,
            COIN_COLLECT_SPEED,
            CoinAnimation::Collected,
        ));
        true
    }

    /// Returns true once the collect animation has finished.
    pub fn update(&mut self, dt: f32) -> bool {
        matches!(
            self.animator.update(dt),
            Some(AnimationSignal::Completed(CoinAnimation::Collected))
        )
    }
}

impl Entity for Coin {
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

/// Mobile hazard patrolling back and forth around its spawn point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    base: EntityBase,
    pub velocity_x: f32,
    origin_x: f32,
    patrol_range: f32,
    animator: Animator<()>,
}

impl Enemy {
    pub fn new(id: EntityId, x: f32, y: f32, patrol_speed: f32, patrol_range: f32) -> Self {
        Self {
            base: EntityBase::new(id, x, y, ENEMY_SIZE, ENEMY_SIZE),
            velocity_x: patrol_speed,
            origin_x: x,
            patrol_range: patrol_range.max(0.0),
            animator: Animator::new(LoopAnimation::new(ENEMY_FRAMES, ENEMY_FRAME_SPEED)),
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.base.x += self.velocity_x * dt;
        let offset = self.base.x - self.origin_x;
        if offset.abs() > self.patrol_range {
            self.base.x = self.origin_x + self.patrol_range.copysign(offset);
            self.velocity_x = -self.velocity_x;
        }
        self.animator.update(dt);
    }
}

impl Entity for Enemy {
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

/// Non-colliding named marker point (camera hints, exits).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    base: EntityBase,
    pub label: String,
}

impl Anchor {
    pub fn new(id: EntityId, x: f32, y: f32, label: impl Into<String>) -> Self {
        Self {
            base: EntityBase::marker(id, x, y),
            label: label.into(),
        }
    }
}

impl Entity for Anchor {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

/// Every non-player entity a level can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Actor {
    Platform(Platform),
    Coin(Coin),
    Enemy(Enemy),
    Clone(FrozenClone),
    Anchor(Anchor),
}

impl Actor {
    pub fn kind(&self) -> EntityKind {
        match self {
            Actor::Platform(_) => EntityKind::Platform,
            Actor::Coin(_) => EntityKind::Coin,
            Actor::Enemy(_) => EntityKind::Enemy,
            Actor::Clone(_) => EntityKind::FrozenClone,
            Actor::Anchor(_) => EntityKind::Anchor,
        }
    }

    pub fn as_entity(&self) -> &dyn Entity {
        match self {
            Actor::Platform(e) => e,
            Actor::Coin(e) => e,
            Actor::Enemy(e) => e,
            Actor::Clone(e) => e,
            Actor::Anchor(e) => e,
        }
    }

    pub fn as_entity_mut(&mut self) -> &mut dyn Entity {
        match self {
            Actor::Platform(e) => e,
            Actor::Coin(e) => e,
            Actor::Enemy(e) => e,
            Actor::Clone(e) => e,
            Actor::Anchor(e) => e,
        }
    }

    /// Whether a renderer should draw this actor this frame.
    pub fn is_visible(&self) -> bool {
        match self {
            Actor::Clone(clone) => clone.visible,
            Actor::Anchor(_) => false,
            _ => true,
        }
    }
}

impl Entity for Actor {
    fn base(&self) -> &EntityBase {
        self.as_entity().base()
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        self.as_entity_mut().base_mut()
    }

    fn collision_box(&self) -> Option<Rect> {
        self.as_entity().collision_box()
    }

    fn animation_frame(&self) -> u32 {
        self.as_entity().animation_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_and_numbered_always_collide() {
        let solid = Platform::new(1, 0.0, 0.0, 32.0, 32.0);
        let numbered = Platform::new(2, 0.0, 0.0, 32.0, 32.0)
            .with_collision_type(CollisionType::Numbered)
            .with_required_coins(Some(3));
        for push in [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ] {
            assert!(solid.should_collide(push));
            assert!(numbered.should_collide(push));
        }
    }

    #[test]
    fn one_way_up_only_holds_from_above() {
        let p = Platform::new(1, 0.0, 0.0, 32.0, 32.0).with_collision_type(CollisionType::OneWayUp);
        assert!(p.should_collide(Direction::Up));
        assert!(!p.should_collide(Direction::Down));
        assert!(!p.should_collide(Direction::Left));
        assert!(!p.should_collide(Direction::Right));
    }

    #[test]
    fn collision_type_parses_kebab_case() {
        let parsed: CollisionType = serde_json::from_str("\"one-way-left\"").unwrap();
        assert_eq!(parsed, CollisionType::OneWayLeft);
    }

    #[test]
    fn coin_collects_once() {
        let mut coin = Coin::new(5, 0.0, 0.0);
        assert!(coin.collision_box().is_some());
        assert!(coin.collect());
        assert!(!coin.collect());
        assert!(coin.collision_box().is_none());
        assert_eq!(coin.animation_frame(), COIN_COLLECT_START);
    }

    #[test]
    fn coin_collect_animation_finishes_after_its_frames() {
        let mut coin = Coin::new(5, 0.0, 0.0);
        coin.collect();
        let mut ticks = 0;
        while !coin.update(COIN_COLLECT_SPEED) {
            ticks += 1;
            assert!(ticks < 100, "Collect animation never completed");
        }
        assert_eq!(ticks, COIN_COLLECT_FRAMES as usize - 1);
    }

    #[test]
    fn coin_hitbox_is_centred() {
        let coin = Coin::new(5, 100.0, 200.0);
        assert_eq!(
            coin.collision_box(),
            Some(Rect::new(108.0, 208.0, 16.0, 16.0))
        );
    }

    #[test]
    fn enemy_patrol_reverses_at_range() {
        let mut enemy = Enemy::new(3, 100.0, 0.0, 60.0, 30.0);
        for _ in 0..60 {
            enemy.update(1.0 / 60.0);
        }
        assert!(enemy.velocity_x < 0.0, "Enemy should have turned around");
        assert!(enemy.base().x <= 130.0 && enemy.base().x >= 70.0);
    }

    #[test]
    fn anchor_is_invisible_marker() {
        let anchor = Actor::Anchor(Anchor::new(9, 1.0, 2.0, "exit"));
        assert_eq!(anchor.kind(), EntityKind::Anchor);
        assert!(anchor.bounds().is_none());
        assert!(!anchor.is_visible());
    }
}
