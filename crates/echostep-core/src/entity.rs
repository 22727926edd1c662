use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Rect};

/// Stable identity of an entity for the lifetime of a simulation.
pub type EntityId = u64;

/// Position, size and collision participation common to every entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityBase {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// `None` for marker entities that never collide.
    pub bounds: Option<Bounds>,
    /// Toggles collision participation independently of engine registration.
    pub bounds_enabled: bool,
}

impl EntityBase {
    /// An entity whose bounds cover its full size.
    pub fn new(id: EntityId, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            bounds: Some(Bounds::sized(width, height)),
            bounds_enabled: true,
        }
    }

    /// An entity without bounds; the collision engine rejects these.
    pub fn marker(id: EntityId, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            width: 0.0,
            height: 0.0,
            bounds: None,
            bounds_enabled: false,
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// World-space collision box, or `None` when bounds are absent or disabled.
    pub fn collision_box(&self) -> Option<Rect> {
        if !self.bounds_enabled {
            return None;
        }
        self.bounds.map(|b| b.collision_box(self.x, self.y))
    }
}

/// Capability shared by every positioned, animatable, possibly collidable entity.
///
/// The collision engine only ever sees entities through this trait.
pub trait Entity {
    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    fn id(&self) -> EntityId {
        self.base().id
    }

    fn position(&self) -> (f32, f32) {
        let base = self.base();
        (base.x, base.y)
    }

    fn size(&self) -> (f32, f32) {
        let base = self.base();
        (base.width, base.height)
    }

    fn bounds(&self) -> Option<&Bounds> {
        self.base().bounds.as_ref()
    }

    fn collision_box(&self) -> Option<Rect> {
        self.base().collision_box()
    }

    fn animation_frame(&self) -> u32 {
        0
    }
}
