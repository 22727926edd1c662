//! Broad-phase collision engine with publish/subscribe notification.
//!
//! Every tick, [`CollisionEngine::check_collisions`] tests each unordered
//! pair of registered entities for AABB overlap and hands every overlapping
//! pair to the subscribers of either member. Nothing is cached between
//! ticks: a pair that stays overlapped is reported again on every call.
//!
//! The engine never stores entity data. It asks a [`CollisionWorld`] for the
//! current box of each registered id, so callbacks that move an entity
//! affect the pairs tested after them within the same sweep.

use crate::entity::{Entity, EntityId};
use crate::geometry::Rect;

/// Source of current collision boxes, keyed by entity id.
pub trait CollisionWorld {
    /// `None` when the entity is gone or its bounds are disabled.
    fn collision_box(&self, id: EntityId) -> Option<Rect>;
}

/// Called with `(world, subscribed_entity, other_entity)`.
pub type CollisionCallback<W> = Box<dyn FnMut(&mut W, EntityId, EntityId)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionError {
    /// The entity carries no `Bounds` and cannot take part in collisions.
    MissingBounds(EntityId),
}

impl std::fmt::Display for CollisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingBounds(id) => {
                write!(f, "entity {id} has no bounds and cannot be registered")
            },
        }
    }
}

impl std::error::Error for CollisionError {}

struct Subscription<W> {
    id: SubscriptionId,
    entity: EntityId,
    callback: CollisionCallback<W>,
}

pub struct CollisionEngine<W> {
    entities: Vec<EntityId>,
    subscriptions: Vec<Subscription<W>>,
    next_subscription: u64,
}

impl<W> std::fmt::Debug for CollisionEngine<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionEngine")
            .field("entities", &self.entities)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl<W> Default for CollisionEngine<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> CollisionEngine<W> {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            subscriptions: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Add an entity to the broad phase.
    ///
    /// Entities without bounds are rejected with a warning and left out of
    /// collision checks. Registering an id twice is a no-op.
    pub fn register<E: Entity + ?Sized>(&mut self, entity: &E) -> Result<(), CollisionError> {
        let id = entity.id();
        if entity.bounds().is_none() {
            tracing::warn!(entity = id, "Rejected collision registration without bounds");
            return Err(CollisionError::MissingBounds(id));
        }
        if !self.entities.contains(&id) {
            self.entities.push(id);
        }
        Ok(())
    }

    /// Returns whether the entity was registered.
    pub fn unregister(&mut self, id: EntityId) -> bool {
        let before = self.entities.len();
        self.entities.retain(|&e| e != id);
        self.entities.len() != before
    }

    pub fn is_registered(&self, id: EntityId) -> bool {
        self.entities.contains(&id)
    }

    /// Registered ids in registration order.
    pub fn registered(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn subscribe<F>(&mut self, entity: EntityId, callback: F) -> SubscriptionId
    where
        F: FnMut(&mut W, EntityId, EntityId) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.push(Subscription {
            id,
            entity,
            callback: Box::new(callback),
        });
        id
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != subscription);
        self.subscriptions.len() != before
    }

    /// Drop every subscription for `entity`. Returns how many were removed.
    pub fn unsubscribe_entity(&mut self, entity: EntityId) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.entity != entity);
        before - self.subscriptions.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Wipe all registrations and subscriptions.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.subscriptions.clear();
    }

    /// Run one broad-phase sweep, notifying subscribers of every overlapping
    /// pair. Returns the number of overlapping pairs found.
    pub fn check_collisions(&mut self, world: &mut W) -> usize
    where
        W: CollisionWorld,
    {
        let entities = &self.entities;
        let subscriptions = &mut self.subscriptions;
        let mut pairs = 0;

        for i in 0..entities.len() {
            for j in (i + 1)..entities.len() {
                let (a, b) = (entities[i], entities[j]);
                let (Some(box_a), Some(box_b)) = (world.collision_box(a), world.collision_box(b))
                else {
                    continue;
                };
                if !box_a.intersects(&box_b) {
                    continue;
                }
                pairs += 1;
                for sub in subscriptions.iter_mut() {
                    if sub.entity == a {
                        (sub.callback)(world, a, b);
                    } else if sub.entity == b {
                        (sub.callback)(world, b, a);
                    }
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::entity::EntityBase;

    #[derive(Default)]
    struct Boxes {
        boxes: HashMap<EntityId, Rect>,
        log: Vec<(EntityId, EntityId)>,
    }

    impl CollisionWorld for Boxes {
        fn collision_box(&self, id: EntityId) -> Option<Rect> {
            self.boxes.get(&id).copied()
        }
    }

    struct Block(EntityBase);

    impl Entity for Block {
        fn base(&self) -> &EntityBase {
            &self.0
        }

        fn base_mut(&mut self) -> &mut EntityBase {
            &mut self.0
        }
    }

    fn block(id: EntityId, x: f32, y: f32, w: f32, h: f32) -> Block {
        Block(EntityBase::new(id, x, y, w, h))
    }

    fn setup(blocks: &[Block]) -> (CollisionEngine<Boxes>, Boxes) {
        let mut engine = CollisionEngine::new();
        let mut world = Boxes::default();
        for b in blocks {
            engine.register(b).unwrap();
            world
                .boxes
                .insert(b.id(), b.collision_box().unwrap());
        }
        (engine, world)
    }

    fn logging(world: &mut Boxes, me: EntityId, other: EntityId) {
        world.log.push((me, other));
    }

    #[test]
    fn subscriber_receives_counterpart() {
        let (mut engine, mut world) = setup(&[
            block(1, 0.0, 0.0, 10.0, 10.0),
            block(2, 5.0, 5.0, 10.0, 10.0),
        ]);
        engine.subscribe(1, logging);
        assert_eq!(engine.check_collisions(&mut world), 1);
        assert_eq!(world.log, vec![(1, 2)]);
    }

    #[test]
    fn both_subscribers_fire_in_same_sweep() {
        let (mut engine, mut world) = setup(&[
            block(1, 0.0, 0.0, 10.0, 10.0),
            block(2, 5.0, 5.0, 10.0, 10.0),
        ]);
        engine.subscribe(1, logging);
        engine.subscribe(2, logging);
        engine.check_collisions(&mut world);
        assert_eq!(world.log, vec![(1, 2), (2, 1)]);
    }

    #[test]
    fn multiple_subscriptions_for_one_entity_all_fire() {
        let (mut engine, mut world) = setup(&[
            block(1, 0.0, 0.0, 10.0, 10.0),
            block(2, 5.0, 5.0, 10.0, 10.0),
        ]);
        engine.subscribe(1, logging);
        engine.subscribe(1, logging);
        engine.check_collisions(&mut world);
        assert_eq!(world.log, vec![(1, 2), (1, 2)]);
    }

    #[test]
    fn touching_edges_are_not_reported() {
        let (mut engine, mut world) = setup(&[
            block(1, 0.0, 0.0, 10.0, 10.0),
            block(2, 10.0, 0.0, 10.0, 10.0),
        ]);
        engine.subscribe(1, logging);
        assert_eq!(engine.check_collisions(&mut world), 0);
        assert!(world.log.is_empty());
    }

    #[test]
    fn continuous_overlap_fires_every_sweep() {
        let (mut engine, mut world) = setup(&[
            block(1, 0.0, 0.0, 10.0, 10.0),
            block(2, 5.0, 5.0, 10.0, 10.0),
        ]);
        engine.subscribe(1, logging);
        for _ in 0..3 {
            engine.check_collisions(&mut world);
        }
        assert_eq!(world.log.len(), 3);
    }

    #[test]
    fn entity_without_bounds_is_rejected() {
        let mut engine: CollisionEngine<Boxes> = CollisionEngine::new();
        let marker = Block(EntityBase::marker(9, 0.0, 0.0));
        assert_eq!(
            engine.register(&marker),
            Err(CollisionError::MissingBounds(9))
        );
        assert!(!engine.is_registered(9));
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let mut engine: CollisionEngine<Boxes> = CollisionEngine::new();
        let b = block(1, 0.0, 0.0, 1.0, 1.0);
        engine.register(&b).unwrap();
        engine.register(&b).unwrap();
        assert_eq!(engine.registered(), &[1]);
    }

    #[test]
    fn unregistered_entity_stops_colliding() {
        let (mut engine, mut world) = setup(&[
            block(1, 0.0, 0.0, 10.0, 10.0),
            block(2, 5.0, 5.0, 10.0, 10.0),
        ]);
        engine.subscribe(1, logging);
        assert!(engine.unregister(2));
        assert!(!engine.unregister(2));
        engine.check_collisions(&mut world);
        assert!(world.log.is_empty());
    }

    #[test]
    fn missing_box_skips_pair() {
        let (mut engine, mut world) = setup(&[
            block(1, 0.0, 0.0, 10.0, 10.0),
            block(2, 5.0, 5.0, 10.0, 10.0),
        ]);
        engine.subscribe(1, logging);
        world.boxes.remove(&2);
        assert_eq!(engine.check_collisions(&mut world), 0);
    }

    #[test]
    fn unsubscribe_by_handle_and_entity() {
        let (mut engine, mut world) = setup(&[
            block(1, 0.0, 0.0, 10.0, 10.0),
            block(2, 5.0, 5.0, 10.0, 10.0),
        ]);
        let first = engine.subscribe(1, logging);
        engine.subscribe(2, logging);
        engine.subscribe(2, logging);
        assert!(engine.unsubscribe(first));
        assert!(!engine.unsubscribe(first));
        assert_eq!(engine.unsubscribe_entity(2), 2);
        engine.check_collisions(&mut world);
        assert!(world.log.is_empty());
        assert_eq!(engine.subscription_count(), 0);
    }

    #[test]
    fn callback_moves_affect_later_pairs() {
        // Entity 1 overlaps 2 and 3; resolving against 2 pushes it clear of 3.
        let (mut engine, mut world) = setup(&[
            block(1, 0.0, 0.0, 10.0, 10.0),
            block(2, 8.0, 0.0, 10.0, 10.0),
            block(3, 5.0, 0.0, 4.0, 10.0),
        ]);
        engine.subscribe(1, |world: &mut Boxes, me, other| {
            world.log.push((me, other));
            if other == 2
                && let Some(rect) = world.boxes.get_mut(&me)
            {
                rect.x = -20.0;
            }
        });
        engine.check_collisions(&mut world);
        assert_eq!(world.log, vec![(1, 2)]);
    }

    #[test]
    fn clear_wipes_everything() {
        let (mut engine, mut world) = setup(&[
            block(1, 0.0, 0.0, 10.0, 10.0),
            block(2, 5.0, 5.0, 10.0, 10.0),
        ]);
        engine.subscribe(1, logging);
        engine.clear();
        assert!(engine.registered().is_empty());
        assert_eq!(engine.subscription_count(), 0);
        assert_eq!(engine.check_collisions(&mut world), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn notifications_are_symmetric(
                rects in proptest::collection::vec(
                    (0.0f32..100.0, 0.0f32..100.0, 1.0f32..40.0, 1.0f32..40.0),
                    2..8,
                )
            ) {
                let blocks: Vec<Block> = rects
                    .iter()
                    .enumerate()
                    .map(|(i, &(x, y, w, h))| block(i as EntityId, x, y, w, h))
                    .collect();
                let (mut engine, mut world) = setup(&blocks);
                for b in &blocks {
                    engine.subscribe(b.id(), logging);
                }
                let pairs = engine.check_collisions(&mut world);

                prop_assert_eq!(world.log.len(), pairs * 2);
                for &(me, other) in &world.log {
                    prop_assert_ne!(me, other);
                    prop_assert!(world.log.contains(&(other, me)));
                }
            }
        }
    }
}
