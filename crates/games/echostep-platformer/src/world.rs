use std::collections::BTreeMap;

use echostep_core::collision::CollisionWorld;
use echostep_core::entity::{Entity, EntityId};
use echostep_core::events::GameEvent;
use echostep_core::geometry::Rect;

use crate::config::EchostepConfig;
use crate::entities::Actor;
use crate::frozen_clone::CloneSignal;
use crate::physics::Player;
use crate::response::{
    bounce_vector, handle_clone_collision, handle_static_collision, push_direction,
};

/// Tunables the contact rules read on every collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactRules {
    pub coin_value: i32,
    pub enemy_penalty: i32,
    pub bounce_strength: f32,
    pub enforce_one_way: bool,
}

impl ContactRules {
    pub fn from_config(config: &EchostepConfig) -> Self {
        Self {
            coin_value: config.scoring.coin_value,
            enemy_penalty: config.scoring.enemy_penalty,
            bounce_strength: config.enemy.bounce_strength,
            enforce_one_way: config.level.enforce_one_way_platforms,
        }
    }
}

/// Everything the collision engine's subscriptions can touch.
#[derive(Debug, Clone)]
pub struct World {
    pub player: Player,
    pub actors: BTreeMap<EntityId, Actor>,
    pub score: i32,
    pub rules: ContactRules,
    events: Vec<GameEvent>,
    /// Ids that must leave the collision engine after the current sweep.
    pending_unregister: Vec<EntityId>,
}

impl CollisionWorld for World {
    fn collision_box(&self, id: EntityId) -> Option<Rect> {
        if id == self.player.id() {
            return self.player.collision_box();
        }
        self.actors.get(&id)?.collision_box()
    }
}

impl World {
    pub fn new(player: Player, rules: ContactRules) -> Self {
        Self {
            player,
            actors: BTreeMap::new(),
            score: 0,
            rules,
            events: Vec::new(),
            pending_unregister: Vec::new(),
        }
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn take_pending_unregister(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.pending_unregister)
    }

    /// Drop every actor, returning their ids so the caller can unregister them.
    pub fn clear_actors(&mut self) -> Vec<EntityId> {
        self.pending_unregister.clear();
        let ids = self.actors.keys().copied().collect();
        self.actors.clear();
        ids
    }

    /// Coins still present, collected or not.
    pub fn coin_count(&self) -> usize {
        self.actors
            .values()
            .filter(|a| matches!(a, Actor::Coin(_)))
            .count()
    }

    /// Subscription target for the player: apply the response rule for
    /// whatever `other` is.
    pub fn on_player_contact(&mut self, _player: EntityId, other: EntityId) {
        let Some(actor) = self.actors.get_mut(&other) else {
            return;
        };
        match actor {
            Actor::Platform(platform) => {
                let Some(platform_box) = platform.collision_box() else {
                    return;
                };
                if self.rules.enforce_one_way
                    && let Some(player_box) = self.player.collision_box()
                    && !platform.should_collide(push_direction(&player_box, &platform_box))
                {
                    return;
                }
                handle_static_collision(&mut self.player, &platform_box);
            },
            Actor::Clone(clone) => {
                if let Some(clone_box) = clone.collision_box() {
                    handle_clone_collision(&mut self.player, &clone_box);
                }
            },
            Actor::Coin(coin) => {
                if coin.collect() {
                    self.score += self.rules.coin_value;
                    self.pending_unregister.push(other);
                    self.events.push(GameEvent::CoinCollected {
                        coin: other,
                        score: self.score,
                    });
                }
            },
            Actor::Enemy(enemy) => {
                let (Some(enemy_box), Some(player_box)) =
                    (enemy.collision_box(), self.player.collision_box())
                else {
                    return;
                };
                self.score -= self.rules.enemy_penalty;
                self.events.push(GameEvent::EnemyHit {
                    enemy: other,
                    score: self.score,
                });
                let bounce = bounce_vector(&player_box, &enemy_box, self.rules.bounce_strength);
                handle_static_collision(&mut self.player, &enemy_box);
                match bounce {
                    Some((bx, by)) => self.player.apply_bounce(bx, by),
                    None => tracing::debug!(enemy = other, "Coincident centres, bounce skipped"),
                }
            },
            Actor::Anchor(_) => {},
        }
    }

    /// Advance every actor's own behaviour: enemy patrols, coin animations,
    /// clone lifecycles.
    pub fn update_actors(&mut self, dt: f32) {
        let mut finished_coins = Vec::new();
        let mut expired_clones = Vec::new();
        for (&id, actor) in &mut self.actors {
            match actor {
                Actor::Enemy(enemy) => enemy.update(dt),
                Actor::Coin(coin) => {
                    if coin.update(dt) {
                        finished_coins.push(id);
                    }
                },
                Actor::Clone(clone) => match clone.update(dt) {
                    Some(CloneSignal::Blink(stage)) => {
                        tracing::debug!(clone = id, stage, "Clone blinking");
                        self.events.push(GameEvent::CloneBlink { clone: id, stage });
                    },
                    Some(CloneSignal::Expired) => expired_clones.push(id),
                    None => {},
                },
                Actor::Platform(_) | Actor::Anchor(_) => {},
            }
        }
        for id in finished_coins {
            self.actors.remove(&id);
        }
        for id in expired_clones {
            self.destroy_clone(id);
        }
    }

    /// Remove a clone from play. Safe to call repeatedly; only the first
    /// call has any effect.
    pub fn destroy_clone(&mut self, id: EntityId) -> bool {
        let Some(Actor::Clone(clone)) = self.actors.get_mut(&id) else {
            return false;
        };
        if !clone.mark_destroyed() {
            return false;
        }
        self.actors.remove(&id);
        self.pending_unregister.push(id);
        self.events.push(GameEvent::CloneDestroyed { clone: id });
        tracing::debug!(clone = id, "Clone destroyed");
        true
    }
}
