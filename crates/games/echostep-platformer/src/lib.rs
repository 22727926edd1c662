pub mod config;
pub mod entities;
pub mod frozen_clone;
pub mod level;
pub mod physics;
pub mod response;
pub mod world;

use serde::{Deserialize, Serialize};

use echostep_core::collision::CollisionEngine;
use echostep_core::entity::{Entity, EntityId};
use echostep_core::events::GameEvent;
use echostep_core::game_trait::{Direction, GameMetadata, SideScroller};
use echostep_core::schedule::Scheduler;
use echostep_core::side_scroller_boilerplate;
use echostep_core::time::FrameClock;

use config::EchostepConfig;
use entities::{Actor, Anchor, Coin, Enemy, EntityKind, Platform};
use frozen_clone::FrozenClone;
use level::LevelSet;
use physics::{Facing, Player};
use world::{ContactRules, World};

/// The player is always the first entity of every level.
pub const PLAYER_ID: EntityId = 0;

/// Per-entity render data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub frame: u32,
    pub on_ground: bool,
    pub facing: Facing,
    pub visible: bool,
}

impl EntitySnapshot {
    fn of<E: Entity + ?Sized>(entity: &E, kind: EntityKind) -> Self {
        let (x, y) = entity.position();
        let (width, height) = entity.size();
        Self {
            id: entity.id(),
            kind,
            x,
            y,
            width,
            height,
            frame: entity.animation_frame(),
            on_ground: false,
            facing: Facing::Right,
            visible: true,
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    /// Player first, then every other entity in id order.
    pub entities: Vec<EntitySnapshot>,
    pub score: i32,
    pub place_cooldown_remaining: f32,
    pub is_running: bool,
    pub current_level: usize,
}

/// Deferred work run on simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    ActivateClone(EntityId),
    AdvanceLevel,
    Resume,
}

/// Owns the player, the level's entities and the collision engine, and
/// sequences one simulation tick.
pub struct GameModel {
    config: EchostepConfig,
    levels: LevelSet,
    clock: FrameClock,
    world: World,
    engine: CollisionEngine<World>,
    tasks: Scheduler<Task>,
    current_level: usize,
    paused: bool,
    /// Suspended between levels; cleared by a scheduled `Resume`.
    transitioning: bool,
    place_cooldown: f32,
    level_start_score: i32,
    /// Set while the loaded level still owes a completion.
    awaiting_completion: bool,
    kill_plane_y: f32,
    next_id: EntityId,
}

impl GameModel {
    pub fn new() -> Self {
        Self::with_config(EchostepConfig::default(), LevelSet::builtin())
    }

    /// Config and levels from the environment, as a host would start.
    pub fn from_env() -> Self {
        Self::with_config(EchostepConfig::load(), LevelSet::load())
    }

    pub fn with_config(config: EchostepConfig, levels: LevelSet) -> Self {
        let player = Player::new(PLAYER_ID, 0.0, 0.0, config.physics.clone());
        let world = World::new(player, ContactRules::from_config(&config));
        let mut engine = CollisionEngine::new();
        if let Err(e) = engine.register(&world.player) {
            tracing::warn!("Player could not join the collision engine: {e}");
        }
        engine.subscribe(PLAYER_ID, World::on_player_contact);

        let mut model = Self {
            clock: FrameClock::new(config.max_frame_dt),
            config,
            levels,
            world,
            engine,
            tasks: Scheduler::new(),
            current_level: 0,
            paused: false,
            transitioning: false,
            place_cooldown: 0.0,
            level_start_score: 0,
            awaiting_completion: false,
            kill_plane_y: f32::INFINITY,
            next_id: PLAYER_ID + 1,
        };
        model.load_level(0);
        model
    }

    pub fn score(&self) -> i32 {
        self.world.score
    }

    pub fn place_cooldown_remaining(&self) -> f32 {
        self.place_cooldown
    }

    pub fn current_level(&self) -> usize {
        self.current_level
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &EchostepConfig {
        &self.config
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        let player = &self.world.player;
        let mut entities = Vec::with_capacity(self.world.actors.len() + 1);
        entities.push(EntitySnapshot {
            on_ground: player.physics.on_ground,
            facing: player.facing,
            ..EntitySnapshot::of(player, EntityKind::Player)
        });
        for actor in self.world.actors.values() {
            let facing = match actor {
                Actor::Enemy(enemy) if enemy.velocity_x < 0.0 => Facing::Left,
                _ => Facing::Right,
            };
            entities.push(EntitySnapshot {
                facing,
                visible: actor.is_visible(),
                ..EntitySnapshot::of(actor, actor.kind())
            });
        }
        RenderSnapshot {
            entities,
            score: self.world.score,
            place_cooldown_remaining: self.place_cooldown,
            is_running: self.is_running(),
            current_level: self.current_level,
        }
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Insert an actor, registering it for collisions if it has bounds.
    fn add_actor(&mut self, actor: Actor) {
        if actor.bounds().is_some()
            && let Err(e) = self.engine.register(&actor)
        {
            tracing::warn!("Actor skipped by collision engine: {e}");
        }
        self.world.actors.insert(actor.id(), actor);
    }

    /// Swap in the spawn lists of `index`. The player keeps its engine
    /// registration and subscription; everything else is rebuilt with ids
    /// restarting after the player's.
    fn load_level(&mut self, index: usize) {
        let level = self.levels.get(index).clone();
        let index = if self.levels.contains(index) { index } else { 0 };

        for id in self.world.clear_actors() {
            self.engine.unregister(id);
            self.engine.unsubscribe_entity(id);
        }
        self.tasks.clear();
        self.next_id = PLAYER_ID + 1;

        let tile = self.config.level.tile_size;
        for spawn in &level.platforms {
            let id = self.alloc_id();
            let platform = Platform::new(
                id,
                spawn.x * tile,
                spawn.y * tile,
                spawn.w * tile,
                spawn.h * tile,
            )
            .with_collision_type(spawn.collision_type)
            .with_required_coins(spawn.required_coins);
            self.add_actor(Actor::Platform(platform));
        }
        for spawn in &level.coins {
            let id = self.alloc_id();
            self.add_actor(Actor::Coin(Coin::new(id, spawn.x * tile, spawn.y * tile)));
        }
        for spawn in &level.enemies {
            let id = self.alloc_id();
            let enemy = Enemy::new(
                id,
                spawn.x * tile,
                spawn.y * tile,
                self.config.enemy.patrol_speed,
                self.config.enemy.patrol_range,
            );
            self.add_actor(Actor::Enemy(enemy));
        }
        for spawn in &level.anchors {
            let id = self.alloc_id();
            let anchor = Anchor::new(id, spawn.x * tile, spawn.y * tile, spawn.label.as_str());
            self.add_actor(Actor::Anchor(anchor));
        }

        self.world
            .player
            .respawn(level.player.x * tile, level.player.y * tile);
        self.kill_plane_y = level.kill_plane(tile, self.config.level.kill_plane_margin);
        self.awaiting_completion = !level.coins.is_empty();
        self.place_cooldown = 0.0;
        self.current_level = index;
        self.level_start_score = self.world.score;
        self.world.push_event(GameEvent::LevelLoaded { level: index });
        tracing::debug!(
            level = index,
            name = %level.name,
            actors = self.world.actors.len(),
            "Level loaded"
        );
    }

    /// Hold the simulation for the settle delay after a level load.
    fn begin_settle(&mut self) {
        self.transitioning = true;
        self.tasks
            .schedule(self.config.level.settle_delay, None, Task::Resume);
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::ActivateClone(id) => match self.world.actors.get_mut(&id) {
                Some(Actor::Clone(clone)) => {
                    if clone.activate() {
                        self.world.push_event(GameEvent::CloneActivated { clone: id });
                    }
                },
                _ => tracing::debug!(clone = id, "Activation fired for a clone that is gone"),
            },
            Task::AdvanceLevel => self.next_level(),
            Task::Resume => self.transitioning = false,
        }
    }

    /// One running tick: player, actors, collision sweep, removals, then
    /// level-wide checks.
    fn step(&mut self, dt: f32) {
        let tick = self.world.player.update(dt);
        if tick.jump_started {
            self.world.push_event(GameEvent::JumpStarted);
        }
        self.world.update_actors(dt);
        self.engine.check_collisions(&mut self.world);
        self.flush_removals();
        self.place_cooldown = (self.place_cooldown - dt).max(0.0);

        if self.world.player.position().1 > self.kill_plane_y {
            tracing::debug!(level = self.current_level, "Player fell past the kill plane");
            self.world.push_event(GameEvent::PlayerFell);
            self.reset_level();
            return;
        }

        if self.awaiting_completion && self.world.coin_count() == 0 {
            self.complete_level();
        }
    }

    /// Entities removed during the tick leave the engine and lose any
    /// pending tasks.
    fn flush_removals(&mut self) {
        for id in self.world.take_pending_unregister() {
            self.engine.unregister(id);
            self.engine.unsubscribe_entity(id);
            self.tasks.cancel_owner(id);
        }
    }

    fn complete_level(&mut self) {
        self.awaiting_completion = false;
        self.transitioning = true;
        self.tasks
            .schedule(self.config.level.transition_delay, None, Task::AdvanceLevel);
        self.world.push_event(GameEvent::LevelComplete {
            level: self.current_level,
        });
        tracing::debug!(
            level = self.current_level,
            score = self.world.score,
            "Level complete"
        );
    }
}

impl Default for GameModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SideScroller for GameModel {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Echostep".to_string(),
            description: "Leave frozen copies of yourself behind and climb them to every coin."
                .to_string(),
            level_count: self.levels.len(),
        }
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.paused {
            return Vec::new();
        }
        let dt = self.clock.clamp(dt);

        // A tick that ends a suspension only runs the tasks.
        let suspended = self.transitioning;
        for task in self.tasks.advance(dt) {
            self.run_task(task);
        }
        if !suspended && !self.transitioning {
            self.step(dt);
        }
        self.world.take_events()
    }

    fn apply_player_input(&mut self, direction: Direction) {
        if self.is_running() {
            self.world.player.apply_input(direction);
        }
    }

    fn release_jump(&mut self) {
        self.world.player.release_jump();
    }

    fn handle_place_action(&mut self) -> bool {
        if !self.is_running() || self.place_cooldown > 0.0 {
            return false;
        }
        let player = &self.world.player;
        let Some(bounds) = player.bounds().copied() else {
            return false;
        };
        let (x, y) = player.position();
        let size = player.size();

        let id = self.alloc_id();
        let clone = FrozenClone::new(id, x.round(), y.round(), size, bounds, &self.config.clone);
        self.add_actor(Actor::Clone(clone));
        self.tasks.schedule(
            self.config.clone.grace_period,
            Some(id),
            Task::ActivateClone(id),
        );
        self.place_cooldown = self.config.clone.place_cooldown;
        self.world.push_event(GameEvent::ClonePlaced { clone: id });
        tracing::debug!(clone = id, x, y, "Clone placed");
        true
    }

    fn reset_level(&mut self) {
        self.world.score = self.level_start_score;
        self.load_level(self.current_level);
        self.begin_settle();
    }

    fn next_level(&mut self) {
        self.load_level(self.current_level + 1);
        self.begin_settle();
    }

    side_scroller_boilerplate!(snapshot_type: RenderSnapshot);

    fn is_running(&self) -> bool {
        !self.paused && !self.transitioning
    }
}
