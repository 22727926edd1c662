use echostep_core::entity::Entity;
use echostep_core::events::GameEvent;
use echostep_core::game_trait::{Direction, SideScroller};
use echostep_core::test_helpers::{run_ticks, run_until_running};
use echostep_platformer::config::EchostepConfig;
use echostep_platformer::entities::{Actor, CollisionType, EntityKind};
use echostep_platformer::level::{LevelData, LevelSet, PlatformSpawn, TilePoint};
use echostep_platformer::physics::Facing;
use echostep_platformer::{GameModel, PLAYER_ID};

fn platform(x: f32, y: f32, w: f32, h: f32) -> PlatformSpawn {
    PlatformSpawn {
        x,
        y,
        w,
        h,
        collision_type: CollisionType::Solid,
        required_coins: None,
    }
}

fn level(platforms: Vec<PlatformSpawn>, coins: Vec<TilePoint>, enemies: Vec<TilePoint>) -> LevelData {
    LevelData {
        name: "scenario".to_string(),
        player: TilePoint { x: 2.0, y: 13.75 },
        platforms,
        coins,
        enemies,
        anchors: Vec::new(),
    }
}

fn game_with(levels: Vec<LevelData>) -> GameModel {
    GameModel::with_config(EchostepConfig::default(), LevelSet::from_levels(levels))
}

fn far_coin() -> TilePoint {
    TilePoint { x: 38.0, y: 14.0 }
}

/// Highest point (smallest y) the player reaches during one held jump.
fn jump_apex(game: &mut GameModel) -> f32 {
    let mut apex = game.world().player.position().1;
    for tick in 0..90 {
        let held: &[Direction] = if tick < 30 { &[Direction::Up] } else { &[] };
        run_ticks(game, 1, held);
        apex = apex.min(game.world().player.position().1);
    }
    apex
}

#[test]
fn running_through_a_coin_collects_it() {
    let coin = TilePoint { x: 8.0, y: 14.0 };
    let mut game = game_with(vec![level(
        vec![platform(0.0, 15.0, 40.0, 2.0)],
        vec![coin, far_coin()],
        Vec::new(),
    )]);
    let events = run_ticks(&mut game, 90, &[Direction::Right]);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, GameEvent::CoinCollected { score: 10, .. }))
    );
    assert_eq!(game.score(), 10);
}

#[test]
fn standing_on_a_clone_jumps_higher() {
    let ground = vec![platform(0.0, 15.0, 40.0, 2.0)];
    let mut from_ground = game_with(vec![level(ground.clone(), vec![far_coin()], Vec::new())]);
    run_ticks(&mut from_ground, 5, &[]);
    let ground_apex = jump_apex(&mut from_ground);

    let mut from_clone = game_with(vec![level(ground, vec![far_coin()], Vec::new())]);
    run_ticks(&mut from_clone, 5, &[]);
    assert!(from_clone.handle_place_action());
    run_ticks(&mut from_clone, 30, &[]);
    let clone_apex = jump_apex(&mut from_clone);

    assert!(
        clone_apex < ground_apex - 30.0,
        "Clone apex {clone_apex} should clear ground apex {ground_apex}"
    );
}

#[test]
fn coyote_jump_after_leaving_a_ledge() {
    let mut game = game_with(vec![level(
        vec![platform(0.0, 15.0, 5.0, 2.0)],
        vec![far_coin()],
        Vec::new(),
    )]);
    run_ticks(&mut game, 5, &[]);
    let mut left_ledge = false;
    for _ in 0..120 {
        run_ticks(&mut game, 1, &[Direction::Right]);
        if !game.world().player.physics.on_ground {
            left_ledge = true;
            break;
        }
    }
    assert!(left_ledge, "Player should run off the ledge");

    let events = run_ticks(&mut game, 1, &[Direction::Up, Direction::Right]);
    assert!(events.contains(&GameEvent::JumpStarted));
    assert!(game.world().player.velocity.y < 0.0);
}

#[test]
fn late_jump_after_coyote_window_fails() {
    let mut game = game_with(vec![level(
        vec![platform(0.0, 15.0, 5.0, 2.0)],
        vec![far_coin()],
        Vec::new(),
    )]);
    run_ticks(&mut game, 5, &[]);
    while game.world().player.physics.on_ground {
        run_ticks(&mut game, 1, &[Direction::Right]);
    }
    run_ticks(&mut game, 12, &[]);
    let events = run_ticks(&mut game, 1, &[Direction::Up]);
    assert!(!events.contains(&GameEvent::JumpStarted));
    assert!(game.world().player.velocity.y > 0.0);
}

#[test]
fn enemies_patrol_and_turn_around() {
    let mut game = game_with(vec![level(
        vec![platform(0.0, 15.0, 40.0, 2.0)],
        vec![far_coin()],
        vec![TilePoint { x: 20.0, y: 14.0 }],
    )]);
    let enemy_facing = |game: &GameModel| {
        game.snapshot()
            .entities
            .iter()
            .find(|e| e.kind == EntityKind::Enemy)
            .map(|e| e.facing)
    };
    assert_eq!(enemy_facing(&game), Some(Facing::Right));
    // 64px range at 60px/s: turned around after a little over a second.
    run_ticks(&mut game, 90, &[]);
    assert_eq!(enemy_facing(&game), Some(Facing::Left));
}

#[test]
fn pause_freezes_events_and_state() {
    let mut game = game_with(vec![level(
        vec![platform(0.0, 15.0, 40.0, 2.0)],
        vec![far_coin()],
        Vec::new(),
    )]);
    game.pause();
    let before = game.serialize_state();
    let events = run_ticks(&mut game, 20, &[Direction::Up]);
    assert!(events.is_empty());
    assert_eq!(before, game.serialize_state());
    game.resume();
    assert!(game.is_running());
}

#[test]
fn levels_load_from_json_directory() {
    let dir = std::env::temp_dir().join(format!("echostep-scenario-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let first = level(
        vec![platform(0.0, 15.0, 40.0, 2.0)],
        vec![far_coin()],
        Vec::new(),
    );
    let second = level(
        vec![platform(0.0, 15.0, 20.0, 2.0), platform(5.0, 10.0, 3.0, 1.0)],
        vec![far_coin(), TilePoint { x: 6.0, y: 9.0 }],
        Vec::new(),
    );
    for (i, lvl) in [&first, &second].iter().enumerate() {
        let json = serde_json::to_string_pretty(lvl).unwrap();
        std::fs::write(dir.join(format!("level_{i}.json")), json).unwrap();
    }

    let levels = LevelSet::load_from_dir(&dir).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();

    let mut game = GameModel::with_config(EchostepConfig::default(), levels);
    assert_eq!(game.metadata().level_count, 2);
    game.next_level();
    run_until_running(&mut game, 120);
    assert_eq!(game.current_level(), 1);
    let coins = game
        .world()
        .actors
        .values()
        .filter(|a| matches!(a, Actor::Coin(_)))
        .count();
    assert_eq!(coins, 2);
}

#[test]
fn snapshot_lists_player_first_with_render_fields() {
    let mut game = game_with(vec![level(
        vec![platform(0.0, 15.0, 40.0, 2.0)],
        vec![far_coin()],
        Vec::new(),
    )]);
    run_ticks(&mut game, 10, &[Direction::Left]);
    let snapshot = game.snapshot();
    let player = &snapshot.entities[0];
    assert_eq!(player.id, PLAYER_ID);
    assert_eq!(player.facing, Facing::Left);
    assert!(player.on_ground);
    assert_eq!((player.width, player.height), (32.0, 40.0));
    assert!(snapshot.is_running);
    assert_eq!(snapshot.current_level, 0);
}
