use std::time::Duration;

use tracing_subscriber::EnvFilter;

use echostep_core::events::GameEvent;
use echostep_core::game_trait::{Direction, SideScroller};
use echostep_core::time::FrameClock;
use echostep_platformer::GameModel;

const DEFAULT_TICKS: u64 = 1200;

/// One segment of the scripted input track, in ticks.
struct Segment {
    start: u64,
    end: u64,
    held: &'static [Direction],
    place_at_start: bool,
}

/// Walk right, drop a clone, hop onto it, then keep running right.
const SCRIPT: &[Segment] = &[
    Segment {
        start: 30,
        end: 120,
        held: &[Direction::Right],
        place_at_start: false,
    },
    Segment {
        start: 140,
        end: 150,
        held: &[],
        place_at_start: true,
    },
    Segment {
        start: 180,
        end: 200,
        held: &[Direction::Up],
        place_at_start: false,
    },
    Segment {
        start: 200,
        end: 900,
        held: &[Direction::Right],
        place_at_start: false,
    },
];

fn log_event(tick: u64, event: &GameEvent) {
    match event {
        GameEvent::LevelComplete { level } => {
            tracing::info!(tick, level, "Level complete");
        },
        GameEvent::LevelLoaded { level } => {
            tracing::info!(tick, level, "Level loaded");
        },
        GameEvent::PlayerFell => tracing::info!(tick, "Player fell, level reset"),
        other => tracing::debug!(tick, event = other.name(), ?other, "Game event"),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ticks = std::env::var("ECHOSTEP_TICKS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TICKS);

    let mut game = GameModel::from_env();
    let metadata = game.metadata();
    tracing::info!(
        name = %metadata.name,
        levels = metadata.level_count,
        ticks,
        "Echostep headless host starting"
    );

    let mut clock = FrameClock::new(game.config().max_frame_dt);
    let frame = Duration::from_secs_f32(1.0 / game.tick_rate());
    let mut now = Duration::ZERO;
    let mut jump_held = false;

    for tick in 0..ticks {
        let mut holding_up = false;
        for segment in SCRIPT.iter().filter(|s| (s.start..s.end).contains(&tick)) {
            if segment.place_at_start && tick == segment.start && !game.handle_place_action() {
                tracing::debug!(tick, "Place action refused");
            }
            for &direction in segment.held {
                holding_up |= direction == Direction::Up;
                game.apply_player_input(direction);
            }
        }
        if jump_held && !holding_up {
            game.release_jump();
        }
        jump_held = holding_up;

        let dt = clock.tick(now);
        for event in game.update(dt) {
            log_event(tick, &event);
        }
        now += frame;
    }

    let snapshot = game.snapshot();
    let encoded = game.serialize_state();
    tracing::info!(
        score = snapshot.score,
        level = snapshot.current_level,
        entities = snapshot.entities.len(),
        snapshot_bytes = encoded.len(),
        "Run finished"
    );
}
