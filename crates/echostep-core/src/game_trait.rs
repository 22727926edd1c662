use serde::{Deserialize, Serialize};

use crate::events::GameEvent;

/// Abstract input tokens produced by the keyboard/gamepad collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Contract between a single-player side-scrolling simulation and its host.
///
/// The host owns the frame clock and input polling; the simulation owns all
/// entity state and advances exactly one tick per `update` call.
pub trait SideScroller {
    fn metadata(&self) -> GameMetadata;

    /// Advance one tick. `dt` is already clamped by the host's frame clock.
    fn update(&mut self, dt: f32) -> Vec<GameEvent>;

    /// Queue a held direction for the next tick.
    fn apply_player_input(&mut self, direction: Direction);

    /// Edge event: the jump key was released.
    fn release_jump(&mut self);

    /// Momentary action; returns whether the action was accepted.
    fn handle_place_action(&mut self) -> bool;

    fn reset_level(&mut self);

    fn next_level(&mut self);

    /// Encoded render snapshot for the host.
    fn serialize_state(&self) -> Vec<u8>;

    fn pause(&mut self);

    fn resume(&mut self);

    fn is_running(&self) -> bool;

    /// Ticks per second the host should aim for.
    fn tick_rate(&self) -> f32 {
        60.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub name: String,
    pub description: String,
    pub level_count: usize,
}

/// Generates the `serialize_state`, `pause` and `resume` methods of
/// [`SideScroller`].
///
/// Requires a `snapshot(&self) -> $Snapshot` method and a `paused: bool` field.
#[macro_export]
macro_rules! side_scroller_boilerplate {
    (snapshot_type: $Snapshot:ty) => {
        fn serialize_state(&self) -> Vec<u8> {
            let snapshot: $Snapshot = self.snapshot();
            rmp_serde::to_vec(&snapshot).expect("render snapshot serialization must succeed")
        }

        fn pause(&mut self) {
            self.paused = true;
        }

        fn resume(&mut self) {
            self.paused = false;
        }
    };
}
