pub mod animation;
pub mod collision;
pub mod entity;
pub mod events;
pub mod game_trait;
pub mod geometry;
pub mod schedule;
pub mod time;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::events::GameEvent;
    use crate::game_trait::{Direction, SideScroller};

    /// One 60 Hz frame.
    pub const FRAME_DT: f32 = 1.0 / 60.0;

    /// Run N ticks, re-applying `held` every tick, and collect all events.
    pub fn run_ticks(game: &mut dyn SideScroller, n: usize, held: &[Direction]) -> Vec<GameEvent> {
        let mut all_events = Vec::new();
        for _ in 0..n {
            for &direction in held {
                game.apply_player_input(direction);
            }
            all_events.extend(game.update(FRAME_DT));
        }
        all_events
    }

    /// Tick with no input until the simulation reports running again.
    pub fn run_until_running(game: &mut dyn SideScroller, max_ticks: usize) {
        for _ in 0..max_ticks {
            if game.is_running() {
                return;
            }
            game.update(FRAME_DT);
        }
        assert!(
            game.is_running(),
            "Simulation should resume within {max_ticks} ticks"
        );
    }

    /// Assert that the game's serialized state differs from `before`.
    pub fn assert_game_state_changed(game: &dyn SideScroller, before: &[u8]) {
        let after = game.serialize_state();
        assert_ne!(
            before,
            &after[..],
            "Game state should have changed after operation"
        );
    }

    // ================================================================
    // Simulation Contract Tests
    // ================================================================
    // Every SideScroller implementation must pass these. Game crates call
    // them from their own #[cfg(test)] modules with a fresh instance.

    /// Holding a direction for a while must change the snapshot.
    pub fn contract_input_changes_state(game: &mut dyn SideScroller) {
        let before = game.serialize_state();
        run_ticks(game, 30, &[Direction::Right]);
        assert_game_state_changed(game, &before);
    }

    /// pause() must freeze the snapshot; resume() must unfreeze it.
    pub fn contract_pause_stops_updates(game: &mut dyn SideScroller) {
        game.pause();
        assert!(!game.is_running(), "Paused game must not report running");
        let before = game.serialize_state();
        run_ticks(game, 10, &[Direction::Right]);
        let during_pause = game.serialize_state();
        assert_eq!(before, during_pause, "State must not change while paused");

        game.resume();
        run_ticks(game, 10, &[Direction::Right]);
        assert_game_state_changed(game, &during_pause);
    }

    /// A second place action inside the cooldown must be refused.
    pub fn contract_place_action_has_cooldown(game: &mut dyn SideScroller) {
        assert!(game.handle_place_action(), "First place action must succeed");
        assert!(
            !game.handle_place_action(),
            "Immediate second place action must be refused"
        );
    }

    /// reset_level() must restore the freshly loaded snapshot once the
    /// transition settles. Call on a freshly constructed game.
    pub fn contract_reset_level_restores_start(game: &mut dyn SideScroller, max_ticks: usize) {
        let initial = game.serialize_state();
        run_ticks(game, 30, &[Direction::Right]);
        game.handle_place_action();
        game.reset_level();
        assert!(
            !game.is_running(),
            "Simulation must be suspended while a level reloads"
        );
        run_until_running(game, max_ticks);
        assert_eq!(
            initial,
            game.serialize_state(),
            "reset_level must restore the level's starting state"
        );
    }

    /// next_level() must load different state.
    pub fn contract_next_level_changes_state(game: &mut dyn SideScroller, max_ticks: usize) {
        let before = game.serialize_state();
        game.next_level();
        run_until_running(game, max_ticks);
        assert_game_state_changed(game, &before);
    }
}
