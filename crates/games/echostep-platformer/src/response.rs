//! Collision responses applied to the player when the engine reports contact.
//!
//! All resolution moves the player's position, never the obstacle's, and
//! works on the player's collision box so bounds offsets are honoured.

use echostep_core::entity::Entity;
use echostep_core::game_trait::Direction;
use echostep_core::geometry::Rect;

use crate::physics::Player;

/// Direction the player would be pushed out of `obstacle` along the axis of
/// least overlap. Equal overlaps resolve vertically.
pub fn push_direction(player_box: &Rect, obstacle: &Rect) -> Direction {
    let overlap_x = player_box.overlap_x(obstacle);
    let overlap_y = player_box.overlap_y(obstacle);
    let (player_cx, player_cy) = player_box.center();
    let (obstacle_cx, obstacle_cy) = obstacle.center();

    if overlap_x < overlap_y {
        if player_cx < obstacle_cx {
            Direction::Left
        } else {
            Direction::Right
        }
    } else if player_cy < obstacle_cy {
        Direction::Up
    } else {
        Direction::Down
    }
}

/// Minimum-translation separation against a solid box.
///
/// Snaps the player flush with the nearer face and zeroes velocity on that
/// axis. Landing on top sets `on_ground`. Returns the push direction, or
/// `None` if the player has no collision box.
pub fn handle_static_collision(player: &mut Player, obstacle: &Rect) -> Option<Direction> {
    let player_box = player.collision_box()?;
    let bounds = *player.bounds()?;
    let push = push_direction(&player_box, obstacle);
    let (x, y) = player.position();

    match push {
        Direction::Left => {
            player.set_position(obstacle.x - bounds.width() - bounds.offset_x(), y);
            player.velocity.x = 0.0;
        },
        Direction::Right => {
            player.set_position(obstacle.right() - bounds.offset_x(), y);
            player.velocity.x = 0.0;
        },
        Direction::Up => {
            player.set_position(x, obstacle.y - bounds.height() - bounds.offset_y());
            player.velocity.y = 0.0;
            player.physics.on_ground = true;
        },
        Direction::Down => {
            player.set_position(x, obstacle.bottom() - bounds.offset_y());
            player.velocity.y = 0.0;
        },
    }
    Some(push)
}

/// A grounded player touching a clone is stood on top of it; otherwise the
/// clone resolves like any solid.
pub fn handle_clone_collision(player: &mut Player, clone_box: &Rect) -> Option<Direction> {
    if !player.physics.on_ground {
        return handle_static_collision(player, clone_box);
    }
    let bounds = *player.bounds()?;
    let (x, _) = player.position();
    player.set_position(x, clone_box.y - bounds.height() - bounds.offset_y());
    player.velocity.y = 0.0;
    player.physics.on_ground = true;
    Some(Direction::Up)
}

/// Knockback along the enemy-centre to player-centre line, scaled to
/// `strength`. `None` when the centres coincide.
pub fn bounce_vector(player_box: &Rect, enemy_box: &Rect, strength: f32) -> Option<(f32, f32)> {
    let (player_cx, player_cy) = player_box.center();
    let (enemy_cx, enemy_cy) = enemy_box.center();
    let dx = player_cx - enemy_cx;
    let dy = player_cy - enemy_cy;
    let distance = dx.hypot(dy);
    if distance == 0.0 || !distance.is_finite() {
        return None;
    }
    Some((dx / distance * strength, dy / distance * strength))
}
