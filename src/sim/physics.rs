//! Player locomotion and collision queries
//!
//! Movement is integer and pixel stepped: each axis is walked one pixel at a
//! time (X first, then Y) and stops at the first blocked pixel. There is no
//! penetration to resolve afterwards.

use glam::IVec2;

use super::enemy::Enemy;
use super::geometry::{Direction, Position, Rect, Size};
use super::level::{Level, MovingPlatform};
use super::player::Player;
use super::tick::TickInput;
use crate::consts::{
    ENEMY_HIT_SIZE, GRAVITY, JUMP_FALL_INDEX, JUMP_VELOCITY, NOCLIP_SPEED, TILE_SIZE, WALK_SPEED,
    WALK_SPEED_START,
};

/// Index of the first enemy whose hit box overlaps the rectangle
pub fn collides_enemy(enemies: &[Enemy], position: Position, size: Size) -> Option<usize> {
    let rect = Rect::new(position, size);
    enemies
        .iter()
        .position(|e| rect.intersects(&Rect::new(e.position, IVec2::splat(ENEMY_HIT_SIZE))))
}

/// Would a player at `position` be resting on a one-way platform?
///
/// The feet must sit exactly on the top row of a platform, so the player can
/// jump up through platforms and only lands when coming down onto them.
pub fn player_on_platform(level: &Level, size: Size, position: Position) -> bool {
    let feet = position.y + size.y - 1;

    if feet.rem_euclid(TILE_SIZE) == 0 {
        let row = crate::pixel_to_tile(feet);
        if level.tile(crate::pixel_to_tile(position.x), row).is_solid_top()
            || level
                .tile(crate::pixel_to_tile(position.x + size.x), row)
                .is_solid_top()
        {
            return true;
        }
    }

    level
        .moving_platforms()
        .iter()
        .any(|p| feet == p.position.y && overlaps_platform(position.x, size.x, p))
}

/// Is the player standing on top of this moving platform right now?
pub fn player_standing_on(player_rect: &Rect, platform: &MovingPlatform) -> bool {
    player_rect.bottom() == platform.position.y
        && overlaps_platform(player_rect.left(), player_rect.size.x, platform)
}

fn overlaps_platform(x: i32, width: i32, platform: &MovingPlatform) -> bool {
    x < platform.position.x + TILE_SIZE && x + width > platform.position.x
}

/// Run the player's locomotion for one tick: input, velocity, movement, then
/// the state changes that follow from what the movement hit.
pub fn update_player(player: &mut Player, level: &Level, input: &TickInput) {
    apply_input(player, level, input);
    update_velocity(player);
    move_player(player, level);
    resolve_collisions(player, level);
}

fn apply_input(player: &mut Player, level: &Level, input: &TickInput) {
    if input.left == input.right {
        player.walking = false;
    } else {
        let wanted = if input.right { Direction::Right } else { Direction::Left };
        if player.walking && player.direction == wanted {
            player.walk_tick += 1;
        } else {
            player.walking = true;
            player.walk_tick = 0;
            player.direction = wanted;
        }
    }

    if player.noclip {
        player.velocity.y = if input.up {
            -NOCLIP_SPEED
        } else if input.down {
            NOCLIP_SPEED
        } else {
            0
        };
    } else if input.jump
        && !player.jumping
        && !player.falling
        && !level.collides_solid(
            player.position - IVec2::new(0, player.gravity_sign()),
            Player::size(),
        )
    {
        player.jumping = true;
        player.jump_tick = 0;
    } else if player.jumping {
        player.jump_tick += 1;
    }

    player.shooting = input.shoot;
}

fn jump_velocity(jump_tick: usize) -> i32 {
    let last = JUMP_VELOCITY[JUMP_VELOCITY.len() - 1];
    JUMP_VELOCITY.get(jump_tick).copied().unwrap_or(last)
}

fn update_velocity(player: &mut Player) {
    if !player.noclip {
        let vy = if player.jumping {
            jump_velocity(player.jump_tick)
        } else {
            GRAVITY
        };
        player.velocity.y = vy * player.gravity_sign();
    }

    player.velocity.x = if player.walking {
        let speed = if player.walk_tick == 0 {
            WALK_SPEED_START
        } else {
            WALK_SPEED
        };
        match player.direction {
            Direction::Left => -speed,
            _ => speed,
        }
    } else {
        0
    };
}

fn move_player(player: &mut Player, level: &Level) {
    player.collide_x = false;
    player.collide_y = false;
    let size = Player::size();
    let destination = player.position + player.velocity;
    let right_limit = level.width() * TILE_SIZE - size.x;

    let step_x = (destination.x - player.position.x).signum();
    while player.position.x != destination.x {
        let next = player.position + IVec2::new(step_x, 0);
        if !player.noclip
            && (level.collides_solid(next, size) || next.x < 0 || next.x >= right_limit)
        {
            player.collide_x = true;
            break;
        }
        player.position = next;
    }

    // Solid geometry is checked before platforms
    let step_y = (destination.y - player.position.y).signum();
    while player.position.y != destination.y {
        let next = player.position + IVec2::new(0, step_y);
        if !player.noclip
            && (level.collides_solid(next, size)
                || (step_y == 1 && player_on_platform(level, size, next)))
        {
            player.collide_y = true;
            break;
        }
        player.position = next;
    }
}

fn resolve_collisions(player: &mut Player, level: &Level) {
    if player.walking && player.collide_x {
        player.walking = false;
    }

    if player.jumping {
        let ascending = player.velocity.y * player.gravity_sign() < 0;
        if player.collide_y {
            if ascending {
                // Bumped the head: skip straight to the falling part of the arc
                player.jump_tick = JUMP_FALL_INDEX;
            } else {
                player.jumping = false;
            }
        } else if player.jump_tick >= JUMP_VELOCITY.len() - 1 {
            player.jumping = false;
        } else if player.jump_tick != 0
            && level.collides_solid(
                player.position + IVec2::new(0, player.gravity_sign()),
                Player::size(),
            )
        {
            player.jumping = false;
        }
    }

    if !player.noclip {
        player.falling = !player.jumping
            && player.velocity.y > 0
            && !player.collide_y
            && !level.collides_solid(player.position + IVec2::new(0, 1), Player::size());
    }
}
