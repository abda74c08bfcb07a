//! Cavern Sim - tile-grid platformer simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tile physics, collisions, entities, game state)
//! - `loader`: JSON level/catalog provider (load-time only, never inside a tick)
//! - `settings`: Simulation configuration

pub mod loader;
pub mod settings;
pub mod sim;

pub use loader::{JsonLevelProvider, LevelProvider, LoadError};
pub use settings::SimConfig;

/// Game configuration constants
pub mod consts {
    /// Edge length of a tile in pixels
    pub const TILE_SIZE: i32 = 16;
    /// Largest level dimension or tile coordinate accepted from level data,
    /// so pixel arithmetic stays well inside `i32`
    pub const MAX_TILE_COORD: i32 = 1 << 20;

    /// Visible part of the level (20 x 12 tiles)
    pub const CAMERA_WIDTH: i32 = 320;
    pub const CAMERA_HEIGHT: i32 = 192;

    /// Player collision box. The sprite is 16x16, the player is narrower.
    pub const PLAYER_WIDTH: i32 = 12;
    pub const PLAYER_HEIGHT: i32 = 16;

    /// Constant downward velocity when not jumping (pixels/tick)
    pub const GRAVITY: i32 = 8;

    /// Per-tick Y velocity while jumping, indexed by jump tick
    pub const JUMP_VELOCITY: [i32; 16] = [0, -8, -8, -8, -4, -4, -2, -2, -2, -2, 2, 2, 2, 2, 4, 4];
    /// Jump tick to skip to when the player bumps their head
    pub const JUMP_FALL_INDEX: usize = 10;

    /// Walk speed on the first tick of a walk, then every tick after
    pub const WALK_SPEED_START: i32 = 2;
    pub const WALK_SPEED: i32 = 4;

    /// Vertical speed while noclipping
    pub const NOCLIP_SPEED: i32 = 4;

    /// Item rules
    pub const CRYSTAL_SCORE: u32 = 50;
    pub const MAX_AMMO: u32 = 99;
    /// Ammo granted by the ammo cheat
    pub const CHEAT_AMMO: u32 = 40;

    /// Missile collision box (sprite is 16x16) and probe offset
    pub const MISSILE_WIDTH: i32 = 16;
    pub const MISSILE_HEIGHT: i32 = 11;
    pub const MISSILE_PROBE_OFFSET_Y: i32 = 3;
    /// Pixels travelled per tick, indexed by missile frame (last entry repeats)
    pub const MISSILE_SPEED: [i32; 11] = [4, 4, 4, 4, 4, 4, 6, 8, 10, 12, 14];
    /// Missile despawns once its frame exceeds this
    pub const MISSILE_MAX_FRAME: u32 = 27;
    /// Ticks after an impact before another missile may be fired
    pub const MISSILE_COOLDOWN: u32 = 7;

    /// Explosion sprite sequence
    pub const EXPLOSION_SPRITES: [i32; 7] = [28, 29, 30, 31, 30, 29, 28];

    /// Box used for missile-vs-enemy hits
    pub const ENEMY_HIT_SIZE: i32 = 16;
    /// Default score for killing an enemy
    pub const ENEMY_POINTS: u32 = 500;
}

/// Floor division for pixel -> tile conversion (negative pixels map to negative tiles)
#[inline]
pub fn pixel_to_tile(px: i32) -> i32 {
    px.div_euclid(consts::TILE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_to_tile() {
        assert_eq!(pixel_to_tile(0), 0);
        assert_eq!(pixel_to_tile(15), 0);
        assert_eq!(pixel_to_tile(16), 1);
        assert_eq!(pixel_to_tile(-1), -1);
    }

    #[test]
    fn test_jump_table_shape() {
        use consts::*;
        assert_eq!(JUMP_VELOCITY[0], 0);
        assert!(JUMP_VELOCITY[JUMP_FALL_INDEX] > 0);
        assert!(JUMP_VELOCITY[..JUMP_FALL_INDEX].iter().all(|&v| v <= 0));
    }
}
