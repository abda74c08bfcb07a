//! The player's locomotion state
//!
//! Score, ammo and lives live on `GameState`; this is only the body moving
//! through the level.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Direction, Position, Rect, Size};
use crate::consts::{PLAYER_HEIGHT, PLAYER_WIDTH};

const SPRITE_WALK_RIGHT_1: i32 = 260;
const SPRITE_WALK_LEFT_1: i32 = 272;
const SPRITE_JUMP_RIGHT: i32 = 284;
const SPRITE_JUMP_LEFT: i32 = 285;
const SPRITE_SHOOT_RIGHT: i32 = 286;
const SPRITE_SHOOT_LEFT: i32 = 287;
const WALK_FRAMES: u32 = 12;
/// Offset from the normal sprites to the upside-down ones
const SPRITE_REVERSE_OFFSET: i32 = 104;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub position: Position,
    pub velocity: IVec2,
    /// Left or Right only
    pub direction: Direction,

    pub collide_x: bool,
    pub collide_y: bool,

    pub walking: bool,
    pub walk_tick: u32,
    pub jumping: bool,
    pub jump_tick: usize,
    pub falling: bool,
    pub shooting: bool,

    pub noclip: bool,
    pub godmode: bool,
    pub reverse_gravity: bool,
}

impl Player {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            velocity: IVec2::ZERO,
            direction: Direction::Right,
            collide_x: false,
            collide_y: false,
            walking: false,
            walk_tick: 0,
            jumping: false,
            jump_tick: 0,
            falling: false,
            shooting: false,
            noclip: false,
            godmode: false,
            reverse_gravity: false,
        }
    }

    pub const fn size() -> Size {
        IVec2::new(PLAYER_WIDTH, PLAYER_HEIGHT)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position, Self::size())
    }

    /// +1 when gravity pulls down, -1 when reversed
    pub fn gravity_sign(&self) -> i32 {
        if self.reverse_gravity { -1 } else { 1 }
    }

    /// Sprite for the current pose
    pub fn sprite(&self) -> i32 {
        let right = self.direction != Direction::Left;
        let (walk_1, jump, shoot) = if right {
            (SPRITE_WALK_RIGHT_1, SPRITE_JUMP_RIGHT, SPRITE_SHOOT_RIGHT)
        } else {
            (SPRITE_WALK_LEFT_1, SPRITE_JUMP_LEFT, SPRITE_SHOOT_LEFT)
        };
        let airborne = self.jumping || self.falling;

        let sprite = if self.walking {
            if airborne {
                jump
            } else {
                walk_1 + (self.walk_tick % WALK_FRAMES) as i32
            }
        } else if self.shooting {
            shoot
        } else if airborne {
            jump
        } else {
            walk_1
        };

        if self.reverse_gravity {
            sprite + SPRITE_REVERSE_OFFSET
        } else {
            sprite
        }
    }
}
