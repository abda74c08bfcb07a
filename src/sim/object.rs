//! Generic animated decorations handed to the renderer
//!
//! Objects are rebuilt from scratch every tick and never persisted.

use serde::{Deserialize, Serialize};

use super::geometry::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub position: Position,
    /// First sprite of the animation
    pub sprite: i32,
    /// Number of animation frames (>1 is animated)
    pub num_sprites: i32,
    /// Play the animation backwards
    pub reverse: bool,
}

impl Object {
    pub fn new(position: Position, sprite: i32, num_sprites: i32, reverse: bool) -> Self {
        Self {
            position,
            sprite,
            num_sprites,
            reverse,
        }
    }

    /// A single-frame object
    pub fn still(position: Position, sprite: i32) -> Self {
        Self::new(position, sprite, 1, false)
    }

    /// Sprite to draw at `game_tick`
    pub fn sprite_at(&self, game_tick: u32) -> i32 {
        if self.num_sprites <= 1 {
            return self.sprite;
        }
        let count = self.num_sprites as u32;
        let frame = game_tick % count;
        let frame = if self.reverse { count - 1 - frame } else { frame };
        self.sprite + frame as i32
    }
}
