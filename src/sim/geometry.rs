//! Integer geometry primitives
//!
//! Positions, sizes and velocities are `IVec2` in pixel units. Rectangles are
//! axis-aligned and anchored at their top-left corner.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::consts::{CAMERA_HEIGHT, CAMERA_WIDTH, TILE_SIZE};

/// Top-left position in pixels
pub type Position = IVec2;
/// Width (x) and height (y) in pixels, never negative
pub type Size = IVec2;

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub position: Position,
    pub size: Size,
}

impl Rect {
    pub const fn new(position: Position, size: Size) -> Self {
        Self { position, size }
    }

    pub const fn from_xywh(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            position: IVec2::new(x, y),
            size: IVec2::new(w, h),
        }
    }

    /// A single tile-sized rectangle at a pixel position
    pub const fn tile_at(position: Position) -> Self {
        Self {
            position,
            size: IVec2::new(TILE_SIZE, TILE_SIZE),
        }
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.position.x
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.position.y
    }

    /// Exclusive right edge
    #[inline]
    pub fn right(&self) -> i32 {
        self.position.x + self.size.x
    }

    /// Exclusive bottom edge
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.position.y + self.size.y
    }

    /// True if the two rectangles overlap. Touching edges do not count.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.top() < other.bottom()
            && self.right() > other.left()
            && self.bottom() > other.top()
    }

    /// True if `self` lies within `outer` (shared edges allowed)
    #[inline]
    pub fn is_inside(&self, outer: &Rect) -> bool {
        self.left() >= outer.left()
            && self.top() >= outer.top()
            && self.right() <= outer.right()
            && self.bottom() <= outer.bottom()
    }
}

/// Facing or travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Unit step in pixels
    pub fn step(self) -> IVec2 {
        match self {
            Direction::Left => IVec2::NEG_X,
            Direction::Right => IVec2::X,
            Direction::Up => IVec2::NEG_Y,
            Direction::Down => IVec2::Y,
        }
    }
}

/// True if `rect` overlaps any of `rects`
pub fn is_any_colliding(rects: &[Rect], rect: &Rect) -> bool {
    rects.iter().any(|r| r.intersects(rect))
}

/// The visible part of the level: centered on the player's sprite and
/// clamped so nothing outside the level is shown.
pub fn camera_rect(player_position: Position, level_size_px: Size) -> Rect {
    let half_sprite = IVec2::splat(TILE_SIZE / 2);
    let half_camera = IVec2::new(CAMERA_WIDTH / 2, CAMERA_HEIGHT / 2);
    let desired = player_position + half_sprite - half_camera;
    let max = (level_size_px - IVec2::new(CAMERA_WIDTH, CAMERA_HEIGHT)).max(IVec2::ZERO);
    Rect::new(
        desired.clamp(IVec2::ZERO, max),
        IVec2::new(CAMERA_WIDTH, CAMERA_HEIGHT),
    )
}
