//! Immutable tile, item and background descriptors
//!
//! Levels store ids into these catalogs. Lookups that miss (out of bounds,
//! `-1` ids, ids past the end of a catalog) resolve to the `INVALID`
//! sentinels, which have no effect on anything.

use serde::{Deserialize, Serialize};

use super::geometry::Size;

/// Id into the tile or item catalog; `-1` means "nothing here"
pub type CatalogId = i32;

/// Id stored in a layer cell that holds nothing
pub const NO_ID: CatalogId = -1;

bitflags::bitflags! {
    /// Tile behaviour flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TileFlags: u8 {
        const SOLID = 1 << 0;
        const SOLID_TOP = 1 << 1;
        const DAMAGE = 1 << 2;
        const DEATH = 1 << 3;
        const ANIMATED = 1 << 4;
        const RENDER_IN_FRONT = 1 << 5;
        const BLOCKS_SLIME = 1 << 6;
    }
}

/// A tile type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    valid: bool,
    sprite: i32,
    sprite_count: i32,
    flags: TileFlags,
}

impl Tile {
    /// Out-of-bounds or absent tile: never solid, never drawn
    pub const INVALID: Tile = Tile {
        valid: false,
        sprite: -1,
        sprite_count: 0,
        flags: TileFlags::empty(),
    };

    pub const fn new(sprite: i32, sprite_count: i32, flags: TileFlags) -> Self {
        Self {
            valid: true,
            sprite,
            sprite_count,
            flags,
        }
    }

    pub fn valid(&self) -> bool {
        self.valid
    }

    pub fn sprite(&self) -> i32 {
        self.sprite
    }

    pub fn sprite_count(&self) -> i32 {
        self.sprite_count
    }

    pub fn flags(&self) -> TileFlags {
        self.flags
    }

    pub fn is_solid(&self) -> bool {
        self.flags.contains(TileFlags::SOLID)
    }

    pub fn is_solid_top(&self) -> bool {
        self.flags.contains(TileFlags::SOLID_TOP)
    }

    pub fn is_damage(&self) -> bool {
        self.flags.contains(TileFlags::DAMAGE)
    }

    pub fn is_death(&self) -> bool {
        self.flags.contains(TileFlags::DEATH)
    }

    pub fn is_animated(&self) -> bool {
        self.flags.contains(TileFlags::ANIMATED)
    }

    pub fn is_render_in_front(&self) -> bool {
        self.flags.contains(TileFlags::RENDER_IN_FRONT)
    }

    pub fn blocks_slime(&self) -> bool {
        self.flags.contains(TileFlags::BLOCKS_SLIME)
    }

    /// Sprite to draw at `game_tick`; animated tiles advance every other tick
    pub fn sprite_at(&self, game_tick: u32) -> i32 {
        if self.is_animated() && self.sprite_count > 0 {
            self.sprite + ((game_tick / 2) % self.sprite_count as u32) as i32
        } else {
            self.sprite
        }
    }
}

/// What picking up an item does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Fixed score bonus
    Crystal,
    /// Adds `amount` ammo, capped
    Ammo,
    /// Adds `amount` score
    Score,
}

impl ItemKind {
    /// Numeric encoding used by catalog files
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ItemKind::Crystal),
            1 => Some(ItemKind::Ammo),
            2 => Some(ItemKind::Score),
            _ => None,
        }
    }
}

/// A pickup type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    valid: bool,
    sprite: i32,
    kind: ItemKind,
    amount: u32,
}

impl Item {
    pub const INVALID: Item = Item {
        valid: false,
        sprite: -1,
        kind: ItemKind::Score,
        amount: 0,
    };

    pub const fn new(sprite: i32, kind: ItemKind, amount: u32) -> Self {
        Self {
            valid: true,
            sprite,
            kind,
            amount,
        }
    }

    pub fn valid(&self) -> bool {
        self.valid
    }

    pub fn sprite(&self) -> i32 {
        self.sprite
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }
}

/// Repeating backdrop drawn behind the tile layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    valid: bool,
    sprite: i32,
    size_in_tiles: Size,
}

impl Background {
    pub const INVALID: Background = Background {
        valid: false,
        sprite: -1,
        size_in_tiles: Size::ZERO,
    };

    pub const fn new(sprite: i32, size_in_tiles: Size) -> Self {
        Self {
            valid: true,
            sprite,
            size_in_tiles,
        }
    }

    pub fn valid(&self) -> bool {
        self.valid
    }

    pub fn sprite(&self) -> i32 {
        self.sprite
    }

    pub fn size_in_tiles(&self) -> Size {
        self.size_in_tiles
    }

    /// Sprite covering tile (x, y) when the backdrop is tiled across the level.
    /// The backdrop's sprites are a row-major block of `size_in_tiles` ids.
    pub fn sprite_for_tile(&self, tile_x: i32, tile_y: i32) -> i32 {
        if !self.valid || self.size_in_tiles.x <= 0 || self.size_in_tiles.y <= 0 {
            return -1;
        }
        let w = self.size_in_tiles.x;
        let h = self.size_in_tiles.y;
        self.sprite + tile_y.rem_euclid(h) * w + tile_x.rem_euclid(w)
    }
}

impl Default for Background {
    fn default() -> Self {
        Background::INVALID
    }
}
