//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only, integer pixel math
//! - Seeded RNG only
//! - Stable iteration order (entities in spawn order)
//! - No rendering, audio or file access

pub mod enemy;
pub mod geometry;
pub mod hazard;
pub mod level;
pub mod object;
pub mod particle;
pub mod physics;
pub mod player;
pub mod state;
pub mod tick;
pub mod tile;

pub use enemy::{Enemy, EnemyKind, EnemySpawn, EnemyType};
pub use geometry::{Direction, Position, Rect, Size, camera_rect, is_any_colliding};
pub use hazard::{Hazard, HazardKind, HazardSpawn, HazardType};
pub use level::{
    Backdrop, Catalog, Entrance, EntranceState, Exit, Level, LevelDesc, LevelError, LevelId,
    MovingPlatform,
};
pub use object::Object;
pub use particle::{Explosion, Missile};
pub use physics::{collides_enemy, player_on_platform, player_standing_on};
pub use player::Player;
pub use state::{GameState, RngState};
pub use tick::{TickInput, tick};
pub use tile::{Background, CatalogId, Item, ItemKind, NO_ID, Tile, TileFlags};
