//! Static level data plus the few pieces of level state that move
//!
//! A `Level` is built once at load time and validated on construction, so a
//! tick loop can never start on a malformed level. During play only the
//! update loop mutates it (moving platforms, entrances, exits, removed items).

use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::enemy::EnemySpawn;
use super::geometry::{Direction, Position, Rect, Size};
use super::hazard::HazardSpawn;
use super::object::Object;
use super::tile::{Background, CatalogId, Item, ItemKind, NO_ID, Tile};
use crate::consts::{MAX_TILE_COORD, TILE_SIZE};
use crate::pixel_to_tile;

/// Levels of the game, in episode order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelId {
    Intro,
    Finale,
    MainLevel,
    Level1,
    Level2,
    Level3,
    Level4,
    Level5,
    Level6,
    Level7,
    Level8,
    Level9,
    Level10,
    Level11,
    Level12,
    Level13,
    Level14,
    Level15,
    Level16,
}

impl LevelId {
    pub const ALL: [LevelId; 19] = [
        LevelId::Intro,
        LevelId::Finale,
        LevelId::MainLevel,
        LevelId::Level1,
        LevelId::Level2,
        LevelId::Level3,
        LevelId::Level4,
        LevelId::Level5,
        LevelId::Level6,
        LevelId::Level7,
        LevelId::Level8,
        LevelId::Level9,
        LevelId::Level10,
        LevelId::Level11,
        LevelId::Level12,
        LevelId::Level13,
        LevelId::Level14,
        LevelId::Level15,
        LevelId::Level16,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Next playable level, wrapping from the last level back to the main level
    pub fn next(self) -> Self {
        match self {
            LevelId::Level16 | LevelId::Intro | LevelId::Finale => LevelId::MainLevel,
            other => Self::ALL[other.index() + 1],
        }
    }

    /// File stem used by level providers
    pub fn file_stem(self) -> String {
        match self {
            LevelId::Intro => "intro".to_string(),
            LevelId::Finale => "finale".to_string(),
            LevelId::MainLevel => "mainlevel".to_string(),
            other => format!("level{}", other.index() - LevelId::MainLevel.index()),
        }
    }
}

/// A platform sliding back and forth between two points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovingPlatform {
    pub position: Position,
    /// true while travelling from start to end
    pub forward: bool,
    start: Position,
    end: Position,
    velocity_forward: IVec2,
    sprite_id: i32,
    num_sprites: i32,
}

impl MovingPlatform {
    pub fn new(
        start: Position,
        end: Position,
        speed: i32,
        sprite_id: i32,
        num_sprites: i32,
    ) -> Self {
        let speed = speed.abs();
        let velocity_forward = (end - start).signum() * speed;
        Self {
            position: start,
            forward: true,
            start,
            end,
            velocity_forward,
            sprite_id,
            num_sprites,
        }
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn end(&self) -> Position {
        self.end
    }

    pub fn sprite_id(&self) -> i32 {
        self.sprite_id
    }

    pub fn num_sprites(&self) -> i32 {
        self.num_sprites
    }

    /// Velocity for the current direction of travel
    pub fn velocity(&self) -> IVec2 {
        if self.forward {
            self.velocity_forward
        } else {
            -self.velocity_forward
        }
    }

    /// Platforms travelling back toward their start animate in reverse
    pub fn is_reverse(&self) -> bool {
        !self.forward
    }

    /// Advance one tick and return the distance actually moved.
    ///
    /// A step that would pass the target endpoint stops on it, and the
    /// direction flips on the tick the endpoint is reached.
    pub fn update(&mut self) -> IVec2 {
        let target = if self.forward { self.end } else { self.start };
        let velocity = self.velocity();
        let mut next = self.position + velocity;
        if velocity.x > 0 {
            next.x = next.x.min(target.x);
        } else if velocity.x < 0 {
            next.x = next.x.max(target.x);
        }
        if velocity.y > 0 {
            next.y = next.y.min(target.y);
        } else if velocity.y < 0 {
            next.y = next.y.max(target.y);
        }

        let delta = next - self.position;
        self.position = next;
        if self.position == target {
            self.forward = !self.forward;
        }
        delta
    }

    pub fn object(&self) -> Object {
        Object::new(self.position, self.sprite_id, self.num_sprites, self.is_reverse())
    }
}

const SPRITE_ENTRY_1: i32 = 12;
const SPRITE_ENTRY_DONE: i32 = 15;
const SPRITE_EXIT_TOP_LEFT_1: i32 = 584;
const SPRITE_EXIT_BOTTOM_LEFT_1: i32 = 588;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntranceState {
    Closed,
    Open,
    Complete,
}

/// Door on the main level leading into another level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrance {
    pub position: Position,
    pub level: LevelId,
    pub state: EntranceState,
    /// Door animation, 0 (shut) ..= 2 (fully open)
    pub counter: i32,
}

impl Entrance {
    pub fn new(position: Position, level: LevelId, state: EntranceState) -> Self {
        Self {
            position,
            level,
            state,
            counter: 0,
        }
    }

    pub fn update(&mut self) {
        match self.state {
            EntranceState::Closed => {
                if self.counter > 0 {
                    self.counter -= 1;
                }
            }
            EntranceState::Open => {
                if self.counter < 2 {
                    self.counter += 1;
                }
            }
            EntranceState::Complete => {}
        }
    }

    pub fn sprite(&self) -> i32 {
        match self.state {
            EntranceState::Complete => SPRITE_ENTRY_DONE,
            _ => SPRITE_ENTRY_1 + self.counter,
        }
    }
}

/// Two-tile-high exit door; opens once every crystal is collected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub position: Position,
    pub open: bool,
    pub counter: i32,
}

impl Exit {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            open: false,
            counter: 0,
        }
    }

    pub fn update(&mut self) {
        if self.open && self.counter < 3 {
            self.counter += 1;
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position, IVec2::new(TILE_SIZE, TILE_SIZE * 2))
    }

    pub fn sprites(&self) -> [(Position, i32); 2] {
        [
            (self.position, SPRITE_EXIT_TOP_LEFT_1 + self.counter),
            (
                self.position + IVec2::new(0, TILE_SIZE),
                SPRITE_EXIT_BOTTOM_LEFT_1 + self.counter,
            ),
        ]
    }
}

const SPRITE_EARTH: i32 = 632;
const SPRITE_MOON: i32 = 633;
const SPRITE_MOON_SMALL: i32 = 634;
const SPRITE_VOLCANO_EJECTA_L_1: i32 = 748;
const SPRITE_VOLCANO_EJECTA_R_1: i32 = 752;
const VOLCANO_ACTIVE_TICKS: u32 = 81;
const VOLCANO_IDLE_TICKS: u32 = 220;
const VOLCANO_TILE_X: i32 = 29;
const VOLCANO_TILE_Y: i32 = 2;

/// Animated sky of the main level: earth and moon drifting across the
/// horizon, and an erupting volcano. Positions are in half pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backdrop {
    earth_right: bool,
    earth_x: i32,
    moon_right: bool,
    moon_x: i32,
    volcano_active: bool,
    volcano_tick_start: u32,
}

impl Default for Backdrop {
    fn default() -> Self {
        Self {
            earth_right: false,
            earth_x: 128,
            moon_right: false,
            moon_x: 160,
            volcano_active: false,
            volcano_tick_start: 0,
        }
    }
}

impl Backdrop {
    pub fn earth_x(&self) -> i32 {
        self.earth_x / 2
    }

    pub fn moon_x(&self) -> i32 {
        self.moon_x / 2
    }

    pub fn volcano_active(&self) -> bool {
        self.volcano_active
    }

    /// Advance the backdrop and append its objects in draw order
    pub fn update(&mut self, game_tick: u32, level_width_tiles: i32, objects: &mut Vec<Object>) {
        let right_edge = level_width_tiles * TILE_SIZE;

        if self.earth_right {
            self.earth_x += 1;
            if self.earth_x / 2 + TILE_SIZE >= right_edge {
                self.earth_right = false;
            }
        } else {
            self.earth_x -= 1;
            if self.earth_x <= 32 {
                self.earth_right = true;
            }
        }

        if self.moon_right {
            self.moon_x += if self.earth_right { 2 } else { 1 };
            if self.moon_x > self.earth_x + 72 || self.moon_x / 2 + TILE_SIZE >= right_edge {
                self.moon_right = false;
            }
        } else {
            self.moon_x -= if self.earth_right { 1 } else { 2 };
            if self.moon_x < self.earth_x - 64 || self.moon_x <= 32 {
                self.moon_right = true;
            }
        }

        let elapsed = game_tick.wrapping_sub(self.volcano_tick_start);
        if self.volcano_active && elapsed >= VOLCANO_ACTIVE_TICKS {
            self.volcano_active = false;
            self.volcano_tick_start = game_tick;
        } else if !self.volcano_active && elapsed >= VOLCANO_IDLE_TICKS {
            self.volcano_active = true;
            self.volcano_tick_start = game_tick;
        }

        let earth = Object::still(IVec2::new(self.earth_x(), 0), SPRITE_EARTH);
        if self.moon_right {
            // Moon passes behind the earth
            objects.push(Object::still(IVec2::new(self.moon_x(), 0), SPRITE_MOON_SMALL));
            objects.push(earth);
        } else {
            objects.push(earth);
            objects.push(Object::still(IVec2::new(self.moon_x(), 0), SPRITE_MOON));
        }

        if self.volcano_active {
            let frame = ((game_tick.wrapping_sub(self.volcano_tick_start) / 3) % 4) as i32;
            objects.push(Object::still(
                IVec2::new(VOLCANO_TILE_X * TILE_SIZE, VOLCANO_TILE_Y * TILE_SIZE),
                SPRITE_VOLCANO_EJECTA_R_1 + frame,
            ));
            objects.push(Object::still(
                IVec2::new((VOLCANO_TILE_X + 1) * TILE_SIZE, VOLCANO_TILE_Y * TILE_SIZE),
                SPRITE_VOLCANO_EJECTA_L_1 + frame,
            ));
        }
    }
}

/// Tile, item and background types shared by every level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub tiles: Vec<Tile>,
    pub items: Vec<Item>,
    pub backgrounds: Vec<Background>,
}

impl Catalog {
    pub fn tile(&self, id: CatalogId) -> &Tile {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.tiles.get(i))
            .unwrap_or(&Tile::INVALID)
    }

    pub fn item(&self, id: CatalogId) -> &Item {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.items.get(i))
            .unwrap_or(&Item::INVALID)
    }

    pub fn background(&self, id: CatalogId) -> Background {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.backgrounds.get(i))
            .copied()
            .unwrap_or(Background::INVALID)
    }
}

/// Everything needed to build a `Level`
#[derive(Debug, Clone)]
pub struct LevelDesc {
    pub id: LevelId,
    pub width: i32,
    pub height: i32,
    pub player_spawn: Position,
    pub background: Background,
    /// Tile ids, row major
    pub tiles: Vec<CatalogId>,
    /// Foreground item ids (pickups), row major
    pub foreground: Vec<CatalogId>,
    /// Score layer item ids, row major
    pub score: Vec<CatalogId>,
    /// Extra collision boxes in pixels; boxes for solid tiles are always added
    pub aabbs: Vec<Rect>,
    pub moving_platforms: Vec<MovingPlatform>,
    pub entrances: Vec<Entrance>,
    pub exits: Vec<Exit>,
    pub enemies: Vec<EnemySpawn>,
    pub hazards: Vec<HazardSpawn>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level size {width}x{height} is empty or too large")]
    InvalidSize { width: i32, height: i32 },
    #[error("{layer} layer has {actual} cells, expected {expected}")]
    LayerSize {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{layer} layer references unknown id {id} at cell {index}")]
    UnknownId {
        layer: &'static str,
        id: CatalogId,
        index: usize,
    },
}

/// Number of cells in a `width` x `height` level, or `None` if either side is
/// empty, too large, or the product does not fit
pub fn cell_count(width: i32, height: i32) -> Option<usize> {
    let side = 1..=MAX_TILE_COORD;
    if !side.contains(&width) || !side.contains(&height) {
        return None;
    }
    width.checked_mul(height).map(|cells| cells as usize)
}

/// A loaded, validated level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    id: LevelId,
    width: i32,
    height: i32,
    player_spawn: Position,
    background: Background,
    catalog: Catalog,
    tiles: Vec<CatalogId>,
    foreground: Vec<CatalogId>,
    score: Vec<CatalogId>,
    aabbs: Vec<Rect>,
    platforms: Vec<Position>,
    pub(crate) moving_platforms: Vec<MovingPlatform>,
    pub(crate) entrances: Vec<Entrance>,
    pub(crate) exits: Vec<Exit>,
    pub(crate) backdrop: Option<Backdrop>,
    enemy_spawns: Vec<EnemySpawn>,
    hazard_spawns: Vec<HazardSpawn>,
}

impl Level {
    pub fn new(desc: LevelDesc, catalog: Catalog) -> Result<Self, LevelError> {
        let expected = cell_count(desc.width, desc.height).ok_or(LevelError::InvalidSize {
            width: desc.width,
            height: desc.height,
        })?;
        for (layer, ids, limit) in [
            ("tile", &desc.tiles, catalog.tiles.len()),
            ("foreground", &desc.foreground, catalog.items.len()),
            ("score", &desc.score, catalog.items.len()),
        ] {
            if ids.len() != expected {
                return Err(LevelError::LayerSize {
                    layer,
                    expected,
                    actual: ids.len(),
                });
            }
            if let Some((index, &id)) = ids
                .iter()
                .enumerate()
                .find(|&(_, &id)| id != NO_ID && (id < 0 || id as usize >= limit))
            {
                return Err(LevelError::UnknownId { layer, id, index });
            }
        }

        let mut aabbs = solid_tile_aabbs(desc.width, desc.height, &desc.tiles, &catalog);
        aabbs.extend(desc.aabbs);
        let platforms = solid_top_anchors(desc.width, &desc.tiles, &catalog);
        let backdrop = (desc.id == LevelId::MainLevel).then(Backdrop::default);

        Ok(Self {
            id: desc.id,
            width: desc.width,
            height: desc.height,
            player_spawn: desc.player_spawn,
            background: desc.background,
            catalog,
            tiles: desc.tiles,
            foreground: desc.foreground,
            score: desc.score,
            aabbs,
            platforms,
            moving_platforms: desc.moving_platforms,
            entrances: desc.entrances,
            exits: desc.exits,
            backdrop,
            enemy_spawns: desc.enemies,
            hazard_spawns: desc.hazards,
        })
    }

    pub fn id(&self) -> LevelId {
        self.id
    }

    /// Width in tiles
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in tiles
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn size_px(&self) -> Size {
        IVec2::new(self.width, self.height) * TILE_SIZE
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(IVec2::ZERO, self.size_px())
    }

    pub fn player_spawn(&self) -> Position {
        self.player_spawn
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn aabbs(&self) -> &[Rect] {
        &self.aabbs
    }

    /// Pixel positions of the static one-way platforms
    pub fn platforms(&self) -> &[Position] {
        &self.platforms
    }

    pub fn moving_platforms(&self) -> &[MovingPlatform] {
        &self.moving_platforms
    }

    pub fn entrances(&self) -> &[Entrance] {
        &self.entrances
    }

    pub fn exits(&self) -> &[Exit] {
        &self.exits
    }

    pub fn backdrop(&self) -> Option<&Backdrop> {
        self.backdrop.as_ref()
    }

    pub fn enemy_spawns(&self) -> &[EnemySpawn] {
        &self.enemy_spawns
    }

    pub fn hazard_spawns(&self) -> &[HazardSpawn] {
        &self.hazard_spawns
    }

    fn index(&self, tile_x: i32, tile_y: i32) -> Option<usize> {
        if tile_x >= 0 && tile_x < self.width && tile_y >= 0 && tile_y < self.height {
            Some((tile_y * self.width + tile_x) as usize)
        } else {
            None
        }
    }

    pub fn tile_id(&self, tile_x: i32, tile_y: i32) -> CatalogId {
        self.index(tile_x, tile_y).map_or(NO_ID, |i| self.tiles[i])
    }

    pub fn tile(&self, tile_x: i32, tile_y: i32) -> &Tile {
        self.catalog.tile(self.tile_id(tile_x, tile_y))
    }

    /// Foreground (pickup) item at a tile
    pub fn item(&self, tile_x: i32, tile_y: i32) -> &Item {
        let id = self.index(tile_x, tile_y).map_or(NO_ID, |i| self.foreground[i]);
        self.catalog.item(id)
    }

    pub fn score_item(&self, tile_x: i32, tile_y: i32) -> &Item {
        let id = self.index(tile_x, tile_y).map_or(NO_ID, |i| self.score[i]);
        self.catalog.item(id)
    }

    /// Clear the foreground item at a tile. Missing items are ignored.
    pub fn remove_item(&mut self, tile_x: i32, tile_y: i32) {
        if let Some(i) = self.index(tile_x, tile_y) {
            self.foreground[i] = NO_ID;
        }
    }

    pub fn crystals_remaining(&self) -> usize {
        self.foreground
            .iter()
            .filter(|&&id| {
                let item = self.catalog.item(id);
                item.valid() && item.kind() == ItemKind::Crystal
            })
            .count()
    }

    /// True if the rectangle overlaps solid geometry.
    ///
    /// Tiles are sampled at the four corners only, so for tile-exact results
    /// the rectangle must be at most one tile in each dimension. The static
    /// boxes are tested in full.
    pub fn collides_solid(&self, position: Position, size: Size) -> bool {
        let left = pixel_to_tile(position.x);
        let right = pixel_to_tile(position.x + size.x - 1);
        let top = pixel_to_tile(position.y);
        let bottom = pixel_to_tile(position.y + size.y - 1);
        if self.tile(left, top).is_solid()
            || self.tile(right, top).is_solid()
            || self.tile(left, bottom).is_solid()
            || self.tile(right, bottom).is_solid()
        {
            return true;
        }
        let rect = Rect::new(position, size);
        self.aabbs.iter().any(|aabb| aabb.intersects(&rect))
    }
}

impl Level {
    /// Line-of-sight box for an actor looking in `direction`.
    ///
    /// Starts as an empty strip on the facing side and grows one tile at a
    /// time until the next tile would hit solid geometry or leave the level.
    pub fn detection_rect(&self, position: Position, size: Size, direction: Direction) -> Rect {
        let bounds = self.bounds();
        let (mut rect, grow) = match direction {
            Direction::Right => (
                Rect::from_xywh(position.x + TILE_SIZE, position.y, 0, size.y),
                Rect::from_xywh(0, 0, TILE_SIZE, 0),
            ),
            Direction::Left => (
                Rect::from_xywh(position.x, position.y, 0, size.y),
                Rect::from_xywh(-TILE_SIZE, 0, TILE_SIZE, 0),
            ),
            Direction::Down => (
                Rect::from_xywh(position.x, position.y + TILE_SIZE, size.x, 0),
                Rect::from_xywh(0, 0, 0, TILE_SIZE),
            ),
            Direction::Up => (
                Rect::from_xywh(position.x, position.y, size.x, 0),
                Rect::from_xywh(0, -TILE_SIZE, 0, TILE_SIZE),
            ),
        };
        loop {
            let next = Rect::new(rect.position + grow.position, rect.size + grow.size);
            if self.collides_solid(next.position, next.size) || !next.is_inside(&bounds) {
                return rect;
            }
            rect = next;
        }
    }
}

/// One box per horizontal run of solid tiles
fn solid_tile_aabbs(width: i32, height: i32, tiles: &[CatalogId], catalog: &Catalog) -> Vec<Rect> {
    let mut aabbs = Vec::new();
    for y in 0..height {
        let mut run_start: Option<i32> = None;
        for x in 0..=width {
            let solid = x < width && catalog.tile(tiles[(y * width + x) as usize]).is_solid();
            match (solid, run_start) {
                (true, None) => run_start = Some(x),
                (false, Some(start)) => {
                    aabbs.push(Rect::from_xywh(
                        start * TILE_SIZE,
                        y * TILE_SIZE,
                        (x - start) * TILE_SIZE,
                        TILE_SIZE,
                    ));
                    run_start = None;
                }
                _ => {}
            }
        }
    }
    aabbs
}

fn solid_top_anchors(width: i32, tiles: &[CatalogId], catalog: &Catalog) -> Vec<Position> {
    tiles
        .iter()
        .enumerate()
        .filter(|&(_, &id)| catalog.tile(id).is_solid_top())
        .map(|(i, _)| {
            let i = i as i32;
            IVec2::new(i % width, i / width) * TILE_SIZE
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Small hand-built levels for unit tests

    use super::*;
    use crate::sim::tile::TileFlags;

    pub const AIR: CatalogId = NO_ID;
    pub const SOLID: CatalogId = 0;
    pub const SOLID_TOP: CatalogId = 1;

    pub const CRYSTAL: CatalogId = 0;
    pub const AMMO: CatalogId = 1;
    pub const SCORE: CatalogId = 2;

    pub fn catalog() -> Catalog {
        Catalog {
            tiles: vec![
                Tile::new(1, 1, TileFlags::SOLID),
                Tile::new(2, 1, TileFlags::SOLID_TOP),
            ],
            items: vec![
                Item::new(624, ItemKind::Crystal, 0),
                Item::new(308, ItemKind::Ammo, 5),
                Item::new(700, ItemKind::Score, 250),
            ],
            backgrounds: vec![],
        }
    }

    /// Parse a level from rows of chars: '#' solid, '=' one-way platform,
    /// '*' crystal, 'a' ammo, '$' score item, anything else air
    pub fn desc_from_rows(id: LevelId, rows: &[&str]) -> LevelDesc {
        let width = rows[0].len() as i32;
        let height = rows.len() as i32;
        let mut tiles = Vec::new();
        let mut foreground = Vec::new();
        for row in rows {
            assert_eq!(row.len() as i32, width);
            for c in row.chars() {
                tiles.push(match c {
                    '#' => SOLID,
                    '=' => SOLID_TOP,
                    _ => AIR,
                });
                foreground.push(match c {
                    '*' => CRYSTAL,
                    'a' => AMMO,
                    '$' => SCORE,
                    _ => NO_ID,
                });
            }
        }
        LevelDesc {
            id,
            width,
            height,
            player_spawn: IVec2::new(16, 16),
            background: Background::INVALID,
            score: vec![NO_ID; tiles.len()],
            tiles,
            foreground,
            aabbs: Vec::new(),
            moving_platforms: Vec::new(),
            entrances: Vec::new(),
            exits: Vec::new(),
            enemies: Vec::new(),
            hazards: Vec::new(),
        }
    }

    pub fn level_from_rows(rows: &[&str]) -> Level {
        Level::new(desc_from_rows(LevelId::Level1, rows), catalog()).expect("valid test level")
    }
}
