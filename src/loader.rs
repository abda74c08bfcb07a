//! Level data loading
//!
//! Levels are read from a directory holding `catalog.json` (the tile, item and
//! background types every level shares) and one `<stem>.json` per level, where
//! the stem comes from [`LevelId::file_stem`]. Loading happens between ticks
//! only; a level that fails validation never reaches the simulation.
//!
//! All positions in level files are in tiles.

use std::path::{Path, PathBuf};

use glam::IVec2;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::consts::{MAX_TILE_COORD, TILE_SIZE};
use crate::sim::enemy::{EnemySpawn, EnemyType};
use crate::sim::geometry::{Direction, Position, Rect};
use crate::sim::hazard::{HazardSpawn, HazardType};
use crate::sim::level::{
    Catalog, Entrance, EntranceState, Exit, Level, LevelDesc, LevelError, LevelId, MovingPlatform,
    cell_count,
};
use crate::sim::tile::{Background, CatalogId, Item, ItemKind, NO_ID, Tile, TileFlags};

/// Name of the shared catalog file inside a level directory
pub const CATALOG_FILE: &str = "catalog.json";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read/write file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("item {index} in the catalog has unknown type {code}")]
    UnknownItemType { index: usize, code: i64 },
    #[error("{path} has no PlayerSpawn and {level:?} has no built-in spawn point")]
    MissingSpawn { path: PathBuf, level: LevelId },
    #[error("{path}: {field} value {value} is out of range")]
    CoordinateOutOfRange {
        path: PathBuf,
        field: &'static str,
        value: i32,
    },
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// Source of levels for the game loop
pub trait LevelProvider {
    fn load_level(&self, id: LevelId) -> Result<Level, LoadError>;
}

/// Read and parse a JSON file
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CatalogFile {
    #[serde(default)]
    backgrounds: Vec<BackgroundEntry>,
    tiles: Vec<TileEntry>,
    items: Vec<ItemEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BackgroundEntry {
    sprite: i32,
    sprite_width: i32,
    sprite_height: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TileEntry {
    sprite: i32,
    #[serde(default = "one")]
    sprite_count: i32,
    /// `TileFlags` bits; unknown bits are dropped
    #[serde(default)]
    flags: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemEntry {
    sprite: i32,
    #[serde(rename = "Type")]
    kind: i64,
    #[serde(default)]
    amount: u32,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LevelFile {
    width: i32,
    height: i32,
    items: LayerFile,
    /// Index into the catalog backgrounds
    #[serde(default)]
    background: Option<CatalogId>,
    #[serde(rename = "AABBs", default)]
    aabbs: Vec<AabbEntry>,
    #[serde(default)]
    player_spawn: Option<PointEntry>,
    #[serde(default)]
    moving_platforms: Option<Vec<PlatformEntry>>,
    #[serde(default)]
    entrances: Vec<EntranceEntry>,
    #[serde(default)]
    exits: Vec<PointEntry>,
    #[serde(default)]
    enemies: Vec<EnemyEntry>,
    #[serde(default)]
    hazards: Vec<HazardEntry>,
}

/// Per-cell id layers. `Background` is the tile layer the player collides with.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LayerFile {
    background: Vec<CatalogId>,
    foreground: Vec<CatalogId>,
    #[serde(default)]
    score: Option<Vec<CatalogId>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PointEntry {
    x: i32,
    y: i32,
}

impl PointEntry {
    fn to_pixels(self, path: &Path, field: &'static str) -> Result<Position, LoadError> {
        tile_to_pixels(path, field, self.x, self.y)
    }
}

fn check_range(path: &Path, field: &'static str, value: i32) -> Result<i32, LoadError> {
    if (-MAX_TILE_COORD..=MAX_TILE_COORD).contains(&value) {
        Ok(value)
    } else {
        Err(LoadError::CoordinateOutOfRange {
            path: path.to_path_buf(),
            field,
            value,
        })
    }
}

/// Tile coordinates from a level file to pixels
fn tile_to_pixels(
    path: &Path,
    field: &'static str,
    x: i32,
    y: i32,
) -> Result<Position, LoadError> {
    let x = check_range(path, field, x)?;
    let y = check_range(path, field, y)?;
    Ok(IVec2::new(x, y) * TILE_SIZE)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AabbEntry {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PlatformEntry {
    start: PointEntry,
    end: PointEntry,
    speed: i32,
    sprite: i32,
    sprite_count: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EntranceEntry {
    x: i32,
    y: i32,
    level: LevelId,
    #[serde(default)]
    complete: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnemyEntry {
    #[serde(rename = "Type")]
    kind: EnemyType,
    x: i32,
    y: i32,
    #[serde(default = "default_direction")]
    direction: Direction,
    health: Option<i32>,
    points: Option<u32>,
}

fn default_direction() -> Direction {
    Direction::Right
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HazardEntry {
    #[serde(rename = "Type")]
    kind: HazardEntryType,
    x: i32,
    y: i32,
    #[serde(default)]
    left: bool,
    #[serde(default)]
    top: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
enum HazardEntryType {
    AirTank,
    Laser,
    Thorn,
}

fn parse_catalog(file: CatalogFile) -> Result<Catalog, LoadError> {
    let tiles = file
        .tiles
        .iter()
        .map(|t| Tile::new(t.sprite, t.sprite_count, TileFlags::from_bits_truncate(t.flags)))
        .collect();
    let items = file
        .items
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let kind = ItemKind::from_code(entry.kind).ok_or(LoadError::UnknownItemType {
                index,
                code: entry.kind,
            })?;
            Ok(Item::new(entry.sprite, kind, entry.amount))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;
    let backgrounds = file
        .backgrounds
        .iter()
        .map(|b| Background::new(b.sprite, IVec2::new(b.sprite_width, b.sprite_height)))
        .collect();
    Ok(Catalog {
        tiles,
        items,
        backgrounds,
    })
}

/// Spawn point for levels whose files predate the `PlayerSpawn` field
fn builtin_spawn(id: LevelId) -> Option<Position> {
    match id {
        LevelId::MainLevel => Some(IVec2::new(32, 48)),
        LevelId::Level1 => Some(IVec2::new(4, 22) * TILE_SIZE),
        _ => None,
    }
}

/// Moving platforms for levels whose files do not list them
fn builtin_platforms(id: LevelId) -> Vec<MovingPlatform> {
    let tile = |x: i32, y: i32| IVec2::new(x, y) * TILE_SIZE;
    match id {
        LevelId::MainLevel => vec![
            MovingPlatform::new(tile(38, 7), tile(38, 22), 2, 616, 4),
            MovingPlatform::new(tile(11, 8), tile(7, 8), 2, 612, 4),
        ],
        LevelId::Level1 => vec![MovingPlatform::new(tile(36, 7), tile(36, 22), 2, 616, 4)],
        _ => Vec::new(),
    }
}

fn build_desc(
    id: LevelId,
    path: &Path,
    file: LevelFile,
    catalog: &Catalog,
) -> Result<LevelDesc, LoadError> {
    if cell_count(file.width, file.height).is_none() {
        return Err(LevelError::InvalidSize {
            width: file.width,
            height: file.height,
        }
        .into());
    }

    let player_spawn = match file.player_spawn {
        Some(point) => point.to_pixels(path, "PlayerSpawn")?,
        None => builtin_spawn(id).ok_or_else(|| LoadError::MissingSpawn {
            path: path.to_path_buf(),
            level: id,
        })?,
    };

    let background = match file.background {
        Some(index) => {
            let background = catalog.background(index);
            if !background.valid() {
                log::warn!("{}: unknown background {index}, drawing none", path.display());
            }
            background
        }
        None => Background::INVALID,
    };

    let moving_platforms = match file.moving_platforms {
        Some(entries) => entries
            .iter()
            .map(|p| {
                Ok(MovingPlatform::new(
                    p.start.to_pixels(path, "MovingPlatforms")?,
                    p.end.to_pixels(path, "MovingPlatforms")?,
                    check_range(path, "MovingPlatforms", p.speed)?,
                    p.sprite,
                    p.sprite_count,
                ))
            })
            .collect::<Result<Vec<_>, LoadError>>()?,
        None => builtin_platforms(id),
    };

    let aabbs = file
        .aabbs
        .iter()
        .map(|a| {
            Ok(Rect::new(
                tile_to_pixels(path, "AABBs", a.x, a.y)?,
                tile_to_pixels(path, "AABBs", a.w, a.h)?,
            ))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    let entrances = file
        .entrances
        .iter()
        .map(|e| {
            let state = if e.complete {
                EntranceState::Complete
            } else {
                EntranceState::Closed
            };
            let position = tile_to_pixels(path, "Entrances", e.x, e.y)?;
            Ok(Entrance::new(position, e.level, state))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    let exits = file
        .exits
        .iter()
        .map(|e| Ok(Exit::new(e.to_pixels(path, "Exits")?)))
        .collect::<Result<Vec<_>, LoadError>>()?;

    let enemies = file
        .enemies
        .iter()
        .map(|e| {
            let position = tile_to_pixels(path, "Enemies", e.x, e.y)?;
            let mut spawn = EnemySpawn::new(e.kind, position, e.direction);
            if let Some(health) = e.health {
                spawn.health = health;
            }
            if let Some(points) = e.points {
                spawn.points = points;
            }
            Ok(spawn)
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    let hazards = file
        .hazards
        .iter()
        .map(|h| {
            Ok(HazardSpawn {
                kind: match h.kind {
                    HazardEntryType::AirTank => HazardType::AirTank { top: h.top },
                    HazardEntryType::Laser => HazardType::Laser { left: h.left },
                    HazardEntryType::Thorn => HazardType::Thorn,
                },
                position: tile_to_pixels(path, "Hazards", h.x, h.y)?,
            })
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    // A missing score layer is empty; sized like the tile layer so a bad
    // tile layer is the one reported
    let score = file
        .items
        .score
        .unwrap_or_else(|| vec![NO_ID; file.items.background.len()]);

    Ok(LevelDesc {
        id,
        width: file.width,
        height: file.height,
        player_spawn,
        background,
        tiles: file.items.background,
        foreground: file.items.foreground,
        score,
        aabbs,
        moving_platforms,
        entrances,
        exits,
        enemies,
        hazards,
    })
}

/// Loads levels from JSON files in a directory
#[derive(Debug, Clone)]
pub struct JsonLevelProvider {
    dir: PathBuf,
    catalog: Catalog,
}

impl JsonLevelProvider {
    /// Open a level directory and read its catalog
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, LoadError> {
        let dir = dir.into();
        let path = dir.join(CATALOG_FILE);
        let catalog = read_json(&path).and_then(parse_catalog).inspect_err(|err| {
            log::error!("Failed to load catalog: {err}");
        })?;
        log::info!(
            "Loaded catalog from {} ({} tiles, {} items, {} backgrounds)",
            path.display(),
            catalog.tiles.len(),
            catalog.items.len(),
            catalog.backgrounds.len()
        );
        Ok(Self { dir, catalog })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn level_path(&self, id: LevelId) -> PathBuf {
        self.dir.join(format!("{}.json", id.file_stem()))
    }

    fn try_load(&self, id: LevelId) -> Result<Level, LoadError> {
        let path = self.level_path(id);
        let file: LevelFile = read_json(&path)?;
        let desc = build_desc(id, &path, file, &self.catalog)?;
        let level = Level::new(desc, self.catalog.clone())?;
        log::info!("Loaded level from '{}'", path.display());
        log::debug!("Level information: width={} height={}", level.width(), level.height());
        Ok(level)
    }
}

impl LevelProvider for JsonLevelProvider {
    fn load_level(&self, id: LevelId) -> Result<Level, LoadError> {
        self.try_load(id).inspect_err(|err| {
            log::error!("Failed to load {id:?}: {err}");
        })
    }
}
