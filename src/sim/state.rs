//! Game state and core simulation types
//!
//! Everything the tick reads or writes lives here, so two states built from
//! the same level and config and fed the same inputs stay identical.

use std::fmt::Write as _;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::enemy::Enemy;
use super::geometry::{Rect, camera_rect};
use super::hazard::Hazard;
use super::level::{Level, LevelId};
use super::object::Object;
use super::particle::{Explosion, Missile};
use super::player::Player;
use crate::loader::{LevelProvider, LoadError};
use crate::settings::SimConfig;

/// Seeded generator plus the seed it started from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    rng: Pcg32,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// RNG state
    pub rng_state: RngState,
    pub level: Level,
    pub player: Player,
    /// Live enemies, in spawn order
    pub enemies: Vec<Enemy>,
    /// Live hazards, in spawn order (beams after their lasers)
    pub hazards: Vec<Hazard>,
    pub missile: Missile,
    pub explosion: Explosion,
    /// Decorations for the renderer, rebuilt every tick
    #[serde(skip)]
    pub objects: Vec<Object>,
    pub score: u32,
    pub ammo: u32,
    pub lives: u32,
    /// Level the player is headed for; equals the current level unless an
    /// entrance or warp has been triggered
    pub entering_level: LevelId,
    pub cheats_enabled: bool,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Start a new game on `level`
    pub fn new(level: Level, config: &SimConfig) -> Self {
        let mut state = Self {
            rng_state: RngState::new(config.rng_seed),
            entering_level: level.id(),
            player: Player::new(level.player_spawn()),
            level,
            enemies: Vec::new(),
            hazards: Vec::new(),
            missile: Missile::default(),
            explosion: Explosion::default(),
            objects: Vec::new(),
            score: 0,
            ammo: config.starting_ammo,
            lives: config.starting_lives,
            cheats_enabled: config.cheats_enabled,
            next_id: 1,
        };
        state.spawn_entities();
        state
    }

    /// Load `id` through the provider and start a new game on it
    pub fn init(
        provider: &impl LevelProvider,
        id: LevelId,
        config: &SimConfig,
    ) -> Result<Self, LoadError> {
        let level = provider.load_level(id)?;
        log::info!(
            "Starting {:?} ({}x{} tiles, {} enemies, {} hazards)",
            id,
            level.width(),
            level.height(),
            level.enemy_spawns().len(),
            level.hazard_spawns().len()
        );
        Ok(Self::new(level, config))
    }

    /// Swap in a new level, keeping score, ammo and lives
    pub fn change_level(&mut self, level: Level) {
        log::info!("Entering {:?}", level.id());
        self.entering_level = level.id();
        self.player = Player::new(level.player_spawn());
        self.level = level;
        self.missile = Missile::default();
        self.explosion = Explosion::default();
        self.objects.clear();
        self.spawn_entities();
    }

    /// A level transition requested by an entrance or a warp, if any
    pub fn pending_level(&self) -> Option<LevelId> {
        (self.entering_level != self.level.id()).then_some(self.entering_level)
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn spawn_entities(&mut self) {
        let enemy_spawns = self.level.enemy_spawns().to_vec();
        self.enemies = enemy_spawns
            .iter()
            .map(|spawn| {
                let id = self.next_entity_id();
                Enemy::spawn(id, spawn, self.rng_state.rng())
            })
            .collect();

        let hazard_spawns = self.level.hazard_spawns().to_vec();
        self.hazards = hazard_spawns
            .iter()
            .map(|spawn| {
                let id = self.next_entity_id();
                Hazard::spawn(id, spawn, &self.level)
            })
            .collect();
    }

    /// Visible part of the level
    pub fn camera(&self) -> Rect {
        camera_rect(self.player.position, self.level.size_px())
    }

    /// Multi-line dump of the player and missile state
    pub fn debug_info(&self) -> String {
        let p = &self.player;
        let flag = |b: bool| if b { "true" } else { "false" };
        let mut out = String::new();
        let _ = writeln!(out, "player position: ({}, {})", p.position.x, p.position.y);
        let _ = writeln!(out, "player velocity: ({}, {})", p.velocity.x, p.velocity.y);
        let _ = writeln!(
            out,
            "player collide: {} {}",
            if p.collide_x { "x" } else { "_" },
            if p.collide_y { "y" } else { "_" }
        );
        let _ = writeln!(out, "player walking: {}", flag(p.walking));
        let _ = writeln!(out, "player jumping: {}", flag(p.jumping));
        let _ = writeln!(out, "player falling: {}", flag(p.falling));
        let _ = writeln!(out, "player shooting: {}", flag(p.shooting));
        let _ = writeln!(out, "missile alive: {}", flag(self.missile.alive));
        let _ = writeln!(
            out,
            "missile position: ({}, {})",
            self.missile.position.x, self.missile.position.y
        );
        out
    }
}
