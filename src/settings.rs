//! Simulation configuration
//!
//! Stored as JSON next to the level data. A missing or unreadable file falls
//! back to the defaults, so a fresh checkout runs without any setup.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::loader::{LoadError, read_json};

/// Tunables that are not part of the level data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Ammo at the start of a game
    pub starting_ammo: u32,
    /// Lives at the start of a game
    pub starting_lives: u32,
    /// Seed for the simulation RNG
    pub rng_seed: u64,
    /// Honour the debug toggles in the input (noclip, godmode, ammo, warp)
    pub cheats_enabled: bool,
    /// Fixed update rate used by the runner
    pub ticks_per_second: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            starting_ammo: 5,
            starting_lives: 3,
            rng_seed: 0,
            cheats_enabled: true,
            ticks_per_second: 17,
        }
    }
}

impl SimConfig {
    /// Load from a JSON file, or use the defaults if it cannot be read
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(err) => {
                log::info!("Using default config ({err})");
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, LoadError> {
        read_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }
}
