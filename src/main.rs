//! Cavern Sim entry point
//!
//! Headless runner: loads a level directory, drives the simulation with a
//! scripted input pattern and prints the debug dump at the end.
//!
//! Usage: `cavern-sim <level-dir> [level] [ticks] [config.json]`

use std::path::PathBuf;
use std::process::ExitCode;

use cavern_sim::sim::{GameState, LevelId, TickInput, tick};
use cavern_sim::{JsonLevelProvider, LevelProvider, SimConfig};

/// Parse a level name such as `mainlevel`, `level3` or `intro`
fn parse_level(name: &str) -> Option<LevelId> {
    LevelId::ALL
        .iter()
        .copied()
        .find(|id| id.file_stem().eq_ignore_ascii_case(name))
}

/// Walk right, hop every couple of seconds and fire now and then
fn scripted_input(game_tick: u32) -> TickInput {
    let phase = game_tick % 68;
    TickInput {
        right: phase < 50,
        left: (50..60).contains(&phase),
        jump: phase == 20 || phase == 21,
        jump_pressed: phase == 20,
        shoot: phase == 40,
        shoot_pressed: phase == 40,
        ..TickInput::default()
    }
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Cavern Sim (headless) starting...");

    let mut args = std::env::args().skip(1);
    let Some(dir) = args.next().map(PathBuf::from) else {
        eprintln!("usage: cavern-sim <level-dir> [level] [ticks] [config.json]");
        return ExitCode::FAILURE;
    };
    let level = match args.next() {
        Some(name) => match parse_level(&name) {
            Some(id) => id,
            None => {
                eprintln!("unknown level '{name}'");
                return ExitCode::FAILURE;
            }
        },
        None => LevelId::MainLevel,
    };
    let ticks: u32 = match args.next().map(|t| t.parse()) {
        Some(Ok(ticks)) => ticks,
        Some(Err(err)) => {
            eprintln!("bad tick count: {err}");
            return ExitCode::FAILURE;
        }
        None => 170,
    };
    let config = args
        .next()
        .map(|path| SimConfig::load(&PathBuf::from(path)))
        .unwrap_or_default();

    let provider = match JsonLevelProvider::new(&dir) {
        Ok(provider) => provider,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let mut state = match GameState::init(&provider, level, &config) {
        Ok(state) => state,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "Running {} ticks at {} ticks/s (seed {})",
        ticks,
        config.ticks_per_second,
        config.rng_seed
    );

    for game_tick in 0..ticks {
        tick(&mut state, game_tick, &scripted_input(game_tick));

        if let Some(next) = state.pending_level() {
            match provider.load_level(next) {
                Ok(level) => state.change_level(level),
                Err(_) => {
                    // Already logged by the provider; stay where we are
                    state.entering_level = state.level.id();
                }
            }
        }
    }

    println!("level: {:?}", state.level.id());
    println!("score: {} ammo: {} lives: {}", state.score, state.ammo, state.lives);
    print!("{}", state.debug_info());
    ExitCode::SUCCESS
}
