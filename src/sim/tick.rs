//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. The stage order
//! is part of the behaviour: platforms carry the player before the player
//! moves, pickups see the post-move position, missiles hit enemies before the
//! enemies take their own step.

use glam::IVec2;

use super::geometry::{Direction, Rect};
use super::hazard::Hazard;
use super::level::EntranceState;
use super::object::Object;
use super::particle::Missile;
use super::physics::{self, collides_enemy, player_standing_on};
use super::player::Player;
use super::state::GameState;
use super::tile::ItemKind;
use crate::consts::{CHEAT_AMMO, CRYSTAL_SCORE, MAX_AMMO, MISSILE_PROBE_OFFSET_Y, PLAYER_WIDTH};
use crate::pixel_to_tile;

/// Input commands for a single tick (deterministic)
///
/// Plain fields are held keys; `_pressed` fields are true only on the tick
/// the key went down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub jump: bool,
    pub shoot: bool,

    pub left_pressed: bool,
    pub right_pressed: bool,
    pub up_pressed: bool,
    pub down_pressed: bool,
    pub jump_pressed: bool,
    pub shoot_pressed: bool,

    /// Debug toggles
    pub noclip_pressed: bool,
    pub godmode_pressed: bool,
    pub reverse_gravity_pressed: bool,
    pub ammo_pressed: bool,
    /// Skip to the next level
    pub warp_pressed: bool,
}

/// Advance the game state by one tick
pub fn tick(state: &mut GameState, game_tick: u32, input: &TickInput) {
    state.objects.clear();

    update_level(state, game_tick);
    update_player(state, input);
    update_items(state);
    update_missile(state);
    update_enemies(state);
    update_hazards(state);
}

fn update_level(state: &mut GameState, game_tick: u32) {
    let size = Player::size();

    for i in 0..state.level.moving_platforms.len() {
        // Decide before the platform moves, or a falling platform drops out
        // from under the player
        let standing = player_standing_on(&state.player.rect(), &state.level.moving_platforms[i]);
        let delta = state.level.moving_platforms[i].update();
        if standing {
            let carried = state.player.position + delta;
            if !state.level.collides_solid(carried, size) {
                state.player.position = carried;
            }
        }
    }
    for platform in &state.level.moving_platforms {
        state.objects.push(platform.object());
    }

    let player_rect = state.player.rect();
    for entrance in state.level.entrances.iter_mut() {
        if entrance.state != EntranceState::Complete {
            if player_rect.intersects(&Rect::tile_at(entrance.position)) {
                entrance.state = EntranceState::Open;
                state.entering_level = entrance.level;
            } else {
                entrance.state = EntranceState::Closed;
            }
        }
        entrance.update();
        state.objects.push(Object::still(entrance.position, entrance.sprite()));
    }

    let crystals_left = state.level.crystals_remaining();
    for exit in state.level.exits.iter_mut() {
        if crystals_left == 0 && !exit.open {
            log::debug!("All crystals collected, exit opening");
            exit.open = true;
        }
        exit.update();
        for (position, sprite) in exit.sprites() {
            state.objects.push(Object::still(position, sprite));
        }
    }

    let width = state.level.width();
    if let Some(backdrop) = state.level.backdrop.as_mut() {
        backdrop.update(game_tick, width, &mut state.objects);
    }
}

fn update_player(state: &mut GameState, input: &TickInput) {
    if state.pending_level().is_some() {
        return;
    }
    if state.cheats_enabled {
        apply_cheats(state, input);
    }
    physics::update_player(&mut state.player, &state.level, input);
}

fn apply_cheats(state: &mut GameState, input: &TickInput) {
    let player = &mut state.player;
    if input.noclip_pressed {
        player.noclip = !player.noclip;
        player.falling = true;
        player.velocity = IVec2::ZERO;
        log::debug!("Player noclip {}", if player.noclip { "ON" } else { "OFF" });
    }
    if input.ammo_pressed {
        state.ammo = CHEAT_AMMO;
        log::debug!("Extra ammo");
    }
    if input.godmode_pressed {
        player.godmode = !player.godmode;
        log::debug!("God mode {}", if player.godmode { "ON" } else { "OFF" });
        if !player.godmode && player.reverse_gravity {
            player.reverse_gravity = false;
            log::debug!("Reverse gravity OFF");
        }
    }
    if input.reverse_gravity_pressed && player.godmode {
        player.reverse_gravity = !player.reverse_gravity;
        log::debug!(
            "Reverse gravity {}",
            if player.reverse_gravity { "ON" } else { "OFF" }
        );
    }
    if input.warp_pressed {
        state.entering_level = state.level.id().next();
        log::debug!("Warp to {:?}", state.entering_level);
    }
}

fn update_items(state: &mut GameState) {
    let rect = state.player.rect();
    // The player covers at most four tiles; the same tile may be listed twice
    let corners = [
        (rect.left(), rect.top()),
        (rect.right() - 1, rect.top()),
        (rect.left(), rect.bottom() - 1),
        (rect.right() - 1, rect.bottom() - 1),
    ];

    for (x, y) in corners {
        let (tile_x, tile_y) = (pixel_to_tile(x), pixel_to_tile(y));
        let item = *state.level.item(tile_x, tile_y);
        if !item.valid() {
            continue;
        }
        match item.kind() {
            ItemKind::Crystal => {
                log::debug!("Player took a crystal");
                state.score += CRYSTAL_SCORE;
            }
            ItemKind::Ammo => {
                log::debug!("Player took ammo, amount: {}", item.amount());
                state.ammo = state.ammo.saturating_add(item.amount()).min(MAX_AMMO);
            }
            ItemKind::Score => {
                log::debug!("Player took a score item, amount: {}", item.amount());
                state.score += item.amount();
            }
        }
        state.level.remove_item(tile_x, tile_y);
    }
}

fn kill_enemy(state: &mut GameState, index: usize) {
    let enemy = state.enemies.remove(index);
    log::debug!("Enemy {} destroyed, +{} points", enemy.id, enemy.points);
    state.explosion.spawn(enemy.position);
    state.score += enemy.points;
}

fn update_missile(state: &mut GameState) {
    state.explosion.update();
    if state.missile.cooldown > 0 {
        state.missile.cooldown -= 1;
    }

    if state.missile.alive {
        let step = state.missile.direction.step();
        for _ in 0..state.missile.speed() {
            state.missile.position += step;
            let probe = state.missile.position + IVec2::new(0, MISSILE_PROBE_OFFSET_Y);

            if state.level.collides_solid(probe, Missile::size()) {
                state.missile.impact();
                state.explosion.spawn(state.missile.position);
                break;
            }

            if let Some(index) = collides_enemy(&state.enemies, probe, Missile::size()) {
                state.missile.impact();
                state.explosion.spawn(state.missile.position);
                state.enemies[index].health -= 1;
                if state.enemies[index].is_dead() {
                    kill_enemy(state, index);
                }
                break;
            }
        }

        if state.missile.alive {
            state.missile.age();
        }
    }

    if state.player.shooting && !state.explosion.alive && state.missile.can_fire() {
        if state.ammo > 0 {
            let offset = IVec2::new(PLAYER_WIDTH - 2, 0);
            let (position, direction) = match state.player.direction {
                Direction::Left => (state.player.position - offset, Direction::Left),
                _ => (state.player.position + offset, Direction::Right),
            };
            if state.missile.fire(position, direction) {
                state.ammo -= 1;
            }
        } else {
            log::debug!("Out of ammo");
        }
    }

    if state.explosion.alive {
        state.objects.push(state.explosion.object());
    }
    if state.missile.alive {
        state.objects.push(state.missile.object());
    }
}

fn update_enemies(state: &mut GameState) {
    let player_rect = state.player.rect();
    let mut i = 0;
    while i < state.enemies.len() {
        state.enemies[i].update(&state.level, &player_rect, state.rng_state.rng());
        if state.enemies[i].is_dead() {
            kill_enemy(state, i);
            continue;
        }
        for (position, sprite) in state.enemies[i].sprites() {
            state.objects.push(Object::still(position, sprite));
        }
        i += 1;
    }
}

fn update_hazards(state: &mut GameState) {
    let player_rect = state.player.rect();
    let visible = state.camera();

    let mut requests = Vec::new();
    for hazard in state.hazards.iter_mut() {
        if let Some(request) = hazard.update(&state.level, &player_rect, &visible) {
            requests.push(request);
        }
    }

    let orphaned: Vec<u32> = state
        .hazards
        .iter()
        .filter(|h| !h.is_alive())
        .filter_map(Hazard::parent)
        .collect();
    state.hazards.retain(Hazard::is_alive);
    for parent in orphaned {
        if let Some(laser) = state.hazards.iter_mut().find(|h| h.id == parent) {
            laser.set_child(None);
        }
    }

    for request in requests {
        let id = state.next_entity_id();
        if let Some(laser) = state.hazards.iter_mut().find(|h| h.id == request.parent) {
            laser.set_child(Some(id));
        }
        state.hazards.push(Hazard::beam(id, &request));
    }

    for hazard in &state.hazards {
        state.objects.push(Object::still(hazard.position, hazard.sprite()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SimConfig;
    use crate::sim::enemy::{EnemyKind, EnemySpawn, EnemyType};
    use crate::sim::hazard::{HazardKind, HazardSpawn, HazardType};
    use crate::sim::level::test_support::{catalog, desc_from_rows, level_from_rows};
    use crate::sim::level::{Entrance, Exit, Level, LevelDesc, LevelId, MovingPlatform};

    fn state_for(desc: LevelDesc) -> GameState {
        GameState::new(Level::new(desc, catalog()).unwrap(), &SimConfig::default())
    }

    fn state_from_rows(rows: &[&str], spawn: IVec2) -> GameState {
        let mut desc = desc_from_rows(LevelId::Level1, rows);
        desc.player_spawn = spawn;
        state_for(desc)
    }

    fn run(state: &mut GameState, ticks: u32, input: &TickInput) {
        for t in 0..ticks {
            tick(state, t, input);
        }
    }

    fn shoot() -> TickInput {
        TickInput {
            shoot: true,
            ..TickInput::default()
        }
    }

    /// Wide room; floor top at y=80
    const ROOM: [&str; 6] = [
        "####################",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "####################",
    ];

    #[test]
    fn test_falling_stops_at_floor_boundary() {
        let mut state = state_from_rows(
            &["........", "........", "........", "........", "########"],
            IVec2::new(32, 48),
        );
        state.player.falling = true;
        state.player.velocity = IVec2::new(0, 8);
        tick(&mut state, 0, &TickInput::default());
        assert!(state.player.collide_y);
        assert_eq!(state.player.position, IVec2::new(32, 48));
        assert!(!state.player.falling);
    }

    #[test]
    fn test_shoot_without_ammo() {
        let mut state = state_from_rows(&ROOM, IVec2::new(32, 64));
        state.ammo = 0;
        tick(&mut state, 0, &shoot());
        assert!(!state.missile.alive);
        assert_eq!(state.ammo, 0);
    }

    #[test]
    fn test_fire_missile_spends_ammo_once() {
        let mut state = state_from_rows(&ROOM, IVec2::new(32, 64));
        tick(&mut state, 0, &shoot());
        assert!(state.missile.alive);
        assert_eq!(state.ammo, 4);
        assert_eq!(state.missile.position, IVec2::new(32 + 10, 64));

        // Holding the trigger while it flies does nothing
        tick(&mut state, 1, &shoot());
        tick(&mut state, 2, &shoot());
        assert_eq!(state.ammo, 4);
    }

    #[test]
    fn test_fire_left() {
        let mut state = state_from_rows(&ROOM, IVec2::new(200, 64));
        state.player.direction = Direction::Left;
        tick(&mut state, 0, &shoot());
        assert_eq!(state.missile.direction, Direction::Left);
        assert_eq!(state.missile.position, IVec2::new(190, 64));
    }

    #[test]
    fn test_missile_wall_impact_and_cooldown() {
        let mut state = state_from_rows(&ROOM, IVec2::new(250, 64));
        tick(&mut state, 0, &shoot());
        assert!(state.missile.alive);

        let mut t = 1;
        while state.missile.alive {
            tick(&mut state, t, &TickInput::default());
            t += 1;
            assert!(t < 20);
        }
        assert!(state.explosion.alive);
        assert_eq!(state.missile.cooldown, crate::consts::MISSILE_COOLDOWN);
        // The missile box stopped just short of the wall at x=304
        assert_eq!(state.explosion.position.x + 16, 305);

        tick(&mut state, t, &shoot());
        assert!(!state.missile.alive);
        assert_eq!(state.ammo, 4);

        for _ in 0..10 {
            t += 1;
            tick(&mut state, t, &TickInput::default());
        }
        tick(&mut state, t + 1, &shoot());
        assert!(state.missile.alive);
        assert_eq!(state.ammo, 3);
    }

    #[test]
    fn test_missile_expires_in_open_space() {
        let rows = [".".repeat(80), ".".repeat(80), "#".repeat(80)];
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let mut state = state_from_rows(&rows, IVec2::new(16, 16));
        tick(&mut state, 0, &shoot());
        let mut alive_ticks = 0;
        let mut t = 1;
        while state.missile.alive {
            tick(&mut state, t, &TickInput::default());
            t += 1;
            alive_ticks += 1;
        }
        // One flight step per frame, including frame 0
        assert_eq!(alive_ticks, crate::consts::MISSILE_MAX_FRAME + 1);
        assert!(!state.explosion.alive);
        assert_eq!(state.missile.cooldown, 0);
    }

    #[test]
    fn test_missile_kills_enemy() {
        let mut desc = desc_from_rows(LevelId::Level1, &ROOM);
        desc.player_spawn = IVec2::new(32, 64);
        let mut spawn = EnemySpawn::new(EnemyType::Slime, IVec2::new(80, 64), Direction::Left);
        spawn.points = 300;
        desc.enemies.push(spawn);
        let mut state = state_for(desc);

        tick(&mut state, 0, &shoot());
        let mut t = 1;
        while state.missile.alive {
            tick(&mut state, t, &TickInput::default());
            t += 1;
            assert!(t < 10);
        }
        assert!(state.enemies.is_empty());
        assert_eq!(state.score, 300);
        assert!(state.explosion.alive);
        assert_eq!(state.explosion.position, IVec2::new(80, 64));
        let explosions = state
            .objects
            .iter()
            .filter(|o| crate::consts::EXPLOSION_SPRITES.contains(&o.sprite))
            .count();
        assert_eq!(explosions, 1);
    }

    #[test]
    fn test_missile_wounds_tough_enemy() {
        let mut desc = desc_from_rows(LevelId::Level1, &ROOM);
        desc.player_spawn = IVec2::new(32, 64);
        let mut spawn = EnemySpawn::new(EnemyType::Slime, IVec2::new(80, 64), Direction::Left);
        spawn.health = 2;
        desc.enemies.push(spawn);
        let mut state = state_for(desc);

        tick(&mut state, 0, &shoot());
        let mut t = 1;
        while state.missile.alive {
            tick(&mut state, t, &TickInput::default());
            t += 1;
        }
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.enemies[0].health, 1);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_enemy_at_zero_health_removed_in_enemy_stage() {
        let mut desc = desc_from_rows(LevelId::Level1, &ROOM);
        desc.enemies.push(EnemySpawn::new(
            EnemyType::Slime,
            IVec2::new(160, 64),
            Direction::Left,
        ));
        let mut state = state_for(desc);
        state.enemies[0].health = 0;
        tick(&mut state, 0, &TickInput::default());
        assert!(state.enemies.is_empty());
        assert_eq!(state.score, crate::consts::ENEMY_POINTS);
        assert_eq!(state.explosion.position, IVec2::new(160, 64));
    }

    #[test]
    fn test_item_pickups() {
        let mut state = state_from_rows(
            &["..........", ".*a$......", "##########"],
            IVec2::new(16, 16),
        );
        tick(&mut state, 0, &TickInput::default());
        assert_eq!(state.score, CRYSTAL_SCORE);
        assert_eq!(state.ammo, 5);
        assert!(!state.level.item(1, 1).valid());

        // Walk over the ammo and the score item
        let right = TickInput {
            right: true,
            ..TickInput::default()
        };
        run(&mut state, 10, &right);
        assert_eq!(state.ammo, 10);
        assert_eq!(state.score, CRYSTAL_SCORE + 250);

        // Walking back picks up nothing new
        let left = TickInput {
            left: true,
            ..TickInput::default()
        };
        run(&mut state, 10, &left);
        assert_eq!(state.ammo, 10);
        assert_eq!(state.score, CRYSTAL_SCORE + 250);
    }

    #[test]
    fn test_ammo_clamps_at_max() {
        let mut state = state_from_rows(&[".a..", "####"], IVec2::new(16, 0));
        state.ammo = 97;
        tick(&mut state, 0, &TickInput::default());
        assert_eq!(state.ammo, MAX_AMMO);
    }

    #[test]
    fn test_platform_carries_player() {
        let mut desc = desc_from_rows(LevelId::Level1, &ROOM);
        let platform = MovingPlatform::new(IVec2::new(64, 64), IVec2::new(128, 64), 2, 612, 4);
        desc.moving_platforms.push(platform);
        desc.player_spawn = IVec2::new(66, 48);
        let mut state = state_for(desc);

        run(&mut state, 5, &TickInput::default());
        assert_eq!(state.player.position.y, 48);
        assert_eq!(state.level.moving_platforms()[0].position.x, 74);
        assert_eq!(state.player.position.x, 66 + 10);
        assert!(!state.player.falling);
    }

    #[test]
    fn test_platform_does_not_push_into_wall() {
        let mut desc = desc_from_rows(
            LevelId::Level1,
            &[
                "##########",
                "#.....#..#",
                "#........#",
                "#........#",
                "##########",
            ],
        );
        // Rising platform with the player on it; a block sits overhead
        let platform = MovingPlatform::new(IVec2::new(96, 56), IVec2::new(96, 24), 2, 616, 4);
        desc.moving_platforms.push(platform);
        desc.player_spawn = IVec2::new(98, 40);
        let mut state = state_for(desc);

        // Carried up until the block overhead stops them
        run(&mut state, 4, &TickInput::default());
        assert_eq!(state.level.moving_platforms()[0].position.y, 48);
        assert_eq!(state.player.position.y, 32);

        // The platform keeps rising into the player, who is left behind and drops
        run(&mut state, 1, &TickInput::default());
        assert_eq!(state.level.moving_platforms()[0].position.y, 46);
        assert_eq!(state.player.position.y, 40);

        run(&mut state, 5, &TickInput::default());
        let p = state.player.rect();
        assert!(!state.level.collides_solid(p.position, p.size));
    }

    #[test]
    fn test_platform_objects_and_endpoint_invariant() {
        let mut desc = desc_from_rows(LevelId::Level1, &ROOM);
        desc.moving_platforms.push(MovingPlatform::new(
            IVec2::new(176, 64),
            IVec2::new(112, 64),
            3,
            612,
            4,
        ));
        let mut state = state_for(desc);
        for t in 0..200 {
            tick(&mut state, t, &TickInput::default());
            let p = &state.level.moving_platforms()[0];
            assert!((112..=176).contains(&p.position.x));
            assert!(state.objects.iter().any(|o| o.sprite == 612 && o.num_sprites == 4));
        }
    }

    #[test]
    fn test_entrance_opens_and_blocks_player() {
        let mut desc = desc_from_rows(LevelId::MainLevel, &ROOM);
        desc.player_spawn = IVec2::new(32, 64);
        desc.entrances.push(Entrance::new(
            IVec2::new(64, 64),
            LevelId::Level4,
            EntranceState::Closed,
        ));
        let mut state = state_for(desc);

        let right = TickInput {
            right: true,
            ..TickInput::default()
        };
        let mut t = 0;
        while state.pending_level().is_none() {
            tick(&mut state, t, &right);
            t += 1;
            assert!(t < 20);
        }
        assert_eq!(state.pending_level(), Some(LevelId::Level4));
        assert_eq!(state.level.entrances()[0].state, EntranceState::Open);

        // The player freezes while the transition is pending
        let frozen = state.player.position;
        run(&mut state, 3, &right);
        assert_eq!(state.player.position, frozen);
        assert_eq!(state.level.entrances()[0].counter, 2);
        assert_eq!(state.level.entrances()[0].sprite(), 14);
    }

    #[test]
    fn test_completed_entrance_stays_complete() {
        let mut desc = desc_from_rows(LevelId::MainLevel, &ROOM);
        desc.player_spawn = IVec2::new(64, 64);
        desc.entrances.push(Entrance::new(
            IVec2::new(64, 64),
            LevelId::Level4,
            EntranceState::Complete,
        ));
        let mut state = state_for(desc);
        tick(&mut state, 0, &TickInput::default());
        assert_eq!(state.pending_level(), None);
        assert!(state.objects.iter().any(|o| o.sprite == 15));
    }

    #[test]
    fn test_exit_opens_after_last_crystal() {
        let mut desc = desc_from_rows(
            LevelId::Level1,
            &["..........", ".*........", "##########"],
        );
        desc.player_spawn = IVec2::new(64, 16);
        desc.exits.push(Exit::new(IVec2::new(128, 0)));
        let mut state = state_for(desc);

        tick(&mut state, 0, &TickInput::default());
        assert!(!state.level.exits()[0].open);

        let left = TickInput {
            left: true,
            ..TickInput::default()
        };
        run(&mut state, 15, &left);
        assert_eq!(state.score, CRYSTAL_SCORE);
        tick(&mut state, 100, &TickInput::default());
        assert!(state.level.exits()[0].open);
        run(&mut state, 5, &TickInput::default());
        assert_eq!(state.level.exits()[0].counter, 3);
        assert!(state.objects.iter().any(|o| o.sprite == 584 + 3));
        assert!(state.objects.iter().any(|o| o.sprite == 588 + 3));
    }

    #[test]
    fn test_cheats() {
        let mut state = state_from_rows(&ROOM, IVec2::new(32, 64));
        let ammo = TickInput {
            ammo_pressed: true,
            ..TickInput::default()
        };
        tick(&mut state, 0, &ammo);
        assert_eq!(state.ammo, CHEAT_AMMO);

        // Reverse gravity only works in god mode
        let reverse = TickInput {
            reverse_gravity_pressed: true,
            ..TickInput::default()
        };
        tick(&mut state, 1, &reverse);
        assert!(!state.player.reverse_gravity);

        let god = TickInput {
            godmode_pressed: true,
            ..TickInput::default()
        };
        tick(&mut state, 2, &god);
        tick(&mut state, 3, &reverse);
        assert!(state.player.reverse_gravity);
        tick(&mut state, 4, &god);
        assert!(!state.player.godmode);
        assert!(!state.player.reverse_gravity);

        let noclip = TickInput {
            noclip_pressed: true,
            ..TickInput::default()
        };
        tick(&mut state, 5, &noclip);
        assert!(state.player.noclip);

        let warp = TickInput {
            warp_pressed: true,
            ..TickInput::default()
        };
        tick(&mut state, 6, &warp);
        assert_eq!(state.pending_level(), Some(LevelId::Level2));
    }

    #[test]
    fn test_cheats_can_be_disabled() {
        let mut desc = desc_from_rows(LevelId::Level1, &ROOM);
        desc.player_spawn = IVec2::new(32, 64);
        let level = Level::new(desc, catalog()).unwrap();
        let config = SimConfig {
            cheats_enabled: false,
            ..SimConfig::default()
        };
        let mut state = GameState::new(level, &config);
        let input = TickInput {
            ammo_pressed: true,
            noclip_pressed: true,
            ..TickInput::default()
        };
        tick(&mut state, 0, &input);
        assert_eq!(state.ammo, 5);
        assert!(!state.player.noclip);
    }

    fn laser_state() -> GameState {
        let mut desc = desc_from_rows(LevelId::Level1, &ROOM);
        desc.player_spawn = IVec2::new(200, 64);
        desc.hazards.push(HazardSpawn {
            kind: HazardType::Laser { left: false },
            position: IVec2::new(16, 64),
        });
        state_for(desc)
    }

    #[test]
    fn test_laser_keeps_one_beam() {
        let mut state = laser_state();
        for t in 0..200 {
            tick(&mut state, t, &TickInput::default());
            let beams = state
                .hazards
                .iter()
                .filter(|h| matches!(h.kind, HazardKind::LaserBeam { .. }))
                .count();
            assert!(beams <= 1);
        }
    }

    #[test]
    fn test_beam_death_frees_the_laser() {
        let mut state = laser_state();
        tick(&mut state, 0, &TickInput::default());
        assert_eq!(state.hazards.len(), 2);
        let beam_id = state.hazards[1].id;
        assert!(matches!(
            state.hazards[0].kind,
            HazardKind::Laser { child: Some(id), .. } if id == beam_id
        ));

        // Beam flies until it leaves or hits something
        let mut t = 1;
        while state.hazards.iter().any(|h| h.id == beam_id) {
            tick(&mut state, t, &TickInput::default());
            t += 1;
            assert!(t < 200);
        }
        // Either the laser is idle or it has already fired a fresh beam
        match state.hazards[0].kind {
            HazardKind::Laser { child: None, .. } => assert_eq!(state.hazards.len(), 1),
            HazardKind::Laser { child: Some(id), .. } => {
                assert_ne!(id, beam_id);
                assert_eq!(state.hazards[1].id, id);
            }
            _ => panic!("laser moved"),
        }
    }

    #[test]
    fn test_snake_patrols_and_is_drawn() {
        let mut desc = desc_from_rows(LevelId::Level1, &ROOM);
        desc.enemies.push(EnemySpawn::new(
            EnemyType::Snake,
            IVec2::new(160, 64),
            Direction::Right,
        ));
        let mut state = state_for(desc);
        run(&mut state, 300, &TickInput::default());
        let snake = &state.enemies[0];
        assert!((16..=288).contains(&snake.position.x));
        assert!(matches!(snake.kind, EnemyKind::Snake { .. }));
        assert!(state.objects.iter().any(|o| o.position == snake.position));
    }

    #[test]
    fn test_main_level_backdrop_objects() {
        let mut state = state_for(desc_from_rows(LevelId::MainLevel, &ROOM));
        tick(&mut state, 0, &TickInput::default());
        assert!(state.objects.iter().any(|o| o.sprite == 632));
        let other = state_for(desc_from_rows(LevelId::Level1, &ROOM));
        assert!(other.level.backdrop().is_none());
    }

    #[test]
    fn test_determinism() {
        let build = || {
            let mut desc = desc_from_rows(LevelId::Level1, &ROOM);
            desc.enemies.push(EnemySpawn::new(
                EnemyType::Hopper,
                IVec2::new(160, 64),
                Direction::Left,
            ));
            desc.enemies.push(EnemySpawn::new(
                EnemyType::Hopper,
                IVec2::new(96, 64),
                Direction::Right,
            ));
            state_for(desc)
        };
        let mut a = build();
        let mut b = build();
        let inputs = [
            TickInput {
                right: true,
                ..TickInput::default()
            },
            TickInput {
                jump: true,
                shoot: true,
                ..TickInput::default()
            },
            TickInput::default(),
        ];
        for t in 0..400 {
            let input = &inputs[(t as usize / 7) % inputs.len()];
            tick(&mut a, t, input);
            tick(&mut b, t, input);
        }
        assert_eq!(a.player, b.player);
        assert_eq!(a.enemies, b.enemies);
        assert_eq!(a.score, b.score);
        assert_eq!(a.objects, b.objects);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_input() -> impl Strategy<Value = TickInput> {
            (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(left, right, jump)| TickInput {
                left,
                right,
                jump,
                ..TickInput::default()
            })
        }

        proptest! {
            #[test]
            fn player_never_ends_inside_solid(
                solid in proptest::collection::vec(any::<bool>(), 8 * 4),
                inputs in proptest::collection::vec(arb_input(), 1..60),
            ) {
                // Random blocks in the middle rows, walls all around
                let mut rows = vec!["##########".to_string()];
                for r in 0..4 {
                    let mut row = String::from("#");
                    for c in 0..8 {
                        // Keep the spawn tile open
                        let open = r == 0 && c == 0;
                        row.push(if solid[r * 8 + c] && !open { '#' } else { '.' });
                    }
                    row.push('#');
                    rows.push(row);
                }
                rows.push("##########".to_string());
                let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
                let mut state = state_from_rows(&rows, IVec2::new(16, 16));

                for (t, input) in inputs.iter().enumerate() {
                    tick(&mut state, t as u32, input);
                    let p = state.player.rect();
                    prop_assert!(!state.level.collides_solid(p.position, p.size));
                }
            }

            #[test]
            fn ammo_never_exceeds_max(start in 0u32..=99, amount in 0u32..1000) {
                let mut catalog = catalog();
                catalog.items[1] = crate::sim::tile::Item::new(308, ItemKind::Ammo, amount);
                let mut desc = desc_from_rows(LevelId::Level1, &[".a..", "####"]);
                desc.player_spawn = IVec2::new(16, 0);
                let level = Level::new(desc, catalog).unwrap();
                let mut state = GameState::new(level, &SimConfig::default());
                state.ammo = start;
                tick(&mut state, 0, &TickInput::default());
                prop_assert_eq!(state.ammo, (start + amount).min(MAX_AMMO));
            }

            #[test]
            fn platform_stays_on_segment(
                start in -200i32..200,
                length in -150i32..150,
                speed in 1i32..9,
                ticks in 1usize..400,
            ) {
                let mut p = MovingPlatform::new(
                    IVec2::new(start, 0),
                    IVec2::new(start + length, 0),
                    speed,
                    612,
                    4,
                );
                let (lo, hi) = (start.min(start + length), start.max(start + length));
                for _ in 0..ticks {
                    let forward = p.forward;
                    p.update();
                    prop_assert!(p.position.x >= lo && p.position.x <= hi);
                    let at_end = p.position.x == if forward { start + length } else { start };
                    prop_assert_eq!(p.forward != forward, at_end);
                }
            }
        }
    }

    #[test]
    fn test_level_helper_spawns_player() {
        let level = level_from_rows(&["....", "####"]);
        let state = GameState::new(level, &SimConfig::default());
        assert_eq!(state.player.position, IVec2::new(16, 16));
    }
}
