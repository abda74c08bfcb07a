//! Enemies and their per-variant state machines

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{Direction, Position, Rect, Size};
use super::level::Level;
use crate::consts::{ENEMY_POINTS, TILE_SIZE};

const SPRITE_BIGFOOT_HEAD_R_1: i32 = 1020;
const SPRITE_BIGFOOT_HEAD_L_1: i32 = 1028;
const SPRITE_HOPPER_1: i32 = 496;
const SPRITE_SLIME_R_1: i32 = 916;
const SPRITE_SLIME_L_1: i32 = 920;
const SPRITE_SLIME_U_1: i32 = 924;
const SPRITE_SLIME_D_1: i32 = 928;
const SPRITE_SNAKE_WALK_L_1: i32 = 160;
const SPRITE_SNAKE_PAUSE_1: i32 = 169;
const SPRITE_SNAKE_WALK_R_1: i32 = 176;
const SPRITE_SPIDER_DOWN_1: i32 = 128;
const SPRITE_SPIDER_UP_1: i32 = 136;

/// Hopper changes direction on its own every 1 to 19 seconds
const HOPPER_REVERSE_TICKS: i32 = 17;
const HOPPER_REVERSE_MAX_SECONDS: i32 = 19;

const SNAKE_WALK_TICKS: u32 = 100;
const SNAKE_PAUSE_TICKS: u32 = 14;

/// Enemy type as written in level data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyType {
    Bigfoot,
    Hopper,
    Slime,
    Snake,
    Spider,
}

/// Where and how an enemy starts in a level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub kind: EnemyType,
    pub position: Position,
    pub direction: Direction,
    pub health: i32,
    pub points: u32,
}

impl EnemySpawn {
    pub fn new(kind: EnemyType, position: Position, direction: Direction) -> Self {
        Self {
            kind,
            position,
            direction,
            health: 1,
            points: ENEMY_POINTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Two tiles tall; walks, and runs at the player once it sees them
    Bigfoot { left: bool, running: bool, frame: u32 },
    /// Bounces along, reversing at random intervals
    Hopper {
        left: bool,
        frame: i32,
        next_reverse: i32,
    },
    Slime { direction: Direction, frame: u32 },
    Snake { left: bool, paused: bool, frame: u32 },
    /// Climbs up and down between ceiling and floor
    Spider { up: bool, frame: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub position: Position,
    pub size: Size,
    pub health: i32,
    pub points: u32,
    pub kind: EnemyKind,
}

fn random_reverse_ticks(rng: &mut impl Rng) -> i32 {
    HOPPER_REVERSE_TICKS * (1 + rng.random_range(0..HOPPER_REVERSE_MAX_SECONDS))
}

impl Enemy {
    pub fn spawn(id: u32, spawn: &EnemySpawn, rng: &mut impl Rng) -> Self {
        let left = spawn.direction == Direction::Left;
        let (size, kind) = match spawn.kind {
            EnemyType::Bigfoot => (
                IVec2::new(TILE_SIZE, TILE_SIZE * 2),
                EnemyKind::Bigfoot {
                    left,
                    running: false,
                    frame: 0,
                },
            ),
            EnemyType::Hopper => (
                IVec2::splat(TILE_SIZE),
                EnemyKind::Hopper {
                    left,
                    frame: 0,
                    next_reverse: random_reverse_ticks(rng),
                },
            ),
            EnemyType::Slime => (
                IVec2::splat(TILE_SIZE),
                EnemyKind::Slime {
                    direction: spawn.direction,
                    frame: 0,
                },
            ),
            EnemyType::Snake => (
                IVec2::splat(TILE_SIZE),
                EnemyKind::Snake {
                    left,
                    paused: false,
                    frame: 0,
                },
            ),
            EnemyType::Spider => (
                IVec2::splat(TILE_SIZE),
                EnemyKind::Spider {
                    up: spawn.direction == Direction::Up,
                    frame: 0,
                },
            ),
        };
        Self {
            id,
            position: spawn.position,
            size,
            health: spawn.health,
            points: spawn.points,
            kind,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position, self.size)
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Walker has hit a wall or is about to step off a ledge
    pub fn should_reverse(&self, level: &Level) -> bool {
        let foot = IVec2::new(1, self.size.y);
        level.collides_solid(self.position, self.size)
            || !level.collides_solid(self.position + IVec2::new(1, 1), foot)
            || !level.collides_solid(self.position + IVec2::new(self.size.x - 1, 1), foot)
    }

    /// Boxes in which the enemy notices the player
    pub fn detection_rects(&self, level: &Level) -> Vec<Rect> {
        match self.kind {
            EnemyKind::Bigfoot { left, .. } => {
                let direction = if left { Direction::Left } else { Direction::Right };
                vec![level.detection_rect(self.position, self.size, direction)]
            }
            _ => Vec::new(),
        }
    }

    pub fn update(&mut self, level: &Level, player_rect: &Rect, rng: &mut impl Rng) {
        match self.kind {
            EnemyKind::Bigfoot {
                mut left,
                mut running,
                mut frame,
            } => {
                frame = (frame + 1) % 8;
                let speed = if running { 4 } else { 2 };
                let step = IVec2::new(if left { -speed } else { speed }, 0);
                self.position += step;
                if self.should_reverse(level) {
                    left = !left;
                    running = false;
                    self.position -= step;
                }
                let facing = if left { Direction::Left } else { Direction::Right };
                if level
                    .detection_rect(self.position, self.size, facing)
                    .intersects(player_rect)
                {
                    running = true;
                }
                self.kind = EnemyKind::Bigfoot {
                    left,
                    running,
                    frame,
                };
            }
            EnemyKind::Hopper {
                mut left,
                mut frame,
                mut next_reverse,
            } => {
                frame += if left { -1 } else { 1 };
                if frame == 18 {
                    frame = 0;
                } else if frame <= 0 {
                    frame = 17;
                }
                let step = IVec2::new(if left { -4 } else { 4 }, 0);
                self.position += step;
                if next_reverse == 0 || self.should_reverse(level) {
                    left = !left;
                    self.position -= step;
                    next_reverse = random_reverse_ticks(rng);
                }
                next_reverse -= 1;
                self.kind = EnemyKind::Hopper {
                    left,
                    frame,
                    next_reverse,
                };
            }
            EnemyKind::Slime {
                direction,
                mut frame,
            } => {
                frame = (frame + 1) % 4;
                self.kind = EnemyKind::Slime { direction, frame };
            }
            EnemyKind::Snake {
                mut left,
                mut paused,
                mut frame,
            } => {
                frame += 1;
                if paused {
                    if frame == SNAKE_PAUSE_TICKS {
                        paused = false;
                        frame = 0;
                    }
                } else if frame == SNAKE_WALK_TICKS {
                    paused = true;
                    frame = 0;
                }
                if !paused {
                    let step = IVec2::new(if left { -2 } else { 2 }, 0);
                    self.position += step;
                    if self.should_reverse(level) {
                        left = !left;
                        self.position -= step;
                    }
                }
                self.kind = EnemyKind::Snake {
                    left,
                    paused,
                    frame,
                };
            }
            EnemyKind::Spider { mut up, mut frame } => {
                frame = (frame + 1) % 8;
                let step = IVec2::new(0, if up { -2 } else { 2 });
                self.position += step;
                if level.collides_solid(self.position, self.size) {
                    up = !up;
                    self.position -= step;
                }
                self.kind = EnemyKind::Spider { up, frame };
            }
        }
    }

    /// Sprites to draw, with their positions
    pub fn sprites(&self) -> Vec<(Position, i32)> {
        match self.kind {
            EnemyKind::Bigfoot {
                left,
                running,
                frame,
            } => {
                let head = if left {
                    SPRITE_BIGFOOT_HEAD_L_1
                } else {
                    SPRITE_BIGFOOT_HEAD_R_1
                };
                let frame = (if running { frame % 4 } else { frame / 2 }) as i32;
                vec![
                    (self.position, head + frame),
                    (self.position + IVec2::new(0, TILE_SIZE), head + 4 + frame),
                ]
            }
            EnemyKind::Hopper { frame, .. } => vec![(self.position, SPRITE_HOPPER_1 + frame)],
            EnemyKind::Slime { direction, frame } => {
                let base = match direction {
                    Direction::Right => SPRITE_SLIME_R_1,
                    Direction::Left => SPRITE_SLIME_L_1,
                    Direction::Up => SPRITE_SLIME_U_1,
                    Direction::Down => SPRITE_SLIME_D_1,
                };
                vec![(self.position, base + frame as i32)]
            }
            EnemyKind::Snake {
                left,
                paused,
                frame,
            } => {
                let (base, frames) = if paused {
                    (SPRITE_SNAKE_PAUSE_1, 7)
                } else if left {
                    (SPRITE_SNAKE_WALK_L_1, 9)
                } else {
                    (SPRITE_SNAKE_WALK_R_1, 9)
                };
                vec![(self.position, base + (frame % frames) as i32)]
            }
            EnemyKind::Spider { up, frame } => {
                let base = if up {
                    SPRITE_SPIDER_UP_1
                } else {
                    SPRITE_SPIDER_DOWN_1
                };
                vec![(self.position, base + frame as i32)]
            }
        }
    }
}
