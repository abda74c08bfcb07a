//! Hazards: stationary traps and the projectiles they fire
//!
//! A laser and its beam refer to each other by entity id. The beam keeps its
//! parent's id; the laser keeps its live beam's id in `child` and only fires
//! while that slot is empty. The hazard pass in the tick clears the slot when
//! the beam dies.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Direction, Position, Rect, Size};
use super::level::Level;
use crate::consts::TILE_SIZE;

const SPRITE_AIR_TANK_TOP_1: i32 = 216;
const SPRITE_AIR_TANK_BOTTOM: i32 = 218;
const SPRITE_LASER_R: i32 = 581;
const SPRITE_LASER_L: i32 = 582;
const SPRITE_LASER_BEAM_1: i32 = 578;
const SPRITE_LASER_BEAM_2: i32 = 579;
const SPRITE_THORN_1: i32 = 241;

const THORN_MAX_FRAME: u32 = 4;
const BEAM_SPEED: i32 = 4;
/// Beam spawn point relative to its laser
const BEAM_OFFSET_X: i32 = 12;
const BEAM_OFFSET_Y: i32 = -1;

/// Hazard type as written in level data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardType {
    /// Upper half of a tank animates, lower half is static
    AirTank { top: bool },
    Laser { left: bool },
    Thorn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardSpawn {
    pub kind: HazardType,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardKind {
    AirTank { top: bool, frame: u32 },
    /// Fires a beam along its line of sight
    Laser { left: bool, child: Option<u32> },
    LaserBeam {
        left: bool,
        frame: u32,
        parent: u32,
        alive: bool,
    },
    /// Thrusts up while the player is above
    Thorn { frame: u32 },
}

/// Something a hazard asks the tick to create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeamRequest {
    pub parent: u32,
    pub position: Position,
    pub left: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: u32,
    pub position: Position,
    /// Line of sight, fixed at spawn. Empty for hazards that do not look.
    pub detection: Rect,
    pub kind: HazardKind,
}

impl Hazard {
    pub fn spawn(id: u32, spawn: &HazardSpawn, level: &Level) -> Self {
        let size = Self::size();
        let (kind, detection) = match spawn.kind {
            HazardType::AirTank { top } => (HazardKind::AirTank { top, frame: 0 }, Rect::default()),
            HazardType::Laser { left } => {
                let facing = if left { Direction::Left } else { Direction::Right };
                (
                    HazardKind::Laser { left, child: None },
                    level.detection_rect(spawn.position, size, facing),
                )
            }
            HazardType::Thorn => (
                HazardKind::Thorn { frame: 0 },
                level.detection_rect(spawn.position, size, Direction::Up),
            ),
        };
        Self {
            id,
            position: spawn.position,
            detection,
            kind,
        }
    }

    pub fn beam(id: u32, request: &BeamRequest) -> Self {
        Self {
            id,
            position: request.position,
            detection: Rect::default(),
            kind: HazardKind::LaserBeam {
                left: request.left,
                frame: 0,
                parent: request.parent,
                alive: true,
            },
        }
    }

    pub const fn size() -> Size {
        IVec2::new(TILE_SIZE, TILE_SIZE)
    }

    pub fn is_alive(&self) -> bool {
        match self.kind {
            HazardKind::LaserBeam { alive, .. } => alive,
            _ => true,
        }
    }

    /// Parent laser id of a beam
    pub fn parent(&self) -> Option<u32> {
        match self.kind {
            HazardKind::LaserBeam { parent, .. } => Some(parent),
            _ => None,
        }
    }

    /// Record a newly fired beam on a laser
    pub fn set_child(&mut self, beam_id: Option<u32>) {
        if let HazardKind::Laser { child, .. } = &mut self.kind {
            *child = beam_id;
        }
    }

    /// Advance one tick. `visible` is the area a beam may travel in.
    pub fn update(
        &mut self,
        level: &Level,
        player_rect: &Rect,
        visible: &Rect,
    ) -> Option<BeamRequest> {
        match &mut self.kind {
            HazardKind::AirTank { top, frame } => {
                if *top {
                    *frame = 1 - *frame;
                }
                None
            }
            HazardKind::Laser { left, child } => {
                if child.is_none() && self.detection.intersects(player_rect) {
                    let dx = if *left { -BEAM_OFFSET_X } else { BEAM_OFFSET_X };
                    Some(BeamRequest {
                        parent: self.id,
                        position: self.position + IVec2::new(dx, BEAM_OFFSET_Y),
                        left: *left,
                    })
                } else {
                    None
                }
            }
            HazardKind::LaserBeam {
                left, frame, alive, ..
            } => {
                *frame = 1 - *frame;
                self.position.x += if *left { -BEAM_SPEED } else { BEAM_SPEED };
                let rect = Rect::new(self.position, Self::size());
                if level.collides_solid(self.position + IVec2::new(0, 1), Self::size())
                    || !rect.intersects(visible)
                {
                    *alive = false;
                }
                None
            }
            HazardKind::Thorn { frame } => {
                if self.detection.intersects(player_rect) {
                    if *frame < THORN_MAX_FRAME {
                        *frame += 1;
                    }
                } else {
                    *frame = 0;
                }
                None
            }
        }
    }

    pub fn sprite(&self) -> i32 {
        match self.kind {
            HazardKind::AirTank { top: true, frame } => SPRITE_AIR_TANK_TOP_1 + frame as i32,
            HazardKind::AirTank { top: false, .. } => SPRITE_AIR_TANK_BOTTOM,
            HazardKind::Laser { left: true, .. } => SPRITE_LASER_L,
            HazardKind::Laser { left: false, .. } => SPRITE_LASER_R,
            HazardKind::LaserBeam { frame: 0, .. } => SPRITE_LASER_BEAM_1,
            HazardKind::LaserBeam { .. } => SPRITE_LASER_BEAM_2,
            HazardKind::Thorn { frame } => SPRITE_THORN_1 + frame as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::test_support::level_from_rows;

    fn hall() -> Level {
        level_from_rows(&[
            "############",
            "#..........#",
            "#..........#",
            "############",
        ])
    }

    fn everywhere(level: &Level) -> Rect {
        level.bounds()
    }

    #[test]
    fn test_laser_fires_only_when_player_in_sight() {
        let level = hall();
        let spawn = HazardSpawn {
            kind: HazardType::Laser { left: false },
            position: IVec2::new(16, 16),
        };
        let mut laser = Hazard::spawn(1, &spawn, &level);
        assert_eq!(laser.detection, Rect::from_xywh(32, 16, 144, 16));

        let hidden = Rect::from_xywh(32, 32, 12, 16);
        assert_eq!(laser.update(&level, &hidden, &everywhere(&level)), None);

        let seen = Rect::from_xywh(100, 16, 12, 16);
        let request = laser.update(&level, &seen, &everywhere(&level));
        assert_eq!(
            request,
            Some(BeamRequest {
                parent: 1,
                position: IVec2::new(28, 15),
                left: false,
            })
        );

        // With a live beam it holds fire
        laser.set_child(Some(2));
        assert_eq!(laser.update(&level, &seen, &everywhere(&level)), None);
        laser.set_child(None);
        assert!(laser.update(&level, &seen, &everywhere(&level)).is_some());
    }

    #[test]
    fn test_beam_dies_on_wall() {
        let level = hall();
        let request = BeamRequest {
            parent: 1,
            position: IVec2::new(140, 15),
            left: false,
        };
        let mut beam = Hazard::beam(2, &request);
        assert_eq!(beam.parent(), Some(1));
        let player = Rect::from_xywh(0, 0, 0, 0);
        let mut ticks = 0;
        while beam.is_alive() {
            beam.update(&level, &player, &everywhere(&level));
            ticks += 1;
            assert!(ticks < 10);
        }
        assert!(beam.position.x + 16 > 176);
    }

    #[test]
    fn test_beam_dies_off_screen() {
        let level = hall();
        let request = BeamRequest {
            parent: 1,
            position: IVec2::new(64, 15),
            left: true,
        };
        let mut beam = Hazard::beam(2, &request);
        let visible = Rect::from_xywh(64, 0, 100, 64);
        beam.update(&level, &Rect::default(), &visible);
        assert!(beam.is_alive());
        for _ in 0..4 {
            beam.update(&level, &Rect::default(), &visible);
        }
        assert!(!beam.is_alive());
    }

    #[test]
    fn test_beam_frames_alternate() {
        let level = hall();
        let request = BeamRequest {
            parent: 1,
            position: IVec2::new(64, 15),
            left: false,
        };
        let mut beam = Hazard::beam(2, &request);
        assert_eq!(beam.sprite(), SPRITE_LASER_BEAM_1);
        beam.update(&level, &Rect::default(), &everywhere(&level));
        assert_eq!(beam.sprite(), SPRITE_LASER_BEAM_2);
        beam.update(&level, &Rect::default(), &everywhere(&level));
        assert_eq!(beam.sprite(), SPRITE_LASER_BEAM_1);
    }

    #[test]
    fn test_thorn_thrusts_up() {
        let level = hall();
        let spawn = HazardSpawn {
            kind: HazardType::Thorn,
            position: IVec2::new(48, 32),
        };
        let mut thorn = Hazard::spawn(1, &spawn, &level);
        assert_eq!(thorn.detection, Rect::from_xywh(48, 16, 16, 16));

        let above = Rect::from_xywh(50, 16, 12, 16);
        for _ in 0..6 {
            thorn.update(&level, &above, &everywhere(&level));
        }
        assert_eq!(thorn.sprite(), SPRITE_THORN_1 + 4);

        let away = Rect::from_xywh(120, 16, 12, 16);
        thorn.update(&level, &away, &everywhere(&level));
        assert_eq!(thorn.sprite(), SPRITE_THORN_1);
    }

    #[test]
    fn test_air_tank_animation() {
        let level = hall();
        let top = HazardSpawn {
            kind: HazardType::AirTank { top: true },
            position: IVec2::new(32, 16),
        };
        let bottom = HazardSpawn {
            kind: HazardType::AirTank { top: false },
            position: IVec2::new(32, 32),
        };
        let mut top = Hazard::spawn(1, &top, &level);
        let mut bottom = Hazard::spawn(2, &bottom, &level);
        let mut seen = Vec::new();
        for _ in 0..4 {
            top.update(&level, &Rect::default(), &everywhere(&level));
            bottom.update(&level, &Rect::default(), &everywhere(&level));
            seen.push((top.sprite(), bottom.sprite()));
        }
        assert_eq!(
            seen,
            vec![(217, 218), (216, 218), (217, 218), (216, 218)]
        );
    }
}
