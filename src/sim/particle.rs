//! Missile and explosion singletons

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Direction, Position, Size};
use super::object::Object;
use crate::consts::{
    EXPLOSION_SPRITES, MISSILE_COOLDOWN, MISSILE_HEIGHT, MISSILE_MAX_FRAME, MISSILE_SPEED,
    MISSILE_WIDTH,
};

const SPRITE_MISSILE_RIGHT_1: i32 = 296;
const SPRITE_MISSILE_LEFT_1: i32 = 302;
const MISSILE_FRAMES: i32 = 6;

/// The player's single missile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Missile {
    pub alive: bool,
    pub frame: u32,
    pub position: Position,
    /// Left or Right only
    pub direction: Direction,
    /// Ticks until another missile may be fired
    pub cooldown: u32,
}

impl Default for Missile {
    fn default() -> Self {
        Self {
            alive: false,
            frame: 0,
            position: IVec2::ZERO,
            direction: Direction::Right,
            cooldown: 0,
        }
    }
}

impl Missile {
    pub const fn size() -> Size {
        IVec2::new(MISSILE_WIDTH, MISSILE_HEIGHT)
    }

    /// Pixels to travel this tick
    pub fn speed(&self) -> i32 {
        let last = MISSILE_SPEED[MISSILE_SPEED.len() - 1];
        MISSILE_SPEED.get(self.frame as usize).copied().unwrap_or(last)
    }

    pub fn can_fire(&self) -> bool {
        !self.alive && self.cooldown == 0
    }

    /// Launch from `position`. Returns false (and does nothing) while a
    /// missile is in flight or cooling down.
    pub fn fire(&mut self, position: Position, direction: Direction) -> bool {
        if !self.can_fire() {
            return false;
        }
        self.alive = true;
        self.frame = 0;
        self.position = position;
        self.direction = direction;
        true
    }

    /// Despawn after hitting something
    pub fn impact(&mut self) {
        self.alive = false;
        self.cooldown = MISSILE_COOLDOWN;
    }

    /// Advance the frame counter after a flight step; despawns once spent
    pub fn age(&mut self) {
        self.frame += 1;
        if self.frame > MISSILE_MAX_FRAME {
            self.alive = false;
        }
    }

    /// Animated object for the renderer
    pub fn object(&self) -> Object {
        let sprite = match self.direction {
            Direction::Left => SPRITE_MISSILE_LEFT_1,
            _ => SPRITE_MISSILE_RIGHT_1,
        };
        Object::new(self.position, sprite, MISSILE_FRAMES, false)
    }
}

/// The one explosion on screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explosion {
    pub alive: bool,
    pub frame: u32,
    pub position: Position,
}

impl Explosion {
    /// Start (or restart) the explosion at `position`
    pub fn spawn(&mut self, position: Position) {
        self.alive = true;
        self.frame = 0;
        self.position = position;
    }

    pub fn update(&mut self) {
        if self.alive {
            self.frame += 1;
            if self.frame as usize >= EXPLOSION_SPRITES.len() {
                self.alive = false;
            }
        }
    }

    pub fn sprite(&self) -> i32 {
        EXPLOSION_SPRITES
            .get(self.frame as usize)
            .copied()
            .unwrap_or(EXPLOSION_SPRITES[0])
    }

    pub fn object(&self) -> Object {
        Object::still(self.position, self.sprite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missile_speed_table() {
        let mut m = Missile::default();
        assert_eq!(m.speed(), 4);
        m.frame = 10;
        assert_eq!(m.speed(), 14);
        m.frame = 25;
        assert_eq!(m.speed(), 14);
    }

    #[test]
    fn test_fire_is_exclusive() {
        let mut m = Missile::default();
        assert!(m.fire(IVec2::new(10, 0), Direction::Right));
        assert!(!m.fire(IVec2::new(99, 0), Direction::Left));
        assert_eq!(m.position, IVec2::new(10, 0));

        m.impact();
        assert!(!m.alive);
        assert!(!m.fire(IVec2::ZERO, Direction::Right));
        m.cooldown = 0;
        assert!(m.fire(IVec2::ZERO, Direction::Right));
    }

    #[test]
    fn test_missile_ages_out() {
        let mut m = Missile::default();
        m.fire(IVec2::ZERO, Direction::Right);
        for _ in 0..MISSILE_MAX_FRAME {
            m.age();
            assert!(m.alive);
        }
        m.age();
        assert!(!m.alive);
        // Running out of range does not arm the cooldown
        assert_eq!(m.cooldown, 0);
    }

    #[test]
    fn test_explosion_lifetime() {
        let mut e = Explosion::default();
        e.spawn(IVec2::new(5, 5));
        let mut sprites = vec![e.sprite()];
        while e.alive {
            e.update();
            if e.alive {
                sprites.push(e.sprite());
            }
        }
        assert_eq!(sprites, EXPLOSION_SPRITES.to_vec());
    }
}
