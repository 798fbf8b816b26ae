//! Raw key state → player intent.
//!
//! The router never touches actor geometry. It records which vertical motion
//! is wanted; the next tick reads that and moves the player.

use crate::entities::VerticalMotion;

/// Keys the runtime understands, independent of any terminal library.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Space,
    Escape,
}

/// One-shot requests produced by a key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelCommand {
    /// Ask for a projectile; the level decides whether one is spawned.
    Fire,
    TogglePause,
}

#[derive(Clone, Debug, Default)]
pub struct InputRouter {
    active: VerticalMotion,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last pressed direction wins.
    pub fn key_down(&mut self, key: Key) -> Option<LevelCommand> {
        match key {
            Key::Up => {
                self.active = VerticalMotion::Up;
                None
            }
            Key::Down => {
                self.active = VerticalMotion::Down;
                None
            }
            Key::Space => Some(LevelCommand::Fire),
            Key::Escape => Some(LevelCommand::TogglePause),
        }
    }

    /// Releasing a direction only stops motion it started; a stale release of
    /// the other direction is ignored.
    pub fn key_up(&mut self, key: Key) {
        let released = match key {
            Key::Up => VerticalMotion::Up,
            Key::Down => VerticalMotion::Down,
            Key::Space | Key::Escape => return,
        };
        if self.active == released {
            self.active = VerticalMotion::Idle;
        }
    }

    pub fn motion(&self) -> VerticalMotion {
        self.active
    }

    pub fn reset(&mut self) {
        self.active = VerticalMotion::Idle;
    }
}
