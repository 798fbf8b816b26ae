//! Runtime core for a side-scrolling shooter.
//!
//! The library holds everything that mutates the game world: actors,
//! collisions, projectiles, the fixed-tick clock, the run timer and the level
//! state machine. Rendering, audio and storage are reached only through the
//! collaborator traits in [`services`].

pub mod best_times;
pub mod clock;
pub mod collision;
pub mod config;
pub mod entities;
pub mod error;
pub mod input;
pub mod level;
pub mod levels;
pub mod projectiles;
pub mod services;
pub mod state_machine;
pub mod timer;
