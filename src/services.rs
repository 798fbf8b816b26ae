//! Collaborators the runtime notifies but does not own: display, audio and
//! best-time storage. All calls are fire-and-forget from the tick thread.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Blocking overlay currently shown on top of the play field.
#[derive(Clone, Debug, PartialEq)]
pub enum Overlay {
    Countdown(u32),
    Pause,
    ExitConfirm,
    Win(WinReport),
    GameOver { elapsed: Duration },
}

#[derive(Clone, Debug, PartialEq)]
pub struct WinReport {
    pub level: String,
    pub elapsed: Duration,
    /// Stored best before this run.
    pub previous_best: Option<Duration>,
    pub new_best: bool,
    /// Finished at or under the level's par time.
    pub achievement: bool,
    pub has_next_level: bool,
}

pub trait GameDisplay: Send {
    fn update_health(&mut self, health: u32);
    fn update_kill_count(&mut self, current: u32, target: Option<u32>);
    fn update_boss_health(&mut self, health: Option<u32>);
    fn update_custom_info(&mut self, text: &str);
    fn update_timer(&mut self, elapsed_secs: u64);
    fn show_overlay(&mut self, overlay: Overlay);
    fn hide_overlay(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundEvent {
    PlayerFire,
    EnemyHit,
    EnemyDestroyed,
    PlayerHit,
    ShieldBlock,
    ShieldUp,
    Win,
    GameOver,
}

pub trait GameAudio: Send {
    fn play(&mut self, event: SoundEvent);
    fn mute_all(&mut self);
    fn unmute_all(&mut self);
}

/// Persisted fastest completion per level name.
pub trait BestTimeStore: Send {
    fn best_time(&self, level: &str) -> Option<Duration>;

    /// Store `time` only if it strictly beats the record (or none exists).
    /// Returns whether the record changed.
    fn record_time(&mut self, level: &str, time: Duration) -> bool;
}

/// A store shared between the running level and, say, a menu that lists
/// records.
impl<T: BestTimeStore> BestTimeStore for Arc<Mutex<T>> {
    fn best_time(&self, level: &str) -> Option<Duration> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .best_time(level)
    }

    fn record_time(&mut self, level: &str, time: Duration) -> bool {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_time(level, time)
    }
}

/// Process-scoped services handed to each level at construction.
pub struct Services {
    pub display: Box<dyn GameDisplay>,
    pub audio: Box<dyn GameAudio>,
    pub best_times: Box<dyn BestTimeStore>,
}

impl Services {
    pub fn new(
        display: impl GameDisplay + 'static,
        audio: impl GameAudio + 'static,
        best_times: impl BestTimeStore + 'static,
    ) -> Self {
        Self {
            display: Box::new(display),
            audio: Box::new(audio),
            best_times: Box::new(best_times),
        }
    }
}

/// Audio sink for hosts without sound; events go to the trace log.
#[derive(Clone, Debug, Default)]
pub struct SilentAudio {
    muted: bool,
}

impl GameAudio for SilentAudio {
    fn play(&mut self, event: SoundEvent) {
        if !self.muted {
            tracing::trace!(?event, "sound");
        }
    }

    fn mute_all(&mut self) {
        self.muted = true;
    }

    fn unmute_all(&mut self) {
        self.muted = false;
    }
}
