//! Wall-clock run timer used for best-time scoring.
//!
//! `start` always begins again from zero; `stop` freezes the value for later
//! reads. Paused intervals are never counted.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Where the timer reads "now" from.
pub trait TimeSource: Send {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicTime;

impl TimeSource for MonotonicTime {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced time, shared between clones.
#[derive(Clone, Debug)]
pub struct ManualTime {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualTime {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Stopped,
}

pub struct GameTimer {
    source: Box<dyn TimeSource>,
    state: TimerState,
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl Default for GameTimer {
    fn default() -> Self {
        Self::new(MonotonicTime)
    }
}

impl GameTimer {
    pub fn new(source: impl TimeSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            state: TimerState::Idle,
            accumulated: Duration::ZERO,
            running_since: None,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Reset to zero and begin counting.
    pub fn start(&mut self) {
        self.accumulated = Duration::ZERO;
        self.running_since = Some(self.source.now());
        self.state = TimerState::Running;
    }

    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.fold();
            self.state = TimerState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == TimerState::Paused {
            self.running_since = Some(self.source.now());
            self.state = TimerState::Running;
        }
    }

    /// Back to idle at zero, ready for the next level start.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.running_since = None;
        self.state = TimerState::Idle;
    }

    /// Freeze the current value. Safe to call repeatedly or before `start`.
    pub fn stop(&mut self) {
        match self.state {
            TimerState::Running => {
                self.fold();
                self.state = TimerState::Stopped;
            }
            TimerState::Paused => self.state = TimerState::Stopped,
            TimerState::Idle | TimerState::Stopped => {}
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + self.source.now().saturating_duration_since(since),
            None => self.accumulated,
        }
    }

    /// Whole seconds counted so far.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed().as_secs()
    }

    fn fold(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += self.source.now().saturating_duration_since(since);
        }
    }
}
