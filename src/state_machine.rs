//! Level overlay states and the guards between them.
//!
//! `None` is normal play; every other state blocks the gameplay update.
//! Requests that are not legal from the current state return `false` and
//! change nothing; they are ordinary races between input and overlays.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelState {
    None,
    Countdown,
    Pause,
    Win,
    GameOver,
    ExitConfirm,
}

impl LevelState {
    pub fn is_blocking(self) -> bool {
        self != LevelState::None
    }

    /// Win and game-over are left only by an explicit caller action.
    pub fn is_terminal(self) -> bool {
        matches!(self, LevelState::Win | LevelState::GameOver)
    }
}

impl fmt::Display for LevelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LevelState::None => "none",
            LevelState::Countdown => "countdown",
            LevelState::Pause => "pause",
            LevelState::Win => "win",
            LevelState::GameOver => "game-over",
            LevelState::ExitConfirm => "exit-confirm",
        };
        f.write_str(name)
    }
}

/// Outcome of advancing the countdown by one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownStep {
    /// Still counting; seconds left to show.
    Remaining(u32),
    /// Countdown completed and play may begin.
    Finished,
    /// No countdown in progress.
    Inactive,
}

#[derive(Clone, Debug)]
pub struct LevelStateMachine {
    state: LevelState,
    countdown: u32,
}

impl Default for LevelStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelStateMachine {
    pub fn new() -> Self {
        Self {
            state: LevelState::None,
            countdown: 0,
        }
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    /// Gameplay updates only run with no overlay state active.
    pub fn allows_gameplay(&self) -> bool {
        self.state == LevelState::None
    }

    pub fn countdown_remaining(&self) -> u32 {
        self.countdown
    }

    pub fn begin_countdown(&mut self, secs: u32) -> bool {
        if !self.transition(LevelState::None, LevelState::Countdown) {
            return false;
        }
        self.countdown = secs;
        true
    }

    pub fn countdown_step(&mut self) -> CountdownStep {
        if self.state != LevelState::Countdown {
            return CountdownStep::Inactive;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return CountdownStep::Remaining(self.countdown);
        }
        self.transition(LevelState::Countdown, LevelState::None);
        CountdownStep::Finished
    }

    pub fn request_pause(&mut self) -> bool {
        self.transition(LevelState::None, LevelState::Pause)
    }

    pub fn request_resume(&mut self) -> bool {
        self.transition(LevelState::Pause, LevelState::None)
    }

    pub fn request_exit(&mut self) -> bool {
        self.transition(LevelState::None, LevelState::ExitConfirm)
    }

    pub fn cancel_exit(&mut self) -> bool {
        self.transition(LevelState::ExitConfirm, LevelState::None)
    }

    pub fn declare_win(&mut self) -> bool {
        self.transition(LevelState::None, LevelState::Win)
    }

    pub fn declare_game_over(&mut self) -> bool {
        self.transition(LevelState::None, LevelState::GameOver)
    }

    /// Explicit restart / next-level / back-to-menu from the caller. The only
    /// way out of a terminal state.
    pub fn reset(&mut self) {
        if self.state != LevelState::None {
            tracing::debug!(from = %self.state, "level state reset");
        }
        self.state = LevelState::None;
        self.countdown = 0;
    }

    fn transition(&mut self, from: LevelState, to: LevelState) -> bool {
        if self.state != from {
            tracing::trace!(current = %self.state, requested = %to, "transition rejected");
            return false;
        }
        tracing::debug!(%from, %to, "level state transition");
        self.state = to;
        true
    }
}
