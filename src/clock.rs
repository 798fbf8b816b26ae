//! Fixed-interval tick driver.
//!
//! A [`GameClock`] owns one worker thread that sleeps until the next deadline
//! and then invokes the registered callback. Ticks are delivered serially on
//! that thread; when the callback overruns, missed ticks are dropped rather
//! than replayed in a burst. [`ClockHandle`] is the cloneable control surface
//! so code running inside a tick can pause or stop its own clock.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
    Paused,
}

struct Control {
    state: ClockState,
    shutdown: bool,
    ticks: u64,
    /// Bumped by every `stop`; a worker that sees it change drops its schedule.
    epoch: u64,
}

struct Shared {
    control: Mutex<Control>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Start/pause/resume/stop access to a clock, usable from any thread.
#[derive(Clone)]
pub struct ClockHandle {
    name: Arc<str>,
    shared: Arc<Shared>,
}

impl ClockHandle {
    /// A handle with no worker behind it. State transitions behave exactly as
    /// on a real clock; nothing ticks.
    pub fn detached(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            shared: Arc::new(Shared {
                control: Mutex::new(Control {
                    state: ClockState::Stopped,
                    shutdown: false,
                    ticks: 0,
                    epoch: 0,
                }),
                wake: Condvar::new(),
            }),
        }
    }

    /// Begin ticking. Idempotent while running; continues a paused clock.
    pub fn start(&self) {
        let mut ctl = self.shared.lock();
        if ctl.state != ClockState::Running {
            ctl.state = ClockState::Running;
            tracing::debug!(clock = %self.name, "clock started");
            self.shared.wake.notify_all();
        }
    }

    /// Halt ticking, keeping counters. Only meaningful while running.
    pub fn pause(&self) {
        let mut ctl = self.shared.lock();
        if ctl.state == ClockState::Running {
            ctl.state = ClockState::Paused;
            tracing::debug!(clock = %self.name, tick = ctl.ticks, "clock paused");
            self.shared.wake.notify_all();
        }
    }

    pub fn resume(&self) {
        let mut ctl = self.shared.lock();
        if ctl.state == ClockState::Paused {
            ctl.state = ClockState::Running;
            tracing::debug!(clock = %self.name, "clock resumed");
            self.shared.wake.notify_all();
        }
    }

    /// Halt ticking and reset. Safe from any state.
    pub fn stop(&self) {
        let mut ctl = self.shared.lock();
        if ctl.state != ClockState::Stopped {
            tracing::debug!(clock = %self.name, ticks = ctl.ticks, "clock stopped");
        }
        ctl.state = ClockState::Stopped;
        ctl.ticks = 0;
        ctl.epoch = ctl.epoch.wrapping_add(1);
        self.shared.wake.notify_all();
    }

    pub fn is_running(&self) -> bool {
        self.state() == ClockState::Running
    }

    pub fn state(&self) -> ClockState {
        self.shared.lock().state
    }

    fn shutdown(&self) {
        let mut ctl = self.shared.lock();
        ctl.shutdown = true;
        ctl.state = ClockState::Stopped;
        self.shared.wake.notify_all();
    }
}

pub type TickCallback = Box<dyn FnMut() + Send>;

pub struct GameClock {
    handle: ClockHandle,
    interval: Duration,
    callback: Option<TickCallback>,
    worker: Option<JoinHandle<()>>,
}

impl GameClock {
    pub fn new(name: &str, interval: Duration) -> Self {
        Self {
            handle: ClockHandle::detached(name),
            interval,
            callback: None,
            worker: None,
        }
    }

    /// Build a clock at `hz` ticks per second.
    pub fn with_rate(name: &str, hz: u32) -> Self {
        let hz = hz.max(1);
        Self::new(name, Duration::from_nanos(1_000_000_000 / u64::from(hz)))
    }

    pub fn handle(&self) -> ClockHandle {
        self.handle.clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Register the per-tick callback. Must be set before the first `start`;
    /// later calls are ignored once the worker is running.
    pub fn set_callback(&mut self, callback: impl FnMut() + Send + 'static) {
        if self.worker.is_some() {
            tracing::warn!(clock = %self.handle.name, "callback already bound to a running worker");
            return;
        }
        self.callback = Some(Box::new(callback));
    }

    pub fn start(&mut self) {
        self.launch();
        self.handle.start();
    }

    pub fn pause(&self) {
        self.handle.pause();
    }

    pub fn resume(&self) {
        self.handle.resume();
    }

    pub fn stop(&self) {
        self.handle.stop();
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    /// Spawn the worker thread without starting ticks, so the clock can be
    /// started later through a [`ClockHandle`].
    pub fn launch(&mut self) {
        if self.worker.is_some() {
            return;
        }
        let Some(callback) = self.callback.take() else {
            tracing::warn!(clock = %self.handle.name, "clock started without a callback");
            return;
        };
        let shared = Arc::clone(&self.handle.shared);
        let interval = self.interval;
        let spawned = thread::Builder::new()
            .name(format!("{}-clock", self.handle.name))
            .spawn(move || run_worker(&shared, interval, callback));
        match spawned {
            Ok(worker) => self.worker = Some(worker),
            Err(e) => tracing::error!(clock = %self.handle.name, error = %e, "failed to spawn clock worker"),
        }
    }
}

impl Drop for GameClock {
    fn drop(&mut self) {
        self.handle.shutdown();
        if let Some(worker) = self.worker.take() {
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

fn run_worker(shared: &Shared, interval: Duration, mut callback: TickCallback) {
    let mut deadline: Option<Instant> = None;
    let mut seen_epoch = shared.lock().epoch;

    loop {
        {
            let mut ctl = shared.lock();
            loop {
                if ctl.shutdown {
                    return;
                }
                if ctl.epoch != seen_epoch {
                    seen_epoch = ctl.epoch;
                    deadline = None;
                }
                if ctl.state == ClockState::Running {
                    break;
                }
                deadline = None;
                ctl = shared.wake.wait(ctl).unwrap_or_else(PoisonError::into_inner);
            }

            let due = *deadline.get_or_insert_with(|| Instant::now() + interval);
            let now = Instant::now();
            if due > now {
                // Wake early on any state change so pause/stop act at once.
                let (mut ctl, _) = shared
                    .wake
                    .wait_timeout(ctl, due - now)
                    .unwrap_or_else(PoisonError::into_inner);
                if ctl.shutdown {
                    return;
                }
                if ctl.state != ClockState::Running
                    || ctl.epoch != seen_epoch
                    || Instant::now() < due
                {
                    continue;
                }
                ctl.ticks += 1;
            } else {
                ctl.ticks += 1;
            }
        }

        callback();

        let due = deadline.unwrap_or_else(Instant::now);
        let now = Instant::now();
        let mut next = due + interval;
        if now > next + interval {
            next = now + interval;
        }
        deadline = Some(next);
    }
}
