#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use scroll_shooter::best_times::BestTimes;
use scroll_shooter::entities::Field;
use scroll_shooter::level::{Level, LevelClocks, LevelSetup};
use scroll_shooter::levels::LevelSpec;
use scroll_shooter::services::{GameAudio, GameDisplay, Overlay, Services, SoundEvent};
use scroll_shooter::timer::{GameTimer, ManualTime};

pub const FIELD: Field = Field {
    width: 80.0,
    height: 20.0,
};

// ── Recording collaborators ───────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum Shown {
    Overlay(Overlay),
    Hidden,
}

#[derive(Debug, Default)]
pub struct DisplayLog {
    pub health: Option<u32>,
    pub kills: Option<(u32, Option<u32>)>,
    pub boss_health: Option<u32>,
    pub custom_info: String,
    pub timer: Option<u64>,
    pub overlays: Vec<Shown>,
}

#[derive(Clone, Default)]
pub struct RecordingDisplay(pub Arc<Mutex<DisplayLog>>);

impl RecordingDisplay {
    pub fn overlays(&self) -> Vec<Shown> {
        self.0.lock().unwrap().overlays.clone()
    }

    pub fn last_overlay(&self) -> Option<Shown> {
        self.0.lock().unwrap().overlays.last().cloned()
    }

    pub fn win_count(&self) -> usize {
        self.overlays()
            .iter()
            .filter(|s| matches!(s, Shown::Overlay(Overlay::Win(_))))
            .count()
    }
}

impl GameDisplay for RecordingDisplay {
    fn update_health(&mut self, health: u32) {
        self.0.lock().unwrap().health = Some(health);
    }

    fn update_kill_count(&mut self, current: u32, target: Option<u32>) {
        self.0.lock().unwrap().kills = Some((current, target));
    }

    fn update_boss_health(&mut self, health: Option<u32>) {
        self.0.lock().unwrap().boss_health = health;
    }

    fn update_custom_info(&mut self, text: &str) {
        self.0.lock().unwrap().custom_info = text.to_string();
    }

    fn update_timer(&mut self, elapsed_secs: u64) {
        self.0.lock().unwrap().timer = Some(elapsed_secs);
    }

    fn show_overlay(&mut self, overlay: Overlay) {
        self.0.lock().unwrap().overlays.push(Shown::Overlay(overlay));
    }

    fn hide_overlay(&mut self) {
        self.0.lock().unwrap().overlays.push(Shown::Hidden);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioCall {
    Play(SoundEvent),
    Mute,
    Unmute,
}

#[derive(Clone, Default)]
pub struct RecordingAudio(pub Arc<Mutex<Vec<AudioCall>>>);

impl RecordingAudio {
    pub fn calls(&self) -> Vec<AudioCall> {
        self.0.lock().unwrap().clone()
    }

    pub fn played(&self, event: SoundEvent) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == AudioCall::Play(event))
            .count()
    }
}

impl GameAudio for RecordingAudio {
    fn play(&mut self, event: SoundEvent) {
        self.0.lock().unwrap().push(AudioCall::Play(event));
    }

    fn mute_all(&mut self) {
        self.0.lock().unwrap().push(AudioCall::Mute);
    }

    fn unmute_all(&mut self) {
        self.0.lock().unwrap().push(AudioCall::Unmute);
    }
}

// ── Level harness ─────────────────────────────────────────────────────────────

pub struct Harness {
    pub level: Level,
    pub display: RecordingDisplay,
    pub audio: RecordingAudio,
    pub time: ManualTime,
    pub best: Arc<Mutex<BestTimes>>,
    pub clocks: LevelClocks,
}

/// A level on an 80×20 field with detached clocks, hand-driven time and a
/// fixed seed. Not yet started.
pub fn harness(spec: LevelSpec, countdown_secs: u32) -> Harness {
    let display = RecordingDisplay::default();
    let audio = RecordingAudio::default();
    let time = ManualTime::new();
    let best = Arc::new(Mutex::new(BestTimes::in_memory()));
    let clocks = LevelClocks::detached();

    let setup = LevelSetup {
        field: FIELD,
        countdown_secs,
        timer: GameTimer::new(time.clone()),
        rng: StdRng::seed_from_u64(42),
    };
    let services = Services::new(display.clone(), audio.clone(), Arc::clone(&best));
    let level = Level::new(spec, setup, services, clocks.clone());

    Harness {
        level,
        display,
        audio,
        time,
        best,
        clocks,
    }
}

/// Started with no countdown, so play is live immediately.
pub fn playing(spec: LevelSpec) -> Harness {
    let mut h = harness(spec, 0);
    assert!(h.level.start());
    h
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}
