mod display;

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{stdout, BufWriter, Write};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Color, Print},
    terminal,
    ExecutableCommand, QueueableCommand,
};
use tracing_subscriber::EnvFilter;

use scroll_shooter::best_times::BestTimes;
use scroll_shooter::clock::GameClock;
use scroll_shooter::config::GameConfig;
use scroll_shooter::entities::Field;
use scroll_shooter::input::Key;
use scroll_shooter::level::{Level, LevelClocks, LevelSetup};
use scroll_shooter::levels::{self, LevelSpec};
use scroll_shooter::services::{BestTimeStore, Services, SilentAudio};
use scroll_shooter::state_machine::LevelState;

use display::{Frame, TerminalHud, BOTTOM_ROWS, TOP_ROWS};

const FRAME: Duration = Duration::from_millis(33); // ≈30 FPS

// ── Held-key fallback ─────────────────────────────────────────────────────────

/// A direction key counts as held while its last press/repeat event arrived
/// within this many frames. Terminals without key-release events only ever
/// send presses, so silence longer than this is treated as a release.
const HOLD_WINDOW: u64 = 4;

fn map_key(code: &KeyCode) -> Option<Key> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Key::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Key::Down),
        KeyCode::Char(' ') => Some(Key::Space),
        KeyCode::Esc => Some(Key::Escape),
        _ => None,
    }
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// The terminal is in raw mode while the game runs, so logs go to a file.
fn init_logging(config: &GameConfig) {
    let file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
    {
        Ok(file) => file,
        Err(_) => return,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Start(LevelSpec),
    Quit,
}

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    catalog: &[LevelSpec],
    best_times: &Arc<Mutex<BestTimes>>,
    selected: &mut usize,
) -> std::io::Result<MenuResult> {
    loop {
        draw_menu(out, catalog, best_times, *selected)?;

        // Block until the user makes a choice
        let Ok(Event::Key(KeyEvent { code, kind, modifiers, .. })) = rx.recv() else {
            return Ok(MenuResult::Quit);
        };
        if kind == KeyEventKind::Release {
            continue;
        }
        match code {
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => {
                *selected = selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
                *selected = (*selected + 1).min(catalog.len().saturating_sub(1));
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(spec) = catalog.get(*selected) {
                    return Ok(MenuResult::Start(spec.clone()));
                }
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let pick = (c as usize).wrapping_sub('1' as usize);
                if let Some(spec) = levels::by_index(pick) {
                    *selected = pick;
                    return Ok(MenuResult::Start(spec));
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(MenuResult::Quit);
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                return Ok(MenuResult::Quit);
            }
            _ => {}
        }
    }
}

fn draw_menu<W: Write>(
    out: &mut W,
    catalog: &[LevelSpec],
    best_times: &Arc<Mutex<BestTimes>>,
    selected: usize,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let title = "★  SCROLL  SHOOTER  ★";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(6),
    ))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    out.queue(cursor::MoveTo(cx.saturating_sub(14), cy.saturating_sub(4)))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print("Select level:"))?;

    for (i, spec) in catalog.iter().enumerate() {
        let row = cy.saturating_sub(2) + i as u16;
        let marker = if i == selected { "▶" } else { " " };
        let best = match best_times.best_time(&spec.name) {
            Some(t) => format!("best {}", display::format_time(t)),
            None => "no record".to_string(),
        };
        out.queue(cursor::MoveTo(cx.saturating_sub(14), row))?;
        out.queue(style::SetForegroundColor(Color::Yellow))?;
        out.queue(Print(format!("{marker} ")))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(format!("[{}] ", i + 1)))?;
        out.queue(style::SetForegroundColor(if i == selected {
            Color::White
        } else {
            Color::Grey
        }))?;
        out.queue(Print(format!("{:<10}", spec.name)))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(format!("  {best}")))?;
    }

    let row = cy + catalog.len() as u16;
    out.queue(cursor::MoveTo(cx.saturating_sub(14), row))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print("↑ ↓ / W S : Choose   ENTER : Play   Q : Quit"))?;

    out.queue(style::ResetColor)?;
    out.flush()
}

// ── Level loop ────────────────────────────────────────────────────────────────

enum Outcome {
    Menu,
    Quit,
}

fn lock(level: &Mutex<Level>) -> MutexGuard<'_, Level> {
    level.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keys that act on overlays rather than on the ship.
fn handle_command(level: &mut Level, code: &KeyCode) -> Option<Outcome> {
    let KeyCode::Char(ch) = code else {
        return None;
    };
    match (level.state(), ch.to_ascii_lowercase()) {
        (LevelState::ExitConfirm, 'y') => {
            level.confirm_exit();
        }
        (LevelState::ExitConfirm, 'n') => {
            level.cancel_exit();
        }
        (LevelState::Win, 'n') => {
            level.advance_to_next_level();
        }
        (LevelState::Win | LevelState::GameOver | LevelState::Pause, 'r') => {
            level.restart();
        }
        (LevelState::Win | LevelState::GameOver, 'q') => return Some(Outcome::Menu),
        (_, 'q') => {
            level.request_exit();
        }
        _ => {}
    }
    None
}

/// Run one level (and any levels it advances into) until the player leaves.
///
/// The level is shared with two clock workers: the gameplay tick and the
/// one-second countdown. This loop only feeds input and draws; it takes the
/// level lock briefly and renders from a copied [`Frame`].
fn play_level<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: &GameConfig,
    spec: LevelSpec,
    best_times: &Arc<Mutex<BestTimes>>,
) -> std::io::Result<Outcome> {
    let (width, height) = terminal::size()?;
    let field = Field::new(
        f32::from(width.saturating_sub(2)),
        f32::from(height.saturating_sub(TOP_ROWS + BOTTOM_ROWS)),
    );

    let hud = TerminalHud::default();
    let services = Services::new(hud.clone(), SilentAudio::default(), Arc::clone(best_times));

    let mut tick_clock = GameClock::with_rate("tick", config.tick_hz);
    let mut countdown_clock = GameClock::new("countdown", Duration::from_secs(1));
    let clocks = LevelClocks {
        tick: tick_clock.handle(),
        countdown: countdown_clock.handle(),
    };

    let setup = LevelSetup::new(field, config.countdown_secs);
    let level = Arc::new(Mutex::new(Level::new(spec, setup, services, clocks)));
    {
        let level = Arc::clone(&level);
        tick_clock.set_callback(move || lock(&level).tick());
    }
    {
        let level = Arc::clone(&level);
        countdown_clock.set_callback(move || {
            lock(&level).countdown_step();
        });
    }
    tick_clock.launch();
    countdown_clock.launch();
    lock(&level).start();

    // Direction key → frame it was last seen (press or repeat).
    let mut held: HashMap<Key, u64> = HashMap::new();
    let mut frame: u64 = 0;

    loop {
        let frame_start = Instant::now();
        frame += 1;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            let Event::Key(KeyEvent { code, kind, modifiers, .. }) = ev else {
                continue;
            };
            if kind == KeyEventKind::Press
                && code == KeyCode::Char('c')
                && modifiers.contains(KeyModifiers::CONTROL)
            {
                return Ok(Outcome::Quit);
            }

            let mut lvl = lock(&level);
            if kind == KeyEventKind::Press
                && code == KeyCode::Esc
                && lvl.state() == LevelState::ExitConfirm
            {
                lvl.cancel_exit();
                continue;
            }

            match (kind, map_key(&code)) {
                (KeyEventKind::Release, Some(key)) => {
                    held.remove(&key);
                    lvl.key_up(key);
                }
                (KeyEventKind::Repeat, Some(Key::Escape)) => {}
                (KeyEventKind::Press | KeyEventKind::Repeat, Some(key)) => {
                    if matches!(key, Key::Up | Key::Down) {
                        held.insert(key, frame);
                    }
                    lvl.key_down(key);
                }
                (KeyEventKind::Press, None) => {
                    if let Some(outcome) = handle_command(&mut lvl, &code) {
                        return Ok(outcome);
                    }
                }
                _ => {}
            }
        }

        // ── Expire directions whose release never arrived ─────────────────────
        let expired: Vec<Key> = held
            .iter()
            .filter(|(_, &last)| frame.saturating_sub(last) > HOLD_WINDOW)
            .map(|(&key, _)| key)
            .collect();

        let snapshot = {
            let mut lvl = lock(&level);
            for key in expired {
                held.remove(&key);
                lvl.key_up(key);
            }
            if lvl.is_exited() {
                return Ok(Outcome::Menu);
            }
            Frame {
                level_name: lvl.spec().name.clone(),
                actors: lvl.actors().cloned().collect(),
                hud: hud.snapshot(),
                width,
                height,
            }
        };

        display::render(out, &snapshot)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> std::io::Result<()> {
    let config = GameConfig::load();
    init_logging(&config);
    tracing::info!(tick_hz = config.tick_hz, countdown_secs = config.countdown_secs, "starting");

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Terminals without the kitty protocol fall back to HOLD_WINDOW expiry.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();
    tracing::debug!(keyboard_enhanced, "terminal ready");

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the frame loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let result = run(&mut out, &rx, &config);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if let Err(e) = &result {
        tracing::error!(error = %e, "terminal error");
    }
    tracing::info!("exiting");
    result
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: &GameConfig,
) -> std::io::Result<()> {
    let catalog = levels::catalog();
    let best_times = Arc::new(Mutex::new(BestTimes::open(config.best_times_path.clone())));

    let mut selected = match &config.start_level {
        Some(name) => match catalog.iter().position(|s| s.name.eq_ignore_ascii_case(name)) {
            Some(i) => i,
            None => {
                tracing::warn!(start_level = %name, "unknown start level, using the first");
                0
            }
        },
        None => 0,
    };

    loop {
        match show_menu(out, rx, &catalog, &best_times, &mut selected)? {
            MenuResult::Quit => break,
            MenuResult::Start(spec) => {
                tracing::info!(level_name = %spec.name, "level selected");
                if let Outcome::Quit = play_level(out, rx, config, spec, &best_times)? {
                    break;
                }
                // Otherwise loop back to the menu
            }
        }
    }
    Ok(())
}
