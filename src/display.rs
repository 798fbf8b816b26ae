/// Terminal rendering. Every byte written to the screen goes through here.
///
/// The renderer works from a [`Frame`] copied out of the level, so the tick
/// thread is never held up by terminal writes. [`TerminalHud`] is the display
/// collaborator the level notifies; the renderer reads what it collected.
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};
use scroll_shooter::entities::{Actor, ActorKind, Faction};
use scroll_shooter::services::{GameDisplay, Overlay, WinReport};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_HEALTH: Color = Color::Red;
const C_HUD_KILLS: Color = Color::Yellow;
const C_HUD_INFO: Color = Color::Cyan;
const C_PLAYER: Color = Color::White;
const C_ALLY: Color = Color::Green;
const C_ENEMY: Color = Color::Red;
const C_BOSS: Color = Color::Magenta;
const C_BOSS_SHIELDED: Color = Color::Cyan;
const C_SHOT_USER: Color = Color::Cyan;
const C_SHOT_ALLY: Color = Color::Green;
const C_SHOT_ENEMY: Color = Color::Magenta;
const C_SHOT_BOSS: Color = Color::Red;
const C_HINT: Color = Color::DarkGrey;
const C_DIMMED: Color = Color::DarkGrey;

/// Rows taken above the play field (HUD + top border).
pub const TOP_ROWS: u16 = 2;
/// Rows taken below the play field (bottom border + hint).
pub const BOTTOM_ROWS: u16 = 2;

// ── Display collaborator ──────────────────────────────────────────────────────

/// Everything the level has told the display so far.
#[derive(Clone, Debug, Default)]
pub struct HudState {
    pub health: u32,
    pub kills: u32,
    pub kill_target: Option<u32>,
    pub boss_health: Option<u32>,
    pub custom_info: String,
    pub elapsed_secs: u64,
    pub overlay: Option<Overlay>,
}

#[derive(Clone, Default)]
pub struct TerminalHud {
    state: Arc<Mutex<HudState>>,
}

impl TerminalHud {
    pub fn snapshot(&self) -> HudState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, HudState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GameDisplay for TerminalHud {
    fn update_health(&mut self, health: u32) {
        self.lock().health = health;
    }

    fn update_kill_count(&mut self, current: u32, target: Option<u32>) {
        let mut hud = self.lock();
        hud.kills = current;
        hud.kill_target = target;
    }

    fn update_boss_health(&mut self, health: Option<u32>) {
        self.lock().boss_health = health;
    }

    fn update_custom_info(&mut self, text: &str) {
        let mut hud = self.lock();
        if hud.custom_info != text {
            hud.custom_info = text.to_string();
        }
    }

    fn update_timer(&mut self, elapsed_secs: u64) {
        self.lock().elapsed_secs = elapsed_secs;
    }

    fn show_overlay(&mut self, overlay: Overlay) {
        self.lock().overlay = Some(overlay);
    }

    fn hide_overlay(&mut self) {
        self.lock().overlay = None;
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// A copy of what is on screen this frame.
pub struct Frame {
    pub level_name: String,
    pub actors: Vec<Actor>,
    pub hud: HudState,
    pub width: u16,
    pub height: u16,
}

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, frame: &Frame) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, frame)?;
    draw_hud(out, frame)?;

    let dimmed = matches!(frame.hud.overlay, Some(Overlay::Countdown(_)));
    for actor in &frame.actors {
        draw_actor(out, frame, actor, dimmed)?;
    }

    draw_controls_hint(out, frame)?;

    if let Some(overlay) = &frame.hud.overlay {
        draw_overlay(out, frame, overlay)?;
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, frame.height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, frame: &Frame) -> std::io::Result<()> {
    let w = frame.width as usize;
    let h = frame.height;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, TOP_ROWS - 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(BOTTOM_ROWS)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in TOP_ROWS..h.saturating_sub(BOTTOM_ROWS) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(frame.width.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, frame: &Frame) -> std::io::Result<()> {
    let hud = &frame.hud;

    // Health and kills on the left
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_HEALTH))?;
    out.queue(Print(format!("HP:{} ", "♥".repeat(hud.health as usize))))?;
    out.queue(style::SetForegroundColor(C_HUD_KILLS))?;
    match hud.kill_target {
        Some(target) => out.queue(Print(format!(" Kills:{:>3}/{}", hud.kills, target)))?,
        None => out.queue(Print(format!(" Kills:{:>3}", hud.kills)))?,
    };
    if let Some(boss) = hud.boss_health {
        out.queue(style::SetForegroundColor(C_BOSS))?;
        out.queue(Print(format!("  Boss:{boss:>3}")))?;
    }

    // Level name, centred
    let level_str = format!("[ {} ]", frame.level_name.to_uppercase());
    let lx = (frame.width / 2).saturating_sub(level_str.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(lx, 0))?;
    out.queue(style::SetForegroundColor(Color::Yellow))?;
    out.queue(Print(&level_str))?;

    // Custom info and timer on the right
    let right = format!("{}  {:>4}s", hud.custom_info, hud.elapsed_secs);
    let rx = frame
        .width
        .saturating_sub(right.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_INFO))?;
    out.queue(Print(&right))?;

    Ok(())
}

// ── Actors ────────────────────────────────────────────────────────────────────

// One string per row; spaces are transparent.
const SPRITE_PLAYER: &[&str] = &["=>-"];
const SPRITE_ALLY: &[&str] = &["»=>"];
const SPRITE_ENEMY: &[&str] = &["<◎]"];
const SPRITE_BOSS: &[&str] = &[" /██", "<███]", " \\██"];
const SPRITE_SHOT_USER: &[&str] = &["─"];
const SPRITE_SHOT_ALLY: &[&str] = &["-"];
const SPRITE_SHOT_ENEMY: &[&str] = &["•"];
const SPRITE_SHOT_BOSS: &[&str] = &["◆"];

fn draw_actor<W: Write>(
    out: &mut W,
    frame: &Frame,
    actor: &Actor,
    dimmed: bool,
) -> std::io::Result<()> {
    let (rows, color) = match &actor.kind {
        ActorKind::Player { .. } => (SPRITE_PLAYER, C_PLAYER),
        ActorKind::Ally => (SPRITE_ALLY, C_ALLY),
        ActorKind::Enemy => (SPRITE_ENEMY, C_ENEMY),
        ActorKind::Boss { .. } if actor.is_shielded() => (SPRITE_BOSS, C_BOSS_SHIELDED),
        ActorKind::Boss { .. } => (SPRITE_BOSS, C_BOSS),
        ActorKind::Projectile { faction, .. } => match faction {
            Faction::User => (SPRITE_SHOT_USER, C_SHOT_USER),
            Faction::Ally => (SPRITE_SHOT_ALLY, C_SHOT_ALLY),
            Faction::Enemy => (SPRITE_SHOT_ENEMY, C_SHOT_ENEMY),
            Faction::Boss => (SPRITE_SHOT_BOSS, C_SHOT_BOSS),
        },
    };

    out.queue(style::SetForegroundColor(if dimmed { C_DIMMED } else { color }))?;
    let play_bottom = frame.height.saturating_sub(BOTTOM_ROWS);
    let right_wall = frame.width.saturating_sub(1);
    for (i, sprite) in rows.iter().enumerate() {
        let row = TOP_ROWS as i32 + actor.y.round() as i32 + i as i32;
        let col = 1 + actor.x.round() as i32;
        if row < TOP_ROWS as i32 || row >= play_bottom as i32 {
            continue;
        }
        // Clip each glyph against the side walls.
        for (j, ch) in sprite.chars().enumerate() {
            let c = col + j as i32;
            if c < 1 || c >= right_wall as i32 || ch == ' ' {
                continue;
            }
            out.queue(cursor::MoveTo(c as u16, row as u16))?;
            out.queue(Print(ch))?;
        }
    }
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, frame: &Frame) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, frame.height.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("↑ ↓ / W S : Move   SPACE : Shoot   ESC : Pause   Q : Leave"))?;
    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

fn draw_overlay<W: Write>(out: &mut W, frame: &Frame, overlay: &Overlay) -> std::io::Result<()> {
    let lines: Vec<(String, Color)> = match overlay {
        Overlay::Countdown(n) => vec![
            boxed("GET READY", Color::Yellow),
            vec![(format!("{n}"), Color::White)],
        ]
        .concat(),
        Overlay::Pause => vec![
            boxed("PAUSED", Color::Cyan),
            vec![("ESC - Resume   R - Restart".to_string(), Color::White)],
        ]
        .concat(),
        Overlay::ExitConfirm => vec![
            boxed("LEAVE LEVEL?", Color::Yellow),
            vec![("Y - Leave   N - Stay".to_string(), Color::White)],
        ]
        .concat(),
        Overlay::Win(report) => win_lines(report),
        Overlay::GameOver { elapsed } => vec![
            boxed("GAME  OVER", Color::Red),
            vec![
                (format!("Survived: {}", format_time(*elapsed)), Color::Yellow),
                ("R - Try Again  Q - Menu".to_string(), Color::White),
            ],
        ]
        .concat(),
    };
    draw_centered(out, frame, &lines)
}

fn win_lines(report: &WinReport) -> Vec<(String, Color)> {
    let mut lines = boxed("LEVEL  CLEAR", Color::Green);
    lines.push((format!("Time: {}", format_time(report.elapsed)), Color::Yellow));
    if report.new_best {
        lines.push(("★ NEW BEST TIME ★".to_string(), Color::Yellow));
    } else if let Some(best) = report.previous_best {
        lines.push((format!("Best: {}", format_time(best)), Color::DarkGrey));
    }
    if report.achievement {
        lines.push(("Par time beaten!".to_string(), Color::Magenta));
    }
    let hint = if report.has_next_level {
        "N - Next Level  R - Replay  Q - Menu"
    } else {
        "Campaign complete!  R - Replay  Q - Menu"
    };
    lines.push((hint.to_string(), Color::White));
    lines
}

fn boxed(title: &str, color: Color) -> Vec<(String, Color)> {
    let inner = title.chars().count() + 8;
    vec![
        (format!("╔{}╗", "═".repeat(inner)), color),
        (format!("║    {title}    ║"), color),
        (format!("╚{}╝", "═".repeat(inner)), color),
    ]
}

fn draw_centered<W: Write>(
    out: &mut W,
    frame: &Frame,
    lines: &[(String, Color)],
) -> std::io::Result<()> {
    let cx = frame.width / 2;
    let start_row = (frame.height / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (msg, color)) in lines.iter().enumerate() {
        let row = start_row + i as u16;
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(msg))?;
    }
    Ok(())
}

pub fn format_time(d: Duration) -> String {
    format!("{}.{}s", d.as_secs(), d.subsec_millis() / 100)
}
