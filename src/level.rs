//! One running level: actor collections, the per-tick pipeline and the side
//! effects of every state-machine transition.
//!
//! The game clock calls [`Level::tick`]; input calls the `key_*` methods and
//! the overlay actions. Both reach the level through the same lock, so a tick
//! never observes a half-applied input.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::ClockHandle;
use crate::collision::{self, TickCollisions};
use crate::entities::{
    Actor, ActorId, ActorKind, Faction, Field, IdSource, ALLY_SIZE, BOSS_SIZE, ENEMY_SIZE,
    PLAYER_SIZE,
};
use crate::input::{InputRouter, Key, LevelCommand};
use crate::levels::{self, LevelGoal, LevelSpec};
use crate::projectiles::ProjectileSet;
use crate::services::{Overlay, Services, SoundEvent, WinReport};
use crate::state_machine::{CountdownStep, LevelState, LevelStateMachine};
use crate::timer::GameTimer;

/// Cap on simultaneous player shots in flight.
pub const MAX_USER_SHOTS: usize = 6;

const PLAYER_SLOT: usize = 0;
const SQUAD_X: f32 = 2.0;

/// The two schedulers a level drives: the gameplay tick and the one-second
/// countdown step.
#[derive(Clone)]
pub struct LevelClocks {
    pub tick: ClockHandle,
    pub countdown: ClockHandle,
}

impl LevelClocks {
    pub fn detached() -> Self {
        Self {
            tick: ClockHandle::detached("tick"),
            countdown: ClockHandle::detached("countdown"),
        }
    }
}

/// Construction inputs that are not services.
pub struct LevelSetup {
    pub field: Field,
    pub countdown_secs: u32,
    pub timer: GameTimer,
    pub rng: StdRng,
}

impl LevelSetup {
    pub fn new(field: Field, countdown_secs: u32) -> Self {
        Self {
            field,
            countdown_secs,
            timer: GameTimer::default(),
            rng: StdRng::from_entropy(),
        }
    }
}

pub struct Level {
    spec: LevelSpec,
    field: Field,
    machine: LevelStateMachine,
    services: Services,
    clocks: LevelClocks,
    countdown_secs: u32,
    timer: GameTimer,
    rng: StdRng,
    ids: IdSource,
    router: InputRouter,
    fire_requested: bool,

    /// Player at `PLAYER_SLOT`, allies after it.
    squad: Vec<Actor>,
    /// Regular enemies and, on boss levels, the boss.
    enemies: Vec<Actor>,
    friendly_shots: ProjectileSet,
    hostile_shots: ProjectileSet,

    kills: u32,
    exited: bool,
}

impl Level {
    pub fn new(spec: LevelSpec, setup: LevelSetup, services: Services, clocks: LevelClocks) -> Self {
        let mut level = Self {
            spec,
            field: setup.field,
            machine: LevelStateMachine::new(),
            services,
            clocks,
            countdown_secs: setup.countdown_secs,
            timer: setup.timer,
            rng: setup.rng,
            ids: IdSource::default(),
            router: InputRouter::new(),
            fire_requested: false,
            squad: Vec::new(),
            enemies: Vec::new(),
            friendly_shots: ProjectileSet::new(),
            hostile_shots: ProjectileSet::new(),
            kills: 0,
            exited: false,
        };
        level.reset_world();
        level
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn spec(&self) -> &LevelSpec {
        &self.spec
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn state(&self) -> LevelState {
        self.machine.state()
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.timer.elapsed_secs()
    }

    pub fn timer(&self) -> &GameTimer {
        &self.timer
    }

    pub fn is_exited(&self) -> bool {
        self.exited
    }

    pub fn player(&self) -> &Actor {
        &self.squad[PLAYER_SLOT]
    }

    pub fn player_mut(&mut self) -> &mut Actor {
        &mut self.squad[PLAYER_SLOT]
    }

    pub fn allies(&self) -> &[Actor] {
        &self.squad[PLAYER_SLOT + 1..]
    }

    pub fn enemies(&self) -> &[Actor] {
        &self.enemies
    }

    pub fn boss(&self) -> Option<&Actor> {
        self.enemies.iter().find(|e| e.is_boss())
    }

    pub fn friendly_shots(&self) -> &ProjectileSet {
        &self.friendly_shots
    }

    pub fn hostile_shots(&self) -> &ProjectileSet {
        &self.hostile_shots
    }

    /// Every actor in the world, for rendering.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.squad
            .iter()
            .chain(self.enemies.iter())
            .chain(self.friendly_shots.iter())
            .chain(self.hostile_shots.iter())
            .filter(|a| !a.is_destroyed())
    }

    /// Put an enemy on the field directly, bypassing the spawn roll.
    pub fn place_enemy(&mut self, x: f32, y: f32, health: u32) -> ActorId {
        let id = self.ids.next_id();
        self.enemies
            .push(Actor::enemy(id, x, y, health, self.spec.enemy_speed));
        id
    }

    /// Put a projectile on the field directly.
    pub fn place_shot(&mut self, faction: Faction, x: f32, y: f32) -> ActorId {
        let set = if faction.is_friendly() {
            &mut self.friendly_shots
        } else {
            &mut self.hostile_shots
        };
        set.spawn(&mut self.ids, faction, (x, y))
    }

    // ── Input ────────────────────────────────────────────────────────────────

    pub fn key_down(&mut self, key: Key) {
        match self.router.key_down(key) {
            Some(LevelCommand::Fire) if self.machine.allows_gameplay() => {
                self.fire_requested = true;
            }
            Some(LevelCommand::TogglePause) => {
                self.toggle_pause();
            }
            _ => {}
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.router.key_up(key);
    }

    // ── Caller actions and state transitions ─────────────────────────────────

    /// First start of a freshly built level.
    pub fn start(&mut self) -> bool {
        tracing::info!(level_name = %self.spec.name, "level starting");
        self.begin_countdown()
    }

    /// Start this level over from any state.
    pub fn restart(&mut self) -> bool {
        self.machine.reset();
        self.clocks.countdown.stop();
        self.clocks.tick.stop();
        self.timer.reset();
        self.services.display.hide_overlay();
        self.reset_world();
        self.exited = false;
        tracing::info!(level_name = %self.spec.name, "level restarting");
        self.begin_countdown()
    }

    /// Move on after a win. Rejected anywhere but `Win` or on the last level.
    pub fn advance_to_next_level(&mut self) -> bool {
        if self.machine.state() != LevelState::Win {
            return false;
        }
        let Some(next) = levels::next_after(&self.spec) else {
            return false;
        };
        self.spec = next;
        self.restart()
    }

    pub fn toggle_pause(&mut self) -> bool {
        if self.machine.state() == LevelState::Pause {
            self.resume()
        } else {
            self.pause()
        }
    }

    pub fn pause(&mut self) -> bool {
        if !self.machine.request_pause() {
            return false;
        }
        self.freeze();
        self.services.display.show_overlay(Overlay::Pause);
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.machine.request_resume() {
            return false;
        }
        self.services.display.hide_overlay();
        self.thaw();
        true
    }

    pub fn request_exit(&mut self) -> bool {
        if !self.machine.request_exit() {
            return false;
        }
        self.freeze();
        self.services.display.show_overlay(Overlay::ExitConfirm);
        true
    }

    pub fn cancel_exit(&mut self) -> bool {
        if !self.machine.cancel_exit() {
            return false;
        }
        self.services.display.hide_overlay();
        self.thaw();
        true
    }

    /// Leave the level from the exit prompt.
    pub fn confirm_exit(&mut self) -> bool {
        if self.machine.state() != LevelState::ExitConfirm {
            return false;
        }
        self.halt();
        self.services.display.hide_overlay();
        self.exited = true;
        tracing::info!(level_name = %self.spec.name, "level exited");
        true
    }

    /// Advance the countdown by one second. Driven by the countdown clock.
    pub fn countdown_step(&mut self) -> CountdownStep {
        let step = self.machine.countdown_step();
        match step {
            CountdownStep::Remaining(n) => {
                self.services.display.show_overlay(Overlay::Countdown(n));
            }
            CountdownStep::Finished => {
                self.clocks.countdown.stop();
                self.services.audio.unmute_all();
                self.services.display.hide_overlay();
                self.on_countdown_complete();
            }
            CountdownStep::Inactive => self.clocks.countdown.stop(),
        }
        step
    }

    fn begin_countdown(&mut self) -> bool {
        if !self.machine.begin_countdown(self.countdown_secs) {
            return false;
        }
        self.clocks.tick.pause();
        self.timer.pause();
        self.services.audio.mute_all();
        self.services
            .display
            .show_overlay(Overlay::Countdown(self.countdown_secs));
        if self.countdown_secs == 0 {
            self.countdown_step();
        } else {
            self.clocks.countdown.start();
        }
        true
    }

    /// Deferred start: play begins once the countdown has run out.
    fn on_countdown_complete(&mut self) {
        self.timer.start();
        self.clocks.tick.start();
        self.push_displays();
        tracing::debug!(level_name = %self.spec.name, "countdown complete, play started");
    }

    fn freeze(&mut self) {
        self.clocks.tick.pause();
        self.timer.pause();
        self.fire_requested = false;
    }

    fn thaw(&mut self) {
        self.timer.resume();
        self.clocks.tick.resume();
    }

    fn halt(&mut self) {
        self.clocks.tick.stop();
        self.clocks.countdown.stop();
        self.timer.stop();
        self.fire_requested = false;
    }

    fn win(&mut self) {
        if !self.machine.declare_win() {
            return;
        }
        self.halt();
        let elapsed = self.timer.elapsed();
        let name = self.spec.name.clone();
        let previous_best = self.services.best_times.best_time(&name);
        let new_best = self.services.best_times.record_time(&name, elapsed);
        let achievement = self.spec.par_time.is_some_and(|par| elapsed <= par);
        tracing::info!(
            level_name = %name,
            elapsed_ms = elapsed.as_millis() as u64,
            new_best,
            achievement,
            "level won"
        );
        self.services.audio.play(SoundEvent::Win);
        self.services.display.show_overlay(Overlay::Win(WinReport {
            level: name,
            elapsed,
            previous_best,
            new_best,
            achievement,
            has_next_level: !self.spec.is_final(),
        }));
    }

    fn game_over(&mut self) {
        if !self.machine.declare_game_over() {
            return;
        }
        self.halt();
        let elapsed = self.timer.elapsed();
        tracing::info!(level_name = %self.spec.name, kills = self.kills, "game over");
        self.services.audio.play(SoundEvent::GameOver);
        self.services
            .display
            .show_overlay(Overlay::GameOver { elapsed });
    }

    // ── Tick pipeline ────────────────────────────────────────────────────────

    /// One gameplay tick. Does nothing unless the clock is running and no
    /// overlay state is active.
    pub fn tick(&mut self) {
        if !self.clocks.tick.is_running() || !self.machine.allows_gameplay() {
            return;
        }

        let motion = self.router.motion();
        self.player_mut().set_motion(motion);

        self.advance_actors();
        self.check_breakthroughs();
        self.spawn_fire();
        self.spawn_enemies();

        let hits = collision::run_tick(
            self.friendly_shots.as_mut_slice(),
            self.hostile_shots.as_mut_slice(),
            &mut self.enemies,
            &mut self.squad,
        );
        self.apply_collisions(&hits);

        self.reap();
        self.evaluate();
        self.push_displays();
    }

    fn advance_actors(&mut self) {
        let field = self.field;
        for unit in self.squad.iter_mut().chain(self.enemies.iter_mut()) {
            unit.update_actor(&field);
        }
        self.friendly_shots.advance(&field);
        self.hostile_shots.advance(&field);
    }

    /// Enemies that slip past the left edge are lost and cost the player a hit.
    fn check_breakthroughs(&mut self) {
        let mut escaped = 0;
        for enemy in &mut self.enemies {
            if !enemy.is_destroyed() && enemy.x + enemy.width < 0.0 {
                enemy.destroy();
                escaped += 1;
            }
        }
        for _ in 0..escaped {
            self.squad[PLAYER_SLOT].take_damage();
            self.services.audio.play(SoundEvent::PlayerHit);
        }
        if escaped > 0 {
            tracing::debug!(escaped, "enemies broke through");
        }
    }

    fn spawn_fire(&mut self) {
        let fire_requested = std::mem::take(&mut self.fire_requested);
        let player = &mut self.squad[PLAYER_SLOT];
        if fire_requested
            && player.can_fire()
            && self.friendly_shots.count(Faction::User) < MAX_USER_SHOTS
        {
            self.friendly_shots
                .spawn(&mut self.ids, Faction::User, player.muzzle());
            player.fire_cooldown = self.spec.fire_cooldown;
            self.services.audio.play(SoundEvent::PlayerFire);
        }

        let spec = &self.spec;
        for ally in self.squad.iter_mut().skip(PLAYER_SLOT + 1) {
            if ally.can_fire() && roll(&mut self.rng, spec.ally_fire_chance) {
                self.friendly_shots
                    .spawn(&mut self.ids, Faction::Ally, ally.muzzle());
                ally.fire_cooldown = spec.ally_fire_cooldown;
            }
        }

        let field_width = self.field.width;
        for enemy in &mut self.enemies {
            if !enemy.can_fire() || enemy.x >= field_width {
                continue;
            }
            if let Some(boss) = spec.boss.as_ref().filter(|_| enemy.is_boss()) {
                if !enemy.is_shielded() && roll(&mut self.rng, boss.shield_chance) {
                    enemy.raise_shield(boss.shield_ticks);
                    self.services.audio.play(SoundEvent::ShieldUp);
                }
                if roll(&mut self.rng, boss.fire_chance) {
                    self.hostile_shots
                        .spawn(&mut self.ids, Faction::Boss, enemy.muzzle());
                    enemy.fire_cooldown = boss.fire_cooldown;
                }
            } else if roll(&mut self.rng, spec.enemy_fire_chance) {
                self.hostile_shots
                    .spawn(&mut self.ids, Faction::Enemy, enemy.muzzle());
                enemy.fire_cooldown = spec.enemy_fire_cooldown;
            }
        }
    }

    fn spawn_enemies(&mut self) {
        let regular = self
            .enemies
            .iter()
            .filter(|e| !e.is_boss() && !e.is_destroyed())
            .count();
        if regular >= self.spec.max_enemies || !roll(&mut self.rng, self.spec.spawn_chance) {
            return;
        }
        let max_y = self.field.height - ENEMY_SIZE.1;
        let y = if max_y > 0.0 {
            self.rng.gen_range(0.0..max_y)
        } else {
            0.0
        };
        let id = self.ids.next_id();
        self.enemies.push(Actor::enemy(
            id,
            self.field.width,
            y,
            self.spec.enemy_health,
            self.spec.enemy_speed,
        ));
    }

    fn apply_collisions(&mut self, hits: &TickCollisions) {
        self.kills += hits.kills;
        let audio = &mut self.services.audio;
        for _ in 0..hits.player_hits {
            audio.play(SoundEvent::PlayerHit);
        }
        if hits.enemy_hits > hits.shot_kills {
            audio.play(SoundEvent::EnemyHit);
        }
        if hits.kills > 0 {
            audio.play(SoundEvent::EnemyDestroyed);
        }
        if hits.shield_blocks > 0 {
            audio.play(SoundEvent::ShieldBlock);
        }
        if hits.allies_lost > 0 {
            tracing::debug!(lost = hits.allies_lost, "allies destroyed");
        }
    }

    /// End-of-tick removal of destroyed and off-screen actors. The player is
    /// never removed.
    fn reap(&mut self) {
        let field = self.field;
        self.friendly_shots.prune(&field);
        self.hostile_shots.prune(&field);
        self.enemies.retain(|e| !e.is_destroyed());
        self.squad
            .retain(|u| matches!(u.kind, ActorKind::Player { .. }) || !u.is_destroyed());
    }

    fn evaluate(&mut self) {
        if self.player().is_destroyed() {
            self.game_over();
            return;
        }
        let won = match self.spec.goal {
            LevelGoal::Kills(target) => self.kills >= target,
            LevelGoal::DefeatBoss => self.boss().map_or(true, |b| b.health == 0),
        };
        if won {
            self.win();
        }
    }

    fn push_displays(&mut self) {
        let health = self.player().health;
        let boss_health = self.spec.boss.as_ref().map(|_| self.boss().map_or(0, |b| b.health));
        let info = self.custom_info();
        let elapsed = self.timer.elapsed_secs();
        let display = &mut self.services.display;
        display.update_health(health);
        display.update_kill_count(self.kills, self.spec.kill_target());
        display.update_boss_health(boss_health);
        display.update_custom_info(&info);
        display.update_timer(elapsed);
    }

    fn custom_info(&self) -> String {
        if let Some(boss) = self.boss() {
            if boss.is_shielded() {
                return "Boss shield ACTIVE".to_string();
            }
            return "Boss shield down".to_string();
        }
        if self.spec.allies > 0 {
            return format!("Allies: {}", self.allies().len());
        }
        match self.spec.kill_target() {
            Some(target) => format!("Destroy {target} enemies"),
            None => self.spec.name.clone(),
        }
    }

    // ── World setup ──────────────────────────────────────────────────────────

    fn reset_world(&mut self) {
        self.ids = IdSource::default();
        self.router.reset();
        self.fire_requested = false;
        self.kills = 0;
        self.enemies.clear();
        self.friendly_shots.clear();
        self.hostile_shots.clear();
        self.squad.clear();

        let field = self.field;
        let mid = ((field.height - PLAYER_SIZE.1) / 2.0).max(0.0);
        let id = self.ids.next_id();
        self.squad.push(Actor::player(
            id,
            SQUAD_X,
            mid,
            self.spec.player_health,
            self.spec.player_speed,
        ));

        let allies = self.spec.allies;
        for i in 0..allies {
            let slot = (i + 1) as f32 / (allies + 1) as f32;
            let y = ((field.height - ALLY_SIZE.1) * slot).max(0.0);
            let id = self.ids.next_id();
            self.squad
                .push(Actor::ally(id, SQUAD_X + PLAYER_SIZE.0 + 1.0, y, self.spec.ally_health));
        }

        if let Some(boss) = &self.spec.boss {
            let x = (field.width - BOSS_SIZE.0 - 2.0).max(0.0);
            let y = ((field.height - BOSS_SIZE.1) / 2.0).max(0.0);
            let id = self.ids.next_id();
            self.enemies
                .push(Actor::boss(id, x, y, boss.health, boss.speed));
        }
    }
}

fn roll(rng: &mut StdRng, chance: f64) -> bool {
    chance > 0.0 && rng.gen_bool(chance.min(1.0))
}
