//! Level catalog and per-level tuning tables.

use std::time::Duration;

/// What ends a level in victory.
#[derive(Clone, Debug, PartialEq)]
pub enum LevelGoal {
    /// Destroy this many enemies.
    Kills(u32),
    /// Bring the boss to zero health.
    DefeatBoss,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BossSpec {
    pub health: u32,
    pub speed: f32,
    /// Per-tick chance to fire once the cooldown has elapsed.
    pub fire_chance: f64,
    pub fire_cooldown: u32,
    /// Per-tick chance to raise the shield while it is down.
    pub shield_chance: f64,
    pub shield_ticks: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LevelSpec {
    pub name: String,
    pub next: Option<String>,
    pub goal: LevelGoal,

    pub player_health: u32,
    pub player_speed: f32,
    /// Minimum ticks between two player shots.
    pub fire_cooldown: u32,

    pub enemy_health: u32,
    pub enemy_speed: f32,
    /// Per-tick chance of a new enemy entering on the right.
    pub spawn_chance: f64,
    pub max_enemies: usize,
    pub enemy_fire_chance: f64,
    pub enemy_fire_cooldown: u32,

    pub allies: u32,
    pub ally_health: u32,
    pub ally_fire_chance: f64,
    pub ally_fire_cooldown: u32,

    pub boss: Option<BossSpec>,
    /// Finishing at or under this time earns the achievement flag.
    pub par_time: Option<Duration>,
}

impl Default for LevelSpec {
    /// An empty arena: nothing spawns and nothing fires on its own.
    fn default() -> Self {
        Self {
            name: "Sandbox".to_string(),
            next: None,
            goal: LevelGoal::Kills(1),
            player_health: 5,
            player_speed: 0.4,
            fire_cooldown: 6,
            enemy_health: 1,
            enemy_speed: 0.1,
            spawn_chance: 0.0,
            max_enemies: 0,
            enemy_fire_chance: 0.0,
            enemy_fire_cooldown: 45,
            allies: 0,
            ally_health: 2,
            ally_fire_chance: 0.0,
            ally_fire_cooldown: 30,
            boss: None,
            par_time: None,
        }
    }
}

impl LevelSpec {
    pub fn kill_target(&self) -> Option<u32> {
        match self.goal {
            LevelGoal::Kills(n) => Some(n),
            LevelGoal::DefeatBoss => None,
        }
    }

    pub fn is_final(&self) -> bool {
        self.next.is_none()
    }
}

// ── Built-in campaign ────────────────────────────────────────────────────────

pub fn catalog() -> Vec<LevelSpec> {
    vec![
        LevelSpec {
            name: "Outskirts".to_string(),
            next: Some("Harbor".to_string()),
            goal: LevelGoal::Kills(10),
            spawn_chance: 0.02,
            max_enemies: 5,
            enemy_fire_chance: 0.004,
            par_time: Some(Duration::from_secs(45)),
            ..LevelSpec::default()
        },
        LevelSpec {
            name: "Harbor".to_string(),
            next: Some("Citadel".to_string()),
            goal: LevelGoal::Kills(20),
            enemy_health: 2,
            enemy_speed: 0.15,
            spawn_chance: 0.03,
            max_enemies: 8,
            enemy_fire_chance: 0.008,
            allies: 2,
            ally_fire_chance: 0.05,
            par_time: Some(Duration::from_secs(75)),
            ..LevelSpec::default()
        },
        LevelSpec {
            name: "Citadel".to_string(),
            next: None,
            goal: LevelGoal::DefeatBoss,
            player_health: 6,
            spawn_chance: 0.01,
            max_enemies: 3,
            enemy_fire_chance: 0.006,
            boss: Some(BossSpec {
                health: 40,
                speed: 0.12,
                fire_chance: 0.08,
                fire_cooldown: 20,
                shield_chance: 0.004,
                shield_ticks: 120,
            }),
            par_time: Some(Duration::from_secs(90)),
            ..LevelSpec::default()
        },
    ]
}

/// Case-insensitive lookup by level name.
pub fn find(name: &str) -> Option<LevelSpec> {
    catalog()
        .into_iter()
        .find(|l| l.name.eq_ignore_ascii_case(name))
}

/// Zero-based position in the campaign.
pub fn by_index(index: usize) -> Option<LevelSpec> {
    catalog().into_iter().nth(index)
}

pub fn first() -> LevelSpec {
    catalog().into_iter().next().unwrap_or_default()
}

/// The level that follows `spec`, if the campaign continues.
pub fn next_after(spec: &LevelSpec) -> Option<LevelSpec> {
    spec.next.as_deref().and_then(find)
}
