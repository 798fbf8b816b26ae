//! Game-world actors.
//!
//! Every entity is one [`Actor`]; what it is and how it behaves is carried by
//! the [`ActorKind`] tag. Positions are continuous play-field units (one unit
//! is one terminal cell in the bundled front-end).

// ── Geometry ─────────────────────────────────────────────────────────────────

/// Axis-aligned bounding box, origin at the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    /// Strict overlap; boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// The visible play area. Actors fully outside it are off-screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Field {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn overlaps(&self, b: &Bounds) -> bool {
        b.x + b.width > 0.0 && b.x < self.width && b.y + b.height > 0.0 && b.y < self.height
    }

    fn clamp_y(&self, y: f32, height: f32) -> f32 {
        y.clamp(0.0, (self.height - height).max(0.0))
    }
}

// ── Sizes and speeds ─────────────────────────────────────────────────────────

pub const PLAYER_SIZE: (f32, f32) = (3.0, 1.0);
pub const ALLY_SIZE: (f32, f32) = (3.0, 1.0);
pub const ENEMY_SIZE: (f32, f32) = (3.0, 1.0);
pub const BOSS_SIZE: (f32, f32) = (5.0, 3.0);
pub const PROJECTILE_SIZE: (f32, f32) = (1.0, 1.0);

/// Horizontal distance covered by a projectile per tick, signed.
pub fn projectile_velocity(faction: Faction) -> f32 {
    match faction {
        Faction::User => 1.2,
        Faction::Ally => 1.0,
        Faction::Enemy => -0.6,
        Faction::Boss => -0.8,
    }
}

// ── Tags ─────────────────────────────────────────────────────────────────────

pub type ActorId = u64;

/// Which side fired a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Faction {
    User,
    Ally,
    Enemy,
    Boss,
}

impl Faction {
    pub fn is_friendly(self) -> bool {
        matches!(self, Faction::User | Faction::Ally)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShieldState {
    Inactive,
    Active,
}

/// Continuous vertical motion requested for the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum VerticalMotion {
    #[default]
    Idle,
    Up,
    Down,
}

impl VerticalMotion {
    fn direction(self) -> f32 {
        match self {
            VerticalMotion::Idle => 0.0,
            VerticalMotion::Up => -1.0,
            VerticalMotion::Down => 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ActorKind {
    Player {
        motion: VerticalMotion,
    },
    Ally,
    Enemy,
    Boss {
        shield: ShieldState,
        /// Ticks left before an active shield drops.
        shield_ticks: u32,
        /// +1.0 moving down, -1.0 moving up.
        heading: f32,
    },
    Projectile {
        faction: Faction,
        velocity: f32,
    },
}

/// Result of a single `take_damage` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Actor was already destroyed; nothing changed.
    Ignored,
    /// Boss shield absorbed the hit; nothing changed.
    Shielded,
    Wounded,
    Destroyed,
}

// ── Actor ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub health: u32,
    /// Distance per tick along the actor's own axis of motion.
    pub speed: f32,
    /// Ticks until this actor may fire again.
    pub fire_cooldown: u32,
    destroyed: bool,
}

impl Actor {
    fn new(id: ActorId, kind: ActorKind, x: f32, y: f32, size: (f32, f32), health: u32) -> Self {
        Self {
            id,
            kind,
            x,
            y,
            width: size.0,
            height: size.1,
            health,
            speed: 0.0,
            fire_cooldown: 0,
            destroyed: false,
        }
    }

    pub fn player(id: ActorId, x: f32, y: f32, health: u32, speed: f32) -> Self {
        let motion = VerticalMotion::Idle;
        Self {
            speed,
            ..Self::new(id, ActorKind::Player { motion }, x, y, PLAYER_SIZE, health)
        }
    }

    pub fn ally(id: ActorId, x: f32, y: f32, health: u32) -> Self {
        Self::new(id, ActorKind::Ally, x, y, ALLY_SIZE, health)
    }

    pub fn enemy(id: ActorId, x: f32, y: f32, health: u32, speed: f32) -> Self {
        Self {
            speed,
            ..Self::new(id, ActorKind::Enemy, x, y, ENEMY_SIZE, health)
        }
    }

    pub fn boss(id: ActorId, x: f32, y: f32, health: u32, speed: f32) -> Self {
        let kind = ActorKind::Boss {
            shield: ShieldState::Inactive,
            shield_ticks: 0,
            heading: 1.0,
        };
        Self {
            speed,
            ..Self::new(id, kind, x, y, BOSS_SIZE, health)
        }
    }

    pub fn projectile(id: ActorId, faction: Faction, x: f32, y: f32) -> Self {
        let velocity = projectile_velocity(faction);
        Self::new(id, ActorKind::Projectile { faction, velocity }, x, y, PROJECTILE_SIZE, 1)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn faction(&self) -> Option<Faction> {
        match self.kind {
            ActorKind::Projectile { faction, .. } => Some(faction),
            _ => None,
        }
    }

    pub fn is_boss(&self) -> bool {
        matches!(self.kind, ActorKind::Boss { .. })
    }

    pub fn is_shielded(&self) -> bool {
        matches!(
            self.kind,
            ActorKind::Boss {
                shield: ShieldState::Active,
                ..
            }
        )
    }

    pub fn can_fire(&self) -> bool {
        !self.destroyed && self.fire_cooldown == 0
    }

    /// Where a projectile fired by this actor appears: ahead of the nose,
    /// vertically centred.
    pub fn muzzle(&self) -> (f32, f32) {
        let y = self.y + (self.height - PROJECTILE_SIZE.1) / 2.0;
        match self.kind {
            ActorKind::Player { .. } | ActorKind::Ally => (self.x + self.width, y),
            _ => (self.x - PROJECTILE_SIZE.0, y),
        }
    }

    pub fn set_motion(&mut self, next: VerticalMotion) {
        if let ActorKind::Player { motion } = &mut self.kind {
            *motion = next;
        }
    }

    /// Raise the boss shield for `ticks` ticks. No-op for anything but an
    /// unshielded, living boss.
    pub fn raise_shield(&mut self, ticks: u32) {
        if self.destroyed || ticks == 0 {
            return;
        }
        if let ActorKind::Boss {
            shield,
            shield_ticks,
            ..
        } = &mut self.kind
        {
            if *shield == ShieldState::Inactive {
                *shield = ShieldState::Active;
                *shield_ticks = ticks;
            }
        }
    }

    /// Apply this actor's own motion rule for one tick.
    pub fn update_position(&mut self, field: &Field) {
        if self.destroyed {
            return;
        }
        match &mut self.kind {
            ActorKind::Player { motion } => {
                let y = self.y + motion.direction() * self.speed;
                self.y = field.clamp_y(y, self.height);
            }
            ActorKind::Ally => {}
            ActorKind::Enemy => self.x -= self.speed,
            ActorKind::Boss { heading, .. } => {
                let top = 0.0;
                let bottom = (field.height - self.height).max(0.0);
                let mut y = self.y + *heading * self.speed;
                if y <= top {
                    y = top;
                    *heading = 1.0;
                } else if y >= bottom {
                    y = bottom;
                    *heading = -1.0;
                }
                self.y = y;
            }
            ActorKind::Projectile { velocity, .. } => self.x += *velocity,
        }
    }

    /// Per-tick hook: motion plus cooldown and shield bookkeeping.
    pub fn update_actor(&mut self, field: &Field) {
        if self.destroyed {
            return;
        }
        self.update_position(field);
        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);
        if let ActorKind::Boss {
            shield,
            shield_ticks,
            ..
        } = &mut self.kind
        {
            if *shield == ShieldState::Active {
                *shield_ticks = shield_ticks.saturating_sub(1);
                if *shield_ticks == 0 {
                    *shield = ShieldState::Inactive;
                }
            }
        }
    }

    /// Apply one hit. Projectiles die on any hit; everything else loses one
    /// health point and dies at zero.
    pub fn take_damage(&mut self) -> DamageOutcome {
        if self.destroyed {
            return DamageOutcome::Ignored;
        }
        if self.is_shielded() {
            return DamageOutcome::Shielded;
        }
        if matches!(self.kind, ActorKind::Projectile { .. }) {
            self.health = 0;
        } else {
            self.health = self.health.saturating_sub(1);
        }
        if self.health == 0 {
            self.destroyed = true;
            DamageOutcome::Destroyed
        } else {
            DamageOutcome::Wounded
        }
    }

    /// Mark destroyed without a hit (escaped enemies, off-screen shots).
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }
}

// ── Identity ─────────────────────────────────────────────────────────────────

/// Hands out actor ids, unique within one level run.
#[derive(Clone, Debug, Default)]
pub struct IdSource {
    next: ActorId,
}

impl IdSource {
    pub fn next_id(&mut self) -> ActorId {
        self.next += 1;
        self.next
    }
}
