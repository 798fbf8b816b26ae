//! Pairwise hit detection and damage application.
//!
//! Collisions only mark actors destroyed; removing them is left to the
//! end-of-tick reap so no collection is resized while it is being scanned.

use crate::entities::{Actor, ActorKind, DamageOutcome};

/// One intersection between an attacker and a target, by slice index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hit {
    pub attacker: usize,
    pub target: usize,
    pub attacker_outcome: DamageOutcome,
    pub target_outcome: DamageOutcome,
}

impl Hit {
    pub fn is_blocked(&self) -> bool {
        self.target_outcome == DamageOutcome::Shielded
    }
}

/// Test every living attacker against every living target and apply one hit
/// to both sides of each intersection. A shielded target absorbs the hit and
/// the attacker is left untouched.
pub fn resolve_pair(attackers: &mut [Actor], targets: &mut [Actor]) -> Vec<Hit> {
    let mut hits = Vec::new();
    for (ai, attacker) in attackers.iter_mut().enumerate() {
        for (ti, target) in targets.iter_mut().enumerate() {
            if attacker.is_destroyed() {
                break;
            }
            if target.is_destroyed() || !attacker.bounds().intersects(&target.bounds()) {
                continue;
            }
            if target.is_shielded() {
                hits.push(Hit {
                    attacker: ai,
                    target: ti,
                    attacker_outcome: DamageOutcome::Ignored,
                    target_outcome: DamageOutcome::Shielded,
                });
                continue;
            }
            let target_outcome = target.take_damage();
            let attacker_outcome = attacker.take_damage();
            hits.push(Hit {
                attacker: ai,
                target: ti,
                attacker_outcome,
                target_outcome,
            });
        }
    }
    hits
}

/// Aggregate result of one tick's collision passes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickCollisions {
    /// Enemies (boss included) destroyed by friendly fire or by ramming.
    pub kills: u32,
    /// The part of `kills` dealt by friendly fire.
    pub shot_kills: u32,
    /// Hits the player unit actually took.
    pub player_hits: u32,
    pub allies_lost: u32,
    /// Friendly shots absorbed by an active boss shield.
    pub shield_blocks: u32,
    /// Friendly shots that damaged an enemy.
    pub enemy_hits: u32,
}

/// Run every collision pass for one tick:
///
/// 1. friendly shots × enemies
/// 2. hostile shots × squad (player and allies)
/// 3. enemies × squad (ramming)
pub fn run_tick(
    friendly_shots: &mut [Actor],
    hostile_shots: &mut [Actor],
    enemies: &mut [Actor],
    squad: &mut [Actor],
) -> TickCollisions {
    let mut out = TickCollisions::default();

    for hit in resolve_pair(friendly_shots, enemies) {
        if hit.is_blocked() {
            out.shield_blocks += 1;
            continue;
        }
        if landed(hit.target_outcome) {
            out.enemy_hits += 1;
        }
        if hit.target_outcome == DamageOutcome::Destroyed {
            out.kills += 1;
            out.shot_kills += 1;
        }
    }

    for hit in resolve_pair(hostile_shots, squad) {
        record_squad_damage(&mut out, &squad[hit.target], hit.target_outcome);
    }

    for hit in resolve_pair(enemies, squad) {
        record_squad_damage(&mut out, &squad[hit.target], hit.target_outcome);
        if hit.attacker_outcome == DamageOutcome::Destroyed {
            out.kills += 1;
        }
    }

    out
}

fn landed(outcome: DamageOutcome) -> bool {
    matches!(outcome, DamageOutcome::Wounded | DamageOutcome::Destroyed)
}

fn record_squad_damage(out: &mut TickCollisions, unit: &Actor, outcome: DamageOutcome) {
    if !landed(outcome) {
        return;
    }
    match unit.kind {
        ActorKind::Player { .. } => out.player_hits += 1,
        ActorKind::Ally if outcome == DamageOutcome::Destroyed => out.allies_lost += 1,
        _ => {}
    }
}
