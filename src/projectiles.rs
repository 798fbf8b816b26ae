use crate::entities::{Actor, ActorId, Faction, Field, IdSource};

/// Live projectiles for one side of the fight.
#[derive(Clone, Debug, Default)]
pub struct ProjectileSet {
    shots: Vec<Actor>,
}

impl ProjectileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, ids: &mut IdSource, faction: Faction, at: (f32, f32)) -> ActorId {
        let id = ids.next_id();
        self.shots.push(Actor::projectile(id, faction, at.0, at.1));
        id
    }

    /// Move every live projectile by its velocity.
    pub fn advance(&mut self, field: &Field) {
        for shot in &mut self.shots {
            shot.update_actor(field);
        }
    }

    /// Drop destroyed and off-screen projectiles. Returns how many went.
    pub fn prune(&mut self, field: &Field) -> usize {
        let before = self.shots.len();
        self.shots
            .retain(|s| !s.is_destroyed() && field.overlaps(&s.bounds()));
        before - self.shots.len()
    }

    pub fn count(&self, faction: Faction) -> usize {
        self.shots
            .iter()
            .filter(|s| !s.is_destroyed() && s.faction() == Some(faction))
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.shots.iter()
    }

    pub fn as_mut_slice(&mut self) -> &mut [Actor] {
        &mut self.shots
    }

    pub fn len(&self) -> usize {
        self.shots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }

    pub fn clear(&mut self) {
        self.shots.clear();
    }
}
