use scroll_shooter::entities::{Faction, Field, IdSource};
use scroll_shooter::projectiles::ProjectileSet;

fn field() -> Field {
    Field::new(40.0, 20.0)
}

#[test]
fn spawn_assigns_fresh_ids() {
    let mut ids = IdSource::default();
    let mut set = ProjectileSet::new();
    let a = set.spawn(&mut ids, Faction::User, (5.0, 5.0));
    let b = set.spawn(&mut ids, Faction::Ally, (5.0, 6.0));
    assert_ne!(a, b);
    assert_eq!(set.len(), 2);
    assert_eq!(set.count(Faction::User), 1);
    assert_eq!(set.count(Faction::Ally), 1);
    assert_eq!(set.count(Faction::Enemy), 0);
}

#[test]
fn advance_moves_every_shot() {
    let mut ids = IdSource::default();
    let mut set = ProjectileSet::new();
    set.spawn(&mut ids, Faction::User, (5.0, 5.0));
    set.spawn(&mut ids, Faction::Enemy, (20.0, 5.0));

    set.advance(&field());
    let xs: Vec<f32> = set.iter().map(|s| s.x).collect();
    assert!(xs[0] > 5.0);
    assert!(xs[1] < 20.0);
}

#[test]
fn prune_drops_offscreen_and_destroyed() {
    let f = field();
    let mut ids = IdSource::default();
    let mut set = ProjectileSet::new();
    set.spawn(&mut ids, Faction::User, (39.5, 5.0));
    set.spawn(&mut ids, Faction::Enemy, (-0.5, 5.0));
    set.spawn(&mut ids, Faction::User, (10.0, 5.0));
    set.spawn(&mut ids, Faction::User, (12.0, 5.0));
    set.as_mut_slice()[3].destroy();

    set.advance(&f);
    let removed = set.prune(&f);
    assert_eq!(removed, 3);
    assert_eq!(set.len(), 1);
    assert_eq!(set.iter().next().map(|s| s.x), Some(10.0 + 1.2));
}

#[test]
fn destroyed_shots_are_not_counted() {
    let mut ids = IdSource::default();
    let mut set = ProjectileSet::new();
    set.spawn(&mut ids, Faction::User, (5.0, 5.0));
    set.as_mut_slice()[0].destroy();
    assert_eq!(set.count(Faction::User), 0);
    assert!(!set.is_empty());

    set.clear();
    assert!(set.is_empty());
}
