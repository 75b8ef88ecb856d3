//! Tests for projectile manager systems.

use bevy::prelude::*;

use crate::combat::{DamageDealt, DamageType};
use crate::components::{Collider, Enemy, Health, Player, Velocity};
use crate::projectile::Projectile;
use crate::spatial::SpatialIndex;
use crate::{collect_events, create_headless_app, step_fixed, SimulationPlugin};

const TICK: f32 = 1.0 / 60.0;

fn test_app() -> App {
    let mut app = create_headless_app(7);
    app.add_plugins(SimulationPlugin);
    app
}

fn spawn_enemy(app: &mut App, x: f32, y: f32) -> Entity {
    app.world_mut()
        .spawn((Health::new(100.0), Enemy, Collider::new(10.0), Transform::from_xyz(x, y, 0.0)))
        .id()
}

fn spawn_projectile(app: &mut App, projectile: Projectile, position: Vec2, velocity: Vec2) -> Entity {
    app.world_mut()
        .spawn((projectile, Transform::from_translation(position.extend(0.0)), Velocity(velocity)))
        .id()
}

fn was_damaged(app: &App, entity: Entity) -> bool {
    app.world()
        .get::<Health>(entity)
        .map(|h| h.current < h.max)
        .unwrap_or(false)
}

#[test]
fn test_pierce_two_hits_exactly_two_targets() {
    let mut app = test_app();
    let enemies = [
        spawn_enemy(&mut app, 0.0, 0.0),
        spawn_enemy(&mut app, 3.0, 0.0),
        spawn_enemy(&mut app, -3.0, 0.0),
    ];
    let projectile = spawn_projectile(
        &mut app,
        Projectile::new(None, true, 10.0, DamageType::Physical).with_pierce(2),
        Vec2::ZERO,
        Vec2::ZERO,
    );

    step_fixed(&mut app, TICK);

    let damaged = enemies.iter().filter(|e| was_damaged(&app, **e)).count();
    assert_eq!(damaged, 2);
    assert!(app.world().get::<Projectile>(projectile).is_none());
    assert!(!app.world().resource::<SpatialIndex>().contains(projectile));

    let events = collect_events::<DamageDealt>(app.world());
    assert_eq!(events.len(), 2);
    assert_ne!(events[0].target, events[1].target);
}

#[test]
fn test_expired_projectile_removed_before_collision() {
    let mut app = test_app();
    let enemy = spawn_enemy(&mut app, 0.0, 0.0);
    let projectile = spawn_projectile(
        &mut app,
        Projectile::new(None, true, 10.0, DamageType::Physical).with_lifetime(TICK / 2.0),
        Vec2::ZERO,
        Vec2::ZERO,
    );

    step_fixed(&mut app, TICK);

    assert!(!was_damaged(&app, enemy));
    assert!(app.world().get::<Projectile>(projectile).is_none());
    assert!(collect_events::<DamageDealt>(app.world()).is_empty());
}

#[test]
fn test_same_target_hit_only_once() {
    let mut app = test_app();
    let enemy = spawn_enemy(&mut app, 0.0, 0.0);
    let projectile = spawn_projectile(
        &mut app,
        Projectile::new(None, true, 10.0, DamageType::Physical).with_pierce(5),
        Vec2::ZERO,
        Vec2::ZERO,
    );

    for _ in 0..10 {
        step_fixed(&mut app, TICK);
    }

    assert_eq!(app.world().get::<Health>(enemy).map(|h| h.current), Some(90.0));
    let remaining = app.world().get::<Projectile>(projectile).expect("projectile despawned");
    assert_eq!(remaining.pierce, 4);
    assert!(remaining.has_hit(enemy));
}

#[test]
fn test_projectile_moves_and_reaches_target() {
    let mut app = test_app();
    let enemy = spawn_enemy(&mut app, 100.0, 0.0);
    let projectile = spawn_projectile(
        &mut app,
        Projectile::new(None, true, 10.0, DamageType::Fire),
        Vec2::ZERO,
        Vec2::new(600.0, 0.0),
    );

    // 600 u/s * 1/60 = 10 units за тик
    step_fixed(&mut app, TICK);
    let x = app
        .world()
        .get::<Transform>(projectile)
        .map(|t| t.translation.x)
        .expect("projectile despawned");
    assert!((x - 10.0).abs() < 1e-3);
    assert!(!was_damaged(&app, enemy));

    for _ in 0..10 {
        step_fixed(&mut app, TICK);
    }
    assert!(was_damaged(&app, enemy));
    assert!(app.world().get::<Projectile>(projectile).is_none());
}

#[test]
fn test_enemy_projectile_targets_player_layer() {
    let mut app = test_app();
    let enemy = spawn_enemy(&mut app, 0.0, 0.0);
    let player = app
        .world_mut()
        .spawn((Health::new(100.0), Player::default(), Transform::from_xyz(2.0, 0.0, 0.0)))
        .id();
    spawn_projectile(
        &mut app,
        Projectile::new(Some(enemy), false, 15.0, DamageType::Poison),
        Vec2::ZERO,
        Vec2::ZERO,
    );

    step_fixed(&mut app, TICK);

    assert!(!was_damaged(&app, enemy));
    assert_eq!(app.world().get::<Health>(player).map(|h| h.current), Some(85.0));
}

#[test]
fn test_dead_targets_are_skipped() {
    let mut app = test_app();
    let corpse = spawn_enemy(&mut app, 0.0, 0.0);
    app.world_mut().get_mut::<Health>(corpse).expect("no Health").current = 0.0;
    let projectile = spawn_projectile(
        &mut app,
        Projectile::new(None, true, 10.0, DamageType::Physical),
        Vec2::ZERO,
        Vec2::ZERO,
    );

    step_fixed(&mut app, TICK);

    assert!(collect_events::<DamageDealt>(app.world()).is_empty());
    assert!(app.world().get::<Projectile>(projectile).is_some());
}

#[test]
fn test_externally_despawned_projectile_leaves_index() {
    let mut app = test_app();
    let projectile = spawn_projectile(
        &mut app,
        Projectile::new(None, true, 10.0, DamageType::Physical),
        Vec2::new(500.0, 500.0),
        Vec2::ZERO,
    );

    step_fixed(&mut app, TICK);
    assert!(app.world().resource::<SpatialIndex>().contains(projectile));

    app.world_mut().despawn(projectile);
    step_fixed(&mut app, TICK);
    assert!(!app.world().resource::<SpatialIndex>().contains(projectile));
}
