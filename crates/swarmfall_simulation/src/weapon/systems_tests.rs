//! Tests for weapon controller, effect factory and effect systems.

use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;

use crate::combat::{CombatConfig, DamageDealt};
use crate::components::{Collider, Enemy, Health, Player};
use crate::projectile::Projectile;
use crate::report::CombatReport;
use crate::spatial::SpatialIndex;
use crate::weapon::{
    AreaEffect, MeleeHitbox, Minion, StatModifiers, WeaponController, WeaponError, WeaponFired, WeaponId,
    WeaponInventory, WeaponInventoryRequest,
};
use crate::{collect_events, create_headless_app, step_fixed, SimulationPlugin};

const TICK: f32 = 1.0 / 60.0;

fn test_app() -> App {
    let mut app = create_headless_app(11);
    app.add_plugins(SimulationPlugin);
    app
}

fn spawn_player(app: &mut App) -> Entity {
    app.world_mut()
        .spawn((
            Player::default(),
            Health::new(100.0),
            WeaponInventory::default(),
            Transform::default(),
            Collider::new(12.0),
        ))
        .id()
}

fn spawn_enemy(app: &mut App, x: f32, y: f32) -> Entity {
    app.world_mut()
        .spawn((Enemy, Health::new(100.0), Transform::from_xyz(x, y, 0.0), Collider::new(12.0)))
        .id()
}

fn equip(app: &mut App, owner: Entity, weapon: &str) -> Result<bool, WeaponError> {
    let id = WeaponId::from(weapon);
    app.world_mut()
        .run_system_once(move |mut controller: WeaponController| controller.add_weapon(owner, &id))
        .expect("equip system failed")
}

fn cooldown(app: &App, owner: Entity, weapon: &str) -> f32 {
    app.world()
        .get::<WeaponInventory>(owner)
        .and_then(|inventory| inventory.get(&weapon.into()))
        .map(|instance| instance.current_cooldown)
        .expect("weapon not equipped")
}

fn count<T: Component>(app: &mut App) -> usize {
    let world = app.world_mut();
    world.query::<&T>().iter(world).count()
}

#[test]
fn test_closest_autofire_spawns_projectile_toward_target() {
    let mut app = test_app();
    let player = spawn_player(&mut app);
    spawn_enemy(&mut app, 200.0, 0.0);
    spawn_enemy(&mut app, 0.0, 100.0);
    assert_eq!(equip(&mut app, player, "magic_wand"), Ok(true));

    step_fixed(&mut app, TICK);

    let fired = collect_events::<WeaponFired>(app.world());
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].entity, player);
    assert_eq!(fired[0].projectile_count, 1);
    assert!((fired[0].direction - Vec2::Y).length() < 1e-5);

    assert_eq!(count::<Projectile>(&mut app), 1);
    assert!((cooldown(&app, player, "magic_wand") - 1.2).abs() < 1e-5);
}

#[test]
fn test_no_target_in_range_does_not_fire() {
    let mut app = test_app();
    let player = spawn_player(&mut app);
    spawn_enemy(&mut app, 2000.0, 0.0);
    equip(&mut app, player, "magic_wand").unwrap();

    step_fixed(&mut app, TICK);
    step_fixed(&mut app, TICK);

    assert_eq!(app.world().resource::<CombatReport>().fired("magic_wand"), 0);
    assert_eq!(count::<Projectile>(&mut app), 0);
    assert!(cooldown(&app, player, "magic_wand") <= 0.0);
}

#[test]
fn test_projectile_fan_spans_spread() {
    let mut app = test_app();
    let player = spawn_player(&mut app);
    app.world_mut().entity_mut(player).insert(StatModifiers {
        projectile_count_bonus: 2,
        ..Default::default()
    });
    spawn_enemy(&mut app, 100.0, 0.0);
    equip(&mut app, player, "magic_wand").unwrap();

    step_fixed(&mut app, TICK);

    let world = app.world_mut();
    let mut angles: Vec<f32> = world
        .query::<(&Projectile, &crate::components::Velocity)>()
        .iter(world)
        .map(|(_, velocity)| velocity.0.y.atan2(velocity.0.x))
        .collect();
    angles.sort_by(|a, b| a.total_cmp(b));

    assert_eq!(angles.len(), 3);
    let spread = CombatConfig::default().projectile_spread;
    assert!((angles[2] - angles[0] - spread).abs() < 1e-4);
    assert!(angles[1].abs() < 1e-4);
}

#[test]
fn test_cooldown_reduction_floors_post_fire_cooldown() {
    let mut app = test_app();
    let player = spawn_player(&mut app);
    app.world_mut().entity_mut(player).insert(StatModifiers {
        cooldown_reduction: 0.99,
        ..Default::default()
    });
    spawn_enemy(&mut app, 50.0, 0.0);
    equip(&mut app, player, "magic_wand").unwrap();

    step_fixed(&mut app, TICK);

    let remaining = cooldown(&app, player, "magic_wand");
    assert!(remaining >= 0.1);
    // cdr cap 0.9 → 1.2 × 0.1
    assert!((remaining - 0.12).abs() < 1e-4);
}

#[test]
fn test_manual_fire_requires_ready_cooldown() {
    let mut app = test_app();
    let player = spawn_player(&mut app);
    equip(&mut app, player, "magic_wand").unwrap();
    let id = WeaponId::from("magic_wand");

    // Цель совпадает с позицией владельца → направление (0, 1)
    let fire = move |mut controller: WeaponController| controller.fire_weapon(player, &id, Vec2::ZERO);
    assert_eq!(app.world_mut().run_system_once(fire.clone()).unwrap(), Ok(true));
    assert_eq!(app.world_mut().run_system_once(fire).unwrap(), Ok(false));

    let fired = collect_events::<WeaponFired>(app.world());
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].direction, Vec2::Y);
}

#[test]
fn test_fire_unequipped_weapon_returns_false() {
    let mut app = test_app();
    let player = spawn_player(&mut app);
    let id = WeaponId::from("whip");

    let result = app
        .world_mut()
        .run_system_once(move |mut controller: WeaponController| controller.fire_weapon(player, &id, Vec2::X))
        .unwrap();

    assert_eq!(result, Ok(false));
}

#[test]
fn test_area_weapon_pulses_and_refreshes() {
    let mut app = test_app();
    let player = spawn_player(&mut app);
    let near = spawn_enemy(&mut app, 30.0, 0.0);
    let far = spawn_enemy(&mut app, 200.0, 0.0);
    equip(&mut app, player, "garlic").unwrap();

    // Тик 1: выстрел → аура. Тик 2: первый импульс.
    step_fixed(&mut app, TICK);
    assert_eq!(count::<AreaEffect>(&mut app), 1);
    step_fixed(&mut app, TICK);

    assert_eq!(app.world().get::<Health>(near).map(|h| h.current), Some(95.0));
    assert_eq!(app.world().get::<Health>(far).map(|h| h.current), Some(100.0));

    // Повторные выстрелы обновляют ту же ауру
    for _ in 0..40 {
        step_fixed(&mut app, 0.1);
    }
    assert!(app.world().resource::<CombatReport>().fired("garlic") >= 2);
    assert_eq!(count::<AreaEffect>(&mut app), 1);
}

#[test]
fn test_remove_weapon_despawns_its_area() {
    let mut app = test_app();
    let player = spawn_player(&mut app);
    equip(&mut app, player, "garlic").unwrap();
    step_fixed(&mut app, TICK);
    assert_eq!(count::<AreaEffect>(&mut app), 1);

    let id = WeaponId::from("garlic");
    let removed = app
        .world_mut()
        .run_system_once(move |mut controller: WeaponController| controller.remove_weapon(player, &id))
        .unwrap();

    assert!(removed);
    assert_eq!(count::<AreaEffect>(&mut app), 0);
    assert!(app.world().get::<WeaponInventory>(player).unwrap().is_empty());
}

#[test]
fn test_passive_area_has_no_expiry() {
    let mut app = test_app();
    let player = spawn_player(&mut app);
    equip(&mut app, player, "spirit_ward").unwrap();

    step_fixed(&mut app, TICK);

    let world = app.world_mut();
    let remaining: Vec<Option<f32>> = world.query::<&AreaEffect>().iter(world).map(|a| a.remaining).collect();
    assert_eq!(remaining, vec![None]);
}

#[test]
fn test_melee_hitbox_hits_once_then_expires() {
    let mut app = test_app();
    let player = spawn_player(&mut app);
    let enemy = spawn_enemy(&mut app, 50.0, 0.0);
    equip(&mut app, player, "whip").unwrap();

    step_fixed(&mut app, TICK);
    assert_eq!(count::<MeleeHitbox>(&mut app), 1);
    let mut damage = collect_events::<DamageDealt>(app.world());

    for _ in 0..20 {
        step_fixed(&mut app, TICK);
        damage.extend(collect_events::<DamageDealt>(app.world()));
    }

    let hits = damage.into_iter().filter(|event| event.target == enemy).count();
    assert_eq!(hits, 1);
    assert_eq!(count::<MeleeHitbox>(&mut app), 0);

    // Hitbox убран и из индекса: в индексе остались только актёры
    assert_eq!(app.world().resource::<SpatialIndex>().len(), 2);
}

#[test]
fn test_summon_spawns_minions_that_expire() {
    let mut app = test_app();
    let player = spawn_player(&mut app);
    equip(&mut app, player, "familiar").unwrap();

    step_fixed(&mut app, 0.5);
    assert_eq!(count::<Minion>(&mut app), 1);

    for _ in 0..13 {
        step_fixed(&mut app, 0.5);
    }
    assert_eq!(count::<Minion>(&mut app), 0);
}

#[test]
fn test_inventory_requests_level_and_evolve() {
    let mut app = test_app();
    let player = spawn_player(&mut app);
    let wand = WeaponId::from("magic_wand");

    app.world_mut().send_event(WeaponInventoryRequest::Add {
        entity: player,
        weapon_id: wand.clone(),
    });
    for _ in 0..7 {
        app.world_mut().send_event(WeaponInventoryRequest::Upgrade {
            entity: player,
            weapon_id: wand.clone(),
        });
    }
    app.world_mut().send_event(WeaponInventoryRequest::Evolve {
        entity: player,
        weapon_id: wand.clone(),
    });

    step_fixed(&mut app, TICK);

    let inventory = app.world().get::<WeaponInventory>(player).unwrap();
    assert!(!inventory.contains(&wand));
    assert_eq!(inventory.get(&"holy_wand".into()).map(|w| w.level), Some(1));
}

#[test]
fn test_unknown_weapon_request_is_reported_not_applied() {
    let mut app = test_app();
    let player = spawn_player(&mut app);

    assert_eq!(
        equip(&mut app, player, "laser_sword"),
        Err(WeaponError::UnknownDefinition("laser_sword".into()))
    );

    app.world_mut().send_event(WeaponInventoryRequest::Add {
        entity: player,
        weapon_id: "laser_sword".into(),
    });
    step_fixed(&mut app, TICK);

    assert!(app.world().get::<WeaponInventory>(player).unwrap().is_empty());
}

#[test]
fn test_owner_without_inventory_is_rejected() {
    let mut app = test_app();
    let enemy = spawn_enemy(&mut app, 0.0, 0.0);

    assert_eq!(equip(&mut app, enemy, "magic_wand"), Ok(false));
}
