//! Headless арена Swarmfall
//!
//! Игрок с оружием против волны врагов (часть — elite), без рендера.
//! Ход боя пишется в журнал (`BufferLogger`), в конце журнал и итог
//! из `CombatReport` печатаются одним блоком.

use bevy::prelude::*;
use swarmfall_simulation::logger::{BufferLogger, LogLevel};
use swarmfall_simulation::weapon::WeaponInventoryRequest;
use swarmfall_simulation::*;

const TICK: f32 = 1.0 / 60.0;
const TICK_COUNT: usize = 1800;
const ENEMY_COUNT: usize = 40;

fn main() {
    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(42);
    println!("Starting Swarmfall headless arena (seed: {})", seed);

    // init_logger в create_headless_app занятый слот не трогает
    let journal = BufferLogger::new();
    logger::set_logger(Box::new(journal.clone()));
    logger::set_log_level(LogLevel::Info);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    let player = app
        .world_mut()
        .spawn((
            Player::default(),
            Health::new(200.0).with_armor(5.0),
            WeaponInventory::default(),
            StatModifiers {
                cooldown_reduction: 0.2,
                ..Default::default()
            },
            Transform::default(),
            Collider::new(12.0),
        ))
        .id();

    for weapon in ["magic_wand", "garlic", "whip", "familiar"] {
        app.world_mut().send_event(WeaponInventoryRequest::Add {
            entity: player,
            weapon_id: weapon.into(),
        });
    }

    for i in 0..ENEMY_COUNT {
        let angle = i as f32 * std::f32::consts::TAU / ENEMY_COUNT as f32;
        let distance = 60.0 + (i % 5) as f32 * 50.0;
        let position = Vec2::from_angle(angle) * distance;
        let mut enemy = app.world_mut().spawn((
            Enemy,
            Health::new(30.0),
            MovementSpeed::default(),
            Transform::from_xyz(position.x, position.y, 0.0),
            Collider::new(10.0),
        ));
        if i % 10 == 0 {
            enemy.insert(WeaponInventory::default());
        }
        let enemy = enemy.id();

        if i % 10 == 0 {
            app.world_mut().send_event(WeaponInventoryRequest::Add {
                entity: enemy,
                weapon_id: "acid_spit".into(),
            });
        }
        app.world_mut().send_event(MakeEliteRequest::roll(enemy, 1, 8.0));
    }

    let boss = app
        .world_mut()
        .spawn((
            Enemy,
            Boss,
            Health::new(400.0),
            Transform::from_xyz(0.0, 280.0, 0.0),
            Collider::new(30.0),
        ))
        .id();
    app.world_mut().send_event(MakeEliteRequest::roll(boss, 100, 20.0));

    // Level up wand на середине боя
    for tick in 0..TICK_COUNT {
        if tick == TICK_COUNT / 2 {
            app.world_mut().send_event(WeaponInventoryRequest::Upgrade {
                entity: player,
                weapon_id: "magic_wand".into(),
            });
        }

        step_fixed(&mut app, TICK);

        if tick % 300 == 0 {
            let world = app.world();
            let hp = world.get::<Health>(player).map_or(0.0, |h| h.current);
            let kills = world.get::<Player>(player).map_or(0, |p| p.kills);
            log_info(&format!(
                "Tick {}: {} entities, player hp {:.1}, kills {}",
                tick,
                world.entities().len(),
                hp,
                kills
            ));
        }
    }

    let world = app.world();
    let report = world.resource::<CombatReport>();
    let kills = world.get::<Player>(player).map_or(0, |p| p.kills);
    let boss_dead = world.get::<Dead>(boss).is_some();

    log_info(&format!(
        "Damage events: {} ({} crit), total {:.1}",
        report.damage_events, report.critical_hits, report.total_damage
    ));
    for (weapon_id, shots) in &report.weapons_fired {
        log_info(&format!("  {}: {} shots", weapon_id, shots));
    }
    log_info(&format!(
        "Elites spawned: {}, exploded: {}",
        report.elites_spawned, report.explosions
    ));
    log_info(&format!(
        "Player kills: {} / {} (boss dead: {}), total deaths {}, xp {}",
        kills,
        ENEMY_COUNT + 1,
        boss_dead,
        report.kills,
        report.xp_awarded
    ));

    let lines = journal.lines();
    let problems = lines.iter().filter(|line| !line.starts_with("[INFO]")).count();
    println!("Simulation complete! ({} ticks, {} warnings/errors)", report.ticks, problems);
    for line in lines {
        println!("{}", line);
    }
}
