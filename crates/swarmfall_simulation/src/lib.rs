//! Swarmfall Simulation Core
//!
//! Боевое ядро bullet-heaven на Bevy 0.16 (headless ECS)
//!
//! Подсистемы (порядок в FixedUpdate, `CombatSet`):
//! - Spatial: синхронизация акторов в `SpatialIndex`
//! - Damage: урон, лечение, DoT, i-frames
//! - Projectiles: движение, pierce, столкновения снарядов
//! - Effects: melee hitbox, area, minion
//! - Weapons: cooldown, targeting, autofire, inventory
//! - Elites: elite модификаторы, vampiric, щит, взрывы
//!
//! Рендер, звук, UI — снаружи: слушают events (DamageDealt, WeaponFired, EliteSpawned...).
//! Итоги прогона копит `CombatReport`.

use bevy::ecs::event::event_update_system;
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod combat;
pub mod components;
pub mod elite;
pub mod logger;
pub mod projectile;
pub mod report;
pub mod spatial;
pub mod weapon;

// Re-export базовых типов для удобства
pub use combat::{
    CombatConfig, CombatPlugin, CombatSet, DamageDealt, DamageResolver, DamageResult, DamageType,
    DealDamageRequest, EntityKilled, HealRequest,
};
pub use components::*;
pub use elite::{ElitePlugin, EliteModifier, EliteModifiers, Elites, MakeEliteRequest};
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use projectile::{Projectile, ProjectilePlugin};
pub use report::CombatReport;
pub use spatial::{SpatialIndex, SpatialLayer};
pub use weapon::{
    StatModifiers, WeaponController, WeaponDefinitions, WeaponFired, WeaponId, WeaponInventory, WeaponPlugin,
};

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Fixed timestep 60Hz для simulation tick
        app.insert_resource(Time::<Fixed>::from_hz(60.0));

        // Seed из create_headless_app не перетираем
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.init_resource::<SpatialIndex>();
        app.init_resource::<CombatReport>();

        app.configure_sets(
            FixedUpdate,
            (
                CombatSet::Spatial,
                CombatSet::Damage,
                CombatSet::Projectiles,
                CombatSet::Effects,
                CombatSet::Weapons,
                CombatSet::Elites,
            )
                .chain(),
        );

        app.add_systems(FixedUpdate, spatial::sync_actor_index.in_set(CombatSet::Spatial));

        app.add_plugins((CombatPlugin, ProjectilePlugin, WeaponPlugin, ElitePlugin));

        app.add_systems(FixedUpdate, report::record_combat_report.after(CombatSet::Elites));
    }
}

/// Детерминистичный RNG resource (seeded)
///
/// Единственный источник случайности: crit rolls, random targeting, elite rolls.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Один fixed tick с явным delta (тесты, headless прогоны)
///
/// Не зависит от wall clock: `Time<Fixed>` сдвигается ровно на `delta`.
/// Перед тиком буферы events сдвигаются, как в `First` при `app.update()`:
/// readers ещё видят прошлый тик, более старые events отбрасываются.
pub fn step_fixed(app: &mut App, delta: f32) {
    let world = app.world_mut();
    if let Err(error) = world.run_system_cached(event_update_system) {
        log_error(&format!("step_fixed: event update failed: {}", error));
    }
    world
        .resource_mut::<Time<Fixed>>()
        .advance_by(Duration::from_secs_f32(delta));
    world.run_schedule(FixedUpdate);
}

/// Events, записанные за последний `step_fixed` (и после него)
pub fn collect_events<E: Event + Clone>(world: &World) -> Vec<E> {
    world
        .get_resource::<Events<E>>()
        .map(|events| events.iter_current_update_events().cloned().collect())
        .unwrap_or_default()
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
