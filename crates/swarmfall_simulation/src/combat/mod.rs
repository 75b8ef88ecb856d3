//! Combat module: damage resolution
//!
//! ECS ответственность:
//! - Health / shield / armor math (`damage`)
//! - Смерть (Dead + EntityKilled), лечение, DoT, i-frames
//! - Events: DamageDealt, EntityKilled
//!
//! Порядок внутри FixedUpdate задаёт `CombatSet` (см. `SimulationPlugin`):
//! Spatial → Damage → Projectiles → Effects → Weapons → Elites.

use bevy::prelude::*;

pub mod config;
pub mod damage;
pub mod systems;

pub use config::CombatConfig;
pub use damage::{
    absorb_with_shield, compute_hit, mitigate_damage, ApplyDotRequest, CritParams, DamageDealt, DamageOverTime,
    DamageResolver, DamageResult, DamageType, DealDamageRequest, EntityKilled, HealRequest,
};

/// Фазы combat tick (выполняются строго последовательно)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSet {
    /// Синхронизация акторов в SpatialIndex
    Spatial,
    /// Damage requests, DoT, i-frames
    Damage,
    /// Projectile enter/exit, движение, коллизии
    Projectiles,
    /// Melee hitboxes, area effects, summons
    Effects,
    /// Cooldowns, targeting, стрельба
    Weapons,
    /// Elite tick, реакции на события, взрывы
    Elites,
}

/// Combat Plugin (damage resolver)
///
/// Порядок выполнения в `CombatSet::Damage`:
/// 1. tick_invulnerability — i-frames
/// 2. process_damage_requests — DealDamageRequest / HealRequest / ApplyDotRequest
/// 3. tick_damage_over_time — DoT
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CombatConfig>();

        app.add_event::<DamageDealt>()
            .add_event::<EntityKilled>()
            .add_event::<DealDamageRequest>()
            .add_event::<HealRequest>()
            .add_event::<ApplyDotRequest>();

        app.add_systems(
            FixedUpdate,
            (
                systems::tick_invulnerability,
                systems::process_damage_requests,
                systems::tick_damage_over_time,
            )
                .chain()
                .in_set(CombatSet::Damage),
        );
    }
}
