//! Elite modifier manager
//!
//! Вероятностные апгрейды врагов (Vampiric / Fast / Giant / Shielded / Explosive)
//! и их эффекты: лечение от урона, регенерирующий щит, взрыв при смерти.
//!
//! Внешние слушатели подписываются на hook events
//! (`EliteSpawned`, `VampiricHealed`, `EliteExploded`, `EliteShieldHit`).

use bevy::prelude::*;

pub mod components;
pub mod modifiers;
pub mod systems;


pub use components::{
    EliteExploded, EliteModifier, EliteShieldHit, EliteSpawned, MakeEliteRequest, PendingExplosion,
    PendingExplosions, VampiricHealed,
};
pub use modifiers::{elite_display_name, roll_modifiers, EliteConfig, EliteModifiers, ModifierProfile};
pub use systems::{try_make_elite, Elites};

use crate::combat::CombatSet;

/// Elite Plugin (CombatSet::Elites)
pub struct ElitePlugin;

impl Plugin for ElitePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EliteConfig>()
            .init_resource::<PendingExplosions>();

        app.add_event::<MakeEliteRequest>()
            .add_event::<EliteSpawned>()
            .add_event::<VampiricHealed>()
            .add_event::<EliteExploded>()
            .add_event::<EliteShieldHit>();

        app.add_systems(
            FixedUpdate,
            (
                systems::process_make_elite_requests,
                systems::react_to_damage,
                systems::queue_explosions,
                systems::detonate_explosions,
                systems::tick_elites,
            )
                .chain()
                .in_set(CombatSet::Elites),
        );
    }
}
