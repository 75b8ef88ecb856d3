//! Weapon module: definitions, inventory, targeting, effect factory, controller
//!
//! Поток выстрела:
//! 1. `WeaponController::tick` — cooldown ≤ 0 → targeting
//! 2. `execute_fire` — StatModifiers → `WeaponEffectFactory::spawn_effect`
//! 3. Factory спавнит Projectile / MeleeHitbox / AreaEffect / Minion + `WeaponFired`
//! 4. Снаряды ведёт projectile manager, остальные эффекты — системы `effects`

use bevy::prelude::*;

pub mod controller;
pub mod definitions;
pub mod effects;
pub mod inventory;
pub mod stats;
pub mod systems;
pub mod targeting;

#[cfg(test)]
mod systems_tests;

pub use controller::WeaponController;
pub use definitions::{
    companion_always_owned, CompanionCheck, TargetingMode, WeaponCategory, WeaponDefinition, WeaponDefinitions,
    WeaponEvolution, WeaponId, WeaponScaling, WeaponStats,
};
pub use effects::{AreaEffect, FireContext, MeleeHitbox, Minion, WeaponEffectFactory, WeaponFired};
pub use inventory::{WeaponError, WeaponInstance, WeaponInventory};
pub use stats::StatModifiers;
pub use systems::{FireWeaponRequest, WeaponInventoryRequest};
pub use targeting::{aim_direction, directional_aim_point, select_target, TargetCandidate};

use crate::combat::CombatSet;

/// Weapon Plugin
///
/// `CombatSet::Effects`: melee hitboxes → area effects → minions
/// `CombatSet::Weapons`: inventory requests → fire requests → autofire
pub struct WeaponPlugin;

impl Plugin for WeaponPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WeaponDefinitions>();

        app.add_event::<WeaponFired>()
            .add_event::<FireWeaponRequest>()
            .add_event::<WeaponInventoryRequest>();

        app.add_systems(
            FixedUpdate,
            (effects::tick_melee_hitboxes, effects::tick_area_effects, effects::tick_minions)
                .chain()
                .in_set(CombatSet::Effects),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::process_inventory_requests,
                systems::process_fire_requests,
                systems::update_weapons,
            )
                .chain()
                .in_set(CombatSet::Weapons),
        );
    }
}
