//! Projectile manager
//!
//! Владеет жизненным циклом снарядов после спавна:
//! движение по Velocity, sync с SpatialIndex, lifetime, коллизии, pierce, удаление.
//! Урон — только через `DamageResolver` (can_crit = true, snapshot крита из снаряда).

use bevy::prelude::*;

pub mod components;
pub mod systems;

#[cfg(test)]
mod systems_tests;

pub use components::Projectile;
pub use systems::{track_projectile_lifecycle, update_projectiles};

use crate::combat::CombatSet;

/// Projectile Plugin
///
/// Порядок в `CombatSet::Projectiles`:
/// 1. track_projectile_lifecycle — enter/exit diff
/// 2. update_projectiles — движение + коллизии + отложенное удаление
pub struct ProjectilePlugin;

impl Plugin for ProjectilePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (track_projectile_lifecycle, update_projectiles)
                .chain()
                .in_set(CombatSet::Projectiles),
        );
    }
}
