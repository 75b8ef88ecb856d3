//! Projectile manager systems
//!
//! Порядок за тик (CombatSet::Projectiles):
//! 1. `track_projectile_lifecycle` — enter/exit diff (до любых мутаций)
//! 2. `update_projectiles` — движение, sync индекса, lifetime, коллизии, удаление

use bevy::prelude::*;

use crate::combat::{CombatConfig, DamageResolver, DealDamageRequest};
use crate::components::{planar_position, Collider, Health, Velocity};
use crate::projectile::Projectile;
use crate::spatial::{SpatialIndex, SpatialLayer};

/// Система: новые снаряды → hit tracking + insert в индекс; исчезнувшие → remove
pub fn track_projectile_lifecycle(
    mut entered: Query<(Entity, &Transform, &mut Projectile, Option<&Collider>), Added<Projectile>>,
    mut exited: RemovedComponents<Projectile>,
    mut index: ResMut<SpatialIndex>,
    config: Res<CombatConfig>,
) {
    for entity in exited.read() {
        if index.contains(entity) {
            index.remove(entity);
        }
    }

    for (entity, transform, mut projectile, collider) in entered.iter_mut() {
        projectile.hit_targets.clear();
        let radius = collider.map_or(config.projectile_default_radius, |c| c.radius);
        index.insert(entity, planar_position(transform), radius, SpatialLayer::Projectile);
    }
}

/// Система: движение + коллизии снарядов
///
/// Удаление отложено до конца полного прохода (список `expired`).
pub fn update_projectiles(
    mut projectiles: Query<
        (Entity, &mut Transform, &mut Projectile, Option<&Velocity>, Option<&Collider>),
        Without<Health>,
    >,
    mut index: ResMut<SpatialIndex>,
    mut resolver: DamageResolver,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    let default_radius = resolver.config().projectile_default_radius;
    let query_margin = resolver.config().projectile_query_margin;

    let mut expired = Vec::new();

    for (entity, mut transform, mut projectile, velocity, collider) in projectiles.iter_mut() {
        if let Some(velocity) = velocity {
            transform.translation += (velocity.0 * delta).extend(0.0);
        }

        let position = planar_position(&transform);
        let radius = collider.map_or(default_radius, |c| c.radius);
        if !index.update(entity, position, radius, SpatialLayer::Projectile) {
            index.insert(entity, position, radius, SpatialLayer::Projectile);
        }

        projectile.lifetime -= delta;
        if projectile.lifetime <= 0.0 {
            expired.push(entity);
            continue;
        }

        let layer = SpatialLayer::opposing(projectile.owner_is_player);
        for target in index.query_radius(position, radius + query_margin, Some(layer)) {
            if projectile.has_hit(target) || !resolver.has_health(target) || resolver.is_dead(target) {
                continue;
            }
            let Some(entry) = index.get(target) else {
                continue;
            };
            let reach = radius + entry.radius;
            if entry.position.distance_squared(position) > reach * reach {
                continue;
            }

            projectile.record_hit(target);
            let request = DealDamageRequest::new(projectile.owner, target, projectile.damage, projectile.damage_type)
                .with_crit_override(projectile.crit_chance, projectile.crit_multiplier);
            resolver.resolve(&request);

            projectile.pierce -= 1;
            if projectile.pierce <= 0 {
                expired.push(entity);
                break;
            }
        }
    }

    for entity in expired {
        if let Ok((_, _, mut projectile, _, _)) = projectiles.get_mut(entity) {
            projectile.hit_targets.clear();
        }
        index.remove(entity);
        resolver.commands().entity(entity).despawn();
    }
}
