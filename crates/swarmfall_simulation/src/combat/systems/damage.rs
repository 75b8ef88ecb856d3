//! Damage maintenance systems: i-frames, DoT, request events.

use bevy::prelude::*;

use crate::combat::{ApplyDotRequest, DamageOverTime, DamageResolver, DealDamageRequest, HealRequest};
use crate::components::Health;

/// Система: тикаем i-frames, снимаем флаг при invulnerable_time ≤ 0
pub fn tick_invulnerability(mut healths: Query<&mut Health>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for mut health in healths.iter_mut() {
        if health.invulnerable {
            health.tick_invulnerability(delta);
        }
    }
}

/// Система: запросы от внешних коллабораторов (deal_damage / heal / DoT)
pub fn process_damage_requests(
    mut damage_requests: EventReader<DealDamageRequest>,
    mut heal_requests: EventReader<HealRequest>,
    mut dot_requests: EventReader<ApplyDotRequest>,
    mut resolver: DamageResolver,
) {
    for request in damage_requests.read() {
        resolver.resolve(request);
    }

    for request in heal_requests.read() {
        resolver.heal(request.entity, request.amount);
    }

    for request in dot_requests.read() {
        resolver.apply_damage_over_time(
            request.source,
            request.target,
            request.damage_per_second,
            request.duration,
            request.damage_type,
        );
    }
}

/// Система: DoT тик
///
/// Каждый тик `dps * dt` через resolver без крита (min-1 floor действует
/// и здесь — каждый тик DoT наносит минимум 1).
/// DoT снимается когда elapsed ≥ duration или цель уже мертва.
pub fn tick_damage_over_time(
    mut dots: Query<(Entity, &mut DamageOverTime)>,
    mut resolver: DamageResolver,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut dot) in dots.iter_mut() {
        if resolver.is_dead(entity) {
            resolver.commands().entity(entity).remove::<DamageOverTime>();
            continue;
        }

        dot.elapsed += delta;
        let request = DealDamageRequest::new(dot.source, entity, dot.damage_per_second * delta, dot.damage_type);
        resolver.resolve(&request);

        if dot.is_finished() {
            resolver.commands().entity(entity).remove::<DamageOverTime>();
        }
    }
}
