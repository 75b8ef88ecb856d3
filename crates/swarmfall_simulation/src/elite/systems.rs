//! Elite modifier manager: превращение в elite, tick, реакции, взрывы
//!
//! Порядок в `CombatSet::Elites`:
//! 1. process_make_elite_requests — `try_make_elite` через commands
//! 2. react_to_damage — vampiric лечение, сброс регенерации щита
//! 3. queue_explosions — EntityKilled explosive → PendingExplosions
//! 4. detonate_explosions — дренаж очереди (без рекурсии внутри прохода)
//! 5. tick_elites — косметика + регенерация щита

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use rand::Rng;

use crate::combat::{DamageDealt, DamageResolver, DamageType, DealDamageRequest, EntityKilled};
use crate::components::{Boss, Collider, Dead, Enemy, Health, MovementSpeed, SpriteSize};
use crate::elite::{
    elite_display_name, roll_modifiers, EliteConfig, EliteExploded, EliteModifier, EliteModifiers, EliteShieldHit,
    EliteSpawned, MakeEliteRequest, PendingExplosion, PendingExplosions, VampiricHealed,
};
use crate::spatial::SpatialIndex;
use crate::DeterministicRng;

/// Попытка сделать entity elite. true — модификаторы повешены.
///
/// Уже elite → false (идемпотентно). Не forced и не Boss → roll против `elite_chance`.
/// Множители применяются только к присутствующим компонентам.
pub fn try_make_elite(world: &mut World, request: MakeEliteRequest) -> bool {
    let entity = request.entity;
    if world.get_entity(entity).is_err() || world.get::<EliteModifier>(entity).is_some() {
        return false;
    }

    let config = world.resource::<EliteConfig>().clone();
    let is_boss = request.force_boss || world.get::<Boss>(entity).is_some();

    let modifiers = {
        let mut rng = world.resource_mut::<DeterministicRng>();
        if !request.force_elite && !is_boss && rng.rng.gen::<f32>() >= config.elite_chance {
            return false;
        }
        let count = if is_boss {
            config.boss_modifier_count
        } else {
            config.elite_modifier_count
        };
        roll_modifiers(&mut rng.rng, count)
    };

    let profile = config.combined(modifiers);
    let xp_multiplier = config.xp_multiplier(modifiers);

    if let Some(mut health) = world.get_mut::<Health>(entity) {
        health.max *= profile.health_multiplier;
        health.current *= profile.health_multiplier;
        if modifiers.contains(EliteModifiers::SHIELDED) {
            health.shield_max = health.max * config.shield_fraction;
            health.shield = health.shield_max;
        }
    }
    if let Some(mut speed) = world.get_mut::<MovementSpeed>(entity) {
        speed.speed *= profile.speed_multiplier;
    }
    if let Some(mut transform) = world.get_mut::<Transform>(entity) {
        transform.scale *= profile.scale_multiplier;
    }
    if let Some(mut collider) = world.get_mut::<Collider>(entity) {
        collider.radius *= profile.scale_multiplier;
    }
    if let Some(mut size) = world.get_mut::<SpriteSize>(entity) {
        size.0 *= profile.scale_multiplier;
    }

    let elite = EliteModifier {
        modifiers,
        base_xp_value: request.base_xp,
        xp_multiplier,
        shield_regen_timer: 0.0,
        shield_regen_delay: config.shield_regen_delay,
        shield_regen_rate: config.shield_regen_rate,
        vampiric_heal_percent: if modifiers.contains(EliteModifiers::VAMPIRIC) {
            config.vampiric_heal_percent
        } else {
            0.0
        },
        explosion_radius: if modifiers.contains(EliteModifiers::EXPLOSIVE) {
            config.explosion_radius
        } else {
            0.0
        },
        explosion_damage: if modifiers.contains(EliteModifiers::EXPLOSIVE) {
            request.base_damage * config.explosion_damage_multiplier
        } else {
            0.0
        },
        effect_timer: 0.0,
    };
    world.entity_mut(entity).insert(elite);

    world.send_event(EliteSpawned {
        entity,
        modifiers,
        xp_multiplier,
    });
    crate::logger::log(&format!(
        "👑 {:?} became {} (xp ×{:.2})",
        entity,
        elite_display_name("elite", modifiers),
        xp_multiplier
    ));

    true
}

/// SystemParam: read-only запросы к elite состоянию
#[derive(SystemParam)]
pub struct Elites<'w, 's> {
    elites: Query<'w, 's, &'static EliteModifier>,
}

impl<'w, 's> Elites<'w, 's> {
    pub fn is_elite(&self, entity: Entity) -> bool {
        self.elites.contains(entity)
    }

    pub fn has_modifier(&self, entity: Entity, modifier: EliteModifiers) -> bool {
        self.elites.get(entity).is_ok_and(|elite| elite.has(modifier))
    }

    /// Пустая маска для обычных врагов
    pub fn modifiers(&self, entity: Entity) -> EliteModifiers {
        self.elites
            .get(entity)
            .map_or(EliteModifiers::empty(), |elite| elite.modifiers)
    }

    /// 1.0 для обычных врагов
    pub fn xp_multiplier(&self, entity: Entity) -> f32 {
        self.elites.get(entity).map_or(1.0, |elite| elite.xp_multiplier)
    }

    pub fn display_name(&self, entity: Entity, base_name: &str) -> String {
        elite_display_name(base_name, self.modifiers(entity))
    }
}

/// Система: MakeEliteRequest → try_make_elite (exclusive доступ через commands)
pub fn process_make_elite_requests(mut requests: EventReader<MakeEliteRequest>, mut commands: Commands) {
    for request in requests.read().copied() {
        commands.queue(move |world: &mut World| {
            try_make_elite(world, request);
        });
    }
}

/// Система: реакции на DamageDealt (vampiric heal, shield hit)
pub fn react_to_damage(
    mut damage_events: EventReader<DamageDealt>,
    mut elites: Query<(&mut EliteModifier, &mut Health), Without<Dead>>,
    mut healed_events: EventWriter<VampiricHealed>,
    mut shield_events: EventWriter<EliteShieldHit>,
) {
    for event in damage_events.read() {
        if let Some(source) = event.source {
            if let Ok((elite, mut health)) = elites.get_mut(source) {
                if elite.has(EliteModifiers::VAMPIRIC) && health.is_alive() {
                    let healed = health.heal(event.amount * elite.vampiric_heal_percent);
                    if healed > 0.0 {
                        healed_events.write(VampiricHealed {
                            entity: source,
                            target: event.target,
                            amount: healed,
                        });
                    }
                }
            }
        }

        if let Ok((mut elite, health)) = elites.get_mut(event.target) {
            if elite.has(EliteModifiers::SHIELDED) {
                elite.shield_regen_timer = 0.0;
                shield_events.write(EliteShieldHit {
                    entity: event.target,
                    shield_remaining: health.shield,
                });
            }
        }
    }
}

/// Система: смерть explosive elite → взрыв в очередь
pub fn queue_explosions(
    mut killed_events: EventReader<EntityKilled>,
    elites: Query<&EliteModifier>,
    mut pending: ResMut<PendingExplosions>,
) {
    for event in killed_events.read() {
        let Ok(elite) = elites.get(event.entity) else {
            continue;
        };
        if !elite.has(EliteModifiers::EXPLOSIVE) {
            continue;
        }
        pending.queue.push(PendingExplosion {
            source: event.entity,
            position: event.position,
            radius: elite.explosion_radius,
            damage: elite.explosion_damage,
        });
    }
}

/// Система: детонация очереди взрывов
///
/// Цели — не враги, живые, в радиусе. Линейный falloff `damage × (1 - dist/radius)`.
/// Урон без источника. Взрывы, порождённые этим проходом, ждут следующего тика.
pub fn detonate_explosions(
    mut pending: ResMut<PendingExplosions>,
    index: Res<SpatialIndex>,
    enemies: Query<(), With<Enemy>>,
    mut resolver: DamageResolver,
    mut exploded_events: EventWriter<EliteExploded>,
) {
    let explosions = std::mem::take(&mut pending.queue);

    for explosion in explosions {
        let mut targets_hit = 0;

        for target in index.query_radius(explosion.position, explosion.radius, None) {
            if enemies.contains(target) || !resolver.has_health(target) || resolver.is_dead(target) {
                continue;
            }
            let target_position = resolver
                .position_of(target)
                .or_else(|| index.get(target).map(|entry| entry.position))
                .unwrap_or(explosion.position);
            let distance = target_position.distance(explosion.position);
            let damage = explosion.damage * (1.0 - distance / explosion.radius).max(0.0);
            if damage <= 0.0 {
                continue;
            }

            let request = DealDamageRequest::new(None, target, damage, DamageType::Explosion);
            if resolver.resolve(&request).total() > 0.0 {
                targets_hit += 1;
            }
        }

        exploded_events.write(EliteExploded {
            entity: explosion.source,
            position: explosion.position,
            radius: explosion.radius,
            targets_hit,
        });
        crate::logger::log(&format!(
            "💥 Elite {:?} exploded at {:?} (hit {})",
            explosion.source, explosion.position, targets_hit
        ));
    }
}

/// Система: косметический таймер + регенерация щита
pub fn tick_elites(
    mut elites: Query<(&mut EliteModifier, Option<&mut Health>), Without<Dead>>,
    config: Res<EliteConfig>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (mut elite, health) in elites.iter_mut() {
        elite.effect_timer += delta;
        if config.effect_period > 0.0 && elite.effect_timer >= config.effect_period {
            elite.effect_timer %= config.effect_period;
        }

        if !elite.has(EliteModifiers::SHIELDED) {
            continue;
        }
        let Some(mut health) = health else {
            continue;
        };

        elite.shield_regen_timer += delta;
        if elite.shield_regen_timer >= elite.shield_regen_delay && health.shield < health.shield_max {
            let amount = elite.shield_regen_rate * delta;
            health.restore_shield(amount);
        }
    }
}
