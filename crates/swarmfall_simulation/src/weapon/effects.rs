//! Weapon effect factory + effect entities (melee hitbox, area, summon)
//!
//! Factory превращает выстрел (`FireContext`) в entities по категории оружия:
//! - Projectile: `projectile_count` снарядов веером `projectile_spread`
//! - Melee: hitbox перед владельцем (свой hit set, живёт `melee_duration`)
//! - Area: аура вокруг владельца, refresh по (owner, weapon)
//! - Passive: Area с бесконечной длительностью
//! - Summon: миньоны вокруг владельца
//!
//! Каждый выстрел → `WeaponFired`.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f32::consts::TAU;

use crate::combat::{CombatConfig, DamageResolver, DamageType, DealDamageRequest};
use crate::components::{planar_position, Collider, Health, Velocity};
use crate::projectile::Projectile;
use crate::spatial::{SpatialIndex, SpatialLayer};
use crate::weapon::{WeaponCategory, WeaponId, WeaponInventory, WeaponStats};

/// Event: оружие выстрелило
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponFired {
    pub entity: Entity,
    pub weapon_id: WeaponId,
    pub position: Vec2,
    pub direction: Vec2,
    pub projectile_count: u32,
}

/// Всё, что нужно factory для одного выстрела (статы уже с StatModifiers)
#[derive(Debug, Clone, PartialEq)]
pub struct FireContext {
    pub owner: Entity,
    pub owner_is_player: bool,
    pub weapon_id: WeaponId,
    pub category: WeaponCategory,
    pub damage_type: DamageType,
    pub position: Vec2,
    pub direction: Vec2,
    pub stats: WeaponStats,
}

/// Melee hitbox (вне projectile manager)
#[derive(Component, Debug, Clone, PartialEq)]
pub struct MeleeHitbox {
    pub owner: Entity,
    pub owner_is_player: bool,
    pub weapon_id: WeaponId,
    pub damage: f32,
    pub damage_type: DamageType,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    pub remaining: f32,
    pub hit_targets: HashSet<Entity>,
}

/// Аура вокруг владельца: урон всем в радиусе каждые `area_tick_interval`
#[derive(Component, Debug, Clone, PartialEq)]
pub struct AreaEffect {
    pub owner: Entity,
    pub owner_is_player: bool,
    pub weapon_id: WeaponId,
    pub damage: f32,
    pub damage_type: DamageType,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    pub radius: f32,
    /// None — бесконечно (Passive)
    pub remaining: Option<f32>,
    /// ≤ 0 → импульс урона
    pub tick_timer: f32,
}

/// Призванный миньон (поведение — вне combat core)
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Minion {
    pub owner: Entity,
    pub weapon_id: WeaponId,
    pub damage: f32,
    pub remaining: f32,
}

/// SystemParam: спавн эффектов оружия
#[derive(SystemParam)]
pub struct WeaponEffectFactory<'w, 's> {
    commands: Commands<'w, 's>,
    areas: Query<'w, 's, (Entity, &'static mut AreaEffect)>,
    index: ResMut<'w, SpatialIndex>,
    config: Res<'w, CombatConfig>,
    fired_events: EventWriter<'w, WeaponFired>,
}

impl<'w, 's> WeaponEffectFactory<'w, 's> {
    /// Dispatch по категории + WeaponFired
    pub fn spawn_effect(&mut self, ctx: &FireContext) {
        let spawned = match ctx.category {
            WeaponCategory::Projectile => self.spawn_projectiles(ctx),
            WeaponCategory::Melee => self.spawn_melee(ctx),
            WeaponCategory::Area => self.spawn_or_refresh_area(ctx, Some(ctx.stats.duration)),
            WeaponCategory::Passive => self.spawn_or_refresh_area(ctx, None),
            WeaponCategory::Summon => self.spawn_minions(ctx),
        };

        self.fired_events.write(WeaponFired {
            entity: ctx.owner,
            weapon_id: ctx.weapon_id.clone(),
            position: ctx.position,
            direction: ctx.direction,
            projectile_count: spawned,
        });
    }

    fn spawn_projectiles(&mut self, ctx: &FireContext) -> u32 {
        let count = ctx.stats.projectile_count.max(1);
        let spread = self.config.projectile_spread;
        let base_angle = ctx.direction.y.atan2(ctx.direction.x);

        for i in 0..count {
            let offset = if count == 1 {
                0.0
            } else {
                -spread / 2.0 + spread * i as f32 / (count - 1) as f32
            };
            let direction = Vec2::from_angle(base_angle + offset);

            let projectile = Projectile::new(Some(ctx.owner), ctx.owner_is_player, ctx.stats.damage, ctx.damage_type)
                .with_pierce(ctx.stats.pierce)
                .with_lifetime(ctx.stats.duration)
                .with_crit(ctx.stats.crit_chance, ctx.stats.crit_multiplier);

            self.commands.spawn((
                projectile,
                Transform::from_translation(ctx.position.extend(0.0)),
                Velocity(direction * ctx.stats.projectile_speed),
                Collider::new(ctx.stats.area),
            ));
        }

        count
    }

    fn spawn_melee(&mut self, ctx: &FireContext) -> u32 {
        let position = ctx.position + ctx.direction * self.config.melee_offset;

        let entity = self
            .commands
            .spawn((
                MeleeHitbox {
                    owner: ctx.owner,
                    owner_is_player: ctx.owner_is_player,
                    weapon_id: ctx.weapon_id.clone(),
                    damage: ctx.stats.damage,
                    damage_type: ctx.damage_type,
                    crit_chance: ctx.stats.crit_chance,
                    crit_multiplier: ctx.stats.crit_multiplier,
                    remaining: self.config.melee_duration,
                    hit_targets: HashSet::new(),
                },
                Transform::from_translation(position.extend(0.0)),
                Collider::new(ctx.stats.area),
            ))
            .id();

        self.index.insert(entity, position, ctx.stats.area, SpatialLayer::Effect);
        1
    }

    fn spawn_or_refresh_area(&mut self, ctx: &FireContext, duration: Option<f32>) -> u32 {
        let existing = self
            .areas
            .iter_mut()
            .find(|(_, area)| area.owner == ctx.owner && area.weapon_id == ctx.weapon_id);

        if let Some((_, mut area)) = existing {
            area.damage = ctx.stats.damage;
            area.radius = ctx.stats.area;
            area.crit_chance = ctx.stats.crit_chance;
            area.crit_multiplier = ctx.stats.crit_multiplier;
            area.remaining = duration;
            return 1;
        }

        self.commands.spawn((
            AreaEffect {
                owner: ctx.owner,
                owner_is_player: ctx.owner_is_player,
                weapon_id: ctx.weapon_id.clone(),
                damage: ctx.stats.damage,
                damage_type: ctx.damage_type,
                crit_chance: ctx.stats.crit_chance,
                crit_multiplier: ctx.stats.crit_multiplier,
                radius: ctx.stats.area,
                remaining: duration,
                tick_timer: 0.0,
            },
            Transform::from_translation(ctx.position.extend(0.0)),
        ));
        1
    }

    fn spawn_minions(&mut self, ctx: &FireContext) -> u32 {
        let count = ctx.stats.projectile_count.max(1);
        let lifetime = if ctx.stats.duration > 0.0 {
            ctx.stats.duration
        } else {
            self.config.summon_duration
        };

        for i in 0..count {
            let angle = TAU * i as f32 / count as f32;
            let position = ctx.position + Vec2::from_angle(angle) * self.config.summon_offset;
            self.commands.spawn((
                Minion {
                    owner: ctx.owner,
                    weapon_id: ctx.weapon_id.clone(),
                    damage: ctx.stats.damage,
                    remaining: lifetime,
                },
                Transform::from_translation(position.extend(0.0)),
                Collider::new(ctx.stats.area),
            ));
        }

        count
    }

    /// Убрать ауру (owner, weapon). true если была.
    pub fn despawn_area(&mut self, owner: Entity, weapon_id: &WeaponId) -> bool {
        let mut found = false;
        for (entity, area) in self.areas.iter() {
            if area.owner == owner && &area.weapon_id == weapon_id {
                self.commands.entity(entity).despawn();
                found = true;
            }
        }
        found
    }

    pub fn spatial(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }
}

// ============================================================================
// Effect systems (CombatSet::Effects)
// ============================================================================

/// Система: melee hitboxes — урон пересекающимся целям, затем таймер
pub fn tick_melee_hitboxes(
    mut hitboxes: Query<(Entity, &Transform, &mut MeleeHitbox, Option<&Collider>), Without<Health>>,
    mut index: ResMut<SpatialIndex>,
    mut resolver: DamageResolver,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, transform, mut hitbox, collider) in hitboxes.iter_mut() {
        let position = planar_position(transform);
        let radius = collider.map_or(0.0, |c| c.radius);
        let layer = SpatialLayer::opposing(hitbox.owner_is_player);

        for target in index.query_radius(position, radius, Some(layer)) {
            if hitbox.hit_targets.contains(&target) || !resolver.has_health(target) || resolver.is_dead(target) {
                continue;
            }
            hitbox.hit_targets.insert(target);
            let request = DealDamageRequest::new(Some(hitbox.owner), target, hitbox.damage, hitbox.damage_type)
                .with_crit_override(hitbox.crit_chance, hitbox.crit_multiplier);
            resolver.resolve(&request);
        }

        hitbox.remaining -= delta;
        if hitbox.remaining <= 0.0 {
            hitbox.hit_targets.clear();
            index.remove(entity);
            resolver.commands().entity(entity).despawn();
        }
    }
}

/// Система: ауры — следуют за владельцем, импульс урона каждые `area_tick_interval`
pub fn tick_area_effects(
    mut areas: Query<(Entity, &mut Transform, &mut AreaEffect), Without<Health>>,
    owners: Query<&Transform, (With<WeaponInventory>, Without<AreaEffect>)>,
    index: Res<SpatialIndex>,
    mut resolver: DamageResolver,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    let interval = resolver.config().area_tick_interval;

    for (entity, mut transform, mut area) in areas.iter_mut() {
        let Ok(owner_transform) = owners.get(area.owner) else {
            resolver.commands().entity(entity).despawn();
            continue;
        };
        if resolver.is_dead(area.owner) {
            resolver.commands().entity(entity).despawn();
            continue;
        }

        transform.translation.x = owner_transform.translation.x;
        transform.translation.y = owner_transform.translation.y;
        let position = planar_position(&transform);

        area.tick_timer -= delta;
        if area.tick_timer <= 0.0 {
            let layer = SpatialLayer::opposing(area.owner_is_player);
            for target in index.query_radius(position, area.radius, Some(layer)) {
                if !resolver.has_health(target) || resolver.is_dead(target) {
                    continue;
                }
                let request = DealDamageRequest::new(Some(area.owner), target, area.damage, area.damage_type)
                    .with_crit_override(area.crit_chance, area.crit_multiplier);
                resolver.resolve(&request);
            }
            area.tick_timer += interval;
            if area.tick_timer <= 0.0 {
                area.tick_timer = interval;
            }
        }

        if let Some(remaining) = area.remaining.as_mut() {
            *remaining -= delta;
            if *remaining <= 0.0 {
                resolver.commands().entity(entity).despawn();
            }
        }
    }
}

/// Система: lifetime миньонов
pub fn tick_minions(mut minions: Query<(Entity, &mut Minion)>, mut commands: Commands, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for (entity, mut minion) in minions.iter_mut() {
        minion.remaining -= delta;
        if minion.remaining <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}
