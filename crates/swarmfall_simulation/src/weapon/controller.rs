//! Weapon controller — inventory операции, autofire, targeting, cooldowns
//!
//! Один тик (`tick`):
//! 1. `current_cooldown -= dt` для каждого оружия каждого владельца
//! 2. Оружие с cooldown ≤ 0 пытается выстрелить (targeting → fire)
//!
//! Fire execution (общая для autofire и `fire_weapon`):
//! направление owner → target ((0, 1) если точки совпали), StatModifiers
//! к копии статов, dispatch в `WeaponEffectFactory`, новый cooldown
//! `max(0.1, cooldown × (1 - min(cdr, 0.9)))`.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::components::{planar_position, Dead, Health, Player, Velocity};
use crate::spatial::SpatialLayer;
use crate::weapon::{
    aim_direction, directional_aim_point, select_target, FireContext, StatModifiers, TargetCandidate, TargetingMode,
    WeaponDefinitions, WeaponEffectFactory, WeaponError, WeaponId, WeaponInventory,
};
use crate::DeterministicRng;

/// SystemParam: единая точка работы с оружием владельцев
#[derive(SystemParam)]
pub struct WeaponController<'w, 's> {
    owners: Query<
        'w,
        's,
        (
            Entity,
            &'static mut WeaponInventory,
            &'static Transform,
            Option<&'static Velocity>,
            Option<&'static StatModifiers>,
            Has<Player>,
            Has<Dead>,
        ),
    >,
    candidates: Query<'w, 's, (&'static Health, &'static Transform, Has<Dead>)>,
    definitions: Res<'w, WeaponDefinitions>,
    rng: ResMut<'w, DeterministicRng>,
    factory: WeaponEffectFactory<'w, 's>,
}

impl<'w, 's> WeaponController<'w, 's> {
    fn min_cooldown(&self) -> f32 {
        self.factory.config().min_weapon_cooldown
    }

    /// Экипировать оружие. Нет WeaponInventory → Ok(false).
    pub fn add_weapon(&mut self, entity: Entity, weapon_id: &WeaponId) -> Result<bool, WeaponError> {
        let min_cooldown = self.min_cooldown();
        let Ok((_, mut inventory, ..)) = self.owners.get_mut(entity) else {
            return Ok(false);
        };
        inventory.add(&self.definitions, weapon_id, min_cooldown)
    }

    /// Убрать оружие + его ауру
    pub fn remove_weapon(&mut self, entity: Entity, weapon_id: &WeaponId) -> bool {
        let Ok((_, mut inventory, ..)) = self.owners.get_mut(entity) else {
            return false;
        };
        if !inventory.remove(&self.definitions, weapon_id) {
            return false;
        }
        self.factory.despawn_area(entity, weapon_id);
        true
    }

    pub fn upgrade_weapon(&mut self, entity: Entity, weapon_id: &WeaponId) -> Result<bool, WeaponError> {
        let min_cooldown = self.min_cooldown();
        let Ok((_, mut inventory, ..)) = self.owners.get_mut(entity) else {
            return Ok(false);
        };
        inventory.upgrade(&self.definitions, weapon_id, min_cooldown)
    }

    /// Эволюция: старое оружие (и его аура) заменяется эволюцией на level 1
    pub fn evolve_weapon(&mut self, entity: Entity, weapon_id: &WeaponId) -> Result<bool, WeaponError> {
        let min_cooldown = self.min_cooldown();
        let Ok((_, mut inventory, ..)) = self.owners.get_mut(entity) else {
            return Ok(false);
        };
        if !inventory.evolve(&self.definitions, weapon_id, min_cooldown)? {
            return Ok(false);
        }

        self.factory.despawn_area(entity, weapon_id);
        crate::logger::log(&format!("✨ {:?} evolved weapon {}", entity, weapon_id));
        Ok(true)
    }

    /// Ручной выстрел в точку (без targeting). Cooldown должен быть ≤ 0.
    pub fn fire_weapon(&mut self, entity: Entity, weapon_id: &WeaponId, target: Vec2) -> Result<bool, WeaponError> {
        let ready = self
            .owners
            .get(entity)
            .ok()
            .filter(|(.., is_dead)| !is_dead)
            .and_then(|(_, inventory, ..)| inventory.get(weapon_id))
            .map(|instance| instance.current_cooldown <= 0.0)
            .unwrap_or(false);

        if !ready {
            return Ok(false);
        }
        self.execute_fire(entity, weapon_id, target)
    }

    /// Тик cooldowns + autofire всех владельцев
    pub fn tick(&mut self, delta: f32) {
        let mut ready = Vec::new();

        for (entity, mut inventory, _, _, _, _, is_dead) in self.owners.iter_mut() {
            if is_dead {
                continue;
            }
            for instance in inventory.iter_mut() {
                instance.current_cooldown -= delta;
                if instance.current_cooldown <= 0.0 {
                    ready.push((entity, instance.definition_id.clone()));
                }
            }
        }

        for (entity, weapon_id) in ready {
            if let Err(error) = self.autofire(entity, &weapon_id) {
                crate::logger::log_error(&format!("Autofire {} for {:?} failed: {}", weapon_id, entity, error));
            }
        }
    }

    fn autofire(&mut self, entity: Entity, weapon_id: &WeaponId) -> Result<bool, WeaponError> {
        let targeting = self
            .definitions
            .get(weapon_id)
            .map(|def| def.targeting)
            .ok_or_else(|| WeaponError::UnknownDefinition(weapon_id.clone()))?;

        let Some(target) = self.find_target(entity, weapon_id, targeting) else {
            return Ok(false);
        };
        self.execute_fire(entity, weapon_id, target)
    }

    /// Точка прицела для режима targeting. None — нет валидной цели.
    fn find_target(&mut self, entity: Entity, weapon_id: &WeaponId, targeting: TargetingMode) -> Option<Vec2> {
        let (_, inventory, transform, velocity, _, is_player, _) = self.owners.get(entity).ok()?;
        let origin = planar_position(transform);
        let range = inventory.get(weapon_id)?.stats.range;
        let config = self.factory.config();

        match targeting {
            TargetingMode::Area => Some(origin),
            TargetingMode::Directional => Some(directional_aim_point(
                origin,
                velocity.map(|v| v.0),
                config.stationary_speed_threshold,
                config.directional_aim_distance,
            )),
            mode => {
                let layer = SpatialLayer::opposing(is_player);
                let candidates: Vec<TargetCandidate> = self
                    .factory
                    .spatial()
                    .query_radius(origin, range, Some(layer))
                    .into_iter()
                    .filter_map(|target| {
                        let (health, target_transform, is_dead) = self.candidates.get(target).ok()?;
                        (!is_dead && health.is_alive()).then(|| TargetCandidate {
                            entity: target,
                            position: planar_position(target_transform),
                            current_hp: health.current,
                        })
                    })
                    .collect();

                select_target(mode, origin, &candidates, &mut self.rng.rng).map(|c| c.position)
            }
        }
    }

    fn execute_fire(&mut self, entity: Entity, weapon_id: &WeaponId, target: Vec2) -> Result<bool, WeaponError> {
        let Ok((_, inventory, transform, _, modifiers, is_player, _)) = self.owners.get(entity) else {
            return Ok(false);
        };
        let Some(instance) = inventory.get(weapon_id) else {
            return Ok(false);
        };
        let definition = self
            .definitions
            .get(&instance.definition_id)
            .ok_or_else(|| WeaponError::UnknownDefinition(instance.definition_id.clone()))?;

        let position = planar_position(transform);
        let modifiers = modifiers.copied().unwrap_or_default();
        let base_cooldown = instance.stats.cooldown;

        let ctx = FireContext {
            owner: entity,
            owner_is_player: is_player,
            weapon_id: weapon_id.clone(),
            category: definition.category,
            damage_type: definition.damage_type,
            position,
            direction: aim_direction(position, target),
            stats: modifiers.apply(&instance.stats),
        };
        self.factory.spawn_effect(&ctx);

        let config = self.factory.config();
        let cooldown =
            modifiers.effective_cooldown(base_cooldown, config.max_cooldown_reduction, config.min_weapon_cooldown);
        if let Ok((_, mut inventory, ..)) = self.owners.get_mut(entity) {
            if let Some(instance) = inventory.get_mut(weapon_id) {
                instance.current_cooldown = cooldown;
            }
        }
        Ok(true)
    }

    pub fn inventory(&self, entity: Entity) -> Option<&WeaponInventory> {
        self.owners.get(entity).ok().map(|(_, inventory, ..)| inventory)
    }
}
