//! Weapon inventory — runtime оружие владельца
//!
//! **WeaponInstance** ссылается на definition через `WeaponId`:
//! - level (1..=max_level)
//! - current_cooldown (тикает weapon controller)
//! - stats snapshot на текущем уровне
//! - can_evolve (max level + evolution + companion passive)
//!
//! Операции возвращают `Result<bool, WeaponError>`:
//! `Ok(false)` — штатный отказ (уже есть, max level, нет оружия),
//! `Err(UnknownDefinition)` — id не зарегистрирован в `WeaponDefinitions`.

use bevy::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::weapon::{WeaponDefinitions, WeaponId, WeaponStats};

/// Ошибки операций с инвентарём
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WeaponError {
    #[error("unknown weapon definition: {0}")]
    UnknownDefinition(WeaponId),
}

/// Оружие в инвентаре
#[derive(Clone, Debug, PartialEq)]
pub struct WeaponInstance {
    pub definition_id: WeaponId,
    pub level: u32,
    /// ≤ 0 → готово к выстрелу
    pub current_cooldown: f32,
    pub stats: WeaponStats,
    pub can_evolve: bool,
}

/// Инвентарь оружия (BTreeMap — детерминированный порядок autofire)
#[derive(Component, Clone, Debug, Default, PartialEq)]
pub struct WeaponInventory {
    weapons: BTreeMap<WeaponId, WeaponInstance>,
}

impl WeaponInventory {
    pub fn get(&self, id: &WeaponId) -> Option<&WeaponInstance> {
        self.weapons.get(id)
    }

    pub fn get_mut(&mut self, id: &WeaponId) -> Option<&mut WeaponInstance> {
        self.weapons.get_mut(id)
    }

    pub fn contains(&self, id: &WeaponId) -> bool {
        self.weapons.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeaponInstance> {
        self.weapons.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut WeaponInstance> {
        self.weapons.values_mut()
    }

    /// Экипировать новое оружие на level 1. Уже есть → Ok(false).
    pub fn add(
        &mut self,
        definitions: &WeaponDefinitions,
        id: &WeaponId,
        min_cooldown: f32,
    ) -> Result<bool, WeaponError> {
        let definition = definitions
            .get(id)
            .ok_or_else(|| WeaponError::UnknownDefinition(id.clone()))?;

        if self.contains(id) {
            return Ok(false);
        }

        self.weapons.insert(
            id.clone(),
            WeaponInstance {
                definition_id: id.clone(),
                level: 1,
                current_cooldown: 0.0,
                stats: definition.base_stats.at_level(&definition.scaling, 1, min_cooldown),
                can_evolve: false,
            },
        );
        self.refresh_evolution_flags(definitions);
        Ok(true)
    }

    /// Убрать оружие. false если его не было.
    pub fn remove(&mut self, definitions: &WeaponDefinitions, id: &WeaponId) -> bool {
        let removed = self.weapons.remove(id).is_some();
        if removed {
            self.refresh_evolution_flags(definitions);
        }
        removed
    }

    /// Level up + пересчёт статов. Нет оружия или max level → Ok(false).
    pub fn upgrade(
        &mut self,
        definitions: &WeaponDefinitions,
        id: &WeaponId,
        min_cooldown: f32,
    ) -> Result<bool, WeaponError> {
        let Some(instance) = self.weapons.get_mut(id) else {
            return Ok(false);
        };
        let definition = definitions
            .get(&instance.definition_id)
            .ok_or_else(|| WeaponError::UnknownDefinition(instance.definition_id.clone()))?;

        if instance.level >= definition.max_level {
            return Ok(false);
        }

        instance.level += 1;
        instance.stats = definition
            .base_stats
            .at_level(&definition.scaling, instance.level, min_cooldown);

        self.refresh_evolution_flags(definitions);
        Ok(true)
    }

    /// Заменить оружие его эволюцией (level 1).
    ///
    /// Ok(false): !can_evolve или эволюция уже в инвентаре (оба экземпляра не трогаем).
    pub fn evolve(
        &mut self,
        definitions: &WeaponDefinitions,
        id: &WeaponId,
        min_cooldown: f32,
    ) -> Result<bool, WeaponError> {
        let Some(instance) = self.weapons.get(id) else {
            return Ok(false);
        };
        if !instance.can_evolve {
            return Ok(false);
        }

        let definition = definitions
            .get(&instance.definition_id)
            .ok_or_else(|| WeaponError::UnknownDefinition(instance.definition_id.clone()))?;
        let Some(evolution) = definition.evolution.as_ref() else {
            return Ok(false);
        };
        let evolved = definitions
            .get(&evolution.evolves_into)
            .ok_or_else(|| WeaponError::UnknownDefinition(evolution.evolves_into.clone()))?;
        if self.contains(&evolved.id) {
            return Ok(false);
        }

        self.weapons.remove(id);
        self.weapons.insert(
            evolved.id.clone(),
            WeaponInstance {
                definition_id: evolved.id.clone(),
                level: 1,
                current_cooldown: 0.0,
                stats: evolved.base_stats.at_level(&evolved.scaling, 1, min_cooldown),
                can_evolve: false,
            },
        );
        self.refresh_evolution_flags(definitions);
        Ok(true)
    }

    /// Пересчёт can_evolve для всего инвентаря (companion мог появиться/пропасть)
    fn refresh_evolution_flags(&mut self, definitions: &WeaponDefinitions) {
        let flags: Vec<(WeaponId, bool)> = self
            .weapons
            .iter()
            .map(|(id, instance)| {
                let ready = definitions
                    .get(&instance.definition_id)
                    .and_then(|def| {
                        let evolution = def.evolution.as_ref()?;
                        Some(
                            instance.level >= def.max_level
                                && (definitions.companion_check)(self, &evolution.required_passive),
                        )
                    })
                    .unwrap_or(false);
                (id.clone(), ready)
            })
            .collect();

        for (id, ready) in flags {
            if let Some(instance) = self.weapons.get_mut(&id) {
                instance.can_evolve = ready;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN_CD: f32 = 0.1;

    fn wand() -> WeaponId {
        "magic_wand".into()
    }

    fn max_out(inventory: &mut WeaponInventory, defs: &WeaponDefinitions, id: &WeaponId) {
        while inventory.upgrade(defs, id, MIN_CD).unwrap() {}
    }

    #[test]
    fn test_add_unknown_weapon_is_error() {
        let defs = WeaponDefinitions::default();
        let mut inventory = WeaponInventory::default();

        let result = inventory.add(&defs, &"no_such_weapon".into(), MIN_CD);

        assert_eq!(result, Err(WeaponError::UnknownDefinition("no_such_weapon".into())));
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_add_twice_returns_false() {
        let defs = WeaponDefinitions::default();
        let mut inventory = WeaponInventory::default();

        assert_eq!(inventory.add(&defs, &wand(), MIN_CD), Ok(true));
        assert_eq!(inventory.add(&defs, &wand(), MIN_CD), Ok(false));
        assert_eq!(inventory.get(&wand()).map(|w| w.level), Some(1));
    }

    #[test]
    fn test_upgrade_recomputes_stats() {
        let defs = WeaponDefinitions::default();
        let mut inventory = WeaponInventory::default();
        inventory.add(&defs, &wand(), MIN_CD).unwrap();

        assert_eq!(inventory.upgrade(&defs, &wand(), MIN_CD), Ok(true));

        let instance = inventory.get(&wand()).unwrap();
        assert_eq!(instance.level, 2);
        assert_eq!(instance.stats.damage, 15.0);
        assert!((instance.stats.cooldown - 1.1).abs() < 1e-5);
    }

    #[test]
    fn test_upgrade_at_max_level_leaves_stats_unchanged() {
        let defs = WeaponDefinitions::default();
        let mut inventory = WeaponInventory::default();
        inventory.add(&defs, &wand(), MIN_CD).unwrap();
        max_out(&mut inventory, &defs, &wand());

        let before = inventory.get(&wand()).cloned().unwrap();
        assert_eq!(before.level, 8);

        assert_eq!(inventory.upgrade(&defs, &wand(), MIN_CD), Ok(false));
        assert_eq!(inventory.get(&wand()), Some(&before));
    }

    #[test]
    fn test_upgrade_missing_weapon_returns_false() {
        let defs = WeaponDefinitions::default();
        let mut inventory = WeaponInventory::default();

        assert_eq!(inventory.upgrade(&defs, &wand(), MIN_CD), Ok(false));
    }

    #[test]
    fn test_evolution_at_max_level() {
        let defs = WeaponDefinitions::default();
        let mut inventory = WeaponInventory::default();
        inventory.add(&defs, &wand(), MIN_CD).unwrap();

        assert_eq!(inventory.evolve(&defs, &wand(), MIN_CD), Ok(false));

        max_out(&mut inventory, &defs, &wand());
        assert!(inventory.get(&wand()).unwrap().can_evolve);

        assert_eq!(inventory.evolve(&defs, &wand(), MIN_CD), Ok(true));
        assert!(!inventory.contains(&wand()));

        let holy = inventory.get(&"holy_wand".into()).expect("evolved weapon missing");
        assert_eq!(holy.level, 1);
        assert_eq!(holy.stats.projectile_count, 2);
    }

    #[test]
    fn test_evolution_already_owned_is_refused() {
        let defs = WeaponDefinitions::default();
        let holy: WeaponId = "holy_wand".into();
        let mut inventory = WeaponInventory::default();
        inventory.add(&defs, &wand(), MIN_CD).unwrap();
        max_out(&mut inventory, &defs, &wand());
        inventory.add(&defs, &holy, MIN_CD).unwrap();
        inventory.get_mut(&holy).unwrap().current_cooldown = 0.7;
        let before = inventory.clone();

        assert_eq!(inventory.evolve(&defs, &wand(), MIN_CD), Ok(false));

        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.get(&wand()), before.get(&wand()));
        assert_eq!(inventory.get(&holy).map(|w| w.current_cooldown), Some(0.7));
    }

    #[test]
    fn test_companion_check_blocks_evolution() {
        let mut defs = WeaponDefinitions::default();
        defs.companion_check = |inventory, passive| inventory.contains(passive);
        let mut inventory = WeaponInventory::default();
        inventory.add(&defs, &wand(), MIN_CD).unwrap();
        max_out(&mut inventory, &defs, &wand());

        assert!(!inventory.get(&wand()).unwrap().can_evolve);
        assert_eq!(inventory.evolve(&defs, &wand(), MIN_CD), Ok(false));

        // Companion появился → флаг пересчитан
        inventory.add(&defs, &"spirit_ward".into(), MIN_CD).unwrap();
        assert!(inventory.get(&wand()).unwrap().can_evolve);
    }

    #[test]
    fn test_evolution_into_unregistered_weapon_is_error() {
        let mut defs = WeaponDefinitions::default();
        let mut broken = defs.get(&wand()).cloned().unwrap();
        broken.max_level = 1;
        if let Some(evolution) = broken.evolution.as_mut() {
            evolution.evolves_into = "missing".into();
        }
        defs.add(broken);

        let mut inventory = WeaponInventory::default();
        inventory.add(&defs, &wand(), MIN_CD).unwrap();

        assert_eq!(
            inventory.evolve(&defs, &wand(), MIN_CD),
            Err(WeaponError::UnknownDefinition("missing".into()))
        );
        assert!(inventory.contains(&wand()));
    }
}
