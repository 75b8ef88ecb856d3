//! Projectile компоненты

use bevy::prelude::*;
use std::collections::HashSet;

use crate::combat::DamageType;

/// Снаряд (создаёт weapon effect factory, ведёт и удаляет projectile manager)
///
/// Инвариант: каждая цель получает урон от снаряда не больше одного раза
/// за всю его жизнь (`hit_targets`).
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Projectile {
    pub damage: f32,
    pub damage_type: DamageType,
    /// Сколько ещё целей может поразить до уничтожения
    pub pierce: i32,
    /// Секунды жизни
    pub lifetime: f32,
    pub owner: Option<Entity>,
    /// Фракция владельца → слой целей (player-owned бьёт Enemy)
    pub owner_is_player: bool,
    /// Snapshot крита владельца на момент выстрела
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    pub hit_targets: HashSet<Entity>,
}

impl Projectile {
    pub fn new(owner: Option<Entity>, owner_is_player: bool, damage: f32, damage_type: DamageType) -> Self {
        Self {
            damage,
            damage_type,
            pierce: 1,
            lifetime: 2.0,
            owner,
            owner_is_player,
            crit_chance: 0.0,
            crit_multiplier: 1.0,
            hit_targets: HashSet::new(),
        }
    }

    pub fn with_pierce(mut self, pierce: i32) -> Self {
        self.pierce = pierce.max(1);
        self
    }

    pub fn with_lifetime(mut self, lifetime: f32) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_crit(mut self, chance: f32, multiplier: f32) -> Self {
        self.crit_chance = chance;
        self.crit_multiplier = multiplier;
        self
    }

    pub fn has_hit(&self, target: Entity) -> bool {
        self.hit_targets.contains(&target)
    }

    /// Записать попадание. false если цель уже была поражена.
    pub fn record_hit(&mut self, target: Entity) -> bool {
        self.hit_targets.insert(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_hit_only_once() {
        let mut projectile = Projectile::new(None, true, 10.0, DamageType::Physical);
        let target = Entity::from_raw(3);

        assert!(projectile.record_hit(target));
        assert!(!projectile.record_hit(target));
        assert!(projectile.has_hit(target));
    }

    #[test]
    fn test_pierce_never_below_one() {
        let projectile = Projectile::new(None, true, 10.0, DamageType::Physical).with_pierce(0);
        assert_eq!(projectile.pierce, 1);
    }
}
