//! StatModifiers — внешние бонусы владельца (пассивки, level-up, баффы)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::weapon::WeaponStats;

/// Модификаторы владельца оружия (read-only для combat core)
///
/// Отсутствие компонента = нейтральные значения (×1, +0).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct StatModifiers {
    pub damage_multiplier: f32,
    pub area_multiplier: f32,
    /// Доля сокращения cooldown (cap в CombatConfig::max_cooldown_reduction)
    pub cooldown_reduction: f32,
    pub projectile_count_bonus: u32,
    pub crit_chance_bonus: f32,
    pub crit_multiplier_bonus: f32,
}

impl Default for StatModifiers {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            area_multiplier: 1.0,
            cooldown_reduction: 0.0,
            projectile_count_bonus: 0,
            crit_chance_bonus: 0.0,
            crit_multiplier_bonus: 0.0,
        }
    }
}

impl StatModifiers {
    /// Копия статов с применёнными модификаторами (cooldown не трогаем)
    pub fn apply(&self, stats: &WeaponStats) -> WeaponStats {
        WeaponStats {
            damage: stats.damage * self.damage_multiplier,
            area: stats.area * self.area_multiplier,
            projectile_count: stats.projectile_count + self.projectile_count_bonus,
            crit_chance: stats.crit_chance + self.crit_chance_bonus,
            crit_multiplier: stats.crit_multiplier + self.crit_multiplier_bonus,
            ..*stats
        }
    }

    /// Cooldown после выстрела: max(min, cooldown × (1 - min(cdr, cap)))
    pub fn effective_cooldown(&self, cooldown: f32, max_reduction: f32, min_cooldown: f32) -> f32 {
        let reduction = self.cooldown_reduction.min(max_reduction);
        (cooldown * (1.0 - reduction)).max(min_cooldown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_modifiers_keep_stats() {
        let stats = WeaponStats::default();
        assert_eq!(StatModifiers::default().apply(&stats), stats);
    }

    #[test]
    fn test_apply_scales_copy() {
        let stats = WeaponStats {
            damage: 10.0,
            area: 20.0,
            projectile_count: 2,
            crit_chance: 0.05,
            crit_multiplier: 2.0,
            ..Default::default()
        };
        let modifiers = StatModifiers {
            damage_multiplier: 1.5,
            area_multiplier: 2.0,
            projectile_count_bonus: 1,
            crit_chance_bonus: 0.1,
            crit_multiplier_bonus: 0.5,
            ..Default::default()
        };

        let applied = modifiers.apply(&stats);

        assert_eq!(applied.damage, 15.0);
        assert_eq!(applied.area, 40.0);
        assert_eq!(applied.projectile_count, 3);
        assert!((applied.crit_chance - 0.15).abs() < 1e-6);
        assert_eq!(applied.crit_multiplier, 2.5);
        assert_eq!(applied.cooldown, stats.cooldown);
        assert_eq!(stats.damage, 10.0);
    }

    #[test]
    fn test_cooldown_reduction_is_capped() {
        let modifiers = StatModifiers {
            cooldown_reduction: 0.99,
            ..Default::default()
        };

        // cap 0.9 → 2.0 × 0.1 = 0.2
        assert!((modifiers.effective_cooldown(2.0, 0.9, 0.1) - 0.2).abs() < 1e-6);
        // 0.5 × 0.1 = 0.05 → floor 0.1
        assert_eq!(modifiers.effective_cooldown(0.5, 0.9, 0.1), 0.1);
    }
}
