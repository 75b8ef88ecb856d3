//! Combat tuning constants
//!
//! Всё, что раньше было бы магическими числами в системах, живёт здесь.
//! serde — чтобы balance team могла грузить значения из данных.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Combat tuning (damage, projectiles, weapons)
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Базовый шанс крита (до бонусов StatModifiers)
    pub base_crit_chance: f32,
    pub base_crit_multiplier: f32,
    /// Верхний предел шанса крита
    pub max_crit_chance: f32,
    /// I-frames игрока после полученного урона (сек)
    pub player_invulnerability_time: f32,
    pub boss_xp_value: u32,
    pub default_xp_value: u32,

    /// Радиус снаряда без Collider
    pub projectile_default_radius: f32,
    /// Запас к радиусу spatial query (цели крупнее снаряда)
    pub projectile_query_margin: f32,

    /// Веер снарядов (радианы, полная ширина)
    pub projectile_spread: f32,
    pub melee_offset: f32,
    pub melee_duration: f32,
    pub area_tick_interval: f32,
    pub summon_offset: f32,
    pub summon_duration: f32,
    /// Нижний предел cooldown оружия после выстрела/апгрейда
    pub min_weapon_cooldown: f32,
    /// Максимальная доля cooldown reduction
    pub max_cooldown_reduction: f32,
    /// Дистанция точки прицела для Directional targeting
    pub directional_aim_distance: f32,
    /// Ниже этой скорости владелец считается стоящим
    pub stationary_speed_threshold: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            base_crit_chance: 0.05,
            base_crit_multiplier: 2.0,
            max_crit_chance: 0.75,
            player_invulnerability_time: 0.5,
            boss_xp_value: 100,
            default_xp_value: 1,

            projectile_default_radius: 5.0,
            projectile_query_margin: 50.0,

            projectile_spread: 30f32.to_radians(),
            melee_offset: 30.0,
            melee_duration: 0.2,
            area_tick_interval: 0.5,
            summon_offset: 40.0,
            summon_duration: 10.0,
            min_weapon_cooldown: 0.1,
            max_cooldown_reduction: 0.9,
            directional_aim_distance: 100.0,
            stationary_speed_threshold: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config: CombatConfig = serde_json::from_str(r#"{ "max_crit_chance": 0.5 }"#).unwrap();

        assert_eq!(config.max_crit_chance, 0.5);
        assert_eq!(config.base_crit_chance, CombatConfig::default().base_crit_chance);
        assert_eq!(config.boss_xp_value, 100);
    }
}
