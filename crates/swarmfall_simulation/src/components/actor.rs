//! Базовые компоненты акторов: Health, фракции (Player/Enemy), Boss, Dead

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Здоровье + щит + броня актора
///
/// Инварианты:
/// - 0 ≤ current ≤ max
/// - 0 ≤ shield ≤ shield_max
///
/// Урон применяется только через `DamageResolver` (crit → armor → shield → health).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    pub shield: f32,
    pub shield_max: f32,
    /// Броня с diminishing returns: урон × 100 / (100 + armor)
    pub armor: f32,
    pub invulnerable: bool,
    /// Оставшееся время неуязвимости (секунды)
    pub invulnerable_time: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            shield: 0.0,
            shield_max: 0.0,
            armor: 0.0,
            invulnerable: false,
            invulnerable_time: 0.0,
        }
    }

    pub fn with_armor(mut self, armor: f32) -> Self {
        self.armor = armor.max(0.0);
        self
    }

    /// Полный щит с указанным cap
    pub fn with_shield(mut self, shield_max: f32) -> Self {
        self.shield_max = shield_max.max(0.0);
        self.shield = self.shield_max;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Доля здоровья 0.0..=1.0 (0 если max == 0)
    pub fn percent(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    /// Лечение, clamp к max. Возвращает реально восстановленное количество.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - before
    }

    /// Восстановление щита, clamp к shield_max. Возвращает реально восстановленное.
    pub fn restore_shield(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 {
            return 0.0;
        }
        let before = self.shield;
        self.shield = (self.shield + amount).min(self.shield_max);
        self.shield - before
    }

    /// Неуязвимость на `duration` секунд (не сокращает уже действующее окно)
    pub fn grant_invulnerability(&mut self, duration: f32) {
        if duration <= 0.0 {
            return;
        }
        self.invulnerable = true;
        self.invulnerable_time = self.invulnerable_time.max(duration);
    }

    /// Tick таймера неуязвимости
    pub fn tick_invulnerability(&mut self, delta: f32) {
        if !self.invulnerable {
            return;
        }
        self.invulnerable_time -= delta;
        if self.invulnerable_time <= 0.0 {
            self.invulnerable_time = 0.0;
            self.invulnerable = false;
        }
    }
}

/// Игрок. Хранит счётчик убийств (инкрементится в DamageResolver).
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct Player {
    pub kills: u32,
}

/// Враг (enemy layer в spatial index)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Enemy;

/// Босс: всегда становится elite (2 модификатора), XP за убийство = 100
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Boss;

/// Компонент-маркер: entity мертв (Health <= 0)
///
/// Деспавн не автоматический — трупы убирает внешний слой (loot, анимации).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Dead;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_heal_clamped() {
        let mut health = Health::new(100.0);
        health.current = 50.0;

        assert_eq!(health.heal(30.0), 30.0);
        assert_eq!(health.current, 80.0);

        // Clamp к max — возвращаем реально вылеченное
        assert_eq!(health.heal(100.0), 20.0);
        assert_eq!(health.current, 100.0);

        assert_eq!(health.heal(-5.0), 0.0);
    }

    #[test]
    fn test_shield_restore_clamped() {
        let mut health = Health::new(100.0).with_shield(40.0);
        health.shield = 10.0;

        assert_eq!(health.restore_shield(25.0), 25.0);
        assert_eq!(health.restore_shield(25.0), 5.0);
        assert_eq!(health.shield, 40.0);
    }

    #[test]
    fn test_invulnerability_ticks_out() {
        let mut health = Health::new(100.0);
        health.grant_invulnerability(0.5);
        assert!(health.invulnerable);

        health.tick_invulnerability(0.3);
        assert!(health.invulnerable);

        health.tick_invulnerability(0.3);
        assert!(!health.invulnerable);
        assert_eq!(health.invulnerable_time, 0.0);
    }

    #[test]
    fn test_health_percent() {
        let mut health = Health::new(200.0);
        health.current = 50.0;
        assert_eq!(health.percent(), 0.25);

        let empty = Health::new(0.0);
        assert_eq!(empty.percent(), 0.0);
    }
}
