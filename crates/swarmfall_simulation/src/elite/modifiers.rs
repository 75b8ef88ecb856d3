//! Elite modifiers: bitmask, таблица множителей, tuning
//!
//! | Modifier  | health | speed | scale | xp  |
//! |-----------|--------|-------|-------|-----|
//! | Vampiric  | 1.2    | 1.0   | 1.0   | 1.3 |
//! | Fast      | 0.8    | 1.6   | 0.9   | 1.2 |
//! | Giant     | 2.5    | 0.7   | 1.5   | 1.5 |
//! | Shielded  | 1.0    | 1.0   | 1.1   | 1.3 |
//! | Explosive | 1.0    | 1.1   | 1.0   | 1.4 |
//!
//! Итоговый xp multiplier elite = 3.0 × Π xp.

use bevy::prelude::*;
use bitflags::bitflags;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Набор активных модификаторов elite
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EliteModifiers: u8 {
        const VAMPIRIC = 1 << 0;
        const FAST = 1 << 1;
        const GIANT = 1 << 2;
        const SHIELDED = 1 << 3;
        const EXPLOSIVE = 1 << 4;
    }
}

impl Default for EliteModifiers {
    fn default() -> Self {
        Self::empty()
    }
}

impl EliteModifiers {
    /// Отображаемое имя одиночного флага
    pub fn label(self) -> &'static str {
        const LABELS: [(EliteModifiers, &str); 5] = [
            (EliteModifiers::VAMPIRIC, "Vampiric"),
            (EliteModifiers::FAST, "Fast"),
            (EliteModifiers::GIANT, "Giant"),
            (EliteModifiers::SHIELDED, "Shielded"),
            (EliteModifiers::EXPLOSIVE, "Explosive"),
        ];
        LABELS
            .iter()
            .find(|(flag, _)| *flag == self)
            .map_or("Elite", |(_, label)| *label)
    }
}

/// Множители одного модификатора
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModifierProfile {
    pub health_multiplier: f32,
    pub speed_multiplier: f32,
    pub scale_multiplier: f32,
    pub xp_multiplier: f32,
}

impl ModifierProfile {
    pub const fn new(health: f32, speed: f32, scale: f32, xp: f32) -> Self {
        Self {
            health_multiplier: health,
            speed_multiplier: speed,
            scale_multiplier: scale,
            xp_multiplier: xp,
        }
    }

    pub const NEUTRAL: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    fn combine(self, other: Self) -> Self {
        Self::new(
            self.health_multiplier * other.health_multiplier,
            self.speed_multiplier * other.speed_multiplier,
            self.scale_multiplier * other.scale_multiplier,
            self.xp_multiplier * other.xp_multiplier,
        )
    }
}

/// Elite tuning
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EliteConfig {
    /// Шанс стать elite (если не forced и не Boss)
    pub elite_chance: f32,
    pub elite_modifier_count: usize,
    pub boss_modifier_count: usize,
    /// Базовый множитель xp любого elite
    pub elite_xp_multiplier: f32,

    pub vampiric: ModifierProfile,
    pub fast: ModifierProfile,
    pub giant: ModifierProfile,
    pub shielded: ModifierProfile,
    pub explosive: ModifierProfile,

    /// Доля нанесённого урона, возвращаемая vampiric источнику
    pub vampiric_heal_percent: f32,
    /// Щит = доля max health (после множителей)
    pub shield_fraction: f32,
    /// Задержка регенерации щита после удара (сек)
    pub shield_regen_delay: f32,
    /// Регенерация щита (ед/сек)
    pub shield_regen_rate: f32,
    pub explosion_radius: f32,
    /// Урон взрыва = base_damage × multiplier
    pub explosion_damage_multiplier: f32,
    /// Период косметического таймера (пульсация ауры)
    pub effect_period: f32,
}

impl Default for EliteConfig {
    fn default() -> Self {
        Self {
            elite_chance: 0.05,
            elite_modifier_count: 1,
            boss_modifier_count: 2,
            elite_xp_multiplier: 3.0,

            vampiric: ModifierProfile::new(1.2, 1.0, 1.0, 1.3),
            fast: ModifierProfile::new(0.8, 1.6, 0.9, 1.2),
            giant: ModifierProfile::new(2.5, 0.7, 1.5, 1.5),
            shielded: ModifierProfile::new(1.0, 1.0, 1.1, 1.3),
            explosive: ModifierProfile::new(1.0, 1.1, 1.0, 1.4),

            vampiric_heal_percent: 0.2,
            shield_fraction: 0.5,
            shield_regen_delay: 3.0,
            shield_regen_rate: 10.0,
            explosion_radius: 80.0,
            explosion_damage_multiplier: 2.0,
            effect_period: 1.0,
        }
    }
}

impl EliteConfig {
    /// Профиль одиночного флага (для составных масок — NEUTRAL)
    pub fn profile(&self, modifier: EliteModifiers) -> ModifierProfile {
        [
            (EliteModifiers::VAMPIRIC, self.vampiric),
            (EliteModifiers::FAST, self.fast),
            (EliteModifiers::GIANT, self.giant),
            (EliteModifiers::SHIELDED, self.shielded),
            (EliteModifiers::EXPLOSIVE, self.explosive),
        ]
        .into_iter()
        .find(|(flag, _)| *flag == modifier)
        .map_or(ModifierProfile::NEUTRAL, |(_, profile)| profile)
    }

    /// Произведение профилей всех флагов маски
    pub fn combined(&self, modifiers: EliteModifiers) -> ModifierProfile {
        modifiers
            .iter()
            .fold(ModifierProfile::NEUTRAL, |acc, flag| acc.combine(self.profile(flag)))
    }

    /// Итоговый xp multiplier elite: base × Π xp
    pub fn xp_multiplier(&self, modifiers: EliteModifiers) -> f32 {
        self.elite_xp_multiplier * self.combined(modifiers).xp_multiplier
    }
}

/// `count` разных модификаторов без повторов
pub fn roll_modifiers<R: Rng + ?Sized>(rng: &mut R, count: usize) -> EliteModifiers {
    let pool: Vec<EliteModifiers> = EliteModifiers::all().iter().collect();
    pool.choose_multiple(rng, count)
        .fold(EliteModifiers::empty(), |acc, flag| acc | *flag)
}

/// "Vampiric Giant Skeleton"; без модификаторов — base name
pub fn elite_display_name(base_name: &str, modifiers: EliteModifiers) -> String {
    let mut parts: Vec<&str> = modifiers.iter().map(|flag| flag.label()).collect();
    parts.push(base_name);
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_giant_shielded_xp_multiplier() {
        let config = EliteConfig::default();
        let xp = config.xp_multiplier(EliteModifiers::GIANT | EliteModifiers::SHIELDED);
        assert!((xp - 5.85).abs() < 1e-4, "xp = {}", xp);
    }

    #[test]
    fn test_combined_multiplies_health_and_speed() {
        let config = EliteConfig::default();
        let profile = config.combined(EliteModifiers::FAST | EliteModifiers::GIANT);

        assert!((profile.health_multiplier - 2.0).abs() < 1e-5);
        assert!((profile.speed_multiplier - 1.12).abs() < 1e-5);
        assert_eq!(config.combined(EliteModifiers::empty()), ModifierProfile::NEUTRAL);
    }

    #[test]
    fn test_roll_draws_distinct_modifiers() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..50 {
            assert_eq!(roll_modifiers(&mut rng, 2).bits().count_ones(), 2);
            assert_eq!(roll_modifiers(&mut rng, 1).bits().count_ones(), 1);
        }
        assert_eq!(roll_modifiers(&mut rng, 9), EliteModifiers::all());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(elite_display_name("Bat", EliteModifiers::empty()), "Bat");
        assert_eq!(
            elite_display_name("Skeleton", EliteModifiers::VAMPIRIC | EliteModifiers::GIANT),
            "Vampiric Giant Skeleton"
        );
    }
}
