//! Weapon definitions — статические blueprints оружия
//!
//! # Архитектура
//!
//! **WeaponDefinition** — immutable blueprint (id + category + targeting + base stats + scaling):
//! - Хранится в `WeaponDefinitions` resource (HashMap lookup)
//! - Создаются hardcoded в `WeaponDefinitions::default()`
//!
//! **WeaponInstance** (см. `inventory`) — runtime состояние в инвентаре владельца,
//! ссылается на definition через `WeaponId`.
//!
//! Статы на уровне L: `base + per_level * (L - 1)` для каждого объявленного поля scaling.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::combat::DamageType;
use crate::weapon::WeaponInventory;

// ============================================================================
// WeaponId
// ============================================================================

/// Weapon identifier (unique string ID)
///
/// # Examples
/// - "magic_wand"
/// - "holy_wand"
/// - "garlic"
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Reflect, Serialize, Deserialize)]
pub struct WeaponId(pub String);

impl From<&str> for WeaponId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for WeaponId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Category / Targeting
// ============================================================================

/// Что спавнит выстрел
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum WeaponCategory {
    /// Веер снарядов (projectile manager)
    Projectile,
    /// Короткоживущий hitbox перед владельцем
    Melee,
    /// Аура вокруг владельца (refresh по owner + weapon)
    Area,
    /// Аура с бесконечной длительностью
    Passive,
    /// Миньоны рядом с владельцем
    Summon,
}

/// Как оружие выбирает цель при autofire
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum TargetingMode {
    Closest,
    Random,
    HighestHp,
    LowestHp,
    /// Точка впереди по направлению движения владельца
    Directional,
    /// Без цели, стреляет в позицию владельца
    Area,
}

// ============================================================================
// WeaponStats
// ============================================================================

/// Статы оружия (snapshot на текущем уровне)
#[derive(Clone, Copy, Debug, PartialEq, Reflect, Serialize, Deserialize)]
pub struct WeaponStats {
    pub damage: f32,
    /// Секунды между выстрелами
    pub cooldown: f32,
    pub projectile_count: u32,
    pub projectile_speed: f32,
    pub pierce: i32,
    /// Lifetime снаряда / длительность эффекта (сек)
    pub duration: f32,
    /// Радиус эффекта (world units)
    pub area: f32,
    /// Дальность поиска цели
    pub range: f32,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self {
            damage: 10.0,
            cooldown: 1.0,
            projectile_count: 1,
            projectile_speed: 300.0,
            pierce: 1,
            duration: 2.0,
            area: 5.0,
            range: 300.0,
            crit_chance: 0.05,
            crit_multiplier: 2.0,
        }
    }
}

/// Прирост статов за уровень (None = стат не растёт)
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect, Serialize, Deserialize)]
pub struct WeaponScaling {
    pub damage: Option<f32>,
    pub cooldown: Option<f32>,
    pub projectile_count: Option<u32>,
    pub projectile_speed: Option<f32>,
    pub pierce: Option<i32>,
    pub duration: Option<f32>,
    pub area: Option<f32>,
    pub range: Option<f32>,
}

impl WeaponStats {
    /// Статы на уровне `level` (1-based). Cooldown не ниже `min_cooldown`.
    pub fn at_level(&self, scaling: &WeaponScaling, level: u32, min_cooldown: f32) -> Self {
        let steps = level.saturating_sub(1);
        let stepf = steps as f32;
        let mut stats = *self;

        if let Some(per_level) = scaling.damage {
            stats.damage = self.damage + per_level * stepf;
        }
        if let Some(per_level) = scaling.cooldown {
            stats.cooldown = self.cooldown + per_level * stepf;
        }
        if let Some(per_level) = scaling.projectile_count {
            stats.projectile_count = self.projectile_count + per_level * steps;
        }
        if let Some(per_level) = scaling.projectile_speed {
            stats.projectile_speed = self.projectile_speed + per_level * stepf;
        }
        if let Some(per_level) = scaling.pierce {
            stats.pierce = self.pierce + per_level * steps as i32;
        }
        if let Some(per_level) = scaling.duration {
            stats.duration = self.duration + per_level * stepf;
        }
        if let Some(per_level) = scaling.area {
            stats.area = self.area + per_level * stepf;
        }
        if let Some(per_level) = scaling.range {
            stats.range = self.range + per_level * stepf;
        }

        stats.cooldown = stats.cooldown.max(min_cooldown);
        stats
    }
}

// ============================================================================
// WeaponDefinition
// ============================================================================

/// Эволюция: max level + companion passive → другое оружие
#[derive(Clone, Debug, PartialEq, Reflect, Serialize, Deserialize)]
pub struct WeaponEvolution {
    pub evolves_into: WeaponId,
    pub required_passive: WeaponId,
}

/// Static weapon definition (blueprint)
#[derive(Clone, Debug, PartialEq, Reflect, Serialize, Deserialize)]
pub struct WeaponDefinition {
    pub id: WeaponId,
    pub name: String,
    pub category: WeaponCategory,
    pub targeting: TargetingMode,
    pub damage_type: DamageType,
    pub max_level: u32,
    pub base_stats: WeaponStats,
    pub scaling: WeaponScaling,
    pub evolution: Option<WeaponEvolution>,
}

/// Проверка companion passive для эволюции
pub type CompanionCheck = fn(&WeaponInventory, &WeaponId) -> bool;

/// Companion gate по умолчанию: пропускает всегда
pub fn companion_always_owned(_inventory: &WeaponInventory, _passive: &WeaponId) -> bool {
    true
}

// ============================================================================
// WeaponDefinitions (Resource)
// ============================================================================

/// Weapon definitions lookup table (resource)
#[derive(Resource, Clone, Debug)]
pub struct WeaponDefinitions {
    definitions: HashMap<WeaponId, WeaponDefinition>,
    /// Gate эволюции по companion passive
    pub companion_check: CompanionCheck,
}

impl WeaponDefinitions {
    /// Пустой registry
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
            companion_check: companion_always_owned,
        }
    }

    pub fn get(&self, id: &WeaponId) -> Option<&WeaponDefinition> {
        self.definitions.get(id)
    }

    pub fn add(&mut self, definition: WeaponDefinition) {
        self.definitions.insert(definition.id.clone(), definition);
    }

    /// Все IDs (отсортированы)
    pub fn all_ids(&self) -> Vec<&WeaponId> {
        let mut ids: Vec<_> = self.definitions.keys().collect();
        ids.sort();
        ids
    }
}

impl Default for WeaponDefinitions {
    /// Hardcoded arsenal
    fn default() -> Self {
        let mut defs = Self::new();

        // === PROJECTILE ===

        // Magic wand → (max level + spirit_ward) → holy wand
        defs.add(WeaponDefinition {
            id: "magic_wand".into(),
            name: "Magic Wand".to_string(),
            category: WeaponCategory::Projectile,
            targeting: TargetingMode::Closest,
            damage_type: DamageType::Physical,
            max_level: 8,
            base_stats: WeaponStats {
                damage: 10.0,
                cooldown: 1.2,
                projectile_speed: 320.0,
                range: 320.0,
                ..Default::default()
            },
            scaling: WeaponScaling {
                damage: Some(5.0),
                cooldown: Some(-0.1),
                ..Default::default()
            },
            evolution: Some(WeaponEvolution {
                evolves_into: "holy_wand".into(),
                required_passive: "spirit_ward".into(),
            }),
        });

        defs.add(WeaponDefinition {
            id: "holy_wand".into(),
            name: "Holy Wand".to_string(),
            category: WeaponCategory::Projectile,
            targeting: TargetingMode::Closest,
            damage_type: DamageType::Lightning,
            max_level: 1,
            base_stats: WeaponStats {
                damage: 30.0,
                cooldown: 0.3,
                projectile_count: 2,
                projectile_speed: 420.0,
                pierce: 2,
                range: 380.0,
                crit_chance: 0.15,
                ..Default::default()
            },
            scaling: WeaponScaling::default(),
            evolution: None,
        });

        // Throwing knife (летит по направлению движения)
        defs.add(WeaponDefinition {
            id: "knife".into(),
            name: "Throwing Knife".to_string(),
            category: WeaponCategory::Projectile,
            targeting: TargetingMode::Directional,
            damage_type: DamageType::Physical,
            max_level: 8,
            base_stats: WeaponStats {
                damage: 8.0,
                cooldown: 0.9,
                projectile_speed: 500.0,
                duration: 1.5,
                area: 4.0,
                crit_chance: 0.1,
                ..Default::default()
            },
            scaling: WeaponScaling {
                damage: Some(2.0),
                projectile_count: Some(1),
                ..Default::default()
            },
            evolution: None,
        });

        defs.add(WeaponDefinition {
            id: "lightning_ring".into(),
            name: "Lightning Ring".to_string(),
            category: WeaponCategory::Projectile,
            targeting: TargetingMode::Random,
            damage_type: DamageType::Lightning,
            max_level: 8,
            base_stats: WeaponStats {
                damage: 20.0,
                cooldown: 2.0,
                projectile_count: 2,
                projectile_speed: 800.0,
                duration: 0.6,
                range: 400.0,
                ..Default::default()
            },
            scaling: WeaponScaling {
                damage: Some(6.0),
                projectile_count: Some(1),
                ..Default::default()
            },
            evolution: None,
        });

        defs.add(WeaponDefinition {
            id: "bone_spear".into(),
            name: "Bone Spear".to_string(),
            category: WeaponCategory::Projectile,
            targeting: TargetingMode::HighestHp,
            damage_type: DamageType::Physical,
            max_level: 8,
            base_stats: WeaponStats {
                damage: 25.0,
                cooldown: 2.5,
                projectile_speed: 260.0,
                pierce: 3,
                duration: 3.0,
                area: 8.0,
                range: 450.0,
                ..Default::default()
            },
            scaling: WeaponScaling {
                damage: Some(8.0),
                pierce: Some(1),
                ..Default::default()
            },
            evolution: None,
        });

        defs.add(WeaponDefinition {
            id: "frost_shard".into(),
            name: "Frost Shard".to_string(),
            category: WeaponCategory::Projectile,
            targeting: TargetingMode::LowestHp,
            damage_type: DamageType::Ice,
            max_level: 8,
            base_stats: WeaponStats {
                damage: 12.0,
                cooldown: 1.0,
                projectile_speed: 380.0,
                range: 300.0,
                ..Default::default()
            },
            scaling: WeaponScaling {
                damage: Some(3.0),
                cooldown: Some(-0.05),
                ..Default::default()
            },
            evolution: None,
        });

        // === MELEE ===

        defs.add(WeaponDefinition {
            id: "whip".into(),
            name: "Whip".to_string(),
            category: WeaponCategory::Melee,
            targeting: TargetingMode::Directional,
            damage_type: DamageType::Physical,
            max_level: 8,
            base_stats: WeaponStats {
                damage: 15.0,
                cooldown: 1.4,
                area: 40.0,
                range: 60.0,
                ..Default::default()
            },
            scaling: WeaponScaling {
                damage: Some(5.0),
                area: Some(5.0),
                ..Default::default()
            },
            evolution: None,
        });

        // === AREA / PASSIVE ===

        defs.add(WeaponDefinition {
            id: "garlic".into(),
            name: "Garlic".to_string(),
            category: WeaponCategory::Area,
            targeting: TargetingMode::Area,
            damage_type: DamageType::Poison,
            max_level: 8,
            base_stats: WeaponStats {
                damage: 5.0,
                cooldown: 3.0,
                duration: 3.0,
                area: 50.0,
                crit_chance: 0.0,
                ..Default::default()
            },
            scaling: WeaponScaling {
                damage: Some(2.0),
                area: Some(8.0),
                ..Default::default()
            },
            evolution: None,
        });

        defs.add(WeaponDefinition {
            id: "spirit_ward".into(),
            name: "Spirit Ward".to_string(),
            category: WeaponCategory::Passive,
            targeting: TargetingMode::Area,
            damage_type: DamageType::Ice,
            max_level: 5,
            base_stats: WeaponStats {
                damage: 3.0,
                cooldown: 5.0,
                area: 35.0,
                crit_chance: 0.0,
                ..Default::default()
            },
            scaling: WeaponScaling {
                damage: Some(1.0),
                area: Some(5.0),
                ..Default::default()
            },
            evolution: None,
        });

        // === SUMMON ===

        defs.add(WeaponDefinition {
            id: "familiar".into(),
            name: "Familiar".to_string(),
            category: WeaponCategory::Summon,
            targeting: TargetingMode::Area,
            damage_type: DamageType::Fire,
            max_level: 5,
            base_stats: WeaponStats {
                damage: 6.0,
                cooldown: 8.0,
                duration: 6.0,
                area: 10.0,
                ..Default::default()
            },
            scaling: WeaponScaling {
                projectile_count: Some(1),
                ..Default::default()
            },
            evolution: None,
        });

        // === ENEMY ===

        // Плевок врагов-стрелков (owner не player → бьёт Player layer)
        defs.add(WeaponDefinition {
            id: "acid_spit".into(),
            name: "Acid Spit".to_string(),
            category: WeaponCategory::Projectile,
            targeting: TargetingMode::Closest,
            damage_type: DamageType::Poison,
            max_level: 1,
            base_stats: WeaponStats {
                damage: 6.0,
                cooldown: 2.0,
                projectile_speed: 180.0,
                duration: 3.0,
                range: 250.0,
                crit_chance: 0.0,
                ..Default::default()
            },
            scaling: WeaponScaling::default(),
            evolution: None,
        });

        defs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_at_level_scale_declared_fields_only() {
        let base = WeaponStats {
            damage: 10.0,
            cooldown: 1.2,
            ..Default::default()
        };
        let scaling = WeaponScaling {
            damage: Some(5.0),
            cooldown: Some(-0.1),
            ..Default::default()
        };

        let level3 = base.at_level(&scaling, 3, 0.1);

        assert_eq!(level3.damage, 20.0);
        assert!((level3.cooldown - 1.0).abs() < 1e-5);
        assert_eq!(level3.projectile_count, base.projectile_count);
        assert_eq!(level3.area, base.area);
    }

    #[test]
    fn test_cooldown_floor_at_high_level() {
        let base = WeaponStats {
            cooldown: 0.5,
            ..Default::default()
        };
        let scaling = WeaponScaling {
            cooldown: Some(-0.2),
            ..Default::default()
        };

        assert_eq!(base.at_level(&scaling, 8, 0.1).cooldown, 0.1);
    }

    #[test]
    fn test_default_arsenal_evolution_chain_is_registered() {
        let defs = WeaponDefinitions::default();
        let wand = defs.get(&"magic_wand".into()).expect("magic_wand missing");
        let evolution = wand.evolution.as_ref().expect("no evolution");

        assert!(defs.get(&evolution.evolves_into).is_some());
        let passive = defs.get(&evolution.required_passive).expect("passive missing");
        assert_eq!(passive.category, WeaponCategory::Passive);
    }
}
