//! Elite компоненты, очередь взрывов и hook events

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::elite::EliteModifiers;

/// Elite модификатор врага (вешается один раз, не перекатывается)
///
/// Живой щит Shielded хранится в `Health.shield/shield_max`,
/// здесь — только таймеры и параметры.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct EliteModifier {
    pub modifiers: EliteModifiers,
    pub base_xp_value: u32,
    pub xp_multiplier: f32,
    /// Время с последнего удара по щиту (сек)
    pub shield_regen_timer: f32,
    pub shield_regen_delay: f32,
    pub shield_regen_rate: f32,
    pub vampiric_heal_percent: f32,
    pub explosion_radius: f32,
    pub explosion_damage: f32,
    /// Косметический таймер (0..effect_period)
    pub effect_timer: f32,
}

impl EliteModifier {
    pub fn has(&self, modifier: EliteModifiers) -> bool {
        self.modifiers.contains(modifier)
    }

    /// XP за убийство с учётом множителя
    pub fn xp_value(&self) -> u32 {
        (self.base_xp_value as f32 * self.xp_multiplier).round() as u32
    }
}

/// Взрыв, ожидающий детонации (Explosive elite умер)
#[derive(Debug, Clone, PartialEq)]
pub struct PendingExplosion {
    pub source: Entity,
    pub position: Vec2,
    pub radius: f32,
    pub damage: f32,
}

/// Очередь взрывов (дренируется раз в тик)
#[derive(Resource, Debug, Default)]
pub struct PendingExplosions {
    pub queue: Vec<PendingExplosion>,
}

/// Event: запрос try_make_elite
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct MakeEliteRequest {
    pub entity: Entity,
    pub force_elite: bool,
    pub force_boss: bool,
    pub base_xp: u32,
    pub base_damage: f32,
}

impl MakeEliteRequest {
    pub fn roll(entity: Entity, base_xp: u32, base_damage: f32) -> Self {
        Self {
            entity,
            force_elite: false,
            force_boss: false,
            base_xp,
            base_damage,
        }
    }

    pub fn forced(mut self) -> Self {
        self.force_elite = true;
        self
    }

    pub fn boss(mut self) -> Self {
        self.force_boss = true;
        self
    }
}

// ============================================================================
// Hook events
// ============================================================================

/// Hook: entity стал elite
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliteSpawned {
    pub entity: Entity,
    pub modifiers: EliteModifiers,
    pub xp_multiplier: f32,
}

/// Hook: vampiric elite подлечился от нанесённого урона
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VampiricHealed {
    pub entity: Entity,
    pub target: Entity,
    pub amount: f32,
}

/// Hook: explosive elite взорвался
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliteExploded {
    pub entity: Entity,
    pub position: Vec2,
    pub radius: f32,
    pub targets_hit: u32,
}

/// Hook: урон по shielded elite (регенерация щита сброшена)
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliteShieldHit {
    pub entity: Entity,
    pub shield_remaining: f32,
}
