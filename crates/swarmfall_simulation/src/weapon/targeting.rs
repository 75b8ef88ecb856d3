//! Targeting — выбор цели для autofire
//!
//! Кандидаты приходят из SpatialIndex (слой противника, радиус = stats.range),
//! уже отфильтрованные: есть Health, не мёртв. Порядок кандидатов — по Entity,
//! поэтому при равенстве побеждает первый.

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::weapon::TargetingMode;

/// Валидная цель в радиусе оружия
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub entity: Entity,
    pub position: Vec2,
    pub current_hp: f32,
}

/// Выбор цели среди кандидатов
///
/// Directional / Area цель не выбирают → None (см. `directional_aim_point`).
/// RNG потребляется только в Random режиме с непустым списком.
pub fn select_target<R: Rng + ?Sized>(
    mode: TargetingMode,
    origin: Vec2,
    candidates: &[TargetCandidate],
    rng: &mut R,
) -> Option<TargetCandidate> {
    match mode {
        TargetingMode::Closest => pick_best(candidates, |c| -c.position.distance_squared(origin)),
        TargetingMode::Random => candidates.choose(rng).copied(),
        TargetingMode::HighestHp => pick_best(candidates, |c| c.current_hp),
        TargetingMode::LowestHp => pick_best(candidates, |c| -c.current_hp),
        TargetingMode::Directional | TargetingMode::Area => None,
    }
}

/// Максимум по score, при равенстве — первый
fn pick_best(candidates: &[TargetCandidate], score: impl Fn(&TargetCandidate) -> f32) -> Option<TargetCandidate> {
    let mut best: Option<(TargetCandidate, f32)> = None;
    for candidate in candidates {
        let value = score(candidate);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((*candidate, value)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Точка прицела Directional: `distance` впереди по скорости владельца
///
/// Скорость ≤ threshold (или нет Velocity) → направление (1, 0).
pub fn directional_aim_point(origin: Vec2, velocity: Option<Vec2>, threshold: f32, distance: f32) -> Vec2 {
    let direction = match velocity {
        Some(v) if v.length() > threshold => v.normalize(),
        _ => Vec2::X,
    };
    origin + direction * distance
}

/// Направление выстрела owner → target. Совпадающие точки → (0, 1).
pub fn aim_direction(from: Vec2, to: Vec2) -> Vec2 {
    let delta = to - from;
    if delta == Vec2::ZERO {
        Vec2::Y
    } else {
        delta.normalize()
    }
}
