//! Movement компоненты: скорость (вектор) и базовая скорость передвижения

use bevy::prelude::*;

/// Текущая скорость entity (units/sec, плоскость XY)
///
/// Projectile manager интегрирует позицию снарядов по ней.
/// Directional оружие берёт из неё направление взгляда владельца.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Velocity(pub Vec2);

/// Скорость передвижения актора (units/sec)
///
/// Elite модификаторы (Fast, Giant) масштабируют её мультипликативно.
#[derive(Component, Clone, Copy, Debug, PartialEq, Reflect)]
#[reflect(Component)]
pub struct MovementSpeed {
    pub speed: f32,
}

impl Default for MovementSpeed {
    fn default() -> Self {
        Self { speed: 60.0 }
    }
}
