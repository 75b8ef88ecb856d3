//! World компоненты: коллайдер (радиус) и визуальный размер спрайта

use bevy::prelude::*;

/// Круглый коллайдер (радиус в world units)
///
/// Используется spatial index и точной проверкой пересечения окружностей.
/// Без коллайдера снаряды считают радиус по умолчанию.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Collider {
    pub radius: f32,
}

impl Collider {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

/// Размер спрайта (читается render слоем, масштабируется Giant/Fast elite)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct SpriteSize(pub Vec2);

/// 2D позиция entity из Transform (игровая плоскость XY)
pub fn planar_position(transform: &Transform) -> Vec2 {
    transform.translation.truncate()
}
