//! Spatial index — radius + layer proximity queries
//!
//! Uniform grid hash (cell = 64 units). Entity хранится в ячейке своего центра,
//! запрос проверяет пересечение окружностей (query radius + entry radius).
//!
//! Lifecycle каждой entity в индексе: insert (один раз) → update (много) → remove (один раз).
//! Снаряды синхронизирует projectile manager, акторов — `sync_actor_index`.
//!
//! Результаты запросов отсортированы по Entity — детерминизм не зависит
//! от порядка итерации HashMap.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::components::{planar_position, Collider, Enemy, Player};
use crate::projectile::Projectile;

/// Размер ячейки grid (world units)
pub const SPATIAL_CELL_SIZE: f32 = 64.0;

/// Радиус актора без Collider
pub const DEFAULT_ACTOR_RADIUS: f32 = 12.0;

/// Слой (фракция) entity в индексе
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum SpatialLayer {
    Player,
    Enemy,
    Projectile,
    Effect,
}

impl SpatialLayer {
    /// Слой противника для владельца: player-owned → Enemy, иначе → Player
    pub fn opposing(owner_is_player: bool) -> Self {
        if owner_is_player {
            SpatialLayer::Enemy
        } else {
            SpatialLayer::Player
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub position: Vec2,
    pub radius: f32,
    pub layer: SpatialLayer,
}

/// Spatial index resource (shared mutable, single-threaded доступ в FixedUpdate)
#[derive(Resource, Debug)]
pub struct SpatialIndex {
    cell_size: f32,
    entries: HashMap<Entity, SpatialEntry>,
    cells: HashMap<IVec2, Vec<Entity>>,
    /// Максимальный радиус среди entries — расширяет область поиска ячеек
    max_radius: f32,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(SPATIAL_CELL_SIZE)
    }
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            entries: HashMap::new(),
            cells: HashMap::new(),
            max_radius: 0.0,
        }
    }

    fn cell_of(&self, position: Vec2) -> IVec2 {
        (position / self.cell_size).floor().as_ivec2()
    }

    /// Вставка новой entity. Повторная вставка — предупреждение + update.
    pub fn insert(&mut self, entity: Entity, position: Vec2, radius: f32, layer: SpatialLayer) {
        if self.entries.contains_key(&entity) {
            crate::logger::log_warning(&format!(
                "SpatialIndex: {:?} inserted twice, treating as update",
                entity
            ));
            self.update(entity, position, radius, layer);
            return;
        }

        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().push(entity);
        self.entries.insert(entity, SpatialEntry { position, radius, layer });
        self.max_radius = self.max_radius.max(radius);
    }

    /// Обновление позиции/радиуса. false если entity нет в индексе.
    pub fn update(&mut self, entity: Entity, position: Vec2, radius: f32, layer: SpatialLayer) -> bool {
        let Some(entry) = self.entries.get(&entity).copied() else {
            return false;
        };

        let old_cell = self.cell_of(entry.position);
        let new_cell = self.cell_of(position);
        if old_cell != new_cell {
            self.detach_from_cell(old_cell, entity);
            self.cells.entry(new_cell).or_default().push(entity);
        }

        self.entries.insert(entity, SpatialEntry { position, radius, layer });
        if radius >= self.max_radius {
            self.max_radius = radius;
        } else if entry.radius >= self.max_radius {
            self.recompute_max_radius();
        }
        true
    }

    /// Удаление. false если entity уже нет.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(entry) = self.entries.remove(&entity) else {
            return false;
        };
        let cell = self.cell_of(entry.position);
        self.detach_from_cell(cell, entity);
        if entry.radius >= self.max_radius {
            self.recompute_max_radius();
        }
        true
    }

    /// Ушёл самый большой радиус — пересчёт по оставшимся entries
    fn recompute_max_radius(&mut self) {
        self.max_radius = self.entries.values().map(|entry| entry.radius).fold(0.0, f32::max);
    }

    pub fn max_radius(&self) -> f32 {
        self.max_radius
    }

    fn detach_from_cell(&mut self, cell: IVec2, entity: Entity) {
        if let Some(bucket) = self.cells.get_mut(&cell) {
            bucket.retain(|e| *e != entity);
            if bucket.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entries.contains_key(&entity)
    }

    pub fn get(&self, entity: Entity) -> Option<&SpatialEntry> {
        self.entries.get(&entity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Все entities слоя `layer` (None = любой), чья окружность пересекает
    /// окружность запроса. Отсортировано по Entity.
    pub fn query_radius(&self, center: Vec2, radius: f32, layer: Option<SpatialLayer>) -> Vec<Entity> {
        if radius < 0.0 {
            return Vec::new();
        }

        let reach = radius + self.max_radius;
        let min_cell = self.cell_of(center - Vec2::splat(reach));
        let max_cell = self.cell_of(center + Vec2::splat(reach));
        let span = (i64::from(max_cell.x) - i64::from(min_cell.x) + 1)
            * (i64::from(max_cell.y) - i64::from(min_cell.y) + 1);

        let hit = |entry: &SpatialEntry| {
            if layer.is_some_and(|l| l != entry.layer) {
                return false;
            }
            let limit = radius + entry.radius;
            entry.position.distance_squared(center) <= limit * limit
        };

        let mut found = Vec::new();
        // Окно больше, чем занятых ячеек: дешевле пройти все entries
        if span > self.cells.len() as i64 {
            found.extend(
                self.entries
                    .iter()
                    .filter(|(_, entry)| hit(entry))
                    .map(|(entity, _)| *entity),
            );
        } else {
            for cx in min_cell.x..=max_cell.x {
                for cy in min_cell.y..=max_cell.y {
                    let Some(bucket) = self.cells.get(&IVec2::new(cx, cy)) else {
                        continue;
                    };
                    for entity in bucket {
                        if self.entries.get(entity).is_some_and(|entry| hit(entry)) {
                            found.push(*entity);
                        }
                    }
                }
            }
        }

        found.sort();
        found
    }
}

/// System: синхронизация акторов (Player/Enemy) с индексом
///
/// Снаряды исключены — их ведёт projectile manager.
/// Despawn актора → RemovedComponents → remove из индекса.
pub fn sync_actor_index(
    mut index: ResMut<SpatialIndex>,
    actors: Query<
        (Entity, &Transform, Option<&Collider>, Has<Player>),
        (Or<(With<Player>, With<Enemy>)>, Without<Projectile>),
    >,
    mut removed_players: RemovedComponents<Player>,
    mut removed_enemies: RemovedComponents<Enemy>,
) {
    for entity in removed_players.read().chain(removed_enemies.read()) {
        index.remove(entity);
    }

    for (entity, transform, collider, is_player) in actors.iter() {
        let position = planar_position(transform);
        let radius = collider.map_or(DEFAULT_ACTOR_RADIUS, |c| c.radius);
        let layer = if is_player {
            SpatialLayer::Player
        } else {
            SpatialLayer::Enemy
        };

        if !index.update(entity, position, radius, layer) {
            index.insert(entity, position, radius, layer);
        }
    }
}
