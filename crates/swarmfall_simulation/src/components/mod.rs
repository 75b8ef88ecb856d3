//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: здоровье, фракции (Player/Enemy), Boss, Dead
//! - movement: Velocity, MovementSpeed
//! - world: Collider, SpriteSize

pub mod actor;
pub mod movement;
pub mod world;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;
pub use world::*;
