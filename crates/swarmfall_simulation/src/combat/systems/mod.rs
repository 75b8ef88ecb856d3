//! Combat systems (ECS logic)

pub mod damage;


pub use damage::*;
