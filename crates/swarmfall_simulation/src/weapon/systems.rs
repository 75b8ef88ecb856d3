//! Weapon controller systems (CombatSet::Weapons)

use bevy::prelude::*;

use crate::weapon::{WeaponController, WeaponId};

/// Event: ручной выстрел в точку (fire_weapon)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct FireWeaponRequest {
    pub entity: Entity,
    pub weapon_id: WeaponId,
    pub target: Vec2,
}

/// Event: операции с инвентарём оружия
#[derive(Event, Debug, Clone, PartialEq)]
pub enum WeaponInventoryRequest {
    Add { entity: Entity, weapon_id: WeaponId },
    Remove { entity: Entity, weapon_id: WeaponId },
    Upgrade { entity: Entity, weapon_id: WeaponId },
    Evolve { entity: Entity, weapon_id: WeaponId },
}

/// Система: inventory requests (add / remove / upgrade / evolve)
pub fn process_inventory_requests(mut requests: EventReader<WeaponInventoryRequest>, mut controller: WeaponController) {
    for request in requests.read() {
        let result = match request {
            WeaponInventoryRequest::Add { entity, weapon_id } => controller.add_weapon(*entity, weapon_id),
            WeaponInventoryRequest::Remove { entity, weapon_id } => Ok(controller.remove_weapon(*entity, weapon_id)),
            WeaponInventoryRequest::Upgrade { entity, weapon_id } => controller.upgrade_weapon(*entity, weapon_id),
            WeaponInventoryRequest::Evolve { entity, weapon_id } => controller.evolve_weapon(*entity, weapon_id),
        };

        match result {
            Ok(true) => {}
            Ok(false) => crate::logger::log(&format!("Weapon request rejected: {:?}", request)),
            Err(error) => crate::logger::log_error(&format!("Weapon request {:?} failed: {}", request, error)),
        }
    }
}

/// Система: ручные выстрелы
pub fn process_fire_requests(mut requests: EventReader<FireWeaponRequest>, mut controller: WeaponController) {
    for request in requests.read() {
        match controller.fire_weapon(request.entity, &request.weapon_id, request.target) {
            Ok(true) => {}
            Ok(false) => crate::logger::log(&format!(
                "Fire request for {} on {:?} rejected (not ready)",
                request.weapon_id, request.entity
            )),
            Err(error) => crate::logger::log_error(&format!("Fire request failed: {}", error)),
        }
    }
}

/// Система: cooldowns + autofire
pub fn update_weapons(mut controller: WeaponController, time: Res<Time<Fixed>>) {
    controller.tick(time.delta_secs());
}
