//! Combat report: накопительные счётчики боя
//!
//! Event буферы живут два тика, поэтому итоги прогона (сводка headless арены,
//! проверки в тестах) собираются здесь через EventReader, а не из `Events<T>`.

use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::combat::{DamageDealt, EntityKilled};
use crate::elite::{EliteExploded, EliteSpawned};
use crate::weapon::{WeaponFired, WeaponId};

#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct CombatReport {
    pub ticks: u64,
    pub damage_events: u64,
    pub critical_hits: u64,
    pub total_damage: f32,
    pub kills: u64,
    pub xp_awarded: u64,
    pub elites_spawned: u32,
    pub explosions: u32,
    /// Выстрелы по id оружия (все владельцы)
    pub weapons_fired: BTreeMap<WeaponId, u32>,
}

impl CombatReport {
    pub fn fired(&self, weapon_id: &str) -> u32 {
        self.weapons_fired
            .iter()
            .find(|(id, _)| id.0 == weapon_id)
            .map_or(0, |(_, count)| *count)
    }
}

/// System: дочитывает events тика в `CombatReport` (после `CombatSet::Elites`)
pub fn record_combat_report(
    mut report: ResMut<CombatReport>,
    mut damage: EventReader<DamageDealt>,
    mut killed: EventReader<EntityKilled>,
    mut fired: EventReader<WeaponFired>,
    mut spawned: EventReader<EliteSpawned>,
    mut exploded: EventReader<EliteExploded>,
) {
    report.ticks += 1;

    for event in damage.read() {
        report.damage_events += 1;
        report.total_damage += event.amount;
        if event.is_critical {
            report.critical_hits += 1;
        }
    }

    for event in killed.read() {
        report.kills += 1;
        report.xp_awarded += u64::from(event.xp_value);
    }

    for event in fired.read() {
        *report.weapons_fired.entry(event.weapon_id.clone()).or_default() += 1;
    }

    report.elites_spawned += spawned.read().count() as u32;
    report.explosions += exploded.read().count() as u32;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_headless_app, step_fixed, SimulationPlugin};

    #[test]
    fn test_report_counts_events_from_every_tick() {
        let mut app = create_headless_app(3);
        app.add_plugins(SimulationPlugin);
        let target = Entity::from_raw(77);

        for tick in 0..4 {
            for _ in 0..=tick {
                app.world_mut().send_event(DamageDealt {
                    source: None,
                    target,
                    amount: 2.5,
                    damage_type: crate::DamageType::Physical,
                    is_critical: tick == 3,
                    position: Vec2::ZERO,
                });
            }
            app.world_mut().send_event(WeaponFired {
                entity: target,
                weapon_id: "garlic".into(),
                position: Vec2::ZERO,
                direction: Vec2::X,
                projectile_count: 1,
            });
            step_fixed(&mut app, 1.0 / 60.0);
        }

        let report = app.world().resource::<CombatReport>();
        assert_eq!(report.ticks, 4);
        // 1 + 2 + 3 + 4, без двойного счёта событий прошлого тика
        assert_eq!(report.damage_events, 10);
        assert_eq!(report.critical_hits, 4);
        assert!((report.total_damage - 25.0).abs() < 1e-4);
        assert_eq!(report.fired("garlic"), 4);
        assert_eq!(report.fired("whip"), 0);
    }
}
