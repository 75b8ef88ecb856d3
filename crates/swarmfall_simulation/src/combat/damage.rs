//! Damage resolver — урон, смерть, лечение, щит, DoT, неуязвимость
//!
//! Порядок расчёта одного удара:
//! 1. Нет Health → нулевой результат
//! 2. Неуязвим или уже мёртв → blocked, без события
//! 3. Crit roll (cap `max_crit_chance`) → × crit_multiplier
//! 4. Броня: × 100 / (100 + armor)
//! 5. floor, минимум 1
//! 6. Щит поглощает первым, остаток → health (clamp 0)
//! 7. Смерть → Dead + EntityKilled, иначе player получает i-frames
//! 8. DamageDealt { amount = health урон + поглощённое щитом }
//!
//! Математика (`compute_hit`, `mitigate_damage`, `absorb_with_shield`) — чистые функции.
//! `DamageResolver` — SystemParam поверх них (queries, RNG, events, commands).

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::combat::CombatConfig;
use crate::components::{planar_position, Boss, Dead, Health, Player};
use crate::weapon::StatModifiers;
use crate::DeterministicRng;

/// Тип урона (для резистов и VFX)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum DamageType {
    #[default]
    Physical,
    Fire,
    Ice,
    Lightning,
    Poison,
    Explosion,
}

/// Результат одного удара
///
/// `final_damage` — урон по health (после щита), `shield_absorbed` — сколько съел щит.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DamageResult {
    pub final_damage: f32,
    pub is_critical: bool,
    pub shield_absorbed: f32,
    pub killed: bool,
    pub blocked: bool,
}

impl DamageResult {
    pub fn blocked() -> Self {
        Self {
            blocked: true,
            ..Default::default()
        }
    }

    /// Полный урон (health + shield) — то, что уходит в DamageDealt.amount
    pub fn total(&self) -> f32 {
        self.final_damage + self.shield_absorbed
    }
}

/// Параметры крита для одного удара
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CritParams {
    pub chance: f32,
    pub multiplier: f32,
}

/// Запрос на урон (и операция `deal_damage`, и event для внешних коллабораторов)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DealDamageRequest {
    pub source: Option<Entity>,
    pub target: Entity,
    pub base_amount: f32,
    pub damage_type: DamageType,
    pub can_crit: bool,
    /// None → BASE_CRIT_CHANCE + StatModifiers.crit_chance_bonus источника
    pub crit_chance_override: Option<f32>,
    /// None → BASE_CRIT_MULTIPLIER + StatModifiers.crit_multiplier_bonus источника
    pub crit_multiplier_override: Option<f32>,
}

impl DealDamageRequest {
    pub fn new(source: Option<Entity>, target: Entity, base_amount: f32, damage_type: DamageType) -> Self {
        Self {
            source,
            target,
            base_amount,
            damage_type,
            can_crit: false,
            crit_chance_override: None,
            crit_multiplier_override: None,
        }
    }

    pub fn with_crit(mut self) -> Self {
        self.can_crit = true;
        self
    }

    pub fn with_crit_override(mut self, chance: f32, multiplier: f32) -> Self {
        self.can_crit = true;
        self.crit_chance_override = Some(chance);
        self.crit_multiplier_override = Some(multiplier);
        self
    }
}

/// Event: урон нанесён
///
/// Payload contract: source, target, amount, damage_type, is_critical, position.
/// `source = None` — урон без источника (взрыв elite).
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageDealt {
    pub source: Option<Entity>,
    pub target: Entity,
    pub amount: f32,
    pub damage_type: DamageType,
    pub is_critical: bool,
    pub position: Vec2,
}

/// Event: entity умер (health достиг 0)
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityKilled {
    pub entity: Entity,
    pub killer: Option<Entity>,
    pub position: Vec2,
    pub xp_value: u32,
}

/// Event: запрос на лечение
#[derive(Event, Debug, Clone, PartialEq)]
pub struct HealRequest {
    pub entity: Entity,
    pub amount: f32,
}

/// Event: запрос на DoT (перезаписывает текущий DoT цели)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ApplyDotRequest {
    pub source: Option<Entity>,
    pub target: Entity,
    pub damage_per_second: f32,
    pub duration: f32,
    pub damage_type: DamageType,
}

/// Damage over time на цели (один на entity, новый перезаписывает старый)
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct DamageOverTime {
    pub damage_per_second: f32,
    pub duration: f32,
    pub elapsed: f32,
    pub damage_type: DamageType,
    pub source: Option<Entity>,
}

impl DamageOverTime {
    pub fn new(source: Option<Entity>, damage_per_second: f32, duration: f32, damage_type: DamageType) -> Self {
        Self {
            damage_per_second,
            duration,
            elapsed: 0.0,
            damage_type,
            source,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Броня с diminishing returns: armor=100 → ½, armor=200 → ⅓
///
/// Отрицательная броня считается нулевой: урон не усиливается, а при
/// armor ≤ -100 знаменатель не уходит в 0 или минус.
pub fn mitigate_damage(amount: f32, armor: f32) -> f32 {
    amount * 100.0 / (100.0 + armor.max(0.0))
}

/// Щит поглощает первым, остаток уходит в health (clamp 0)
///
/// Возвращает (урон по health, поглощено щитом).
pub fn absorb_with_shield(health: &mut Health, amount: f32) -> (f32, f32) {
    let absorbed = amount.min(health.shield).max(0.0);
    health.shield -= absorbed;

    let remainder = amount - absorbed;
    health.current = (health.current - remainder).max(0.0);
    (remainder, absorbed)
}

/// Чистый расчёт удара по Health (шаги 2–7)
///
/// `roll` вызывается только если crit вообще возможен — потребление RNG
/// детерминировано входами.
pub fn compute_hit(
    health: &mut Health,
    already_dead: bool,
    base_amount: f32,
    crit: Option<CritParams>,
    max_crit_chance: f32,
    roll: impl FnOnce() -> f32,
) -> DamageResult {
    if health.invulnerable || already_dead || !health.is_alive() {
        return DamageResult::blocked();
    }
    if base_amount <= 0.0 {
        return DamageResult::default();
    }

    let mut amount = base_amount;
    let mut is_critical = false;

    if let Some(crit) = crit {
        let chance = crit.chance.min(max_crit_chance);
        if roll() < chance {
            is_critical = true;
            amount *= crit.multiplier;
        }
    }

    amount = mitigate_damage(amount, health.armor);
    amount = amount.floor().max(1.0);

    let (final_damage, shield_absorbed) = absorb_with_shield(health, amount);

    DamageResult {
        final_damage,
        is_critical,
        shield_absorbed,
        killed: !health.is_alive(),
        blocked: false,
    }
}

/// SystemParam: единая точка применения урона в ECS
///
/// Системы с `DamageResolver` не должны одновременно брать
/// `EventWriter<DamageDealt>`/`EventWriter<EntityKilled>` или `&mut Health`.
/// Запросы, мутирующие Transform, должны исключать Health (`Without<Health>`).
#[derive(SystemParam)]
pub struct DamageResolver<'w, 's> {
    targets: Query<
        'w,
        's,
        (
            &'static mut Health,
            Option<&'static Transform>,
            Has<Dead>,
            Has<Player>,
            Has<Boss>,
        ),
    >,
    players: Query<'w, 's, &'static mut Player>,
    modifiers: Query<'w, 's, &'static StatModifiers>,
    config: Res<'w, CombatConfig>,
    rng: ResMut<'w, DeterministicRng>,
    commands: Commands<'w, 's>,
    damage_events: EventWriter<'w, DamageDealt>,
    killed_events: EventWriter<'w, EntityKilled>,
}

impl<'w, 's> DamageResolver<'w, 's> {
    /// Применить урон (resolveDamage)
    pub fn resolve(&mut self, request: &DealDamageRequest) -> DamageResult {
        let crit = if request.can_crit {
            Some(self.crit_params(request))
        } else {
            None
        };
        let max_crit_chance = self.config.max_crit_chance;

        let Ok((mut health, transform, has_dead, is_player, is_boss)) = self.targets.get_mut(request.target) else {
            return DamageResult::default();
        };

        let rng = &mut self.rng.rng;
        let result = compute_hit(
            &mut health,
            has_dead,
            request.base_amount,
            crit,
            max_crit_chance,
            || rng.gen::<f32>(),
        );

        if result.blocked || result.total() <= 0.0 {
            return result;
        }

        let position = transform.map(planar_position).unwrap_or(Vec2::ZERO);

        if result.killed {
            let xp_value = if is_boss {
                self.config.boss_xp_value
            } else {
                self.config.default_xp_value
            };
            self.handle_death(request.target, request.source, position, xp_value);
        } else if is_player {
            health.grant_invulnerability(self.config.player_invulnerability_time);
        }

        self.damage_events.write(DamageDealt {
            source: request.source,
            target: request.target,
            amount: result.total(),
            damage_type: request.damage_type,
            is_critical: result.is_critical,
            position,
        });

        result
    }

    fn crit_params(&self, request: &DealDamageRequest) -> CritParams {
        let bonus = request
            .source
            .and_then(|source| self.modifiers.get(source).ok())
            .copied()
            .unwrap_or_default();

        CritParams {
            chance: request
                .crit_chance_override
                .unwrap_or(self.config.base_crit_chance + bonus.crit_chance_bonus),
            multiplier: request
                .crit_multiplier_override
                .unwrap_or(self.config.base_crit_multiplier + bonus.crit_multiplier_bonus),
        }
    }

    fn handle_death(&mut self, entity: Entity, killer: Option<Entity>, position: Vec2, xp_value: u32) {
        self.commands.entity(entity).insert(Dead);

        self.killed_events.write(EntityKilled {
            entity,
            killer,
            position,
            xp_value,
        });

        if let Some(mut player) = killer.and_then(|k| self.players.get_mut(k).ok()) {
            player.kills += 1;
        }

        crate::logger::log(&format!(
            "☠️ Entity {:?} killed by {:?} (xp {})",
            entity, killer, xp_value
        ));
    }

    /// Лечение (clamp к max). Мёртвых не лечим.
    pub fn heal(&mut self, entity: Entity, amount: f32) -> f32 {
        match self.targets.get_mut(entity) {
            Ok((mut health, _, has_dead, _, _)) if !has_dead && health.is_alive() => health.heal(amount),
            _ => 0.0,
        }
    }

    /// Восстановление щита (clamp к shield_max)
    pub fn restore_shield(&mut self, entity: Entity, amount: f32) -> f32 {
        match self.targets.get_mut(entity) {
            Ok((mut health, _, has_dead, _, _)) if !has_dead => health.restore_shield(amount),
            _ => 0.0,
        }
    }

    pub fn apply_invulnerability(&mut self, entity: Entity, duration: f32) {
        if let Ok((mut health, ..)) = self.targets.get_mut(entity) {
            health.grant_invulnerability(duration);
        }
    }

    /// DoT на цель (перезаписывает существующий)
    pub fn apply_damage_over_time(
        &mut self,
        source: Option<Entity>,
        target: Entity,
        damage_per_second: f32,
        duration: f32,
        damage_type: DamageType,
    ) {
        if !self.targets.contains(target) || damage_per_second <= 0.0 || duration <= 0.0 {
            return;
        }
        self.commands
            .entity(target)
            .insert(DamageOverTime::new(source, damage_per_second, duration, damage_type));
    }

    pub fn is_dead(&self, entity: Entity) -> bool {
        self.targets
            .get(entity)
            .map(|(health, _, has_dead, _, _)| has_dead || !health.is_alive())
            .unwrap_or(false)
    }

    /// Есть ли у entity Health (валидная цель для урона)
    pub fn has_health(&self, entity: Entity) -> bool {
        self.targets.contains(entity)
    }

    pub fn is_invulnerable(&self, entity: Entity) -> bool {
        self.targets
            .get(entity)
            .map(|(health, ..)| health.invulnerable)
            .unwrap_or(false)
    }

    pub fn health_percent(&self, entity: Entity) -> Option<f32> {
        self.targets.get(entity).ok().map(|(health, ..)| health.percent())
    }

    /// Позиция entity с Health (для explosion falloff и т.п.)
    pub fn position_of(&self, entity: Entity) -> Option<Vec2> {
        self.targets
            .get(entity)
            .ok()
            .and_then(|(_, transform, ..)| transform.map(planar_position))
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng.rng
    }

    pub fn commands(&mut self) -> &mut Commands<'w, 's> {
        &mut self.commands
    }
}
