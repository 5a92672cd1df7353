//! Per-creep accumulation of damage, burn, slow and heal requests.
//!
//! Hits landing on a creep during a tick merge into its [`StatusEffect`]; the
//! world resolves every accumulator exactly once at the end of the tick.

use std::{collections::BTreeMap, time::Duration};

use creep_defence_core::{BurnEffect, CreepId, HealEffect, HitEffect, SlowEffect};

use crate::creeps::Creep;

#[derive(Clone, Copy, Debug, PartialEq)]
struct BurnState {
    count: u32,
    damage: u32,
    interval: Duration,
    elapsed: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct SlowState {
    factor: f32,
    remaining: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct HealState {
    interval: Duration,
    amount: u32,
    elapsed: Duration,
}

/// Transient accumulator attached to a creep while effects are outstanding.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct StatusEffect {
    pending_damage: u32,
    burn: Option<BurnState>,
    slow: Option<SlowState>,
    heal: Option<HealState>,
}

/// Outcome of resolving an accumulator for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Effects remain outstanding.
    Active,
    /// Nothing remains outstanding; the accumulator should be dropped.
    Finished,
    /// The creep's health reached zero.
    Killed,
}

impl StatusEffect {
    fn new(regeneration: Option<HealEffect>) -> Self {
        Self {
            heal: regeneration.map(|heal| HealState {
                interval: heal.interval,
                amount: heal.amount,
                elapsed: Duration::ZERO,
            }),
            ..Self::default()
        }
    }

    /// Folds a hit into the accumulator.
    pub(crate) fn merge(&mut self, hit: &HitEffect) {
        self.pending_damage = self.pending_damage.saturating_add(hit.damage);

        if let Some(incoming) = hit.burn {
            self.burn = Some(match self.burn {
                Some(current) => BurnState {
                    count: current.count.max(incoming.count),
                    damage: current.damage.max(incoming.damage),
                    interval: min_nonzero_duration(current.interval, incoming.interval),
                    elapsed: current.elapsed,
                },
                None => BurnState {
                    count: incoming.count,
                    damage: incoming.damage,
                    interval: incoming.interval,
                    elapsed: Duration::ZERO,
                },
            });
        }

        if let Some(incoming) = hit.slow {
            self.slow = Some(match self.slow {
                Some(current) => SlowState {
                    factor: min_nonzero_factor(current.factor, incoming.factor),
                    remaining: current.remaining.max(incoming.duration),
                },
                None => SlowState {
                    factor: incoming.factor,
                    remaining: incoming.duration,
                },
            });
        }
    }

    /// Applies one tick of accumulated effects to the creep.
    pub(crate) fn resolve(&mut self, dt: Duration, creep: &mut Creep) -> Resolution {
        creep.health = creep
            .health
            .saturating_sub(i32::try_from(self.pending_damage).unwrap_or(i32::MAX));
        self.pending_damage = 0;
        if creep.health <= 0 {
            return Resolution::Killed;
        }

        let burnt_out = match self.burn.as_mut() {
            Some(burn) if burn.interval.is_zero() => {
                creep.health = creep.health.saturating_sub(to_health(burn.damage));
                true
            }
            Some(burn) => {
                burn.elapsed = burn.elapsed.saturating_add(dt);
                if burn.count > 0 && burn.elapsed > burn.interval {
                    creep.health = creep.health.saturating_sub(to_health(burn.damage));
                    burn.count -= 1;
                    burn.elapsed = Duration::ZERO;
                }
                burn.count == 0
            }
            None => false,
        };
        if burnt_out {
            self.burn = None;
        }
        if creep.health <= 0 {
            return Resolution::Killed;
        }

        if let Some(heal) = self.heal.as_mut() {
            if creep.health < creep.max_health {
                heal.elapsed = heal.elapsed.saturating_add(dt);
                if heal.elapsed > heal.interval {
                    creep.health = creep
                        .health
                        .saturating_add(to_health(heal.amount))
                        .min(creep.max_health);
                    heal.elapsed = Duration::ZERO;
                }
            } else {
                heal.elapsed = Duration::ZERO;
            }
        }

        let slowed = match self.slow.as_mut() {
            Some(slow) if !slow.remaining.is_zero() => {
                creep.apply_slow(slow.factor);
                slow.remaining = slow.remaining.saturating_sub(dt);
                true
            }
            _ => false,
        };
        if !slowed {
            creep.restore_speed();
            self.slow = None;
        }

        if creep.health <= 0 {
            return Resolution::Killed;
        }

        let healing = self.heal.is_some() && creep.health < creep.max_health;
        if self.pending_damage == 0 && self.burn.is_none() && self.slow.is_none() && !healing {
            return Resolution::Finished;
        }

        Resolution::Active
    }

    /// Remaining burn, reported with the interval it ticks at.
    pub(crate) fn burn(&self) -> Option<BurnEffect> {
        self.burn.map(|burn| BurnEffect {
            count: burn.count,
            damage: burn.damage,
            interval: burn.interval,
        })
    }

    /// Remaining slow, reported with the duration left.
    pub(crate) fn slow(&self) -> Option<SlowEffect> {
        self.slow.map(|slow| SlowEffect {
            factor: slow.factor,
            duration: slow.remaining,
        })
    }

    pub(crate) fn pending_damage(&self) -> u32 {
        self.pending_damage
    }
}

/// Accumulators keyed by the creep they are attached to.
#[derive(Debug, Default)]
pub(crate) struct EffectLedger {
    entries: BTreeMap<CreepId, StatusEffect>,
}

impl EffectLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Merges a hit into the creep's accumulator, creating it on first hit.
    pub(crate) fn apply(
        &mut self,
        creep: &Creep,
        regeneration: Option<HealEffect>,
        hit: &HitEffect,
    ) {
        self.entries
            .entry(creep.id)
            .or_insert_with(|| StatusEffect::new(regeneration))
            .merge(hit);
    }

    pub(crate) fn get(&self, creep: CreepId) -> Option<&StatusEffect> {
        self.entries.get(&creep)
    }

    pub(crate) fn contains(&self, creep: CreepId) -> bool {
        self.entries.contains_key(&creep)
    }

    pub(crate) fn remove(&mut self, creep: CreepId) {
        let _ = self.entries.remove(&creep);
    }

    /// Creeps carrying an accumulator, in identifier order.
    pub(crate) fn affected(&self) -> Vec<CreepId> {
        self.entries.keys().copied().collect()
    }

    pub(crate) fn get_mut(&mut self, creep: CreepId) -> Option<&mut StatusEffect> {
        self.entries.get_mut(&creep)
    }
}

fn to_health(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn min_nonzero_duration(current: Duration, incoming: Duration) -> Duration {
    if current.is_zero() {
        incoming
    } else if incoming.is_zero() {
        current
    } else {
        current.min(incoming)
    }
}

fn min_nonzero_factor(current: f32, incoming: f32) -> f32 {
    if current == 0.0 {
        incoming
    } else if incoming == 0.0 {
        current
    } else {
        current.min(incoming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creep_defence_core::{
        CreepKind, CreepKindId, NodeId, PathLayout, PathNodeLayout, Vec3, WaveId,
    };

    use crate::{creeps::CreepRegistry, path::PathTree};

    fn creep(health: i32) -> Creep {
        let path = PathTree::from_layout(&PathLayout {
            root: NodeId::new(0),
            nodes: vec![PathNodeLayout {
                position: Vec3::ZERO,
                children: Vec::new(),
            }],
        });
        let kind = CreepKind {
            name: "Grunt".to_owned(),
            max_health: health,
            leak_damage: 1,
            gold: 1,
            speed: 4.0,
            acceleration: 2.0,
            regeneration: None,
        };
        let mut registry = CreepRegistry::new();
        let id = registry
            .spawn(CreepKindId::new(0), &kind, WaveId::new(0), &path)
            .expect("spawn");
        registry.remove(id).expect("creep")
    }

    fn burn(count: u32, damage: u32, interval_ms: u64) -> HitEffect {
        HitEffect {
            damage: 0,
            burn: Some(BurnEffect {
                count,
                damage,
                interval: Duration::from_millis(interval_ms),
            }),
            slow: None,
        }
    }

    fn slow(factor: f32, seconds: u64) -> HitEffect {
        HitEffect {
            damage: 0,
            burn: None,
            slow: Some(SlowEffect {
                factor,
                duration: Duration::from_secs(seconds),
            }),
        }
    }

    #[test]
    fn burns_merge_by_max_count_max_damage_min_interval() {
        let mut effect = StatusEffect::default();
        effect.merge(&burn(2, 3, 1_000));
        effect.merge(&burn(1, 5, 500));

        assert_eq!(
            effect.burn(),
            Some(BurnEffect {
                count: 2,
                damage: 5,
                interval: Duration::from_millis(500),
            })
        );
    }

    #[test]
    fn slows_merge_by_strongest_factor_and_longest_duration() {
        let mut effect = StatusEffect::default();
        effect.merge(&slow(0.5, 2));
        effect.merge(&slow(0.3, 1));

        assert_eq!(
            effect.slow(),
            Some(SlowEffect {
                factor: 0.3,
                duration: Duration::from_secs(2),
            })
        );
    }

    #[test]
    fn zero_intervals_and_factors_do_not_win_the_minimum() {
        let mut effect = StatusEffect::default();
        effect.merge(&burn(1, 1, 0));
        effect.merge(&burn(1, 1, 750));
        effect.merge(&slow(0.0, 1));
        effect.merge(&slow(0.6, 1));

        assert_eq!(
            effect.burn().map(|burn| burn.interval),
            Some(Duration::from_millis(750))
        );
        assert_eq!(effect.slow().map(|slow| slow.factor), Some(0.6));
    }

    #[test]
    fn pending_damage_sums_and_applies_once() {
        let mut target = creep(50);
        let mut effect = StatusEffect::default();
        let hit = HitEffect {
            damage: 20,
            ..HitEffect::default()
        };
        effect.merge(&hit);
        effect.merge(&hit);
        assert_eq!(effect.pending_damage(), 40);

        let resolution = effect.resolve(Duration::from_millis(100), &mut target);
        assert_eq!(target.health, 10);
        assert_eq!(effect.pending_damage(), 0);
        assert_eq!(resolution, Resolution::Finished);
    }

    #[test]
    fn lethal_damage_reports_kill() {
        let mut target = creep(30);
        let mut effect = StatusEffect::default();
        effect.merge(&HitEffect {
            damage: 45,
            ..HitEffect::default()
        });

        assert_eq!(
            effect.resolve(Duration::from_millis(100), &mut target),
            Resolution::Killed
        );
        assert!(target.health <= 0);
    }

    #[test]
    fn burn_ticks_after_interval_elapses() {
        let mut target = creep(50);
        let mut effect = StatusEffect::default();
        effect.merge(&burn(2, 4, 1_000));

        let dt = Duration::from_millis(600);
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Active);
        assert_eq!(target.health, 50);
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Active);
        assert_eq!(target.health, 46);
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Active);
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Finished);
        assert_eq!(target.health, 42);
        assert_eq!(effect.burn(), None);
    }

    #[test]
    fn zero_interval_burn_applies_once_immediately() {
        let mut target = creep(50);
        let mut effect = StatusEffect::default();
        effect.merge(&burn(3, 7, 0));

        assert_eq!(
            effect.resolve(Duration::from_millis(16), &mut target),
            Resolution::Finished
        );
        assert_eq!(target.health, 43);
    }

    #[test]
    fn slow_applies_then_restores_base_speed() {
        let mut target = creep(50);
        let mut effect = StatusEffect::default();
        effect.merge(&slow(0.5, 1));

        let dt = Duration::from_millis(500);
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Active);
        assert!((target.speed - 2.0).abs() < f32::EPSILON);
        assert!((target.acceleration - 1.0).abs() < f32::EPSILON);
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Active);
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Finished);
        assert!((target.speed - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn regeneration_heals_until_full() {
        let mut target = creep(50);
        let mut effect = StatusEffect::new(Some(HealEffect {
            interval: Duration::from_millis(500),
            amount: 8,
        }));
        effect.merge(&HitEffect {
            damage: 10,
            ..HitEffect::default()
        });

        let dt = Duration::from_millis(300);
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Active);
        assert_eq!(target.health, 40);
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Active);
        assert_eq!(target.health, 48);
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Active);
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Finished);
        assert_eq!(target.health, 50);
    }

    #[test]
    fn regeneration_never_revives_a_lethal_hit() {
        let mut target = creep(20);
        let mut effect = StatusEffect::new(Some(HealEffect {
            interval: Duration::from_millis(100),
            amount: 10,
        }));
        let dt = Duration::from_millis(60);

        effect.merge(&HitEffect {
            damage: 5,
            ..HitEffect::default()
        });
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Active);
        assert_eq!(target.health, 15);

        effect.merge(&HitEffect {
            damage: 17,
            ..HitEffect::default()
        });
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Killed);
        assert_eq!(target.health, -2);
    }

    #[test]
    fn regeneration_never_revives_a_lethal_burn() {
        let mut target = creep(20);
        let mut effect = StatusEffect::new(Some(HealEffect {
            interval: Duration::from_millis(100),
            amount: 10,
        }));
        effect.merge(&HitEffect {
            damage: 15,
            ..HitEffect::default()
        });
        let dt = Duration::from_millis(60);
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Active);

        effect.merge(&burn(1, 8, 0));
        assert_eq!(effect.resolve(dt, &mut target), Resolution::Killed);
        assert_eq!(target.health, -3);
    }

    #[test]
    fn ledger_creates_accumulator_on_first_hit_only() {
        let target = creep(50);
        let mut ledger = EffectLedger::new();
        assert!(!ledger.contains(target.id));

        ledger.apply(&target, None, &slow(0.5, 1));
        ledger.apply(&target, None, &slow(0.4, 1));
        assert_eq!(ledger.affected(), vec![target.id]);
        assert_eq!(
            ledger.get(target.id).and_then(StatusEffect::slow).map(|s| s.factor),
            Some(0.4)
        );

        ledger.remove(target.id);
        assert!(ledger.get(target.id).is_none());
    }
}
