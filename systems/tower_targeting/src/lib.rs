#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that selects tower targets from range membership.
//!
//! Every tower ranks the creeps inside its range volume with its configured
//! [`TargetingMode`] and [`SortOrder`]. Range changes force a hard
//! re-acquire; towers without a target attempt a weak acquire every tick.

use std::collections::BTreeMap;

use creep_defence_core::{
    Command, CreepId, CreepView, Event, TargetingMode, TowerId, TowerSnapshot, TowerView,
};

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    candidates: Vec<Candidate>,
    pending: BTreeMap<TowerId, Acquisition>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Acquisition {
    Weak,
    Hard,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    id: CreepId,
    key: f32,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ranks the tower's in-range creeps and returns the top one.
    ///
    /// Creeps missing from `creeps` are purged before ranking. Ties keep
    /// range-list order in both directions.
    pub fn acquire(&mut self, tower: &TowerSnapshot, creeps: &CreepView) -> Option<CreepId> {
        self.candidates.clear();
        for id in &tower.in_range {
            let Some(creep) = creeps.get(*id) else {
                continue;
            };
            let key = match tower.mode {
                TargetingMode::Distance => tower.position.distance(creep.position),
                TargetingMode::Health => creep.health as f32,
                TargetingMode::LeakDamage => creep.leak_damage as f32,
                TargetingMode::Speed => creep.speed,
            };
            self.candidates.push(Candidate { id: *id, key });
        }

        let order = tower.order;
        self.candidates
            .sort_by(|left, right| order.apply(left.key.total_cmp(&right.key)));
        self.candidates.first().map(|candidate| candidate.id)
    }

    /// Builds the hard re-acquire issued right before a tower fires.
    pub fn reacquire(
        &mut self,
        tower: TowerId,
        towers: &TowerView,
        creeps: &CreepView,
    ) -> Option<Command> {
        let snapshot = towers.get(tower)?;
        Some(Command::AssignTarget {
            tower,
            target: self.acquire(snapshot, creeps),
        })
    }

    /// Emits `Command::AssignTarget` for towers whose range membership changed.
    ///
    /// Each tower receives at most one assignment per batch. Weak acquires
    /// only emit when they find a creep.
    pub fn handle(
        &mut self,
        events: &[Event],
        towers: &TowerView,
        creeps: &CreepView,
        out: &mut Vec<Command>,
    ) {
        self.pending.clear();

        for event in events {
            match event {
                Event::CreepEnteredRange { tower, .. }
                | Event::CreepExitedRange { tower, .. }
                | Event::TargetCleared { tower }
                | Event::TargetingChanged { tower, .. } => {
                    let _ = self.pending.insert(*tower, Acquisition::Hard);
                }
                Event::TimeAdvanced { .. } => {
                    for snapshot in towers.iter() {
                        if snapshot.current_target.is_none() {
                            let _ = self
                                .pending
                                .entry(snapshot.id)
                                .or_insert(Acquisition::Weak);
                        }
                    }
                }
                _ => {}
            }
        }

        let pending = std::mem::take(&mut self.pending);
        for (tower, acquisition) in &pending {
            let Some(snapshot) = towers.get(*tower) else {
                continue;
            };
            match acquisition {
                Acquisition::Hard => {
                    let target = self.acquire(snapshot, creeps);
                    out.push(Command::AssignTarget {
                        tower: *tower,
                        target,
                    });
                }
                Acquisition::Weak => {
                    if snapshot.current_target.is_some() {
                        continue;
                    }
                    if let Some(target) = self.acquire(snapshot, creeps) {
                        out.push(Command::AssignTarget {
                            tower: *tower,
                            target: Some(target),
                        });
                    }
                }
            }
        }
        self.pending = pending;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creep_defence_core::{
        CreepKindId, CreepSnapshot, NodeId, SortOrder, TowerAttributes, TowerKindId, Vec3,
        WaveId,
    };

    fn creep(id: u32, x: f32, health: i32, leak_damage: u32, speed: f32) -> CreepSnapshot {
        CreepSnapshot {
            id: CreepId::new(id),
            kind: CreepKindId::new(0),
            wave: WaveId::new(0),
            position: Vec3::new(x, 0.0, 0.0),
            health,
            max_health: 100,
            leak_damage,
            speed,
            acceleration: 1.0,
            progress: 0.0,
            origin: NodeId::new(0),
            destination: None,
            affected: false,
        }
    }

    fn tower(in_range: &[u32], mode: TargetingMode, order: SortOrder) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(1),
            kind: TowerKindId::new(0),
            position: Vec3::ZERO,
            attributes: TowerAttributes::default(),
            mode,
            order,
            in_range: in_range.iter().copied().map(CreepId::new).collect(),
            current_target: None,
            upgrade_levels: Vec::new(),
        }
    }

    fn creeps() -> CreepView {
        CreepView::from_snapshots(vec![
            creep(1, 4.0, 30, 2, 1.0),
            creep(2, 2.0, 80, 9, 3.0),
            creep(3, 6.0, 10, 2, 2.0),
        ])
    }

    #[test]
    fn distance_ascending_prefers_nearest() {
        let mut system = TowerTargeting::new();
        let tower = tower(&[1, 2, 3], TargetingMode::Distance, SortOrder::Ascending);
        assert_eq!(system.acquire(&tower, &creeps()), Some(CreepId::new(2)));
    }

    #[test]
    fn distance_descending_prefers_farthest() {
        let mut system = TowerTargeting::new();
        let tower = tower(&[1, 2, 3], TargetingMode::Distance, SortOrder::Descending);
        assert_eq!(system.acquire(&tower, &creeps()), Some(CreepId::new(3)));
    }

    #[test]
    fn health_and_speed_rank_by_current_values() {
        let mut system = TowerTargeting::new();
        let weakest = tower(&[1, 2, 3], TargetingMode::Health, SortOrder::Ascending);
        let fastest = tower(&[1, 2, 3], TargetingMode::Speed, SortOrder::Descending);

        assert_eq!(system.acquire(&weakest, &creeps()), Some(CreepId::new(3)));
        assert_eq!(system.acquire(&fastest, &creeps()), Some(CreepId::new(2)));
    }

    #[test]
    fn leak_damage_ties_keep_range_order() {
        let mut system = TowerTargeting::new();
        let ascending = tower(&[3, 2, 1], TargetingMode::LeakDamage, SortOrder::Ascending);
        let descending = tower(&[3, 1, 2], TargetingMode::LeakDamage, SortOrder::Descending);

        assert_eq!(system.acquire(&ascending, &creeps()), Some(CreepId::new(3)));
        assert_eq!(system.acquire(&descending, &creeps()), Some(CreepId::new(2)));

        let tied = tower(&[3, 1], TargetingMode::LeakDamage, SortOrder::Descending);
        assert_eq!(system.acquire(&tied, &creeps()), Some(CreepId::new(3)));
    }

    #[test]
    fn destroyed_creeps_are_purged_before_ranking() {
        let mut system = TowerTargeting::new();
        let partial = tower(&[7, 1], TargetingMode::Health, SortOrder::Ascending);
        assert_eq!(system.acquire(&partial, &creeps()), Some(CreepId::new(1)));

        let vanished = tower(&[7, 8], TargetingMode::Health, SortOrder::Ascending);
        assert_eq!(system.acquire(&vanished, &creeps()), None);
    }

    #[test]
    fn range_changes_issue_one_hard_acquire_per_tower() {
        let mut system = TowerTargeting::new();
        let mut snapshot = tower(&[1, 2], TargetingMode::Distance, SortOrder::Ascending);
        snapshot.current_target = None;
        let towers = TowerView::from_snapshots(vec![snapshot]);
        let events = vec![
            Event::CreepExitedRange {
                tower: TowerId::new(1),
                creep: CreepId::new(3),
            },
            Event::TargetCleared {
                tower: TowerId::new(1),
            },
            Event::CreepEnteredRange {
                tower: TowerId::new(1),
                creep: CreepId::new(2),
            },
        ];
        let mut out = Vec::new();

        system.handle(&events, &towers, &creeps(), &mut out);

        assert_eq!(
            out,
            vec![Command::AssignTarget {
                tower: TowerId::new(1),
                target: Some(CreepId::new(2)),
            }]
        );
    }

    #[test]
    fn hard_acquire_on_empty_range_clears_target() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(
            &[],
            TargetingMode::Distance,
            SortOrder::Ascending,
        )]);
        let events = vec![Event::CreepExitedRange {
            tower: TowerId::new(1),
            creep: CreepId::new(2),
        }];
        let mut out = Vec::new();

        system.handle(&events, &towers, &creeps(), &mut out);

        assert_eq!(
            out,
            vec![Command::AssignTarget {
                tower: TowerId::new(1),
                target: None,
            }]
        );
    }

    #[test]
    fn weak_acquire_only_runs_without_target() {
        let mut system = TowerTargeting::new();
        let idle = tower(&[1, 3], TargetingMode::Distance, SortOrder::Ascending);
        let mut busy = tower(&[1, 3], TargetingMode::Distance, SortOrder::Ascending);
        busy.id = TowerId::new(2);
        busy.current_target = Some(CreepId::new(3));
        let mut empty = tower(&[], TargetingMode::Distance, SortOrder::Ascending);
        empty.id = TowerId::new(3);
        let towers = TowerView::from_snapshots(vec![idle, busy, empty]);
        let events = vec![Event::TimeAdvanced {
            dt: std::time::Duration::from_millis(16),
        }];
        let mut out = Vec::new();

        system.handle(&events, &towers, &creeps(), &mut out);

        assert_eq!(
            out,
            vec![Command::AssignTarget {
                tower: TowerId::new(1),
                target: Some(CreepId::new(1)),
            }]
        );
    }

    #[test]
    fn reacquire_targets_unknown_towers_with_nothing() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(
            &[1],
            TargetingMode::Distance,
            SortOrder::Ascending,
        )]);

        assert_eq!(
            system.reacquire(TowerId::new(1), &towers, &creeps()),
            Some(Command::AssignTarget {
                tower: TowerId::new(1),
                target: Some(CreepId::new(1)),
            })
        );
        assert_eq!(system.reacquire(TowerId::new(9), &towers, &creeps()), None);
    }
}
