//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use creep_defence_core::{
    CreepId, NodeId, SortOrder, TargetingMode, TowerAttributes, TowerCooldownSnapshot, TowerId,
    TowerKind, TowerKindId, TowerSnapshot, UpgradeError, Vec3,
};

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Catalog entry the tower was built from.
    pub(crate) kind: TowerKindId,
    /// World-space position of the tower.
    pub(crate) position: Vec3,
    /// Base plus purchased upgrade attributes.
    pub(crate) attributes: TowerAttributes,
    /// Level held on each upgrade path.
    pub(crate) upgrade_levels: Vec<Option<usize>>,
    pub(crate) mode: TargetingMode,
    pub(crate) order: SortOrder,
    /// Creeps inside the range volume, in arrival order.
    pub(crate) in_range: Vec<CreepId>,
    /// Current target, always a member of `in_range`.
    pub(crate) target: Option<CreepId>,
    /// Time accumulated while holding a target since the last shot.
    pub(crate) since_last_shot: Duration,
    /// Path nodes whose danger counter this tower contributes to.
    pub(crate) threatened: Vec<NodeId>,
}

impl TowerState {
    fn new(id: TowerId, kind_id: TowerKindId, kind: &TowerKind, position: Vec3) -> Self {
        Self {
            id,
            kind: kind_id,
            position,
            attributes: kind.base.clone(),
            upgrade_levels: vec![None; kind.upgrade_paths.len()],
            mode: TargetingMode::default(),
            order: SortOrder::default(),
            in_range: Vec::new(),
            target: None,
            since_last_shot: Duration::ZERO,
            threatened: Vec::new(),
        }
    }

    /// Adds a creep to the range list, reporting whether it was new.
    pub(crate) fn enter(&mut self, creep: CreepId) -> bool {
        if self.in_range.contains(&creep) {
            return false;
        }
        self.in_range.push(creep);
        true
    }

    /// Removes a creep from the range list.
    ///
    /// Returns `None` when the creep was not a member. Otherwise the target is
    /// cleared unconditionally and the previous target is returned.
    pub(crate) fn exit(&mut self, creep: CreepId) -> Option<Option<CreepId>> {
        let index = self.in_range.iter().position(|member| *member == creep)?;
        let _ = self.in_range.remove(index);
        Some(self.target.take())
    }

    /// Drops a destroyed creep, reporting whether it was the current target.
    pub(crate) fn purge(&mut self, creep: CreepId) -> bool {
        self.in_range.retain(|member| *member != creep);
        if self.target == Some(creep) {
            self.target = None;
            return true;
        }
        false
    }

    /// Writes the current target, reporting whether it changed.
    ///
    /// Creeps outside the range list are refused so the target stays a member.
    pub(crate) fn assign(&mut self, target: Option<CreepId>) -> bool {
        if let Some(creep) = target {
            if !self.in_range.contains(&creep) {
                return false;
            }
        }
        if self.target == target {
            return false;
        }
        self.target = target;
        true
    }

    /// Moves one level along the upgrade path, returning the new level.
    pub(crate) fn upgrade(
        &mut self,
        kind: &TowerKind,
        path: usize,
    ) -> Result<usize, UpgradeError> {
        let levels = kind
            .upgrade_paths
            .get(path)
            .map(|upgrade_path| upgrade_path.levels.len())
            .ok_or(UpgradeError::UnknownPath)?;
        let slot = self
            .upgrade_levels
            .get_mut(path)
            .ok_or(UpgradeError::UnknownPath)?;
        let next = slot.map_or(0, |level| level + 1);
        if next >= levels {
            return Err(UpgradeError::PathExhausted);
        }
        *slot = Some(next);
        self.attributes = composite_attributes(kind, &self.upgrade_levels);
        Ok(next)
    }

    pub(crate) fn cooldown(&self) -> TowerCooldownSnapshot {
        TowerCooldownSnapshot {
            tower: self.id,
            since_last_shot: self.since_last_shot,
            interval: self.attributes.fire_interval(),
        }
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            attributes: self.attributes.clone(),
            mode: self.mode,
            order: self.order,
            in_range: self.in_range.clone(),
            current_target: self.target,
            upgrade_levels: self.upgrade_levels.clone(),
        }
    }
}

/// Base attributes plus the current level of every purchased upgrade path.
pub(crate) fn composite_attributes(
    kind: &TowerKind,
    levels: &[Option<usize>],
) -> TowerAttributes {
    let upgrades = kind
        .upgrade_paths
        .iter()
        .zip(levels)
        .filter_map(|(path, level)| level.and_then(|level| path.levels.get(level)));
    TowerAttributes::composite(&kind.base, upgrades)
}

/// Next purchasable upgrade along a path, if any.
pub(crate) fn next_upgrade<'a>(
    kind: &'a TowerKind,
    levels: &[Option<usize>],
    path: usize,
) -> Option<&'a TowerAttributes> {
    let current = levels.get(path)?;
    let next = current.map_or(0, |level| level + 1);
    kind.upgrade_paths.get(path)?.levels.get(next)
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Stores a freshly placed tower and returns its identifier.
    pub(crate) fn insert(
        &mut self,
        kind_id: TowerKindId,
        kind: &TowerKind,
        position: Vec3,
    ) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self
            .entries
            .insert(id, TowerState::new(id, kind_id, kind, position));
        id
    }

    pub(crate) fn remove(&mut self, tower: TowerId) -> Option<TowerState> {
        self.entries.remove(&tower)
    }

    pub(crate) fn get(&self, tower: TowerId) -> Option<&TowerState> {
        self.entries.get(&tower)
    }

    pub(crate) fn get_mut(&mut self, tower: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&tower)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }
}
