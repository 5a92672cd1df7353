//! Creep state and path-following movement.

use std::{collections::BTreeMap, time::Duration};

use creep_defence_core::{
    CreepId, CreepKind, CreepKindId, CreepSnapshot, Event, NodeId, Vec3, WaveId,
};

use crate::path::PathTree;

/// Creep walking the path tree.
#[derive(Clone, Debug)]
pub(crate) struct Creep {
    pub(crate) id: CreepId,
    pub(crate) kind: CreepKindId,
    pub(crate) wave: WaveId,
    pub(crate) position: Vec3,
    pub(crate) health: i32,
    pub(crate) max_health: i32,
    pub(crate) leak_damage: u32,
    pub(crate) gold: u32,
    pub(crate) base_speed: f32,
    pub(crate) base_acceleration: f32,
    pub(crate) speed: f32,
    pub(crate) acceleration: f32,
    velocity: f32,
    origin: NodeId,
    destination: Option<NodeId>,
    nodes_passed: u32,
    edge_length: f32,
}

impl Creep {
    fn spawn(
        id: CreepId,
        kind_id: CreepKindId,
        kind: &CreepKind,
        wave: WaveId,
        root: NodeId,
        position: Vec3,
    ) -> Self {
        Self {
            id,
            kind: kind_id,
            wave,
            position,
            health: kind.max_health,
            max_health: kind.max_health,
            leak_damage: kind.leak_damage,
            gold: kind.gold,
            base_speed: kind.speed,
            base_acceleration: kind.acceleration,
            speed: kind.speed,
            acceleration: kind.acceleration,
            velocity: 0.0,
            origin: root,
            destination: None,
            nodes_passed: 0,
            edge_length: 0.0,
        }
    }

    /// Node the creep most recently arrived at.
    pub(crate) fn origin(&self) -> NodeId {
        self.origin
    }

    /// Reports whether the creep stands on a node waiting to be routed.
    pub(crate) fn awaiting_route(&self) -> bool {
        self.destination.is_none()
    }

    /// Scales speed and acceleration by a slow factor.
    pub(crate) fn apply_slow(&mut self, factor: f32) {
        self.speed = self.base_speed * factor;
        self.acceleration = self.base_acceleration * factor;
    }

    /// Restores unslowed speed and acceleration.
    pub(crate) fn restore_speed(&mut self) {
        self.speed = self.base_speed;
        self.acceleration = self.base_acceleration;
    }

    /// Starts walking from the current node toward `next`.
    pub(crate) fn route_to(&mut self, next: NodeId, target: Vec3) {
        self.destination = Some(next);
        self.edge_length = self.position.distance(target);
    }

    fn progress(&self, path: &PathTree) -> f32 {
        let passed = self.nodes_passed as f32;
        let Some(destination) = self.destination else {
            return passed;
        };
        let Some(target) = path.position(destination) else {
            return passed;
        };
        if self.edge_length <= f32::EPSILON {
            return passed;
        }

        let remaining = self.position.distance(target);
        passed + (1.0 - remaining / self.edge_length).clamp(0.0, 1.0)
    }

    /// Advances the creep along its current edge, reporting the node reached.
    fn advance(&mut self, dt: Duration, path: &PathTree, arrival_radius: f32) -> Option<NodeId> {
        let destination = self.destination?;
        let Some(target) = path.position(destination) else {
            self.destination = None;
            return None;
        };

        let seconds = dt.as_secs_f32();
        if self.acceleration > 0.0 {
            self.velocity = (self.velocity + self.acceleration * seconds).min(self.speed);
        } else {
            self.velocity = self.speed;
        }
        let velocity = self.velocity.max(0.0);
        let step = velocity * seconds;
        let offset = target - self.position;
        let remaining = offset.length();

        if remaining <= arrival_radius || step >= remaining {
            self.position = target;
            self.origin = destination;
            self.destination = None;
            self.edge_length = 0.0;
            self.nodes_passed = self.nodes_passed.saturating_add(1);
            return Some(destination);
        }

        self.position += offset / remaining * step;
        None
    }

    pub(crate) fn snapshot(&self, path: &PathTree, affected: bool) -> CreepSnapshot {
        CreepSnapshot {
            id: self.id,
            kind: self.kind,
            wave: self.wave,
            position: self.position,
            health: self.health,
            max_health: self.max_health,
            leak_damage: self.leak_damage,
            speed: self.speed,
            acceleration: self.acceleration,
            progress: self.progress(path),
            origin: self.origin,
            destination: self.destination,
            affected,
        }
    }
}

/// Registry that stores creeps and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct CreepRegistry {
    entries: BTreeMap<CreepId, Creep>,
    next_creep_id: CreepId,
}

impl CreepRegistry {
    /// Creates an empty creep registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_creep_id: CreepId::new(0),
        }
    }

    /// Places a new creep of the provided kind on the spawner node.
    pub(crate) fn spawn(
        &mut self,
        kind_id: CreepKindId,
        kind: &CreepKind,
        wave: WaveId,
        path: &PathTree,
    ) -> Option<CreepId> {
        let root = path.root();
        let position = path.position(root)?;
        let id = self.next_creep_id;
        self.next_creep_id = CreepId::new(id.get().saturating_add(1));
        let _ = self
            .entries
            .insert(id, Creep::spawn(id, kind_id, kind, wave, root, position));
        Some(id)
    }

    pub(crate) fn get(&self, creep: CreepId) -> Option<&Creep> {
        self.entries.get(&creep)
    }

    pub(crate) fn get_mut(&mut self, creep: CreepId) -> Option<&mut Creep> {
        self.entries.get_mut(&creep)
    }

    pub(crate) fn remove(&mut self, creep: CreepId) -> Option<Creep> {
        self.entries.remove(&creep)
    }

    pub(crate) fn contains(&self, creep: CreepId) -> bool {
        self.entries.contains_key(&creep)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Creep> {
        self.entries.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Moves every routed creep, announcing arrivals in identifier order.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        path: &PathTree,
        arrival_radius: f32,
        out_events: &mut Vec<Event>,
    ) {
        for creep in self.entries.values_mut() {
            if let Some(node) = creep.advance(dt, path, arrival_radius) {
                out_events.push(Event::CreepReachedNode {
                    creep: creep.id,
                    node,
                });
            }
        }
    }

    /// Creeps lying within `radius` of `center`, in identifier order.
    pub(crate) fn within(&self, center: Vec3, radius: f32) -> Vec<CreepId> {
        self.entries
            .values()
            .filter(|creep| creep.position.distance(center) <= radius)
            .map(|creep| creep.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creep_defence_core::{PathLayout, PathNodeLayout};

    fn line() -> PathTree {
        PathTree::from_layout(&PathLayout {
            root: NodeId::new(0),
            nodes: vec![
                PathNodeLayout {
                    position: Vec3::ZERO,
                    children: vec![NodeId::new(1)],
                },
                PathNodeLayout {
                    position: Vec3::new(10.0, 0.0, 0.0),
                    children: Vec::new(),
                },
            ],
        })
    }

    fn runner() -> CreepKind {
        CreepKind {
            name: "Runner".to_owned(),
            max_health: 10,
            leak_damage: 1,
            gold: 2,
            speed: 2.0,
            acceleration: 0.0,
            regeneration: None,
        }
    }

    #[test]
    fn spawned_creep_waits_on_root() {
        let path = line();
        let mut registry = CreepRegistry::new();
        let id = registry
            .spawn(CreepKindId::new(0), &runner(), WaveId::new(0), &path)
            .expect("spawn");

        let creep = registry.get(id).expect("creep");
        assert_eq!(creep.origin(), NodeId::new(0));
        assert!(creep.awaiting_route());
        assert_eq!(creep.snapshot(&path, false).progress, 0.0);
    }

    #[test]
    fn routed_creep_walks_and_reports_arrival() {
        let path = line();
        let mut registry = CreepRegistry::new();
        let id = registry
            .spawn(CreepKindId::new(0), &runner(), WaveId::new(0), &path)
            .expect("spawn");
        registry
            .get_mut(id)
            .expect("creep")
            .route_to(NodeId::new(1), Vec3::new(10.0, 0.0, 0.0));

        let mut events = Vec::new();
        for _ in 0..2 {
            registry.advance(Duration::from_secs(1), &path, 0.05, &mut events);
        }
        let progress = registry.get(id).expect("creep").snapshot(&path, false).progress;
        assert!((progress - 0.4).abs() < 1e-4);
        assert!(events.is_empty());

        for _ in 0..3 {
            registry.advance(Duration::from_secs(1), &path, 0.05, &mut events);
        }
        assert_eq!(
            events,
            vec![Event::CreepReachedNode {
                creep: id,
                node: NodeId::new(1),
            }]
        );
        let creep = registry.get(id).expect("creep");
        assert!(creep.awaiting_route());
        assert_eq!(creep.snapshot(&path, false).progress, 1.0);
    }

    #[test]
    fn velocity_ramps_with_acceleration() {
        let path = line();
        let mut registry = CreepRegistry::new();
        let kind = CreepKind {
            acceleration: 1.0,
            ..runner()
        };
        let id = registry
            .spawn(CreepKindId::new(0), &kind, WaveId::new(0), &path)
            .expect("spawn");
        registry
            .get_mut(id)
            .expect("creep")
            .route_to(NodeId::new(1), Vec3::new(10.0, 0.0, 0.0));

        let mut events = Vec::new();
        registry.advance(Duration::from_secs(1), &path, 0.05, &mut events);
        let first = registry.get(id).expect("creep").position.x;
        registry.advance(Duration::from_secs(1), &path, 0.05, &mut events);
        let second = registry.get(id).expect("creep").position.x;

        assert!((first - 1.0).abs() < 1e-4);
        assert!((second - 3.0).abs() < 1e-4);
    }

    #[test]
    fn slow_scales_speed_until_restored() {
        let path = line();
        let mut registry = CreepRegistry::new();
        let id = registry
            .spawn(CreepKindId::new(0), &runner(), WaveId::new(0), &path)
            .expect("spawn");
        let creep = registry.get_mut(id).expect("creep");

        creep.apply_slow(0.25);
        assert!((creep.speed - 0.5).abs() < f32::EPSILON);
        creep.restore_speed();
        assert!((creep.speed - 2.0).abs() < f32::EPSILON);
    }
}
