#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Creep Defence.
//!
//! The world owns every creep, tower, projectile and status-effect
//! accumulator. It is only mutated through [`apply`] and read through the
//! [`query`] module.

mod creeps;
mod effects;
mod path;
mod projectiles;
mod proximity;
mod towers;

use std::time::Duration;

use creep_defence_core::{
    Command, CreepId, CreepKind, Event, LevelLayout, PlacementError, TowerId, TowerKind,
    UpgradeError, Vec3,
};

use crate::{
    creeps::CreepRegistry,
    effects::{EffectLedger, Resolution},
    path::PathTree,
    projectiles::{Flight, FlightLimits, Projectile, ProjectileRegistry},
    towers::TowerRegistry,
};

const DEFAULT_ARRIVAL_RADIUS: f32 = 0.05;
const DEFAULT_PROJECTILE_HIT_RADIUS: f32 = 0.25;
const DEFAULT_PROJECTILE_TURN_RATE: f32 = 4.0 * std::f32::consts::PI;
const DEFAULT_PROJECTILE_MAX_FLIGHT: Duration = Duration::from_secs(10);

/// Tunable physical constants of the world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// Distance at which a creep counts as having arrived at a node.
    pub arrival_radius: f32,
    /// Distance at which a projectile counts as having hit its target.
    pub projectile_hit_radius: f32,
    /// Maximum heading change of a projectile, in radians per second.
    pub projectile_turn_rate: f32,
    /// Flight time after which a projectile self-destructs.
    pub projectile_max_flight: Duration,
    /// Whether the world diffs tower range membership itself every tick.
    ///
    /// Hosts with their own spatial engine disable this and submit
    /// [`Command::EnterRange`] and [`Command::ExitRange`] instead.
    pub automatic_range_tracking: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            arrival_radius: DEFAULT_ARRIVAL_RADIUS,
            projectile_hit_radius: DEFAULT_PROJECTILE_HIT_RADIUS,
            projectile_turn_rate: DEFAULT_PROJECTILE_TURN_RATE,
            projectile_max_flight: DEFAULT_PROJECTILE_MAX_FLIGHT,
            automatic_range_tracking: true,
        }
    }
}

/// Represents the authoritative Creep Defence world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    path: PathTree,
    creep_kinds: Vec<CreepKind>,
    tower_kinds: Vec<TowerKind>,
    creeps: CreepRegistry,
    towers: TowerRegistry,
    projectiles: ProjectileRegistry,
    effects: EffectLedger,
    clock: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Departure {
    Killed,
    Leaked,
}

impl World {
    /// Creates a world for the provided level with no creeps or towers.
    #[must_use]
    pub fn new(layout: LevelLayout, config: WorldConfig) -> Self {
        Self {
            config,
            path: PathTree::from_layout(&layout.path),
            creep_kinds: layout.creep_kinds,
            tower_kinds: layout.tower_kinds,
            creeps: CreepRegistry::new(),
            towers: TowerRegistry::new(),
            projectiles: ProjectileRegistry::new(),
            effects: EffectLedger::new(),
            clock: Duration::ZERO,
        }
    }

    fn flight_limits(&self) -> FlightLimits {
        FlightLimits {
            hit_radius: self.config.projectile_hit_radius,
            turn_rate: self.config.projectile_turn_rate,
            max_flight: self.config.projectile_max_flight,
        }
    }

    /// Re-derives the path nodes a tower threatens from its current range.
    fn threaten(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        let Some(state) = self.towers.get_mut(tower) else {
            return;
        };
        let threatened = self
            .path
            .nodes_within(state.position, state.attributes.range);

        for node in state.threatened.iter().filter(|node| !threatened.contains(node)) {
            self.path.exit_danger(*node, out_events);
        }
        for node in threatened.iter().filter(|node| !state.threatened.contains(node)) {
            self.path.enter_danger(*node, out_events);
        }
        state.threatened = threatened;
    }

    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let limits = self.flight_limits();
        for id in self.projectiles.ids() {
            let Some(projectile) = self.projectiles.get_mut(id) else {
                continue;
            };
            let target = self
                .creeps
                .get(projectile.target)
                .map(|creep| creep.position);

            match projectile.advance(dt, target, limits) {
                Flight::InFlight => {}
                Flight::Missed => {
                    let _ = self.projectiles.remove(id);
                    log::debug!("projectile {} missed", id.get());
                    out_events.push(Event::ProjectileMissed { projectile: id });
                }
                Flight::Arrived(point) => {
                    if let Some(projectile) = self.projectiles.remove(id) {
                        self.impact(projectile, point, out_events);
                    }
                }
            }
        }
    }

    /// Pushes the projectile's on-hit effect into every affected accumulator.
    fn impact(&mut self, projectile: Projectile, point: Vec3, out_events: &mut Vec<Event>) {
        let attributes = &projectile.attributes;
        let hit = attributes.hit_effect();
        let mut affected = if attributes.apply_aoe {
            self.creeps.within(point, attributes.aoe_radius.max(0.0))
        } else {
            Vec::new()
        };
        if !affected.contains(&projectile.target) {
            affected.push(projectile.target);
            affected.sort();
        }
        affected.retain(|creep| self.creeps.contains(*creep));

        for creep_id in &affected {
            let Some(creep) = self.creeps.get(*creep_id) else {
                continue;
            };
            let regeneration = self
                .creep_kinds
                .get(creep.kind.index())
                .and_then(|kind| kind.regeneration);
            self.effects.apply(creep, regeneration, &hit);
        }

        log::debug!(
            "projectile {} from tower {} hit {} creep(s)",
            projectile.id.get(),
            projectile.tower.get(),
            affected.len()
        );
        out_events.push(Event::ProjectileImpacted {
            projectile: projectile.id,
            target: projectile.target,
            affected,
        });
    }

    /// Resolves every accumulator exactly once, removing killed creeps.
    fn resolve_effects(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        for creep_id in self.effects.affected() {
            let Some(creep) = self.creeps.get_mut(creep_id) else {
                self.effects.remove(creep_id);
                continue;
            };
            let Some(effect) = self.effects.get_mut(creep_id) else {
                continue;
            };

            match effect.resolve(dt, creep) {
                Resolution::Active => {}
                Resolution::Finished => self.effects.remove(creep_id),
                Resolution::Killed => self.remove_creep(creep_id, Departure::Killed, out_events),
            }
        }
    }

    fn remove_creep(&mut self, creep: CreepId, departure: Departure, out_events: &mut Vec<Event>) {
        let Some(removed) = self.creeps.remove(creep) else {
            return;
        };
        self.effects.remove(creep);

        out_events.push(match departure {
            Departure::Killed => Event::CreepKilled {
                creep,
                kind: removed.kind,
                wave: removed.wave,
                gold: removed.gold,
            },
            Departure::Leaked => Event::CreepLeaked {
                creep,
                kind: removed.kind,
                wave: removed.wave,
                leak_damage: removed.leak_damage,
            },
        });

        for tower in self.towers.iter_mut() {
            if tower.purge(creep) {
                out_events.push(Event::TargetCleared { tower: tower.id });
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });

            world
                .creeps
                .advance(dt, &world.path, world.config.arrival_radius, out_events);

            if world.config.automatic_range_tracking {
                for tower in world.towers.iter_mut() {
                    proximity::track(tower, &world.creeps, out_events);
                }
            }

            for tower in world.towers.iter_mut() {
                if tower.target.is_some() {
                    tower.since_last_shot = tower.since_last_shot.saturating_add(dt);
                }
            }

            world.advance_projectiles(dt, out_events);
            world.resolve_effects(dt, out_events);
        }
        Command::SpawnCreep { kind, wave } => {
            let Some(definition) = world.creep_kinds.get(kind.index()) else {
                log::warn!("ignoring spawn of unknown creep kind {}", kind.get());
                return;
            };
            let Some(creep) = world.creeps.spawn(kind, definition, wave, &world.path) else {
                log::warn!("ignoring spawn on a path without a spawner node");
                return;
            };

            out_events.push(Event::CreepSpawned { creep, kind, wave });
            out_events.push(Event::CreepReachedNode {
                creep,
                node: world.path.root(),
            });
        }
        Command::PlaceTower { kind, position } => {
            let Some(definition) = world.tower_kinds.get(kind.index()) else {
                out_events.push(Event::TowerPlacementRejected {
                    kind,
                    reason: PlacementError::UnknownKind,
                });
                return;
            };
            if !position.is_finite() {
                out_events.push(Event::TowerPlacementRejected {
                    kind,
                    reason: PlacementError::InvalidPosition,
                });
                return;
            }

            let tower = world.towers.insert(kind, definition, position);
            out_events.push(Event::TowerPlaced { tower, kind });
            world.threaten(tower, out_events);
        }
        Command::RemoveTower { tower } => {
            let Some(removed) = world.towers.remove(tower) else {
                return;
            };
            for node in &removed.threatened {
                world.path.exit_danger(*node, out_events);
            }
            out_events.push(Event::TowerRemoved { tower });
        }
        Command::UpgradeTower { tower, path } => {
            let Some(state) = world.towers.get_mut(tower) else {
                out_events.push(Event::TowerUpgradeRejected {
                    tower,
                    path,
                    reason: UpgradeError::MissingTower,
                });
                return;
            };
            let Some(definition) = world.tower_kinds.get(state.kind.index()) else {
                out_events.push(Event::TowerUpgradeRejected {
                    tower,
                    path,
                    reason: UpgradeError::UnknownPath,
                });
                return;
            };

            match state.upgrade(definition, path) {
                Ok(level) => {
                    out_events.push(Event::TowerUpgraded { tower, path, level });
                    world.threaten(tower, out_events);
                }
                Err(reason) => out_events.push(Event::TowerUpgradeRejected {
                    tower,
                    path,
                    reason,
                }),
            }
        }
        Command::SetTargeting { tower, mode, order } => {
            let Some(state) = world.towers.get_mut(tower) else {
                return;
            };
            state.mode = mode;
            state.order = order;
            if state.target.take().is_some() {
                out_events.push(Event::TargetCleared { tower });
            }
            out_events.push(Event::TargetingChanged { tower, mode, order });
        }
        Command::EnterRange { tower, creep } => {
            if !world.creeps.contains(creep) {
                return;
            }
            if let Some(state) = world.towers.get_mut(tower) {
                proximity::enter(state, creep, out_events);
            }
        }
        Command::ExitRange { tower, creep } => {
            if let Some(state) = world.towers.get_mut(tower) {
                proximity::exit(state, creep, out_events);
            }
        }
        Command::AssignTarget { tower, target } => {
            if let Some(creep) = target {
                if !world.creeps.contains(creep) {
                    return;
                }
            }
            let Some(state) = world.towers.get_mut(tower) else {
                return;
            };
            if !state.assign(target) {
                return;
            }
            out_events.push(match target {
                Some(creep) => Event::TargetAssigned { tower, creep },
                None => Event::TargetCleared { tower },
            });
        }
        Command::FireProjectile { tower } => {
            let Some(state) = world.towers.get_mut(tower) else {
                return;
            };
            if !state.cooldown().is_ready() {
                return;
            }
            let Some(target) = state.target else {
                return;
            };
            let Some(creep) = world.creeps.get(target) else {
                return;
            };

            state.since_last_shot = Duration::ZERO;
            let projectile = world.projectiles.launch(
                tower,
                target,
                state.position,
                creep.position,
                state.attributes.clone(),
            );
            log::debug!(
                "tower {} fired projectile {} at creep {}",
                tower.get(),
                projectile.get(),
                target.get()
            );
            out_events.push(Event::ProjectileFired {
                projectile,
                tower,
                target,
            });
        }
        Command::RouteCreep { creep, next } => {
            let Some(state) = world.creeps.get_mut(creep) else {
                return;
            };
            if !state.awaiting_route() {
                return;
            }
            let from = state.origin();
            if !world.path.children(from).contains(&next) {
                log::warn!(
                    "ignoring route of creep {} to node {} which is not a child of node {}",
                    creep.get(),
                    next.get(),
                    from.get()
                );
                return;
            }
            let Some(target) = world.path.position(next) else {
                return;
            };

            state.route_to(next, target);
            out_events.push(Event::CreepRouted {
                creep,
                from,
                to: next,
            });
        }
        Command::DespawnCreep { creep } => {
            world.remove_creep(creep, Departure::Leaked, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{path::PathTree, towers, World, WorldConfig};
    use creep_defence_core::{
        BurnEffect, CreepId, CreepKind, CreepKindId, CreepSnapshot, CreepView, NodeId,
        ProjectileId, SlowEffect, TowerAttributes, TowerCooldownView, TowerId, TowerKind,
        TowerKindId, TowerSnapshot, TowerView, Vec3,
    };

    /// Provides read-only access to the world's tuning constants.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Total simulated time applied to the world.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Looks up a creep kind in the level catalog.
    #[must_use]
    pub fn creep_kind(world: &World, kind: CreepKindId) -> Option<&CreepKind> {
        world.creep_kinds.get(kind.index())
    }

    /// Looks up a tower kind in the level catalog.
    #[must_use]
    pub fn tower_kind(world: &World, kind: TowerKindId) -> Option<&TowerKind> {
        world.tower_kinds.get(kind.index())
    }

    /// Number of creeps currently on the path.
    #[must_use]
    pub fn creep_count(world: &World) -> usize {
        world.creeps.len()
    }

    /// Captures a read-only view of the creeps on the path.
    #[must_use]
    pub fn creep_view(world: &World) -> CreepView {
        CreepView::from_snapshots(
            world
                .creeps
                .iter()
                .map(|creep| creep.snapshot(&world.path, world.effects.contains(creep.id)))
                .collect(),
        )
    }

    /// Captures a read-only view of every tower.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Captures the state of a single tower.
    #[must_use]
    pub fn tower(world: &World, tower: TowerId) -> Option<TowerSnapshot> {
        world.towers.get(tower).map(|state| state.snapshot())
    }

    /// Captures the fire-rate timers of every tower.
    #[must_use]
    pub fn tower_cooldowns(world: &World) -> TowerCooldownView {
        TowerCooldownView::from_snapshots(
            world.towers.iter().map(|tower| tower.cooldown()).collect(),
        )
    }

    /// Next upgrade purchasable along the path, or `None` when exhausted.
    #[must_use]
    pub fn next_upgrade(world: &World, tower: TowerId, path: usize) -> Option<&TowerAttributes> {
        let state = world.towers.get(tower)?;
        let kind = world.tower_kinds.get(state.kind.index())?;
        towers::next_upgrade(kind, &state.upgrade_levels, path)
    }

    /// Exposes a read-only view of the path tree and its danger counters.
    #[must_use]
    pub fn path_view(world: &World) -> PathView<'_> {
        PathView { tree: &world.path }
    }

    /// Captures the projectiles currently in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                tower: projectile.tower,
                target: projectile.target,
                position: projectile.position,
            })
            .collect()
    }

    /// Captures the status-effect accumulator attached to a creep, if any.
    #[must_use]
    pub fn status_effect(world: &World, creep: CreepId) -> Option<StatusEffectSnapshot> {
        world
            .effects
            .get(creep)
            .map(|effect| StatusEffectSnapshot {
                pending_damage: effect.pending_damage(),
                burn: effect.burn(),
                slow: effect.slow(),
            })
    }

    /// Read-only view into the path tree.
    #[derive(Clone, Copy, Debug)]
    pub struct PathView<'a> {
        tree: &'a PathTree,
    }

    impl<'a> PathView<'a> {
        /// Spawner node every creep starts at.
        #[must_use]
        pub fn root(&self) -> NodeId {
            self.tree.root()
        }

        /// Number of nodes in the tree.
        #[must_use]
        pub fn len(&self) -> usize {
            self.tree.len()
        }

        /// Reports whether the tree has no nodes.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.tree.len() == 0
        }

        /// Children of the node; empty for leaves and unknown nodes.
        #[must_use]
        pub fn children(&self, node: NodeId) -> &'a [NodeId] {
            self.tree.children(node)
        }

        /// Parent of the node; `None` for the root and unknown nodes.
        #[must_use]
        pub fn parent(&self, node: NodeId) -> Option<NodeId> {
            self.tree.node(node).and_then(|node| node.parent)
        }

        /// Live danger counter of the node.
        #[must_use]
        pub fn danger(&self, node: NodeId) -> Option<i32> {
            self.tree.node(node).map(|node| node.danger)
        }

        /// World-space position of the node.
        #[must_use]
        pub fn position(&self, node: NodeId) -> Option<Vec3> {
            self.tree.position(node)
        }
    }

    /// Immutable representation of a projectile in flight.
    #[derive(Clone, Debug, PartialEq)]
    pub struct ProjectileSnapshot {
        /// Identifier assigned to the projectile.
        pub id: ProjectileId,
        /// Tower that fired the projectile.
        pub tower: TowerId,
        /// Creep the projectile homes on.
        pub target: CreepId,
        /// Current world-space position.
        pub position: Vec3,
    }

    /// Immutable representation of a creep's status-effect accumulator.
    #[derive(Clone, Debug, PartialEq)]
    pub struct StatusEffectSnapshot {
        /// Flat damage waiting for the next resolution.
        pub pending_damage: u32,
        /// Remaining burn, if any.
        pub burn: Option<BurnEffect>,
        /// Remaining slow, with the duration left.
        pub slow: Option<SlowEffect>,
    }

    /// Captures a creep snapshot by identifier.
    #[must_use]
    pub fn creep(world: &World, creep: CreepId) -> Option<CreepSnapshot> {
        world
            .creeps
            .get(creep)
            .map(|state| state.snapshot(&world.path, world.effects.contains(creep)))
    }
}
