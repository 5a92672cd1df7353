#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulation root for Creep Defence.
//!
//! [`Simulation`] owns the world, every pure system and the score sink. Each
//! host call applies its command and then pumps the resulting events through
//! the systems until no further commands are produced, so the host always
//! observes a settled world.

mod score;

use std::time::Duration;

use creep_defence_core::{
    Command, CreepId, CreepView, Event, NodeId, PlacementError, ProjectileId, SortOrder,
    TargetingMode, TowerAttributes, TowerId, TowerKind, TowerKindId, TowerView, UpgradeError,
    Vec3,
};
use creep_defence_system_bootstrap::LevelBlueprint;
use creep_defence_system_path_routing::{PathRouting, Route};
use creep_defence_system_tower_combat::TowerCombat;
use creep_defence_system_tower_targeting::TowerTargeting;
use creep_defence_system_wave_director::{WaveDirector, WaveNotice, WaveProgress};
use creep_defence_world::{self as world, query, World};
use thiserror::Error;

pub use crate::score::{GameStatus, ScoreSink, Scoreboard};

/// Upper bound on system rounds processed for a single host call.
const MAX_PUMP_ROUNDS: usize = 256;

/// Reasons a host request may be refused.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// No tower with the provided identifier exists.
    #[error("tower {} does not exist", .0.get())]
    UnknownTower(TowerId),
    /// The level catalog has no tower kind with the provided identifier.
    #[error("tower kind {} does not exist", .0.get())]
    UnknownTowerKind(TowerKindId),
    /// The score sink refused the purchase.
    #[error("insufficient gold for a purchase costing {cost}")]
    InsufficientGold {
        /// Price of the refused purchase.
        cost: u32,
    },
    /// The world rejected the placement.
    #[error("tower placement rejected: {0:?}")]
    Placement(PlacementError),
    /// The world rejected the upgrade.
    #[error("tower upgrade rejected: {0:?}")]
    Upgrade(UpgradeError),
}

/// Next purchasable level of an upgrade path.
#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeOffer {
    /// Attribute delta granted by the level.
    pub attributes: TowerAttributes,
    /// Price of the level.
    pub cost: u32,
    /// Whether the score sink can currently pay for it.
    pub affordable: bool,
}

/// Tick driver that owns the world, the systems and the score sink.
#[derive(Debug)]
pub struct Simulation<S: ScoreSink = Scoreboard> {
    world: World,
    routing: PathRouting,
    targeting: TowerTargeting,
    combat: TowerCombat,
    director: WaveDirector,
    sink: S,
    journal: Vec<Event>,
}

impl Simulation<Scoreboard> {
    /// Builds a simulation for the level with the default scoreboard.
    #[must_use]
    pub fn new(level: LevelBlueprint) -> Self {
        let scoreboard = Scoreboard::new(&level.player);
        Self::with_sink(level, scoreboard)
    }
}

impl<S: ScoreSink> Simulation<S> {
    /// Builds a simulation for the level that reports to the provided sink.
    ///
    /// Towers listed in the level's placements are placed free of charge.
    #[must_use]
    pub fn with_sink(level: LevelBlueprint, sink: S) -> Self {
        let LevelBlueprint {
            name,
            world: world_config,
            layout,
            waves,
            director,
            routing,
            placements,
            ..
        } = level;
        log::info!("starting level `{name}` with {} wave(s)", waves.len());

        let mut simulation = Self {
            world: World::new(layout, world_config),
            routing: PathRouting::new(routing),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            director: WaveDirector::new(director, waves),
            sink,
            journal: Vec::new(),
        };

        let mut events = Vec::new();
        for placement in placements {
            world::apply(
                &mut simulation.world,
                Command::PlaceTower {
                    kind: placement.kind,
                    position: placement.position,
                },
                &mut events,
            );
        }
        simulation.observe(&events);
        simulation
    }

    /// Advances the simulation by `dt`.
    pub fn tick(&mut self, dt: Duration) {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);
        self.pump(events);
    }

    /// Requests that the next wave starts; its first creep spawns immediately.
    ///
    /// Returns `false` while a wave is still spawning or waiting to clear.
    pub fn start_next_wave(&mut self) -> bool {
        if !self.director.request_next_wave() {
            return false;
        }

        let mut commands = Vec::new();
        self.director.handle(&[], &mut commands);
        let mut events = Vec::new();
        for command in commands {
            self.execute(command, &mut events);
        }
        self.pump(events);
        true
    }

    /// Enables or disables starting waves without an explicit request.
    pub fn set_auto_advance(&mut self, auto_advance: bool) {
        self.director.set_auto_advance(auto_advance);
    }

    /// Forces a hard re-acquire for the tower and returns its new target.
    pub fn acquire_target(&mut self, tower: TowerId) -> Option<CreepId> {
        let towers = query::tower_view(&self.world);
        let creeps = query::creep_view(&self.world);
        let command = self.targeting.reacquire(tower, &towers, &creeps)?;
        self.submit(command);
        self.current_target(tower)
    }

    /// Fires the tower at its freshly re-acquired target if its cooldown elapsed.
    pub fn fire(&mut self, tower: TowerId) -> Option<ProjectileId> {
        let mut events = Vec::new();
        self.execute(Command::FireProjectile { tower }, &mut events);
        let fired = events.iter().find_map(|event| match event {
            Event::ProjectileFired {
                projectile,
                tower: shooter,
                ..
            } if *shooter == tower => Some(*projectile),
            _ => None,
        });
        self.pump(events);
        fired
    }

    /// Returns the node the creep walks toward, routing it if it waits on a node.
    ///
    /// Returns `None` when the creep does not exist or leaks instead.
    pub fn route(&mut self, creep: CreepId) -> Option<NodeId> {
        let snapshot = query::creep(&self.world, creep)?;
        if snapshot.destination.is_some() {
            return snapshot.destination;
        }

        let decision = self
            .routing
            .route(snapshot.origin, &query::path_view(&self.world));
        match decision {
            Route::Next(next) => {
                self.submit(Command::RouteCreep { creep, next });
                Some(next)
            }
            Route::Despawn => {
                self.submit(Command::DespawnCreep { creep });
                None
            }
        }
    }

    /// Reports that a creep entered the tower's range volume.
    pub fn on_range_enter(&mut self, tower: TowerId, creep: CreepId) {
        self.submit(Command::EnterRange { tower, creep });
    }

    /// Reports that a creep left the tower's range volume.
    pub fn on_range_exit(&mut self, tower: TowerId, creep: CreepId) {
        self.submit(Command::ExitRange { tower, creep });
    }

    /// Buys and places a tower of the provided kind.
    pub fn place_tower(
        &mut self,
        kind: TowerKindId,
        position: Vec3,
    ) -> Result<TowerId, CommandError> {
        let cost = query::tower_kind(&self.world, kind)
            .ok_or(CommandError::UnknownTowerKind(kind))?
            .base
            .cost;
        if !self.sink.try_spend(cost) {
            return Err(CommandError::InsufficientGold { cost });
        }

        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::PlaceTower { kind, position },
            &mut events,
        );
        let outcome = events
            .iter()
            .find_map(|event| match event {
                Event::TowerPlaced { tower, .. } => Some(Ok(*tower)),
                Event::TowerPlacementRejected { reason, .. } => {
                    Some(Err(CommandError::Placement(*reason)))
                }
                _ => None,
            })
            .unwrap_or(Err(CommandError::UnknownTowerKind(kind)));
        if outcome.is_err() {
            self.sink.refund(cost);
        }
        self.pump(events);
        outcome
    }

    /// Buys the next level of the tower's upgrade path and returns that level.
    pub fn upgrade_tower(&mut self, tower: TowerId, path: usize) -> Result<usize, CommandError> {
        let cost = self.upgrade_offer(tower, path)?.cost;
        if !self.sink.try_spend(cost) {
            return Err(CommandError::InsufficientGold { cost });
        }

        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::UpgradeTower { tower, path },
            &mut events,
        );
        let outcome = events
            .iter()
            .find_map(|event| match event {
                Event::TowerUpgraded { level, .. } => Some(Ok(*level)),
                Event::TowerUpgradeRejected { reason, .. } => {
                    Some(Err(CommandError::Upgrade(*reason)))
                }
                _ => None,
            })
            .unwrap_or(Err(CommandError::UnknownTower(tower)));
        if outcome.is_err() {
            self.sink.refund(cost);
        }
        self.pump(events);
        outcome
    }

    /// Removes the tower and refunds its base cost plus every purchased upgrade.
    pub fn sell_tower(&mut self, tower: TowerId) -> Result<u32, CommandError> {
        let snapshot =
            query::tower(&self.world, tower).ok_or(CommandError::UnknownTower(tower))?;
        let refund = query::tower_kind(&self.world, snapshot.kind)
            .map_or(snapshot.attributes.cost, |kind| {
                invested(kind, &snapshot.upgrade_levels)
            });
        self.submit(Command::RemoveTower { tower });
        self.sink.refund(refund);
        Ok(refund)
    }

    /// Changes how the tower ranks creeps; forces a re-acquire.
    pub fn set_targeting(
        &mut self,
        tower: TowerId,
        mode: TargetingMode,
        order: SortOrder,
    ) -> Result<(), CommandError> {
        if query::tower(&self.world, tower).is_none() {
            return Err(CommandError::UnknownTower(tower));
        }
        self.submit(Command::SetTargeting { tower, mode, order });
        Ok(())
    }

    /// Composite attributes of the tower.
    #[must_use]
    pub fn tower_attributes(&self, tower: TowerId) -> Option<TowerAttributes> {
        query::tower(&self.world, tower).map(|snapshot| snapshot.attributes)
    }

    /// Next purchasable level of the tower's upgrade path.
    pub fn upgrade_offer(&self, tower: TowerId, path: usize) -> Result<UpgradeOffer, CommandError> {
        let snapshot =
            query::tower(&self.world, tower).ok_or(CommandError::UnknownTower(tower))?;
        let Some(attributes) = query::next_upgrade(&self.world, tower, path) else {
            let known_path = query::tower_kind(&self.world, snapshot.kind)
                .map_or(false, |kind| path < kind.upgrade_paths.len());
            return Err(CommandError::Upgrade(if known_path {
                UpgradeError::PathExhausted
            } else {
                UpgradeError::UnknownPath
            }));
        };

        Ok(UpgradeOffer {
            cost: attributes.cost,
            affordable: self.sink.can_afford(attributes.cost),
            attributes: attributes.clone(),
        })
    }

    /// Reports whether the tower's upgrade path has a level the sink can pay for.
    #[must_use]
    pub fn can_upgrade(&self, tower: TowerId, path: usize) -> bool {
        self.upgrade_offer(tower, path)
            .map_or(false, |offer| offer.affordable)
    }

    /// Creep the tower currently targets.
    #[must_use]
    pub fn current_target(&self, tower: TowerId) -> Option<CreepId> {
        query::tower(&self.world, tower).and_then(|snapshot| snapshot.current_target)
    }

    /// Wave and level completion counters.
    #[must_use]
    pub fn wave_progress(&self) -> WaveProgress {
        self.director.progress()
    }

    /// Reports whether the final wave cleared.
    #[must_use]
    pub fn is_level_complete(&self) -> bool {
        self.director.is_level_complete()
    }

    /// Snapshot of every creep.
    #[must_use]
    pub fn creeps(&self) -> CreepView {
        query::creep_view(&self.world)
    }

    /// Snapshot of every tower.
    #[must_use]
    pub fn towers(&self) -> TowerView {
        query::tower_view(&self.world)
    }

    /// Read-only access to the world for detailed queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Score sink receiving kill and leak notifications.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the score sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Removes and returns every event recorded since the last call.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, Event> {
        self.journal.drain(..)
    }

    fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        self.execute(command, &mut events);
        self.pump(events);
    }

    /// Applies a command, preceding every shot with a hard re-acquire.
    fn execute(&mut self, command: Command, events: &mut Vec<Event>) {
        if let Command::FireProjectile { tower } = command {
            let towers = query::tower_view(&self.world);
            let creeps = query::creep_view(&self.world);
            if let Some(assignment) = self.targeting.reacquire(tower, &towers, &creeps) {
                world::apply(&mut self.world, assignment, events);
            }
        }
        world::apply(&mut self.world, command, events);
    }

    fn pump(&mut self, mut events: Vec<Event>) {
        let mut rounds = 0;
        while !events.is_empty() {
            self.observe(&events);
            rounds += 1;
            if rounds > MAX_PUMP_ROUNDS {
                log::warn!("event pump stopped after {MAX_PUMP_ROUNDS} rounds");
                break;
            }

            let creeps = query::creep_view(&self.world);
            let towers = query::tower_view(&self.world);
            let mut commands = Vec::new();
            self.director.handle(&events, &mut commands);
            self.routing
                .handle(&events, &query::path_view(&self.world), &mut commands);
            self.targeting
                .handle(&events, &towers, &creeps, &mut commands);
            self.combat.handle(
                &events,
                query::tower_cooldowns(&self.world),
                &towers,
                &mut commands,
            );

            events.clear();
            for command in commands {
                self.execute(command, &mut events);
            }
        }
        self.report_notices();
    }

    fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::CreepKilled { creep, gold, .. } => {
                    log::debug!("creep {} killed for {gold} gold", creep.get());
                    self.sink.on_kill_creep(*gold);
                }
                Event::CreepLeaked {
                    creep, leak_damage, ..
                } => {
                    log::debug!("creep {} leaked for {leak_damage} damage", creep.get());
                    self.sink.on_miss_creep(*leak_damage);
                }
                _ => {}
            }
        }
        self.journal.extend_from_slice(events);
    }

    fn report_notices(&mut self) {
        for notice in self.director.drain_notices() {
            match notice {
                WaveNotice::WaveStarted { wave } => self.sink.on_wave_started(wave),
                WaveNotice::WaveCleared { wave } => self.sink.on_wave_cleared(wave),
                WaveNotice::LevelComplete => self.sink.on_level_complete(),
            }
        }
    }
}

/// Gold spent on a tower: its base cost plus every purchased upgrade level.
fn invested(kind: &TowerKind, levels: &[Option<usize>]) -> u32 {
    kind.upgrade_paths
        .iter()
        .zip(levels)
        .filter_map(|(path, level)| level.map(|level| path.levels.iter().take(level + 1)))
        .flatten()
        .fold(kind.base.cost, |total, level| total.saturating_add(level.cost))
}
