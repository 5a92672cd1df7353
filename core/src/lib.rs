#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Creep Defence combat simulation.
//!
//! This crate defines the message surface that connects the simulation root,
//! the authoritative world, and pure systems. Callers submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views, and respond exclusively with new command batches.

use std::{
    cmp::Ordering,
    ops::{Add, AddAssign},
    time::Duration,
};

pub use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Danger difference tolerated between adjacent branches before routing
/// treats the more dangerous branch as unsafe.
pub const DEFAULT_DANGER_TOLERANCE: i32 = 1;

/// Converts a number of seconds into a [`Duration`], mapping negative, zero,
/// and non-finite inputs to [`Duration::ZERO`].
#[must_use]
pub fn seconds(value: f32) -> Duration {
    if !value.is_finite() || value <= 0.0 {
        return Duration::ZERO;
    }

    Duration::try_from_secs_f32(value).unwrap_or(Duration::MAX)
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }

            /// Interprets the identifier as an index into a dense table.
            #[must_use]
            pub fn index(&self) -> usize {
                usize::try_from(self.0).unwrap_or(usize::MAX)
            }
        }
    };
}

identifier!(
    /// Unique identifier assigned to a creep by the world.
    CreepId
);
identifier!(
    /// Unique identifier assigned to a tower by the world.
    TowerId
);
identifier!(
    /// Identifier of a node within the path tree.
    NodeId
);
identifier!(
    /// Unique identifier assigned to an in-flight projectile.
    ProjectileId
);
identifier!(
    /// Index of a creep kind inside the level catalog.
    CreepKindId
);
identifier!(
    /// Index of a tower kind inside the level catalog.
    TowerKindId
);
identifier!(
    /// Zero-based index of a wave within the level.
    WaveId
);

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a creep of the given kind enters the path at the spawner.
    SpawnCreep {
        /// Catalog entry describing the creep.
        kind: CreepKindId,
        /// Wave the creep belongs to.
        wave: WaveId,
    },
    /// Requests placement of a tower at the provided world position.
    PlaceTower {
        /// Catalog entry describing the tower.
        kind: TowerKindId,
        /// World-space position of the tower.
        position: Vec3,
    },
    /// Requests removal of an existing tower.
    RemoveTower {
        /// Identifier of the tower targeted for removal.
        tower: TowerId,
    },
    /// Requests that a tower advances one level along an upgrade path.
    UpgradeTower {
        /// Tower to upgrade.
        tower: TowerId,
        /// Index of the upgrade path.
        path: usize,
    },
    /// Changes how a tower ranks the creeps inside its range.
    SetTargeting {
        /// Tower to reconfigure.
        tower: TowerId,
        /// Ranking function used during acquisition.
        mode: TargetingMode,
        /// Direction applied to the ranking function.
        order: SortOrder,
    },
    /// Reports that a creep entered a tower's range volume.
    EnterRange {
        /// Tower whose range volume was entered.
        tower: TowerId,
        /// Creep that entered the range volume.
        creep: CreepId,
    },
    /// Reports that a creep left a tower's range volume.
    ExitRange {
        /// Tower whose range volume was exited.
        tower: TowerId,
        /// Creep that left the range volume.
        creep: CreepId,
    },
    /// Writes the tower's current target.
    AssignTarget {
        /// Tower receiving the assignment.
        tower: TowerId,
        /// Selected creep, or `None` to clear the target.
        target: Option<CreepId>,
    },
    /// Requests that a tower launches a projectile at its current target.
    FireProjectile {
        /// Tower that fires.
        tower: TowerId,
    },
    /// Directs a creep that reached a node toward one of the node's children.
    RouteCreep {
        /// Creep being routed.
        creep: CreepId,
        /// Child node the creep should walk to next.
        next: NodeId,
    },
    /// Removes a creep that reached a terminal node, leaking it.
    DespawnCreep {
        /// Creep that leaked.
        creep: CreepId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a creep entered the path at the spawner.
    CreepSpawned {
        /// Identifier assigned to the creep.
        creep: CreepId,
        /// Catalog entry describing the creep.
        kind: CreepKindId,
        /// Wave the creep belongs to.
        wave: WaveId,
    },
    /// Announces that a creep arrived at a path node and awaits routing.
    CreepReachedNode {
        /// Creep that arrived.
        creep: CreepId,
        /// Node the creep arrived at.
        node: NodeId,
    },
    /// Confirms that a creep started walking toward a child node.
    CreepRouted {
        /// Creep that was routed.
        creep: CreepId,
        /// Node the creep departed from.
        from: NodeId,
        /// Node the creep is walking toward.
        to: NodeId,
    },
    /// Announces that a creep entered a tower's range volume.
    CreepEnteredRange {
        /// Tower whose range was entered.
        tower: TowerId,
        /// Creep that entered.
        creep: CreepId,
    },
    /// Announces that a creep left a tower's range volume.
    CreepExitedRange {
        /// Tower whose range was exited.
        tower: TowerId,
        /// Creep that left.
        creep: CreepId,
    },
    /// Confirms that a tower selected a target.
    TargetAssigned {
        /// Tower that selected the target.
        tower: TowerId,
        /// Creep now targeted by the tower.
        creep: CreepId,
    },
    /// Announces that a tower no longer has a target.
    TargetCleared {
        /// Tower whose target was cleared.
        tower: TowerId,
    },
    /// Announces that a tower's ranking configuration changed.
    TargetingChanged {
        /// Tower that was reconfigured.
        tower: TowerId,
        /// Ranking function now in use.
        mode: TargetingMode,
        /// Direction now applied to the ranking.
        order: SortOrder,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Catalog entry describing the tower.
        kind: TowerKindId,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Catalog entry that was requested.
        kind: TowerKindId,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was removed from the world.
    TowerRemoved {
        /// Identifier of the removed tower.
        tower: TowerId,
    },
    /// Confirms that a tower advanced along an upgrade path.
    TowerUpgraded {
        /// Tower that was upgraded.
        tower: TowerId,
        /// Upgrade path that advanced.
        path: usize,
        /// Level now held on the path.
        level: usize,
    },
    /// Reports that an upgrade request was rejected.
    TowerUpgradeRejected {
        /// Tower named in the request.
        tower: TowerId,
        /// Upgrade path named in the request.
        path: usize,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Reports the live danger counter of a node after a tower entered or left it.
    DangerChanged {
        /// Node whose counter changed.
        node: NodeId,
        /// Counter value after the change.
        danger: i32,
    },
    /// Confirms that a tower launched a projectile.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Tower that fired.
        tower: TowerId,
        /// Creep the projectile homes on.
        target: CreepId,
    },
    /// Announces that a projectile arrived and applied its effect.
    ProjectileImpacted {
        /// Projectile that arrived.
        projectile: ProjectileId,
        /// Creep the projectile homed on.
        target: CreepId,
        /// Every creep that received the on-hit effect, in id order.
        affected: Vec<CreepId>,
    },
    /// Announces that a projectile self-destructed without effect.
    ProjectileMissed {
        /// Projectile that was destroyed.
        projectile: ProjectileId,
    },
    /// Announces that a creep's health reached zero.
    CreepKilled {
        /// Creep that was killed.
        creep: CreepId,
        /// Catalog entry describing the creep.
        kind: CreepKindId,
        /// Wave the creep belonged to.
        wave: WaveId,
        /// Gold awarded for the kill.
        gold: u32,
    },
    /// Announces that a creep reached a terminal node undestroyed.
    CreepLeaked {
        /// Creep that leaked.
        creep: CreepId,
        /// Catalog entry describing the creep.
        kind: CreepKindId,
        /// Wave the creep belonged to.
        wave: WaveId,
        /// Damage dealt to the defender.
        leak_damage: u32,
    },
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested tower kind is not part of the level catalog.
    UnknownKind,
    /// The requested position is not a finite coordinate.
    InvalidPosition,
}

/// Reasons an upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    MissingTower,
    /// The tower kind has no upgrade path with the provided index.
    UnknownPath,
    /// The upgrade path has no further levels.
    PathExhausted,
}

/// Ranking functions a tower may apply to the creeps inside its range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetingMode {
    /// Straight-line distance from the tower to the creep.
    #[default]
    Distance,
    /// Current creep health.
    Health,
    /// Damage the creep would deal to the defender if it leaked.
    LeakDamage,
    /// Current post-slow creep speed.
    Speed,
}

/// Direction applied to a [`TargetingMode`] ranking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Smallest value first.
    #[default]
    Ascending,
    /// Largest value first.
    Descending,
}

impl SortOrder {
    /// Sign multiplier associated with the order.
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }

    /// Applies the order to an ascending comparison result.
    ///
    /// Equal elements stay equal in both directions, so a stable sort keeps
    /// ties in their original list order.
    #[must_use]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Damage-over-time component of an on-hit effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BurnEffect {
    /// Number of burns to inflict.
    pub count: u32,
    /// Damage inflicted by each burn.
    pub damage: u32,
    /// Time between burns.
    pub interval: Duration,
}

/// Speed-reduction component of an on-hit effect.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SlowEffect {
    /// Multiplier applied to the creep's base speed; smaller is stronger.
    pub factor: f32,
    /// How long the slow lasts.
    pub duration: Duration,
}

/// Periodic healing applied to a damaged creep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HealEffect {
    /// Time between heals.
    pub interval: Duration,
    /// Health restored by each heal.
    pub amount: u32,
}

/// Typed on-hit payload carried by a projectile into a creep's accumulator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HitEffect {
    /// Flat damage applied on the next resolution.
    pub damage: u32,
    /// Optional damage-over-time component.
    pub burn: Option<BurnEffect>,
    /// Optional speed-reduction component.
    pub slow: Option<SlowEffect>,
}

/// Numeric and boolean attributes of a tower or of one of its upgrades.
///
/// Upgrade attribute sets are deltas: numeric fields add onto the base and
/// the `apply_*` flags combine with logical OR. Durations are expressed in
/// seconds so that level files stay readable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TowerAttributes {
    /// Display name of the tower or upgrade.
    pub name: String,
    /// Flavour text shown by shop interfaces.
    pub description: String,
    /// Gold required to purchase the tower or upgrade.
    pub cost: u32,
    /// Radius of the tower's range volume.
    pub range: f32,
    /// Flat damage of each shot.
    pub damage: u32,
    /// Shots fired per second.
    pub rate_of_fire: f32,
    /// Travel speed of fired projectiles.
    pub missile_speed: f32,
    /// Whether shots slow their targets.
    pub apply_slow: bool,
    /// Seconds a slow lasts.
    pub slow_time: f32,
    /// Speed multiplier applied by a slow.
    pub slow_factor: f32,
    /// Whether shots burn their targets.
    pub apply_burn: bool,
    /// Seconds between burns.
    pub burn_interval: f32,
    /// Number of burns inflicted.
    pub burn_count: u32,
    /// Damage per burn.
    pub burn_damage: u32,
    /// Whether shots damage every creep around the impact point.
    pub apply_aoe: bool,
    /// Radius of the area-of-effect blast.
    pub aoe_radius: f32,
}

impl TowerAttributes {
    /// Sums a base attribute set with any number of upgrade deltas.
    #[must_use]
    pub fn composite<'a, I>(base: &TowerAttributes, upgrades: I) -> TowerAttributes
    where
        I: IntoIterator<Item = &'a TowerAttributes>,
    {
        let mut composite = base.clone();
        for upgrade in upgrades {
            composite += upgrade;
        }
        composite
    }

    /// Time between shots, or `None` when the tower never fires.
    #[must_use]
    pub fn fire_interval(&self) -> Option<Duration> {
        if !self.rate_of_fire.is_finite() || self.rate_of_fire <= 0.0 {
            return None;
        }

        Some(seconds(1.0 / self.rate_of_fire))
    }

    /// Typed on-hit effect delivered by projectiles carrying these attributes.
    #[must_use]
    pub fn hit_effect(&self) -> HitEffect {
        HitEffect {
            damage: self.damage,
            burn: self.apply_burn.then(|| BurnEffect {
                count: self.burn_count,
                damage: self.burn_damage,
                interval: seconds(self.burn_interval),
            }),
            slow: self.apply_slow.then(|| SlowEffect {
                factor: self.slow_factor,
                duration: seconds(self.slow_time),
            }),
        }
    }
}

impl AddAssign<&TowerAttributes> for TowerAttributes {
    fn add_assign(&mut self, rhs: &TowerAttributes) {
        if self.name.is_empty() {
            self.name.clone_from(&rhs.name);
        }
        if self.description.is_empty() {
            self.description.clone_from(&rhs.description);
        }
        self.cost = self.cost.saturating_add(rhs.cost);
        self.range += rhs.range;
        self.damage = self.damage.saturating_add(rhs.damage);
        self.rate_of_fire += rhs.rate_of_fire;
        self.missile_speed += rhs.missile_speed;
        self.apply_slow |= rhs.apply_slow;
        self.slow_time += rhs.slow_time;
        self.slow_factor += rhs.slow_factor;
        self.apply_burn |= rhs.apply_burn;
        self.burn_interval += rhs.burn_interval;
        self.burn_count = self.burn_count.saturating_add(rhs.burn_count);
        self.burn_damage = self.burn_damage.saturating_add(rhs.burn_damage);
        self.apply_aoe |= rhs.apply_aoe;
        self.aoe_radius += rhs.aoe_radius;
    }
}

impl Add<&TowerAttributes> for TowerAttributes {
    type Output = TowerAttributes;

    fn add(mut self, rhs: &TowerAttributes) -> Self::Output {
        self += rhs;
        self
    }
}

/// Catalog entry describing one kind of creep.
#[derive(Clone, Debug, PartialEq)]
pub struct CreepKind {
    /// Display name of the creep kind.
    pub name: String,
    /// Health a freshly spawned creep starts with.
    pub max_health: i32,
    /// Damage dealt to the defender when the creep leaks.
    pub leak_damage: u32,
    /// Gold awarded when the creep is killed.
    pub gold: u32,
    /// Unslowed travel speed.
    pub speed: f32,
    /// Unslowed acceleration toward the travel speed.
    pub acceleration: f32,
    /// Optional self-healing applied while the creep is damaged.
    pub regeneration: Option<HealEffect>,
}

/// Ordered list of upgrades purchasable along one path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpgradePath {
    /// Upgrade deltas, cheapest first.
    pub levels: Vec<TowerAttributes>,
}

/// Catalog entry describing one kind of tower.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerKind {
    /// Attributes of a freshly placed tower.
    pub base: TowerAttributes,
    /// Independent upgrade paths available to the tower.
    pub upgrade_paths: Vec<UpgradePath>,
}

/// Layout of a single node in the path tree.
#[derive(Clone, Debug, PartialEq)]
pub struct PathNodeLayout {
    /// World-space position of the node.
    pub position: Vec3,
    /// Nodes creeps may walk to from this node; empty for despawn points.
    pub children: Vec<NodeId>,
}

/// Validated path tree. Node identifiers index into `nodes`.
#[derive(Clone, Debug, PartialEq)]
pub struct PathLayout {
    /// Spawner node every creep starts at.
    pub root: NodeId,
    /// Every node of the tree.
    pub nodes: Vec<PathNodeLayout>,
}

/// Static content of a level consumed by the world.
///
/// Creep and tower kind identifiers index into the respective catalogs.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelLayout {
    /// Path tree creeps traverse.
    pub path: PathLayout,
    /// Creep catalog.
    pub creep_kinds: Vec<CreepKind>,
    /// Tower catalog.
    pub tower_kinds: Vec<TowerKind>,
}

/// Immutable representation of a single creep's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct CreepSnapshot {
    /// Unique identifier assigned to the creep.
    pub id: CreepId,
    /// Catalog entry describing the creep.
    pub kind: CreepKindId,
    /// Wave the creep belongs to.
    pub wave: WaveId,
    /// Current world-space position.
    pub position: Vec3,
    /// Current health.
    pub health: i32,
    /// Health the creep spawned with.
    pub max_health: i32,
    /// Damage dealt to the defender if the creep leaks.
    pub leak_damage: u32,
    /// Current post-slow speed.
    pub speed: f32,
    /// Current post-slow acceleration.
    pub acceleration: f32,
    /// Nodes passed plus the fraction of the current edge walked.
    pub progress: f32,
    /// Node the creep most recently reached.
    pub origin: NodeId,
    /// Node the creep is walking toward, if it has been routed.
    pub destination: Option<NodeId>,
    /// Whether a status-effect accumulator is attached to the creep.
    pub affected: bool,
}

/// Read-only snapshot describing all creeps on the path.
#[derive(Clone, Debug, Default)]
pub struct CreepView {
    snapshots: Vec<CreepSnapshot>,
}

impl CreepView {
    /// Creates a new creep view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CreepSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured creep snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &CreepSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of the provided creep.
    #[must_use]
    pub fn get(&self, creep: CreepId) -> Option<&CreepSnapshot> {
        self.snapshots
            .binary_search_by_key(&creep, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of creeps captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no creeps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CreepSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Catalog entry describing the tower.
    pub kind: TowerKindId,
    /// World-space position of the tower.
    pub position: Vec3,
    /// Base attributes plus every purchased upgrade.
    pub attributes: TowerAttributes,
    /// Ranking function used during acquisition.
    pub mode: TargetingMode,
    /// Direction applied to the ranking function.
    pub order: SortOrder,
    /// Creeps inside the range volume, in arrival order.
    pub in_range: Vec<CreepId>,
    /// Creep currently targeted; always a member of `in_range`.
    pub current_target: Option<CreepId>,
    /// Level held on each upgrade path, `None` while unpurchased.
    pub upgrade_levels: Vec<Option<usize>>,
}

/// Read-only snapshot describing all towers.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of the provided tower.
    #[must_use]
    pub fn get(&self, tower: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&tower, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of towers captured in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no towers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Fire-rate timer state of a single tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerCooldownSnapshot {
    /// Tower the timer belongs to.
    pub tower: TowerId,
    /// Time accumulated while the tower held a target since its last shot.
    pub since_last_shot: Duration,
    /// Time between shots, `None` when the tower never fires.
    pub interval: Option<Duration>,
}

impl TowerCooldownSnapshot {
    /// Reports whether strictly more than one fire interval has elapsed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.interval
            .map_or(false, |interval| self.since_last_shot > interval)
    }
}

/// Read-only snapshot describing every tower's fire-rate timer.
#[derive(Clone, Debug, Default)]
pub struct TowerCooldownView {
    snapshots: Vec<TowerCooldownSnapshot>,
}

impl TowerCooldownView {
    /// Creates a new cooldown view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerCooldownSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.tower);
        Self { snapshots }
    }

    /// Iterator over the captured timers in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerCooldownSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerCooldownSnapshot> {
        self.snapshots
    }
}
