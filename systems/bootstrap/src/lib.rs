#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level loading for Creep Defence.
//!
//! Level files are versioned TOML documents. Everything a level references is
//! resolved and validated here so that malformed content is reported once at
//! load time and never discovered in the middle of a simulation.

mod file;

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use creep_defence_core::{
    seconds, CreepKind, CreepKindId, HealEffect, LevelLayout, NodeId, PathLayout,
    PathNodeLayout, TowerAttributes, TowerKind, TowerKindId, UpgradePath, Vec3,
};
use creep_defence_system_path_routing as routing;
use creep_defence_system_wave_director::{self as director, Wave, WaveEntry};
use creep_defence_world::WorldConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::file::{CreepEntry, LevelFile, NodeEntry, TowerEntry, WorldSection};

/// Level file format version understood by this loader.
pub const SUPPORTED_LEVEL_VERSION: u32 = 1;

const DEFAULT_STARTING_HEALTH: i32 = 50;
const DEFAULT_STARTING_GOLD: u32 = 30;
const DEFAULT_KILL_SCORE: u32 = 10;

/// Player economy settings read from the `[player]` section.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Health the defender starts with; leaks subtract from it.
    pub starting_health: i32,
    /// Gold available before the first purchase.
    pub starting_gold: u32,
    /// Upper bound on the gold balance.
    pub max_gold: u32,
    /// Purchases are free and the balance always reads as `max_gold`.
    pub infinite_gold: bool,
    /// Score awarded per kill.
    pub kill_score: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            starting_health: DEFAULT_STARTING_HEALTH,
            starting_gold: DEFAULT_STARTING_GOLD,
            max_gold: u32::MAX,
            infinite_gold: false,
            kill_score: DEFAULT_KILL_SCORE,
        }
    }
}

/// Tower the level places before the first wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Tower kind to place.
    pub kind: TowerKindId,
    /// World-space position of the tower.
    pub position: Vec3,
}

/// Fully resolved level ready to seed a simulation.
#[derive(Clone, Debug)]
pub struct LevelBlueprint {
    /// Display name of the level.
    pub name: String,
    /// Physical constants of the world.
    pub world: WorldConfig,
    /// Path tree and catalogs consumed by the world.
    pub layout: LevelLayout,
    /// File identifiers of the path nodes, indexed by [`NodeId`].
    pub node_names: Vec<String>,
    /// Ordered waves of the level.
    pub waves: Vec<Wave>,
    /// Spawn cadence and auto-advance flag of the wave director.
    pub director: director::Config,
    /// Danger tolerance and seed of the path router.
    pub routing: routing::Config,
    /// Player economy settings.
    pub player: PlayerConfig,
    /// Towers placed before the first wave.
    pub placements: Vec<Placement>,
}

/// Errors reported while loading a level.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The level file could not be read.
    #[error("failed to read level file {}", path.display())]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The level file is not valid TOML for the level schema.
    #[error("failed to parse level toml")]
    Parse(#[from] toml::de::Error),
    /// The level file uses a different format version.
    #[error("unsupported level version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version declared by the file.
        found: u32,
        /// Version understood by the loader.
        expected: u32,
    },
    /// Two creep kinds share a name.
    #[error("duplicate creep kind `{0}`")]
    DuplicateCreep(String),
    /// Two tower kinds share a name.
    #[error("duplicate tower kind `{0}`")]
    DuplicateTower(String),
    /// Two path nodes share an identifier.
    #[error("duplicate path node `{0}`")]
    DuplicateNode(String),
    /// A creep kind starts without health.
    #[error("creep kind `{0}` must start with positive health")]
    InvalidHealth(String),
    /// A creep kind carries a negative or non-finite stat.
    #[error("creep kind `{creep}` has an invalid {stat}")]
    InvalidCreepStat {
        /// Offending creep kind.
        creep: String,
        /// Name of the offending stat.
        stat: &'static str,
    },
    /// A tower kind carries a negative or non-finite attribute.
    #[error("tower kind `{tower}` has an invalid {attribute}")]
    InvalidAttribute {
        /// Offending tower kind.
        tower: String,
        /// Name of the offending attribute.
        attribute: &'static str,
    },
    /// A tower upgrade path has no levels.
    #[error("upgrade path {path} of tower kind `{tower}` has no levels")]
    EmptyUpgradePath {
        /// Offending tower kind.
        tower: String,
        /// Index of the empty path.
        path: usize,
    },
    /// The level declares no path nodes.
    #[error("level has no path nodes")]
    NoNodes,
    /// A path node position is not finite.
    #[error("path node `{0}` has a non-finite position")]
    NonFinitePosition(String),
    /// A node lists a child that does not exist.
    #[error("path node `{node}` lists unknown child `{child}`")]
    UnknownChild {
        /// Node listing the child.
        node: String,
        /// Missing child identifier.
        child: String,
    },
    /// A node is listed as a child more than once.
    #[error("path node `{0}` has more than one parent")]
    MultipleParents(String),
    /// The tree does not have exactly one parentless node.
    #[error("path must have exactly one spawner node, found {0}")]
    RootCount(usize),
    /// The spawner node leads nowhere.
    #[error("spawner node `{0}` has no children")]
    RootWithoutChildren(String),
    /// A node cannot be reached from the spawner, which implies a cycle.
    #[error("path node `{0}` is unreachable from the spawner")]
    Unreachable(String),
    /// The spawn cadence is negative or non-finite.
    #[error("spawn wait must be a finite non-negative number of seconds")]
    InvalidSpawnWait,
    /// The level declares no waves.
    #[error("level has no waves")]
    NoWaves,
    /// A wave declares no entries.
    #[error("wave {0} has no entries")]
    EmptyWave(usize),
    /// A wave references a creep kind that does not exist.
    #[error("wave {wave} references unknown creep kind `{creep}`")]
    UnknownCreep {
        /// Offending wave index.
        wave: usize,
        /// Missing creep kind name.
        creep: String,
    },
    /// A wave entry spawns nothing.
    #[error("wave {wave} spawns zero creeps of kind `{creep}`")]
    ZeroCount {
        /// Offending wave index.
        wave: usize,
        /// Creep kind of the entry.
        creep: String,
    },
    /// A placement references a tower kind that does not exist.
    #[error("placement references unknown tower kind `{0}`")]
    UnknownTower(String),
    /// A placement position is not finite.
    #[error("placement of tower kind `{0}` has a non-finite position")]
    NonFinitePlacement(String),
}

impl LevelBlueprint {
    /// Reads and validates the level file at the provided path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let blueprint = Self::parse(&contents)?;
        log::info!(
            "loaded level `{}` from {} with {} wave(s)",
            blueprint.name,
            path.display(),
            blueprint.waves.len()
        );
        Ok(blueprint)
    }

    /// Parses and validates level TOML contents.
    pub fn parse(contents: &str) -> Result<Self, LevelError> {
        let file: LevelFile = toml::from_str(contents)?;
        if file.version != SUPPORTED_LEVEL_VERSION {
            return Err(LevelError::UnsupportedVersion {
                found: file.version,
                expected: SUPPORTED_LEVEL_VERSION,
            });
        }

        let creep_kinds = file
            .creeps
            .iter()
            .map(creep_kind)
            .collect::<Result<Vec<_>, _>>()?;
        let creep_index = index_names(creep_kinds.iter().map(|kind| kind.name.as_str()))
            .map_err(LevelError::DuplicateCreep)?;

        let tower_kinds = file
            .towers
            .into_iter()
            .map(tower_kind)
            .collect::<Result<Vec<_>, _>>()?;
        let tower_index = index_names(tower_kinds.iter().map(|kind| kind.base.name.as_str()))
            .map_err(LevelError::DuplicateTower)?;

        let (path, node_names) = path_layout(&file.nodes)?;

        let spawn_wait = file.waves.spawn_wait_secs;
        if !spawn_wait.is_finite() || spawn_wait < 0.0 {
            return Err(LevelError::InvalidSpawnWait);
        }
        if file.waves.list.is_empty() {
            return Err(LevelError::NoWaves);
        }
        let mut waves = Vec::with_capacity(file.waves.list.len());
        for (index, spec) in file.waves.list.iter().enumerate() {
            if spec.entries.is_empty() {
                return Err(LevelError::EmptyWave(index));
            }
            let mut entries = Vec::with_capacity(spec.entries.len());
            for entry in &spec.entries {
                let Some(kind) = creep_index.get(entry.creep.as_str()) else {
                    return Err(LevelError::UnknownCreep {
                        wave: index,
                        creep: entry.creep.clone(),
                    });
                };
                if entry.count == 0 {
                    return Err(LevelError::ZeroCount {
                        wave: index,
                        creep: entry.creep.clone(),
                    });
                }
                entries.push(WaveEntry {
                    kind: CreepKindId::new(*kind),
                    count: entry.count,
                });
            }
            waves.push(Wave { entries });
        }

        let mut placements = Vec::with_capacity(file.placements.len());
        for placement in &file.placements {
            let Some(kind) = tower_index.get(placement.tower.as_str()) else {
                return Err(LevelError::UnknownTower(placement.tower.clone()));
            };
            let position = Vec3::from_array(placement.position);
            if !position.is_finite() {
                return Err(LevelError::NonFinitePlacement(placement.tower.clone()));
            }
            placements.push(Placement {
                kind: TowerKindId::new(*kind),
                position,
            });
        }

        Ok(Self {
            name: file.name,
            world: world_config(&file.world),
            layout: LevelLayout {
                path,
                creep_kinds,
                tower_kinds,
            },
            node_names,
            waves,
            director: director::Config::new(seconds(spawn_wait), file.waves.auto_advance),
            routing: routing::Config::new(file.routing.danger_tolerance, file.routing.seed),
            player: file.player,
            placements,
        })
    }

    /// Looks up a creep kind by name.
    #[must_use]
    pub fn creep_kind(&self, name: &str) -> Option<CreepKindId> {
        self.layout
            .creep_kinds
            .iter()
            .position(|kind| kind.name == name)
            .and_then(|index| u32::try_from(index).ok())
            .map(CreepKindId::new)
    }

    /// Looks up a tower kind by name.
    #[must_use]
    pub fn tower_kind(&self, name: &str) -> Option<TowerKindId> {
        self.layout
            .tower_kinds
            .iter()
            .position(|kind| kind.base.name == name)
            .and_then(|index| u32::try_from(index).ok())
            .map(TowerKindId::new)
    }

    /// Looks up a path node by its file identifier.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.node_names
            .iter()
            .position(|node| node == name)
            .and_then(|index| u32::try_from(index).ok())
            .map(NodeId::new)
    }
}

fn world_config(section: &WorldSection) -> WorldConfig {
    let defaults = WorldConfig::default();
    WorldConfig {
        arrival_radius: section.arrival_radius.unwrap_or(defaults.arrival_radius),
        projectile_hit_radius: section
            .projectile_hit_radius
            .unwrap_or(defaults.projectile_hit_radius),
        projectile_turn_rate: section
            .projectile_turn_rate
            .unwrap_or(defaults.projectile_turn_rate),
        projectile_max_flight: section
            .projectile_max_flight_secs
            .map_or(defaults.projectile_max_flight, seconds),
        automatic_range_tracking: section
            .automatic_range_tracking
            .unwrap_or(defaults.automatic_range_tracking),
    }
}

fn index_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<HashMap<&'a str, u32>, String> {
    let mut index = HashMap::new();
    for (position, name) in names.enumerate() {
        let id = u32::try_from(position).unwrap_or(u32::MAX);
        if index.insert(name, id).is_some() {
            return Err(name.to_owned());
        }
    }
    Ok(index)
}

fn creep_kind(entry: &CreepEntry) -> Result<CreepKind, LevelError> {
    let invalid = |stat| LevelError::InvalidCreepStat {
        creep: entry.name.clone(),
        stat,
    };

    if entry.health <= 0 {
        return Err(LevelError::InvalidHealth(entry.name.clone()));
    }
    if !entry.speed.is_finite() || entry.speed < 0.0 {
        return Err(invalid("speed"));
    }
    if !entry.acceleration.is_finite() || entry.acceleration < 0.0 {
        return Err(invalid("acceleration"));
    }
    let regeneration = match &entry.regeneration {
        Some(regeneration) => {
            if !regeneration.interval_secs.is_finite() || regeneration.interval_secs < 0.0 {
                return Err(invalid("regeneration interval"));
            }
            Some(HealEffect {
                interval: seconds(regeneration.interval_secs),
                amount: regeneration.amount,
            })
        }
        None => None,
    };

    Ok(CreepKind {
        name: entry.name.clone(),
        max_health: entry.health,
        leak_damage: entry.leak_damage,
        gold: entry.gold,
        speed: entry.speed,
        acceleration: entry.acceleration,
        regeneration,
    })
}

fn tower_kind(entry: TowerEntry) -> Result<TowerKind, LevelError> {
    let name = entry.base.name.clone();
    check_attributes(&name, &entry.base)?;

    let mut upgrade_paths = Vec::with_capacity(entry.upgrades.len());
    for (index, path) in entry.upgrades.into_iter().enumerate() {
        if path.levels.is_empty() {
            return Err(LevelError::EmptyUpgradePath {
                tower: name,
                path: index,
            });
        }
        // Levels are deltas; only the attributes a tower ends up with must be valid.
        for level in &path.levels {
            check_attributes(&name, &(entry.base.clone() + level))?;
        }
        upgrade_paths.push(UpgradePath {
            levels: path.levels,
        });
    }

    Ok(TowerKind {
        base: entry.base,
        upgrade_paths,
    })
}

fn check_attributes(tower: &str, attributes: &TowerAttributes) -> Result<(), LevelError> {
    let fields = [
        ("range", attributes.range),
        ("rate of fire", attributes.rate_of_fire),
        ("missile speed", attributes.missile_speed),
        ("slow time", attributes.slow_time),
        ("slow factor", attributes.slow_factor),
        ("burn interval", attributes.burn_interval),
        ("aoe radius", attributes.aoe_radius),
    ];
    for (attribute, value) in fields {
        if !value.is_finite() || value < 0.0 {
            return Err(LevelError::InvalidAttribute {
                tower: tower.to_owned(),
                attribute,
            });
        }
    }
    Ok(())
}

fn path_layout(nodes: &[NodeEntry]) -> Result<(PathLayout, Vec<String>), LevelError> {
    if nodes.is_empty() {
        return Err(LevelError::NoNodes);
    }
    let index = index_names(nodes.iter().map(|node| node.id.as_str()))
        .map_err(LevelError::DuplicateNode)?;

    let mut parents = vec![0_usize; nodes.len()];
    let mut layout = Vec::with_capacity(nodes.len());
    for node in nodes {
        let position = Vec3::from_array(node.position);
        if !position.is_finite() {
            return Err(LevelError::NonFinitePosition(node.id.clone()));
        }

        let mut children = Vec::with_capacity(node.children.len());
        for child in &node.children {
            let Some(child_index) = index.get(child.as_str()) else {
                return Err(LevelError::UnknownChild {
                    node: node.id.clone(),
                    child: child.clone(),
                });
            };
            let child_id = NodeId::new(*child_index);
            parents[child_id.index()] += 1;
            if parents[child_id.index()] > 1 {
                return Err(LevelError::MultipleParents(child.clone()));
            }
            children.push(child_id);
        }
        layout.push(PathNodeLayout { position, children });
    }

    let roots: Vec<usize> = parents
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(position, _)| position)
        .collect();
    let [root] = roots.as_slice() else {
        return Err(LevelError::RootCount(roots.len()));
    };
    let root = *root;
    if layout[root].children.is_empty() {
        return Err(LevelError::RootWithoutChildren(nodes[root].id.clone()));
    }

    let mut reached = vec![false; layout.len()];
    let mut frontier = vec![root];
    while let Some(current) = frontier.pop() {
        reached[current] = true;
        frontier.extend(layout[current].children.iter().map(NodeId::index));
    }
    if let Some(position) = reached.iter().position(|reached| !reached) {
        return Err(LevelError::Unreachable(nodes[position].id.clone()));
    }

    let names = nodes.iter().map(|node| node.id.clone()).collect();
    Ok((
        PathLayout {
            root: NodeId::new(u32::try_from(root).unwrap_or(u32::MAX)),
            nodes: layout,
        },
        names,
    ))
}
