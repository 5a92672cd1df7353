//! Raw level file schema as it appears on disk.

use creep_defence_core::TowerAttributes;
use serde::Deserialize;

use crate::PlayerConfig;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelFile {
    pub(crate) version: u32,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) world: WorldSection,
    #[serde(default)]
    pub(crate) player: PlayerConfig,
    #[serde(default)]
    pub(crate) routing: RoutingSection,
    pub(crate) creeps: Vec<CreepEntry>,
    #[serde(default)]
    pub(crate) towers: Vec<TowerEntry>,
    pub(crate) nodes: Vec<NodeEntry>,
    pub(crate) waves: WavesSection,
    #[serde(default)]
    pub(crate) placements: Vec<PlacementEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WorldSection {
    pub(crate) arrival_radius: Option<f32>,
    pub(crate) projectile_hit_radius: Option<f32>,
    pub(crate) projectile_turn_rate: Option<f32>,
    pub(crate) projectile_max_flight_secs: Option<f32>,
    pub(crate) automatic_range_tracking: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RoutingSection {
    pub(crate) danger_tolerance: i32,
    pub(crate) seed: u64,
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            danger_tolerance: creep_defence_core::DEFAULT_DANGER_TOLERANCE,
            seed: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CreepEntry {
    pub(crate) name: String,
    pub(crate) health: i32,
    #[serde(default)]
    pub(crate) leak_damage: u32,
    #[serde(default)]
    pub(crate) gold: u32,
    pub(crate) speed: f32,
    #[serde(default)]
    pub(crate) acceleration: f32,
    pub(crate) regeneration: Option<RegenerationEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RegenerationEntry {
    pub(crate) interval_secs: f32,
    pub(crate) amount: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TowerEntry {
    pub(crate) base: TowerAttributes,
    #[serde(default)]
    pub(crate) upgrades: Vec<UpgradePathEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct UpgradePathEntry {
    pub(crate) levels: Vec<TowerAttributes>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NodeEntry {
    pub(crate) id: String,
    pub(crate) position: [f32; 3],
    #[serde(default)]
    pub(crate) children: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WavesSection {
    pub(crate) spawn_wait_secs: f32,
    #[serde(default)]
    pub(crate) auto_advance: bool,
    pub(crate) list: Vec<WaveSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WaveSpec {
    pub(crate) entries: Vec<WaveEntrySpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WaveEntrySpec {
    pub(crate) creep: String,
    pub(crate) count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlacementEntry {
    pub(crate) tower: String,
    pub(crate) position: [f32; 3],
}
