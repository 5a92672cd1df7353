#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Path routing system that balances creep flow away from dangerous branches.
//!
//! When a creep reaches a node, the children are ranked by their live danger
//! counters. Every child up to the first jump in danger larger than the
//! tolerance is considered safe, and one of those is picked uniformly at
//! random. Creeps reaching a node without children leak.

use creep_defence_core::{Command, Event, NodeId, DEFAULT_DANGER_TOLERANCE};
use creep_defence_world::query::PathView;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration parameters required to construct the routing system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    danger_tolerance: i32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided tolerance and seed.
    #[must_use]
    pub const fn new(danger_tolerance: i32, rng_seed: u64) -> Self {
        Self {
            danger_tolerance,
            rng_seed,
        }
    }

    /// Creates a configuration with the default tolerance.
    #[must_use]
    pub const fn with_seed(rng_seed: u64) -> Self {
        Self::new(DEFAULT_DANGER_TOLERANCE, rng_seed)
    }

    /// Danger difference tolerated between adjacent ranked children.
    #[must_use]
    pub const fn danger_tolerance(&self) -> i32 {
        self.danger_tolerance
    }
}

/// Decision taken for a creep standing on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Walk toward the provided child.
    Next(NodeId),
    /// The node is a leaf; the creep leaks.
    Despawn,
}

/// Pure system that routes creeps through the path tree.
#[derive(Debug)]
pub struct PathRouting {
    danger_tolerance: i32,
    rng: ChaCha8Rng,
    ranked: Vec<(i32, NodeId)>,
}

impl PathRouting {
    /// Creates a new routing system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            danger_tolerance: config.danger_tolerance,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            ranked: Vec::new(),
        }
    }

    /// Chooses where a creep standing on `node` walks next.
    pub fn route(&mut self, node: NodeId, path: &PathView<'_>) -> Route {
        let safe = self.safe_children(node, path);
        if safe.is_empty() {
            return Route::Despawn;
        }

        let index = self.rng.gen_range(0..safe.len());
        Route::Next(safe[index])
    }

    /// Children of `node` that routing may pick, in ascending danger order.
    ///
    /// Children are stable-sorted by danger. The safe subset ends right
    /// before the first child whose danger exceeds its predecessor's by more
    /// than the tolerance.
    pub fn safe_children(&mut self, node: NodeId, path: &PathView<'_>) -> Vec<NodeId> {
        self.ranked.clear();
        self.ranked.extend(
            path.children(node)
                .iter()
                .map(|child| (path.danger(*child).unwrap_or(0), *child)),
        );
        self.ranked.sort_by_key(|(danger, _)| *danger);

        let cutoff = self
            .ranked
            .windows(2)
            .position(|pair| pair[1].0 > pair[0].0.saturating_add(self.danger_tolerance))
            .map_or(self.ranked.len(), |index| index + 1);

        self.ranked[..cutoff]
            .iter()
            .map(|(_, child)| *child)
            .collect()
    }

    /// Routes every creep that reached a node in the provided events.
    pub fn handle(&mut self, events: &[Event], path: &PathView<'_>, out: &mut Vec<Command>) {
        for event in events {
            let Event::CreepReachedNode { creep, node } = event else {
                continue;
            };

            match self.route(*node, path) {
                Route::Next(next) => {
                    log::debug!(
                        "routing creep {} from node {} to node {}",
                        creep.get(),
                        node.get(),
                        next.get()
                    );
                    out.push(Command::RouteCreep {
                        creep: *creep,
                        next,
                    });
                }
                Route::Despawn => {
                    if *node == path.root() {
                        log::warn!(
                            "creep {} reached spawner node {} which has no children",
                            creep.get(),
                            node.get()
                        );
                    }
                    out.push(Command::DespawnCreep { creep: *creep });
                }
            }
        }
    }
}
