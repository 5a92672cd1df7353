#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave director that sequences timed creep spawns and tracks completion.
//!
//! The director walks `Idle -> Spawning -> WaitingForClear` for every wave
//! and finishes in `LevelComplete`. Both kills and leaks count a creep as
//! gone from its wave.

use std::time::Duration;

use creep_defence_core::{Command, CreepKindId, Event, WaveId};

/// Single `(creep kind, count)` entry of a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveEntry {
    /// Creep kind to spawn.
    pub kind: CreepKindId,
    /// Number of creeps of that kind.
    pub count: u32,
}

/// Ordered list of spawn entries forming one wave.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Wave {
    /// Entries spawned in order.
    pub entries: Vec<WaveEntry>,
}

impl Wave {
    /// Total number of creeps spawned by the wave.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.entries
            .iter()
            .fold(0, |total, entry| total.saturating_add(entry.count))
    }
}

/// Configuration parameters required to construct the wave director.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    spawn_wait: Duration,
    auto_advance: bool,
}

impl Config {
    /// Creates a new configuration using the provided spawn cadence.
    #[must_use]
    pub const fn new(spawn_wait: Duration, auto_advance: bool) -> Self {
        Self {
            spawn_wait,
            auto_advance,
        }
    }

    /// Time between consecutive spawns inside a wave.
    #[must_use]
    pub const fn spawn_wait(&self) -> Duration {
        self.spawn_wait
    }

    /// Whether waves start without an explicit request.
    #[must_use]
    pub const fn auto_advance(&self) -> bool {
        self.auto_advance
    }
}

/// State of the director's level state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a start signal before the given wave.
    Idle {
        /// Wave started by the next signal.
        next_wave: WaveId,
    },
    /// Spawning the creeps of the wave.
    Spawning {
        /// Wave being spawned.
        wave: WaveId,
    },
    /// Every creep of the wave spawned; waiting for all of them to be gone.
    WaitingForClear {
        /// Wave being waited on.
        wave: WaveId,
    },
    /// The final wave cleared.
    LevelComplete,
}

/// Transitions reported to the simulation root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveNotice {
    /// A wave started spawning.
    WaveStarted {
        /// Wave that started.
        wave: WaveId,
    },
    /// Every creep of a wave was killed or leaked.
    WaveCleared {
        /// Wave that cleared.
        wave: WaveId,
    },
    /// The final wave cleared.
    LevelComplete,
}

/// Completion counters exposed to user interfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveProgress {
    /// Current state machine phase.
    pub phase: Phase,
    /// Number of waves in the level.
    pub wave_count: usize,
    /// Creeps of the current wave still alive or not yet spawned.
    pub living_in_wave: u32,
    /// Creeps of the current wave spawned so far.
    pub spawned_in_wave: u32,
    /// Creeps across every wave of the level.
    pub total_creeps: u32,
    /// Creeps killed or leaked so far.
    pub processed_creeps: u32,
}

/// Pure system that emits spawn commands wave by wave.
#[derive(Debug)]
pub struct WaveDirector {
    waves: Vec<Wave>,
    spawn_wait: Duration,
    auto_advance: bool,
    phase: Phase,
    start_requested: bool,
    entry_index: usize,
    spawned_in_entry: u32,
    spawned_in_wave: u32,
    accumulator: Duration,
    living_in_wave: u32,
    processed_creeps: u32,
    notices: Vec<WaveNotice>,
}

impl WaveDirector {
    /// Creates a new director for the provided waves.
    #[must_use]
    pub fn new(config: Config, waves: Vec<Wave>) -> Self {
        let phase = if waves.is_empty() {
            Phase::LevelComplete
        } else {
            Phase::Idle {
                next_wave: WaveId::new(0),
            }
        };

        Self {
            waves,
            spawn_wait: config.spawn_wait,
            auto_advance: config.auto_advance,
            phase,
            start_requested: false,
            entry_index: 0,
            spawned_in_entry: 0,
            spawned_in_wave: 0,
            accumulator: Duration::ZERO,
            living_in_wave: 0,
            processed_creeps: 0,
            notices: Vec::new(),
        }
    }

    /// Requests that the next wave starts, accepted only while idle.
    pub fn request_next_wave(&mut self) -> bool {
        if matches!(self.phase, Phase::Idle { .. }) {
            self.start_requested = true;
            return true;
        }
        false
    }

    /// Enables or disables starting waves without an explicit request.
    pub fn set_auto_advance(&mut self, auto_advance: bool) {
        self.auto_advance = auto_advance;
    }

    /// Current state machine phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Reports whether the final wave cleared.
    #[must_use]
    pub fn is_level_complete(&self) -> bool {
        self.phase == Phase::LevelComplete
    }

    /// Completion counters of the level and the current wave.
    #[must_use]
    pub fn progress(&self) -> WaveProgress {
        WaveProgress {
            phase: self.phase,
            wave_count: self.waves.len(),
            living_in_wave: self.living_in_wave,
            spawned_in_wave: self.spawned_in_wave,
            total_creeps: self
                .waves
                .iter()
                .fold(0, |total, wave| total.saturating_add(wave.total())),
            processed_creeps: self.processed_creeps,
        }
    }

    /// Removes and returns the transitions recorded since the last call.
    pub fn drain_notices(&mut self) -> std::vec::Drain<'_, WaveNotice> {
        self.notices.drain(..)
    }

    /// Consumes events to count departures, advance timers and emit spawns.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::CreepKilled { wave, .. } | Event::CreepLeaked { wave, .. } => {
                    self.record_departure(*wave);
                }
                _ => {}
            }
        }

        let mut started = false;
        if let Phase::Idle { next_wave } = self.phase {
            if self.start_requested || self.auto_advance {
                self.start_wave(next_wave);
                started = true;
            }
        }

        if let Phase::Spawning { wave } = self.phase {
            if !started {
                self.accumulator = self.accumulator.saturating_add(elapsed);
            }
            self.spawn_due(wave, out);
        }

        if let Phase::WaitingForClear { wave } = self.phase {
            if self.living_in_wave == 0 {
                self.finish_wave(wave);
            }
        }
    }

    fn record_departure(&mut self, wave: WaveId) {
        self.processed_creeps = self.processed_creeps.saturating_add(1);
        let current = match self.phase {
            Phase::Spawning { wave } | Phase::WaitingForClear { wave } => wave,
            Phase::Idle { .. } | Phase::LevelComplete => return,
        };
        if wave == current {
            self.living_in_wave = self.living_in_wave.saturating_sub(1);
        }
    }

    fn start_wave(&mut self, wave: WaveId) {
        let Some(definition) = self.waves.get(wave.index()) else {
            self.phase = Phase::LevelComplete;
            return;
        };

        self.start_requested = false;
        self.living_in_wave = definition.total();
        self.entry_index = 0;
        self.spawned_in_entry = 0;
        self.spawned_in_wave = 0;
        self.accumulator = self.spawn_wait;
        self.phase = Phase::Spawning { wave };
        self.notices.push(WaveNotice::WaveStarted { wave });
        log::info!(
            "wave {} of {} started with {} creep(s)",
            wave.get() + 1,
            self.waves.len(),
            self.living_in_wave
        );
    }

    fn spawn_due(&mut self, wave: WaveId, out: &mut Vec<Command>) {
        let entries = match self.waves.get(wave.index()) {
            Some(definition) => definition.entries.as_slice(),
            None => &[],
        };

        loop {
            while entries
                .get(self.entry_index)
                .map_or(false, |entry| self.spawned_in_entry >= entry.count)
            {
                self.entry_index += 1;
                self.spawned_in_entry = 0;
            }

            let Some(entry) = entries.get(self.entry_index) else {
                self.phase = Phase::WaitingForClear { wave };
                return;
            };
            if self.accumulator < self.spawn_wait {
                return;
            }

            out.push(Command::SpawnCreep {
                kind: entry.kind,
                wave,
            });
            self.spawned_in_entry += 1;
            self.spawned_in_wave = self.spawned_in_wave.saturating_add(1);
            self.accumulator -= self.spawn_wait;
        }
    }

    fn finish_wave(&mut self, wave: WaveId) {
        self.notices.push(WaveNotice::WaveCleared { wave });
        log::info!("wave {} cleared", wave.get() + 1);

        let next = WaveId::new(wave.get().saturating_add(1));
        if next.index() >= self.waves.len() {
            self.phase = Phase::LevelComplete;
            self.notices.push(WaveNotice::LevelComplete);
            log::info!("level complete after {} wave(s)", self.waves.len());
        } else {
            self.phase = Phase::Idle { next_wave: next };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(entries: &[(u32, u32)]) -> Wave {
        Wave {
            entries: entries
                .iter()
                .map(|(kind, count)| WaveEntry {
                    kind: CreepKindId::new(*kind),
                    count: *count,
                })
                .collect(),
        }
    }

    #[test]
    fn wave_total_sums_entries() {
        assert_eq!(wave(&[(0, 3), (1, 2)]).total(), 5);
        assert_eq!(Wave::default().total(), 0);
    }

    #[test]
    fn empty_level_is_complete_immediately() {
        let director = WaveDirector::new(Config::new(Duration::from_secs(1), false), Vec::new());
        assert!(director.is_level_complete());
    }

    #[test]
    fn start_requests_are_refused_outside_idle() {
        let mut director = WaveDirector::new(
            Config::new(Duration::from_secs(1), false),
            vec![wave(&[(0, 2)])],
        );
        assert!(director.request_next_wave());

        let mut out = Vec::new();
        director.handle(&[], &mut out);
        assert_eq!(director.phase(), Phase::Spawning { wave: WaveId::new(0) });
        assert!(!director.request_next_wave());
    }
}
