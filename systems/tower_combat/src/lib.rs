#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits projectile firing commands from fire-rate timers.

use creep_defence_core::{
    Command, Event, TowerCooldownSnapshot, TowerCooldownView, TowerId, TowerView,
};

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireProjectile` entries for towers ready to fire.
    ///
    /// Timers are only inspected when the batch advanced time. A tower is
    /// ready once strictly more than its fire interval has elapsed while it
    /// held a target; towers with a non-positive rate of fire never fire.
    pub fn handle(
        &mut self,
        events: &[Event],
        tower_cooldowns: TowerCooldownView,
        towers: &TowerView,
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        let cooldowns = tower_cooldowns.into_vec();
        if cooldowns.is_empty() {
            return;
        }

        self.scratch.clear();

        for tower in towers.iter() {
            if tower.current_target.is_none() {
                continue;
            }
            if let Some(snapshot) = find_cooldown(&cooldowns, tower.id) {
                if snapshot.is_ready() {
                    self.scratch.push(Command::FireProjectile { tower: tower.id });
                }
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

fn find_cooldown(
    cooldowns: &[TowerCooldownSnapshot],
    tower: TowerId,
) -> Option<&TowerCooldownSnapshot> {
    cooldowns
        .binary_search_by_key(&tower, |snapshot| snapshot.tower)
        .ok()
        .map(|index| &cooldowns[index])
}
