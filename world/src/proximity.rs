//! Built-in range membership tracking for hosts without a spatial engine.

use creep_defence_core::{CreepId, Event};

use crate::{creeps::CreepRegistry, towers::TowerState};

/// Diffs a tower's range list against the creeps inside its range volume.
///
/// Exits are reported before enters; enters follow creep identifier order.
pub(crate) fn track(tower: &mut TowerState, creeps: &CreepRegistry, out_events: &mut Vec<Event>) {
    let inside = creeps.within(tower.position, tower.attributes.range);

    let departed: Vec<CreepId> = tower
        .in_range
        .iter()
        .copied()
        .filter(|creep| !inside.contains(creep))
        .collect();
    for creep in departed {
        exit(tower, creep, out_events);
    }

    for creep in inside {
        enter(tower, creep, out_events);
    }
}

/// Adds a creep to the tower's range list and announces it.
pub(crate) fn enter(tower: &mut TowerState, creep: CreepId, out_events: &mut Vec<Event>) {
    if tower.enter(creep) {
        out_events.push(Event::CreepEnteredRange {
            tower: tower.id,
            creep,
        });
    }
}

/// Removes a creep from the tower's range list, clearing the target.
pub(crate) fn exit(tower: &mut TowerState, creep: CreepId, out_events: &mut Vec<Event>) {
    let Some(previous) = tower.exit(creep) else {
        return;
    };
    out_events.push(Event::CreepExitedRange {
        tower: tower.id,
        creep,
    });
    if previous.is_some() {
        out_events.push(Event::TargetCleared { tower: tower.id });
    }
}
