use std::time::Duration;

use creep_defence_core::{
    Command, CreepId, CreepKind, CreepKindId, Event, LevelLayout, NodeId, PathLayout,
    PathNodeLayout, Vec3, WaveId,
};
use creep_defence_system_wave_director::{
    Config, Phase, Wave, WaveDirector, WaveEntry, WaveNotice,
};
use creep_defence_world::{self as world, query, World, WorldConfig};

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

fn tick(millis: u64) -> Vec<Event> {
    vec![Event::TimeAdvanced {
        dt: Duration::from_millis(millis),
    }]
}

fn killed(creep: u32, wave: u32) -> Event {
    Event::CreepKilled {
        creep: CreepId::new(creep),
        kind: CreepKindId::new(0),
        wave: WaveId::new(wave),
        gold: 1,
    }
}

fn leaked(creep: u32, wave: u32) -> Event {
    Event::CreepLeaked {
        creep: CreepId::new(creep),
        kind: CreepKindId::new(0),
        wave: WaveId::new(wave),
        leak_damage: 5,
    }
}

#[test]
fn first_creep_spawns_immediately_then_one_per_wait() {
    let mut director = WaveDirector::new(
        Config::new(Duration::from_secs(1), false),
        vec![wave(&[(0, 3)])],
    );
    let mut out = Vec::new();

    director.handle(&tick(500), &mut out);
    assert!(out.is_empty(), "director waits for a start signal");

    assert!(director.request_next_wave());
    director.handle(&[], &mut out);
    assert_eq!(
        out,
        vec![Command::SpawnCreep {
            kind: CreepKindId::new(0),
            wave: WaveId::new(0),
        }]
    );

    out.clear();
    director.handle(&tick(500), &mut out);
    assert!(out.is_empty());
    director.handle(&tick(500), &mut out);
    assert_eq!(out.len(), 1);

    out.clear();
    director.handle(&tick(2_000), &mut out);
    assert_eq!(out.len(), 1, "the wave only had three creeps");
    assert_eq!(
        director.phase(),
        Phase::WaitingForClear {
            wave: WaveId::new(0),
        }
    );
    assert_eq!(director.progress().spawned_in_wave, 3);
    assert_eq!(
        director.drain_notices().collect::<Vec<_>>(),
        vec![WaveNotice::WaveStarted {
            wave: WaveId::new(0),
        }]
    );
}

#[test]
fn zero_wait_spawns_every_entry_in_order() {
    let mut director = WaveDirector::new(
        Config::new(Duration::ZERO, true),
        vec![wave(&[(1, 2), (0, 0), (2, 1)])],
    );
    let mut out = Vec::new();

    director.handle(&[], &mut out);

    let kinds: Vec<_> = out
        .iter()
        .map(|command| match command {
            Command::SpawnCreep { kind, .. } => kind.get(),
            other => panic!("unexpected command emitted: {other:?}"),
        })
        .collect();
    assert_eq!(kinds, vec![1, 1, 2]);
    assert_eq!(director.progress().living_in_wave, 3);
}

#[test]
fn wave_clears_only_after_every_departure() {
    let mut director = WaveDirector::new(
        Config::new(Duration::ZERO, false),
        vec![wave(&[(0, 3)]), wave(&[(0, 1)])],
    );
    let mut out = Vec::new();
    assert!(director.request_next_wave());
    director.handle(&[], &mut out);
    let _ = director.drain_notices().count();

    director.handle(&[killed(0, 0)], &mut out);
    director.handle(&[leaked(1, 0)], &mut out);
    assert_eq!(director.progress().living_in_wave, 1);
    assert_eq!(director.drain_notices().count(), 0);

    director.handle(&[killed(2, 0)], &mut out);
    assert_eq!(
        director.drain_notices().collect::<Vec<_>>(),
        vec![WaveNotice::WaveCleared {
            wave: WaveId::new(0),
        }]
    );
    assert_eq!(
        director.phase(),
        Phase::Idle {
            next_wave: WaveId::new(1),
        }
    );
    assert_eq!(director.progress().processed_creeps, 3);
}

#[test]
fn leak_decrements_living_counter_once() {
    let mut director = WaveDirector::new(
        Config::new(Duration::ZERO, false),
        vec![wave(&[(0, 2)])],
    );
    let mut out = Vec::new();
    assert!(director.request_next_wave());
    director.handle(&[], &mut out);

    director.handle(&[leaked(0, 0)], &mut out);

    assert_eq!(director.progress().living_in_wave, 1);
}

#[test]
fn director_blocks_between_waves_until_signalled() {
    let mut director = WaveDirector::new(
        Config::new(Duration::ZERO, false),
        vec![wave(&[(0, 1)]), wave(&[(0, 1)])],
    );
    let mut out = Vec::new();
    assert!(director.request_next_wave());
    director.handle(&[], &mut out);
    director.handle(&[killed(0, 0)], &mut out);
    out.clear();

    for _ in 0..10 {
        director.handle(&tick(1_000), &mut out);
    }
    assert!(out.is_empty(), "no spawns without a start signal");

    director.set_auto_advance(true);
    director.handle(&tick(16), &mut out);
    assert_eq!(
        out,
        vec![Command::SpawnCreep {
            kind: CreepKindId::new(0),
            wave: WaveId::new(1),
        }]
    );

    director.handle(&[killed(1, 1)], &mut out);
    assert!(director.is_level_complete());
    let notices: Vec<_> = director.drain_notices().collect();
    assert_eq!(notices.last(), Some(&WaveNotice::LevelComplete));
}

#[test]
fn departures_from_other_waves_are_not_counted() {
    let mut director = WaveDirector::new(
        Config::new(Duration::ZERO, false),
        vec![wave(&[(0, 2)])],
    );
    let mut out = Vec::new();
    assert!(director.request_next_wave());
    director.handle(&[], &mut out);

    director.handle(&[killed(9, 4)], &mut out);

    let progress = director.progress();
    assert_eq!(progress.living_in_wave, 2);
    assert_eq!(progress.processed_creeps, 1);
    assert_eq!(progress.total_creeps, 2);
}

#[test]
fn spawn_commands_are_accepted_by_the_world() {
    let mut world = World::new(
        LevelLayout {
            path: PathLayout {
                root: NodeId::new(0),
                nodes: vec![PathNodeLayout {
                    position: Vec3::ZERO,
                    children: Vec::new(),
                }],
            },
            creep_kinds: vec![CreepKind {
                name: "Grunt".to_owned(),
                max_health: 10,
                leak_damage: 1,
                gold: 1,
                speed: 1.0,
                acceleration: 1.0,
                regeneration: None,
            }],
            tower_kinds: Vec::new(),
        },
        WorldConfig::default(),
    );
    let mut director = WaveDirector::new(
        Config::new(Duration::from_millis(250), true),
        vec![wave(&[(0, 4)])],
    );

    let mut events = Vec::new();
    for _ in 0..12 {
        let mut commands = Vec::new();
        director.handle(&events, &mut commands);
        events.clear();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut events,
        );
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }
    }

    assert_eq!(query::creep_count(&world), 4);
    let waves: Vec<_> = query::creep_view(&world)
        .iter()
        .map(|creep| creep.wave)
        .collect();
    assert_eq!(waves, vec![WaveId::new(0); 4]);
}
