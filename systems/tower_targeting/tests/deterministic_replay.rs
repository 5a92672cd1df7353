use std::time::Duration;

use creep_defence_core::{
    Command, CreepId, CreepKind, CreepKindId, Event, LevelLayout, NodeId, PathLayout,
    PathNodeLayout, TowerAttributes, TowerKind, TowerKindId, Vec3, WaveId,
};
use creep_defence_system_tower_targeting::TowerTargeting;
use creep_defence_world::{self as world, query, World, WorldConfig};

const TICK: Duration = Duration::from_millis(100);

#[test]
fn replay_follows_creeps_through_a_single_tower() {
    let first = replay();
    let second = replay();

    assert_eq!(first, second, "replay diverged between runs");

    let assignments: Vec<_> = first
        .iter()
        .filter_map(|event| match event {
            Event::TargetAssigned { creep, .. } => Some(*creep),
            _ => None,
        })
        .collect();
    assert_eq!(
        assignments.first(),
        Some(&CreepId::new(0)),
        "the leading creep is targeted first"
    );
    assert!(
        assignments.contains(&CreepId::new(1)),
        "the trailing creep is targeted once the leader leaves: {assignments:?}"
    );
    assert_eq!(
        first
            .iter()
            .filter(|event| matches!(event, Event::CreepLeaked { .. }))
            .count(),
        2
    );
}

/// Walks two creeps past one tower and returns every event the world emitted.
fn replay() -> Vec<Event> {
    let mut world = corridor();
    let mut targeting = TowerTargeting::new();
    let mut journal = Vec::new();
    let mut events = Vec::new();

    world::apply(
        &mut world,
        Command::PlaceTower {
            kind: TowerKindId::new(0),
            position: Vec3::new(10.0, 0.0, 1.0),
        },
        &mut events,
    );
    settle(&mut world, &mut targeting, &mut events, &mut journal);

    for step in 0..150 {
        if step == 0 || step == 10 {
            world::apply(
                &mut world,
                Command::SpawnCreep {
                    kind: CreepKindId::new(0),
                    wave: WaveId::new(0),
                },
                &mut events,
            );
        }
        world::apply(&mut world, Command::Tick { dt: TICK }, &mut events);
        settle(&mut world, &mut targeting, &mut events, &mut journal);
        assert_targets_in_range(&world);
    }

    assert_eq!(query::creep_count(&world), 0);
    assert_eq!(
        query::tower_view(&world)
            .iter()
            .map(|tower| tower.current_target)
            .collect::<Vec<_>>(),
        vec![None]
    );
    journal
}

/// Feeds events to targeting and a straight-line router until the world is quiet.
fn settle(
    world: &mut World,
    targeting: &mut TowerTargeting,
    events: &mut Vec<Event>,
    journal: &mut Vec<Event>,
) {
    for _ in 0..32 {
        if events.is_empty() {
            return;
        }
        let mut commands = Vec::new();
        for event in events.iter() {
            if let Event::CreepReachedNode { creep, node } = event {
                commands.push(if *node == NodeId::new(0) {
                    Command::RouteCreep {
                        creep: *creep,
                        next: NodeId::new(1),
                    }
                } else {
                    Command::DespawnCreep { creep: *creep }
                });
            }
        }
        targeting.handle(
            events,
            &query::tower_view(world),
            &query::creep_view(world),
            &mut commands,
        );

        journal.append(events);
        for command in commands {
            world::apply(world, command, events);
        }
    }
    panic!("world did not settle");
}

fn assert_targets_in_range(world: &World) {
    for tower in query::tower_view(world).iter() {
        if let Some(target) = tower.current_target {
            assert!(
                tower.in_range.contains(&target),
                "tower {:?} targets {target:?} outside its range",
                tower.id
            );
        }
    }
}

fn corridor() -> World {
    World::new(
        LevelLayout {
            path: PathLayout {
                root: NodeId::new(0),
                nodes: vec![
                    PathNodeLayout {
                        position: Vec3::ZERO,
                        children: vec![NodeId::new(1)],
                    },
                    PathNodeLayout {
                        position: Vec3::new(20.0, 0.0, 0.0),
                        children: Vec::new(),
                    },
                ],
            },
            creep_kinds: vec![CreepKind {
                name: "Walker".to_owned(),
                max_health: 100,
                leak_damage: 1,
                gold: 1,
                speed: 2.0,
                acceleration: 0.0,
                regeneration: None,
            }],
            tower_kinds: vec![TowerKind {
                base: TowerAttributes {
                    name: "Spotter".to_owned(),
                    range: 3.0,
                    ..TowerAttributes::default()
                },
                upgrade_paths: Vec::new(),
            }],
        },
        WorldConfig::default(),
    )
}
