use std::time::Duration;

use hayrunner_core::{Command, EntityHandle, Event, GridCoord, HopDirection, OccupantKind};
use hayrunner_system_movement::{HopTuning, Movement};
use hayrunner_world::{self as world, query, World, WorldConfig};

const PLAYER: EntityHandle = EntityHandle::new(1);

fn started_world() -> (World, Vec<Event>) {
    let mut world = World::new(WorldConfig::default());
    let mut events = Vec::new();
    let start = query::player_start(&world);
    world::apply(&mut world, Command::StartRun, &mut events);
    world::apply(
        &mut world,
        Command::SpawnOnTile {
            coord: start,
            entity: PLAYER,
            kind: OccupantKind::Player,
        },
        &mut events,
    );
    (world, events)
}

fn pump(world: &mut World, movement: &mut Movement, mut events: Vec<Event>) -> Vec<Event> {
    let mut log = events.clone();
    loop {
        let mut commands = Vec::new();
        movement.handle(&events, &mut commands);
        if commands.is_empty() {
            return log;
        }
        events.clear();
        for command in commands {
            world::apply(world, command, &mut events);
        }
        log.extend(events.iter().cloned());
    }
}

fn tick(world: &mut World, movement: &mut Movement, millis: u64) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(millis),
        },
        &mut events,
    );
    pump(world, movement, events)
}

#[test]
fn requested_hop_moves_player_forward() {
    let (mut world, events) = started_world();
    let mut movement = Movement::new(PLAYER, HopTuning::default());
    let start = query::player_start(&world);

    movement.request(HopDirection::Forward);
    let log = pump(&mut world, &mut movement, events);

    let destination = GridCoord::new(start.row() + 1, start.lane());
    assert!(log.contains(&Event::OccupantHopped {
        entity: PLAYER,
        from: start,
        to: destination,
    }));
    assert_eq!(query::locate(&world, PLAYER), Some(destination));
    assert_eq!(movement.current_hop(), Some((start, destination)));
}

#[test]
fn hops_queue_behind_the_animation() {
    let (mut world, events) = started_world();
    let mut movement = Movement::new(PLAYER, HopTuning::default());
    let start = query::player_start(&world);

    movement.request(HopDirection::Forward);
    let _ = pump(&mut world, &mut movement, events);
    movement.request(HopDirection::Right);

    let log = tick(&mut world, &mut movement, 150);
    assert!(!log
        .iter()
        .any(|event| matches!(event, Event::OccupantHopped { .. })));
    assert_eq!(
        query::locate(&world, PLAYER),
        Some(GridCoord::new(start.row() + 1, start.lane()))
    );

    let log = tick(&mut world, &mut movement, 50);
    assert!(log
        .iter()
        .any(|event| matches!(event, Event::OccupantHopped { .. })));
    assert_eq!(
        query::locate(&world, PLAYER),
        Some(GridCoord::new(start.row() + 1, start.lane() + 1))
    );
}

#[test]
fn hop_off_the_grid_is_rejected_and_movement_recovers() {
    let mut world = World::new(WorldConfig::default());
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartRun, &mut events);
    world::apply(
        &mut world,
        Command::SpawnOnTile {
            coord: GridCoord::new(5, 0),
            entity: PLAYER,
            kind: OccupantKind::Player,
        },
        &mut events,
    );
    let mut movement = Movement::new(PLAYER, HopTuning::default());

    movement.request(HopDirection::Left);
    let log = pump(&mut world, &mut movement, events);
    assert!(log
        .iter()
        .any(|event| matches!(event, Event::HopRejected { .. })));
    assert!(!movement.is_hopping());

    movement.request(HopDirection::Right);
    let log = pump(&mut world, &mut movement, Vec::new());
    assert!(log
        .iter()
        .any(|event| matches!(event, Event::OccupantHopped { .. })));
    assert_eq!(query::locate(&world, PLAYER), Some(GridCoord::new(5, 1)));
}
