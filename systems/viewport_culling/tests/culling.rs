use glam::Vec2;
use hayrunner_core::{Command, Event};
use hayrunner_system_viewport_culling::{BufferArea, OrthographicCamera, ViewportCulling};
use hayrunner_world::{self as world, query, World, WorldConfig};

fn camera() -> OrthographicCamera {
    // Shows lanes 0..15 and the first ten rows of the default field.
    OrthographicCamera::new(Vec2::new(7.0, 4.5), Vec2::new(7.5, 5.0))
}

fn cull(world: &mut World, culling: &mut ViewportCulling, events: &[Event]) -> Vec<Event> {
    let samples = query::visibility_samples(world);
    let mut commands = Vec::new();
    culling.handle(events, &samples, &camera(), &mut commands);
    let mut produced = Vec::new();
    for command in commands {
        world::apply(world, command, &mut produced);
    }
    produced
}

fn active_rows(world: &World) -> Vec<u32> {
    let mut rows: Vec<u32> = query::tiles(world)
        .filter(|tile| tile.is_active())
        .map(|tile| tile.coord().row())
        .collect();
    rows.dedup();
    rows
}

#[test]
fn start_of_run_deactivates_tiles_beyond_the_buffer() {
    let mut world = World::new(WorldConfig::default());
    let mut culling = ViewportCulling::new(BufferArea::default());
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartRun, &mut events);

    let changed = cull(&mut world, &mut culling, &events);
    assert!(!changed.is_empty());
    assert!(changed
        .iter()
        .all(|event| matches!(event, Event::TileActivationChanged { active: false, .. })));

    // The padded viewport covers y in [-2.5, 11.5].
    assert_eq!(active_rows(&world), (0..=11).collect::<Vec<_>>());
}

#[test]
fn unchanged_visibility_emits_nothing() {
    let mut world = World::new(WorldConfig::default());
    let mut culling = ViewportCulling::new(BufferArea::default());
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartRun, &mut events);
    let _ = cull(&mut world, &mut culling, &events);

    let again = cull(&mut world, &mut culling, &[Event::GridScrolled { distance: 0.0 }]);
    assert!(again.is_empty());
}

#[test]
fn culling_waits_for_the_grid_to_move() {
    let mut world = World::new(WorldConfig::default());
    let mut culling = ViewportCulling::default();
    let changed = cull(
        &mut world,
        &mut culling,
        &[Event::TimeAdvanced {
            dt: std::time::Duration::from_millis(16),
        }],
    );
    assert!(changed.is_empty());
    assert!(query::tiles(&world).all(|tile| tile.is_active()));
}

#[test]
fn scrolling_reveals_the_leading_rows() {
    let mut world = World::new(WorldConfig::default());
    let mut culling = ViewportCulling::new(BufferArea::default());
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartRun, &mut events);
    let _ = cull(&mut world, &mut culling, &events);

    events.clear();
    world::apply(&mut world, Command::Scroll { distance: 5.0 }, &mut events);
    let changed = cull(&mut world, &mut culling, &events);
    assert!(changed
        .iter()
        .any(|event| matches!(event, Event::TileActivationChanged { active: true, .. })));
    assert!(changed
        .iter()
        .any(|event| matches!(event, Event::TileActivationChanged { active: false, .. })));
    // Rows now sit five units lower, so rows 3 through 16 fall inside the buffer.
    assert_eq!(active_rows(&world), (3..=16).collect::<Vec<_>>());
}
