use std::time::Duration;

use hayrunner_core::{
    Command, EntityHandle, Event, HopDirection, OccupantKind, PlayState, RunEndReason, SpawnError,
};
use hayrunner_system_movement::Movement;
use hayrunner_system_pursuit::Pursuit;
use hayrunner_system_scroll_speed::ScrollSpeed;
use hayrunner_system_viewport_culling::{OrthographicCamera, ViewportCulling};
use hayrunner_world::{self as world, query, World};

use crate::config::{DifficultyTier, GameConfig};

/// Handle of the only player entity.
pub(crate) const PLAYER: EntityHandle = EntityHandle::new(1);

/// Upper bound on command/event rounds resolved within a single tick.
const MAX_PUMP_ROUNDS: usize = 32;

/// Counters accumulated over a session.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SessionStats {
    pub(crate) ticks: u64,
    pub(crate) regenerations: u64,
    pub(crate) pickups: u64,
    pub(crate) hops: u64,
    pub(crate) rejected_hops: u64,
    pub(crate) outcome: Option<RunEndReason>,
    pub(crate) final_speed: f32,
}

/// Wires the world to every system and drives them tick by tick.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    speed: ScrollSpeed,
    movement: Movement,
    pursuit: Pursuit,
    culling: ViewportCulling,
    camera: OrthographicCamera,
    tiers: Vec<DifficultyTier>,
    next_tier: usize,
    stats: SessionStats,
}

impl Session {
    pub(crate) fn new(config: &GameConfig) -> Self {
        Self {
            world: World::new(config.world.clone()),
            speed: ScrollSpeed::new(config.speed),
            movement: Movement::new(PLAYER, config.hop),
            pursuit: Pursuit::new(PLAYER, config.pursuit),
            culling: ViewportCulling::new(config.buffer),
            camera: config.camera(),
            tiers: config.tiers.clone(),
            next_tier: 0,
            stats: SessionStats::default(),
        }
    }

    /// Places the player on its start tile and starts the run.
    pub(crate) fn start(&mut self) -> Result<Vec<Event>, SpawnError> {
        let mut events = Vec::new();
        let start = query::player_start(&self.world);
        world::apply(
            &mut self.world,
            Command::SpawnOnTile {
                coord: start,
                entity: PLAYER,
                kind: OccupantKind::Player,
            },
            &mut events,
        );
        if let Some(reason) = events.iter().find_map(|event| match event {
            Event::SpawnRejected { reason, .. } => Some(*reason),
            _ => None,
        }) {
            return Err(reason);
        }
        world::apply(&mut self.world, Command::StartRun, &mut events);
        Ok(self.pump(events))
    }

    /// Buffers a hop for the next tick.
    pub(crate) fn request_hop(&mut self, direction: HopDirection) {
        self.movement.request(direction);
    }

    /// Advances the simulation by `dt` and returns every event it produced.
    pub(crate) fn tick(&mut self, dt: Duration) -> Vec<Event> {
        self.stats.ticks += 1;
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);
        self.pump(events)
    }

    /// Abandons the run if it is still going.
    pub(crate) fn finish(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::EndRun {
                reason: RunEndReason::Abandoned,
            },
            &mut events,
        );
        self.pump(events)
    }

    pub(crate) fn is_over(&self) -> bool {
        query::play_state(&self.world) == PlayState::Ended
    }

    pub(crate) fn stats(&self) -> SessionStats {
        SessionStats {
            final_speed: self.speed.state().current_speed,
            ..self.stats.clone()
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    fn pump(&mut self, mut events: Vec<Event>) -> Vec<Event> {
        let mut log = Vec::new();
        for _ in 0..MAX_PUMP_ROUNDS {
            if events.is_empty() {
                break;
            }
            self.record(&events);

            let mut commands = Vec::new();
            let in_catchup_zone = self.pursuit.in_catchup_zone();
            self.speed.handle(&events, in_catchup_zone, &mut commands);
            self.movement.handle(&events, &mut commands);
            self.pursuit.handle(
                &events,
                query::occupant_position(&self.world, PLAYER),
                &mut commands,
            );
            let samples = query::visibility_samples(&self.world);
            self.culling
                .handle(&events, &samples, &self.camera, &mut commands);
            self.schedule_tiers(&events, &mut commands);

            log.append(&mut events);
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
        log.append(&mut events);
        log
    }

    fn schedule_tiers(&mut self, events: &[Event], out: &mut Vec<Command>) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::SlabRegenerated { .. }))
        {
            return;
        }
        let regenerations = query::regeneration_count(&self.world);
        while let Some(tier) = self.tiers.get(self.next_tier) {
            if tier.after_slabs > regenerations {
                break;
            }
            out.push(Command::ChangeDifficulty {
                profile: tier.profile.clone(),
            });
            self.next_tier += 1;
        }
    }

    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::SlabRegenerated { .. } => self.stats.regenerations += 1,
                Event::OccupantHopped { entity, .. } if *entity == PLAYER => self.stats.hops += 1,
                Event::HopRejected { entity, .. } if *entity == PLAYER => {
                    self.stats.rejected_hops += 1;
                }
                Event::PickupCollected { entity, .. } if *entity == PLAYER => {
                    self.stats.pickups += 1;
                }
                Event::RunEnded { reason } => self.stats.outcome = Some(*reason),
                _ => {}
            }
        }
    }
}
