#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pursuit system tracking the player's scroll-axis position against the
//! catch-up zone and the caught line.

use glam::Vec2;
use hayrunner_core::{Command, EntityHandle, Event, RunEndReason};

/// Scroll-axis thresholds, in world units, that drive the pursuit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PursuitTuning {
    /// The player is in the catch-up zone at or beyond this line.
    pub catchup_line: f32,
    /// The player is caught once behind this line.
    pub caught_line: f32,
}

impl Default for PursuitTuning {
    fn default() -> Self {
        Self {
            catchup_line: 7.0,
            caught_line: -0.5,
        }
    }
}

/// Pure system that ends the run when the pursuer reaches the player.
#[derive(Debug)]
pub struct Pursuit {
    player: EntityHandle,
    tuning: PursuitTuning,
    running: bool,
    in_catchup_zone: bool,
    caught: bool,
}

impl Pursuit {
    /// Creates a pursuit tracking the provided player entity.
    #[must_use]
    pub const fn new(player: EntityHandle, tuning: PursuitTuning) -> Self {
        Self {
            player,
            tuning,
            running: false,
            in_catchup_zone: false,
            caught: false,
        }
    }

    /// Whether the player currently lingers in the catch-up zone.
    #[must_use]
    pub const fn in_catchup_zone(&self) -> bool {
        self.in_catchup_zone
    }

    /// Consumes world events and the player's position, emitting
    /// [`Command::EndRun`] once the player is caught.
    pub fn handle(&mut self, events: &[Event], player_position: Option<Vec2>, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::RunStarted => self.running = true,
                Event::RunEnded { .. } => {
                    self.running = false;
                    self.in_catchup_zone = false;
                }
                Event::OccupantDespawned { entity, .. } if *entity == self.player => {
                    self.catch(out);
                }
                _ => {}
            }
        }

        if !self.running || self.caught {
            self.in_catchup_zone = false;
            return;
        }

        let Some(position) = player_position else {
            self.in_catchup_zone = false;
            return;
        };
        self.in_catchup_zone = position.y >= self.tuning.catchup_line;
        if position.y < self.tuning.caught_line {
            self.catch(out);
        }
    }

    fn catch(&mut self, out: &mut Vec<Command>) {
        if !self.running || self.caught {
            return;
        }
        self.caught = true;
        self.in_catchup_zone = false;
        out.push(Command::EndRun {
            reason: RunEndReason::Caught,
        });
    }
}
