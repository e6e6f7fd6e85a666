#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid-locked hop movement for the player.
//!
//! A hop is requested with [`Movement::request`], confirmed by the world with
//! [`Event::OccupantHopped`] and then animated for [`HopTuning::hop_duration`].
//! Requests made mid-hop are buffered, and the latest one wins.

use std::time::Duration;

use hayrunner_core::{Command, EntityHandle, Event, GridCoord, HopDirection};

const DEFAULT_HOP_DURATION: Duration = Duration::from_millis(200);

/// Timing of a single hop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HopTuning {
    /// Time a hop takes from lift-off to landing.
    pub hop_duration: Duration,
}

impl Default for HopTuning {
    fn default() -> Self {
        Self {
            hop_duration: DEFAULT_HOP_DURATION,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HopPhase {
    Idle,
    Hopping {
        from: GridCoord,
        to: GridCoord,
        elapsed: Duration,
    },
}

/// Pure system that turns buffered hop requests into world commands.
#[derive(Debug)]
pub struct Movement {
    player: EntityHandle,
    tuning: HopTuning,
    phase: HopPhase,
    buffered: Option<HopDirection>,
    awaiting_reply: bool,
    running: bool,
    spawned: bool,
}

impl Movement {
    /// Creates a movement system driving the provided player entity.
    #[must_use]
    pub const fn new(player: EntityHandle, tuning: HopTuning) -> Self {
        Self {
            player,
            tuning,
            phase: HopPhase::Idle,
            buffered: None,
            awaiting_reply: false,
            running: false,
            spawned: false,
        }
    }

    /// Buffers a hop in the provided direction, replacing any earlier request.
    pub fn request(&mut self, direction: HopDirection) {
        self.buffered = Some(direction);
    }

    /// Whether a confirmed hop is still being animated.
    #[must_use]
    pub const fn is_hopping(&self) -> bool {
        matches!(self.phase, HopPhase::Hopping { .. })
    }

    /// Fraction of the current hop completed, `1.0` when idle.
    #[must_use]
    pub fn progress(&self) -> f32 {
        match self.phase {
            HopPhase::Idle => 1.0,
            HopPhase::Hopping { elapsed, .. } => {
                if self.tuning.hop_duration.is_zero() {
                    return 1.0;
                }
                (elapsed.as_secs_f32() / self.tuning.hop_duration.as_secs_f32()).min(1.0)
            }
        }
    }

    /// Origin and destination of the current hop, as master coordinates at lift-off.
    #[must_use]
    pub const fn current_hop(&self) -> Option<(GridCoord, GridCoord)> {
        match self.phase {
            HopPhase::Idle => None,
            HopPhase::Hopping { from, to, .. } => Some((from, to)),
        }
    }

    /// Consumes world events and emits a hop command when the player is free to move.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::RunStarted => self.running = true,
                Event::RunEnded { .. } => {
                    self.running = false;
                    self.reset();
                }
                Event::OccupantSpawned { entity, .. } if *entity == self.player => {
                    self.spawned = true;
                }
                Event::OccupantDespawned { entity, .. } if *entity == self.player => {
                    self.spawned = false;
                    self.reset();
                }
                Event::OccupantHopped { entity, from, to } if *entity == self.player => {
                    self.awaiting_reply = false;
                    self.phase = HopPhase::Hopping {
                        from: *from,
                        to: *to,
                        elapsed: Duration::ZERO,
                    };
                }
                Event::HopRejected { entity, .. } if *entity == self.player => {
                    self.awaiting_reply = false;
                }
                Event::TimeAdvanced { dt } => self.advance(*dt),
                _ => {}
            }
        }

        if !self.running || !self.spawned || self.awaiting_reply || self.is_hopping() {
            return;
        }
        if let Some(direction) = self.buffered.take() {
            self.awaiting_reply = true;
            out.push(Command::HopOccupant {
                entity: self.player,
                direction,
            });
        }
    }

    fn advance(&mut self, dt: Duration) {
        if let HopPhase::Hopping { elapsed, .. } = &mut self.phase {
            *elapsed = elapsed.saturating_add(dt);
            if *elapsed >= self.tuning.hop_duration {
                self.phase = HopPhase::Idle;
            }
        }
    }

    fn reset(&mut self) {
        self.phase = HopPhase::Idle;
        self.buffered = None;
        self.awaiting_reply = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: EntityHandle = EntityHandle::new(1);

    fn ready_movement() -> Movement {
        let mut movement = Movement::new(PLAYER, HopTuning::default());
        let mut out = Vec::new();
        movement.handle(
            &[
                Event::RunStarted,
                Event::OccupantSpawned {
                    entity: PLAYER,
                    kind: hayrunner_core::OccupantKind::Player,
                    coord: GridCoord::new(5, 7),
                },
            ],
            &mut out,
        );
        assert!(out.is_empty());
        movement
    }

    fn hopped() -> Event {
        Event::OccupantHopped {
            entity: PLAYER,
            from: GridCoord::new(5, 7),
            to: GridCoord::new(6, 7),
        }
    }

    #[test]
    fn hop_completes_after_duration() {
        let mut movement = ready_movement();
        let mut out = Vec::new();
        movement.handle(&[hopped()], &mut out);
        assert!(movement.is_hopping());

        movement.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(100),
            }],
            &mut out,
        );
        assert!((movement.progress() - 0.5).abs() < 1e-6);

        movement.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(100),
            }],
            &mut out,
        );
        assert!(!movement.is_hopping());
        assert_eq!(movement.progress(), 1.0);
    }

    #[test]
    fn latest_buffered_request_wins() {
        let mut movement = ready_movement();
        let mut out = Vec::new();
        movement.handle(&[hopped()], &mut out);
        movement.request(HopDirection::Left);
        movement.request(HopDirection::Right);
        movement.handle(&[], &mut out);
        assert!(out.is_empty());

        movement.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(250),
            }],
            &mut out,
        );
        assert_eq!(
            out,
            vec![Command::HopOccupant {
                entity: PLAYER,
                direction: HopDirection::Right,
            }]
        );
    }

    #[test]
    fn rejection_returns_to_idle() {
        let mut movement = ready_movement();
        let mut out = Vec::new();
        movement.request(HopDirection::Backward);
        movement.handle(&[], &mut out);
        assert_eq!(out.len(), 1);

        movement.request(HopDirection::Forward);
        movement.handle(&[], &mut out);
        assert_eq!(out.len(), 1, "waits for the world to answer");

        movement.handle(
            &[Event::HopRejected {
                entity: PLAYER,
                direction: HopDirection::Backward,
                reason: hayrunner_core::HopError::Impassable,
            }],
            &mut out,
        );
        assert!(!movement.is_hopping());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn ended_run_discards_requests() {
        let mut movement = ready_movement();
        let mut out = Vec::new();
        movement.request(HopDirection::Forward);
        movement.handle(
            &[Event::RunEnded {
                reason: hayrunner_core::RunEndReason::Caught,
            }],
            &mut out,
        );
        assert!(out.is_empty());
        assert_eq!(movement.current_hop(), None);
    }
}
