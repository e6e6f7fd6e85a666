#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scroll speed controller with a monotonic base ramp and a smoothed
//! catch-up override.
//!
//! `base_speed` climbs toward its cap regardless of catch-up. `current_speed`,
//! which actually drives scrolling, is smooth-damped toward either the
//! catch-up cap or the base speed depending on whether the player lingers in
//! the catch-up zone.

use hayrunner_core::{Command, Event};

/// Smallest smoothing time accepted by [`smooth_damp`].
const MIN_SMOOTH_TIME: f32 = 1e-4;

/// Tuning constants for the speed controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedTuning {
    /// Base speed at the start of a run, in world units per second.
    pub initial_speed: f32,
    /// Base speed gained per second.
    pub speed_increment: f32,
    /// Ceiling of the base ramp.
    pub max_base_speed: f32,
    /// Speed targeted while catching up; also the absolute ceiling.
    pub catchup_speed_cap: f32,
    /// Smoothing time used while accelerating toward the catch-up cap.
    pub catchup_smooth_time: f32,
    /// Smoothing time used while settling back to the base speed.
    pub release_smooth_time: f32,
    /// Distance from the base speed at which catch-up is considered over.
    pub tolerance: f32,
}

impl Default for SpeedTuning {
    fn default() -> Self {
        Self {
            initial_speed: 1.0,
            speed_increment: 0.05,
            max_base_speed: 4.0,
            catchup_speed_cap: 6.0,
            catchup_smooth_time: 0.6,
            release_smooth_time: 1.2,
            tolerance: 0.1,
        }
    }
}

/// Snapshot of the controller state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedState {
    /// Difficulty-driven speed, ramping toward `max_base_speed`.
    pub base_speed: f32,
    /// Speed that drives scrolling, always within `[0, catchup_speed_cap]`.
    pub current_speed: f32,
    /// Whether the controller is overriding the base speed.
    pub is_catching_up: bool,
    /// Rate of change carried between smoothing steps.
    pub velocity: f32,
}

/// Pure system translating elapsed time into scroll commands.
#[derive(Debug)]
pub struct ScrollSpeed {
    tuning: SpeedTuning,
    state: SpeedState,
    running: bool,
}

impl ScrollSpeed {
    /// Creates a controller at the initial speed of the provided tuning.
    #[must_use]
    pub fn new(tuning: SpeedTuning) -> Self {
        let cap = tuning.catchup_speed_cap.max(0.0);
        let initial = tuning.initial_speed.clamp(0.0, cap);
        Self {
            tuning,
            state: SpeedState {
                base_speed: initial,
                current_speed: initial,
                is_catching_up: false,
                velocity: 0.0,
            },
            running: false,
        }
    }

    /// Current controller state.
    #[must_use]
    pub const fn state(&self) -> SpeedState {
        self.state
    }

    /// Advances the controller by `dt` seconds and returns the current speed.
    pub fn tick(&mut self, dt: f32, player_in_catchup_zone: bool) -> f32 {
        let tuning = self.tuning;
        let cap = tuning.catchup_speed_cap.max(0.0);
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let state = &mut self.state;

        state.base_speed =
            (state.base_speed + tuning.speed_increment * dt).min(tuning.max_base_speed.min(cap));

        let (target, smooth_time) = if player_in_catchup_zone {
            state.is_catching_up = true;
            (cap, tuning.catchup_smooth_time)
        } else {
            (state.base_speed, tuning.release_smooth_time)
        };

        state.current_speed = smooth_damp(
            state.current_speed,
            target,
            &mut state.velocity,
            smooth_time,
            dt,
        );

        if !player_in_catchup_zone
            && (state.current_speed - state.base_speed).abs() < tuning.tolerance
        {
            state.current_speed = state.base_speed;
            state.velocity = 0.0;
            state.is_catching_up = false;
        }

        state.current_speed = state.current_speed.clamp(0.0, cap);
        state.current_speed
    }

    /// Consumes world events and emits one scroll command per elapsed tick
    /// while the run is active.
    pub fn handle(&mut self, events: &[Event], player_in_catchup_zone: bool, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::RunStarted => self.running = true,
                Event::RunEnded { .. } => self.running = false,
                Event::TimeAdvanced { dt } if self.running => {
                    let seconds = dt.as_secs_f32();
                    let speed = self.tick(seconds, player_in_catchup_zone);
                    let distance = speed * seconds;
                    if distance > 0.0 {
                        out.push(Command::Scroll { distance });
                    }
                }
                _ => {}
            }
        }
    }
}

/// Critically damped spring step that never overshoots `target`.
fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return current;
    }
    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smooth_damp_approaches_without_overshoot() {
        let mut velocity = 0.0;
        let mut value = 0.0;
        for _ in 0..600 {
            value = smooth_damp(value, 5.0, &mut velocity, 0.5, 1.0 / 60.0);
            assert!(value <= 5.0);
        }
        assert!((value - 5.0).abs() < 1e-3);
    }

    #[test]
    fn smooth_damp_ignores_zero_dt() {
        let mut velocity = 2.0;
        assert_eq!(smooth_damp(1.0, 4.0, &mut velocity, 0.3, 0.0), 1.0);
        assert_eq!(velocity, 2.0);
    }

    #[test]
    fn base_ramp_stops_at_cap() {
        let mut speed = ScrollSpeed::new(SpeedTuning {
            speed_increment: 1.0,
            max_base_speed: 2.5,
            ..SpeedTuning::default()
        });
        for _ in 0..10 {
            let _ = speed.tick(1.0, false);
        }
        assert_eq!(speed.state().base_speed, 2.5);
        assert_eq!(speed.state().current_speed, 2.5);
    }

    #[test]
    fn speed_is_clamped_to_catchup_cap() {
        let mut speed = ScrollSpeed::new(SpeedTuning {
            initial_speed: 50.0,
            ..SpeedTuning::default()
        });
        assert_eq!(speed.state().current_speed, 6.0);
        assert!(speed.tick(0.016, true) <= 6.0);
    }
}
