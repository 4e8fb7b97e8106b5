//! # Simulation Clock
//!
//! Virtual time with configurable acceleration. While running, simulation
//! time advances at `acceleration` times real (monotonic) time from an
//! anchor point; pausing freezes the current value, and jumps re-anchor so
//! time continues from the new value.
//!
//! Every subcomponent reads time through [`SimulationClock::now`], so there
//! is a single source of truth and no drift between protocol surfaces.

use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use strum_macros::Display;

use crate::error::{Result, SimulationError};

pub const MIN_ACCELERATION: u32 = 1;
pub const MAX_ACCELERATION: u32 = 1000;

/// Clock lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ClockState {
    Stopped,
    Running,
    Paused,
}

/// Point-in-time view of the clock, for status endpoints and MQTT.
#[derive(Debug, Clone, Serialize)]
pub struct ClockSnapshot {
    pub simulation_time: DateTime<Utc>,
    pub real_time: DateTime<Utc>,
    pub acceleration: u32,
    pub state: ClockState,
    pub elapsed_simulation_seconds: f64,
    pub elapsed_real_seconds: f64,
}

struct ClockInner {
    state: ClockState,
    acceleration: u32,
    /// Simulation time the current run segment is anchored at.
    start_simulation_time: DateTime<Utc>,
    /// Original start, restored by `reset(None)`.
    initial_simulation_time: DateTime<Utc>,
    start_real: Option<Instant>,
    pause_real: Option<Instant>,
    accumulated_pause: std::time::Duration,
    current_simulation_time: DateTime<Utc>,
}

impl ClockInner {
    /// Recompute `current_simulation_time` from the monotonic anchor.
    fn update_simulation_time(&mut self) {
        let Some(start_real) = self.start_real else {
            return;
        };
        let elapsed_real = start_real.elapsed().saturating_sub(self.accumulated_pause);
        let elapsed_sim = elapsed_real.as_secs_f64() * self.acceleration as f64;
        self.current_simulation_time = self.start_simulation_time
            + Duration::microseconds((elapsed_sim * 1e6) as i64);
    }

    /// Re-anchor the running clock at the current simulation time.
    fn reanchor(&mut self) {
        self.start_simulation_time = self.current_simulation_time;
        self.start_real = Some(Instant::now());
        self.accumulated_pause = std::time::Duration::ZERO;
    }
}

/// Thread-safe simulation clock. All operations serialise on one mutex.
pub struct SimulationClock {
    inner: Mutex<ClockInner>,
}

impl SimulationClock {
    /// Create a stopped clock.
    ///
    /// `start_time` defaults to the current UTC wall clock when `None`.
    pub fn new(acceleration: u32, start_time: Option<DateTime<Utc>>) -> Result<Self> {
        if !(MIN_ACCELERATION..=MAX_ACCELERATION).contains(&acceleration) {
            return Err(SimulationError::InvalidAcceleration(acceleration));
        }
        let start = start_time.unwrap_or_else(Utc::now);
        Ok(Self {
            inner: Mutex::new(ClockInner {
                state: ClockState::Stopped,
                acceleration,
                start_simulation_time: start,
                initial_simulation_time: start,
                start_real: None,
                pause_real: None,
                accumulated_pause: std::time::Duration::ZERO,
                current_simulation_time: start,
            }),
        })
    }

    pub fn state(&self) -> ClockState {
        self.inner.lock().state
    }

    pub fn acceleration(&self) -> u32 {
        self.inner.lock().acceleration
    }

    /// Change the acceleration factor, keeping simulation time continuous.
    pub fn set_acceleration(&self, acceleration: u32) -> Result<()> {
        if !(MIN_ACCELERATION..=MAX_ACCELERATION).contains(&acceleration) {
            return Err(SimulationError::InvalidAcceleration(acceleration));
        }
        let mut inner = self.inner.lock();
        if inner.state == ClockState::Running {
            inner.update_simulation_time();
            inner.reanchor();
        }
        inner.acceleration = acceleration;
        Ok(())
    }

    /// Start a stopped clock or resume a paused one.
    pub fn start(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            ClockState::Running => {}
            ClockState::Stopped => {
                inner.start_real = Some(Instant::now());
                inner.accumulated_pause = std::time::Duration::ZERO;
                inner.state = ClockState::Running;
            }
            ClockState::Paused => {
                if let Some(pause_real) = inner.pause_real.take() {
                    inner.accumulated_pause += pause_real.elapsed();
                }
                inner.state = ClockState::Running;
            }
        }
    }

    /// Freeze simulation time. Idempotent from non-running states.
    pub fn pause(&self) {
        let mut inner = self.inner.lock();
        if inner.state != ClockState::Running {
            return;
        }
        inner.update_simulation_time();
        inner.pause_real = Some(Instant::now());
        inner.state = ClockState::Paused;
    }

    /// Freeze the current simulation time and go to `Stopped`, keeping the
    /// original start time available for a later `reset`.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        if inner.state == ClockState::Running {
            inner.update_simulation_time();
        }
        inner.state = ClockState::Stopped;
        inner.start_real = None;
        inner.pause_real = None;
        inner.accumulated_pause = std::time::Duration::ZERO;
        inner.start_simulation_time = inner.current_simulation_time;
    }

    /// Stop the clock, drop anchors and restore the start time.
    ///
    /// `start_time` replaces the original start when given.
    pub fn reset(&self, start_time: Option<DateTime<Utc>>) {
        let mut inner = self.inner.lock();
        inner.state = ClockState::Stopped;
        inner.start_real = None;
        inner.pause_real = None;
        inner.accumulated_pause = std::time::Duration::ZERO;
        if let Some(start) = start_time {
            inner.initial_simulation_time = start;
        }
        inner.start_simulation_time = inner.initial_simulation_time;
        inner.current_simulation_time = inner.initial_simulation_time;
    }

    /// Jump to an absolute simulation time. A running clock continues from
    /// the new value at the configured acceleration.
    pub fn set_time(&self, simulation_time: DateTime<Utc>) {
        let mut inner = self.inner.lock();
        inner.current_simulation_time = simulation_time;
        if inner.state == ClockState::Running {
            inner.reanchor();
        }
    }

    /// Advance simulation time by a number of simulation seconds.
    pub fn advance(&self, seconds: f64) -> DateTime<Utc> {
        let mut inner = self.inner.lock();
        if inner.state == ClockState::Running {
            inner.update_simulation_time();
        }
        inner.current_simulation_time =
            inner.current_simulation_time + Duration::microseconds((seconds * 1e6) as i64);
        if inner.state == ClockState::Running {
            inner.reanchor();
        }
        inner.current_simulation_time
    }

    /// Advance simulation time to an absolute target, which must not lie in
    /// the past.
    pub fn advance_to(&self, target: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let mut inner = self.inner.lock();
        if inner.state == ClockState::Running {
            inner.update_simulation_time();
        }
        if target < inner.current_simulation_time {
            return Err(SimulationError::TimeReversal {
                current: inner.current_simulation_time,
                requested: target,
            });
        }
        inner.current_simulation_time = target;
        if inner.state == ClockState::Running {
            inner.reanchor();
        }
        Ok(inner.current_simulation_time)
    }

    /// Current simulation time. Recomputed from the monotonic anchor while
    /// running, frozen otherwise.
    pub fn now(&self) -> DateTime<Utc> {
        let mut inner = self.inner.lock();
        if inner.state == ClockState::Running {
            inner.update_simulation_time();
        }
        inner.current_simulation_time
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        let mut inner = self.inner.lock();
        if inner.state == ClockState::Running {
            inner.update_simulation_time();
        }

        let elapsed_sim =
            (inner.current_simulation_time - inner.start_simulation_time).num_milliseconds() as f64
                / 1000.0;
        let elapsed_real = match (inner.state, inner.start_real, inner.pause_real) {
            (ClockState::Paused, Some(start), Some(pause)) => pause
                .duration_since(start)
                .saturating_sub(inner.accumulated_pause)
                .as_secs_f64(),
            (ClockState::Running, Some(start), _) => start
                .elapsed()
                .saturating_sub(inner.accumulated_pause)
                .as_secs_f64(),
            _ => 0.0,
        };

        ClockSnapshot {
            simulation_time: inner.current_simulation_time,
            real_time: Utc::now(),
            acceleration: inner.acceleration,
            state: inner.state,
            elapsed_simulation_seconds: elapsed_sim,
            elapsed_real_seconds: elapsed_real,
        }
    }
}
