//! Deterministic simulation kernel: seeded randomness, virtual time,
//! time-series foundation and the engine facade.

pub mod clock;
pub mod engine;
pub mod rng;
pub mod series;

pub use clock::{ClockSnapshot, ClockState, SimulationClock};
pub use engine::{EngineSnapshot, EngineState, SimulationEngine};
pub use rng::{DeterministicRng, RandomStream};
pub use series::{
    align_timestamp, parse_timestamp, IntervalMinutes, TimeRange, TimeSeriesGenerator,
    TimeSeriesPoint,
};
