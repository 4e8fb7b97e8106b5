//! # Feed Simulators
//!
//! The physical-model generators behind every protocol surface. All of
//! them are deterministic functions of `(seed, entity_id, aligned
//! timestamp)`; coupling between feeds (weather driving PV) goes through
//! shared handles resolved per call.

pub mod consumer_load;
pub mod correlation;
pub mod load_curves;
pub mod meter;
pub mod price;
pub mod pv;
pub mod solar;
pub mod weather;

pub use consumer_load::ConsumerLoadSimulator;
pub use correlation::CorrelationEngine;
pub use meter::EnergyMeterSimulator;
pub use price::EnergyPriceSimulator;
pub use pv::PvGenerationSimulator;
pub use weather::WeatherSimulator;
