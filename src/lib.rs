//! # FACIS Simulation Service
//!
//! Deterministic energy-system simulation: synthetic but physically
//! plausible readings for smart meters, PV arrays, weather, spot prices
//! and industrial loads, served concurrently over REST, MQTT and Modbus
//! TCP with bit-exact reproducibility across runs.

pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod modbus;
pub mod mqtt;
pub mod simulation;
pub mod telemetry;
