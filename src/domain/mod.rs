//! # Domain Data Model
//!
//! Reading and configuration types for every simulated feed, plus the wire
//! payload conversions. The kernel works at full floating-point precision;
//! rounding happens exclusively here, at the JSON boundary, so determinism
//! tests compare unrounded values.

pub mod consumer_load;
pub mod meter;
pub mod price;
pub mod pv;
pub mod snapshot;
pub mod weather;

pub use consumer_load::{
    ConsumerLoadConfig, ConsumerLoadReading, DeviceState, DeviceType, OperatingWindow,
};
pub use meter::{MeterConfig, MeterReading, MeterReadings};
pub use price::{PriceConfig, PriceReading, TariffType};
pub use pv::{PvConfig, PvReading, PvReadings};
pub use snapshot::{CorrelatedSnapshot, DerivedMetrics};
pub use weather::{LocationData, WeatherConditions, WeatherConfig, WeatherReading};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Round to a fixed number of decimal places for wire payloads.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// ISO-8601 timestamp with a `Z` suffix, the only form that crosses the wire.
pub(crate) fn iso_z(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A reading from any registered generator kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Weather(WeatherReading),
    Pv(PvReading),
    Meter(MeterReading),
    Price(PriceReading),
    Load(ConsumerLoadReading),
}

impl Reading {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Reading::Weather(r) => r.timestamp,
            Reading::Pv(r) => r.timestamp,
            Reading::Meter(r) => r.timestamp,
            Reading::Price(r) => r.timestamp,
            Reading::Load(r) => r.timestamp,
        }
    }

    /// Rounded JSON payload for REST and MQTT.
    pub fn to_wire(&self) -> Value {
        match self {
            Reading::Weather(r) => r.to_wire(),
            Reading::Pv(r) => r.to_wire(),
            Reading::Meter(r) => r.to_wire(),
            Reading::Price(r) => r.to_wire(),
            Reading::Load(r) => r.to_wire(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(229.948_213, 1), 229.9);
        assert_eq!(round_to(0.123_46, 4), 0.1235);
        assert_eq!(round_to(-3.14159, 2), -3.14);
    }

    #[test]
    fn test_iso_z_format() {
        let ts: DateTime<Utc> = "2024-06-12T00:15:00Z".parse().unwrap();
        assert_eq!(iso_z(ts), "2024-06-12T00:15:00Z");
    }
}
