//! Photovoltaic system reading and configuration types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{iso_z, round_to};

/// PV system measurements at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PvReadings {
    /// Output in `[0, nominal capacity]`; exactly 0 at night.
    pub power_output_kw: f64,
    /// Energy generated since UTC midnight, resets on date rollover.
    pub daily_energy_kwh: f64,
    pub irradiance_w_m2: f64,
    pub module_temperature_c: f64,
    /// Reported efficiency relative to the lossless theoretical output.
    pub efficiency_pct: f64,
}

/// Complete PV feed payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PvReading {
    pub timestamp: DateTime<Utc>,
    pub system_id: String,
    pub readings: PvReadings,
}

impl PvReading {
    pub fn to_wire(&self) -> Value {
        let r = &self.readings;
        json!({
            "timestamp": iso_z(self.timestamp),
            "system_id": self.system_id,
            "readings": {
                "power_output_kw": round_to(r.power_output_kw, 2),
                "daily_energy_kwh": round_to(r.daily_energy_kwh, 2),
                "irradiance_w_m2": round_to(r.irradiance_w_m2, 1),
                "module_temperature_c": round_to(r.module_temperature_c, 1),
                "efficiency_pct": round_to(r.efficiency_pct, 1),
            },
        })
    }
}

/// PV system parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvConfig {
    /// Weather station supplying irradiance and ambient temperature.
    pub weather_station_id: String,
    pub nominal_capacity_kwp: f64,
    pub system_losses_pct: f64,
    /// Negative, typically -0.3 to -0.5 %/degC.
    pub temperature_coefficient_pct_per_c: f64,
    pub reference_temperature_c: f64,
    /// Nominal Operating Cell Temperature.
    pub noct_c: f64,
}

impl Default for PvConfig {
    fn default() -> Self {
        Self {
            weather_station_id: "weather-001".to_string(),
            nominal_capacity_kwp: 10.0,
            system_losses_pct: 15.0,
            temperature_coefficient_pct_per_c: -0.4,
            reference_temperature_c: 25.0,
            noct_c: 45.0,
        }
    }
}
