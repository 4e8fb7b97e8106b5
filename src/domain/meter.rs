//! Energy-meter reading and configuration types (Janitza UMG 96RM profile).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{iso_z, round_to};

/// Per-phase electrical measurements of one meter at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeterReadings {
    pub active_power_l1_w: f64,
    pub active_power_l2_w: f64,
    pub active_power_l3_w: f64,
    pub voltage_l1_v: f64,
    pub voltage_l2_v: f64,
    pub voltage_l3_v: f64,
    pub current_l1_a: f64,
    pub current_l2_a: f64,
    pub current_l3_a: f64,
    /// Power factor in `[0, 1]`.
    pub power_factor: f64,
    pub frequency_hz: f64,
    /// Monotone non-decreasing cumulative energy.
    pub total_energy_kwh: f64,
}

impl MeterReadings {
    /// Total active power across all three phases in watts.
    pub fn total_active_power_w(&self) -> f64 {
        self.active_power_l1_w + self.active_power_l2_w + self.active_power_l3_w
    }
}

/// Complete meter feed payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterReading {
    pub timestamp: DateTime<Utc>,
    pub meter_id: String,
    pub readings: MeterReadings,
}

impl MeterReading {
    pub fn to_wire(&self) -> Value {
        let r = &self.readings;
        json!({
            "timestamp": iso_z(self.timestamp),
            "meter_id": self.meter_id,
            "readings": {
                "active_power_l1_w": round_to(r.active_power_l1_w, 1),
                "active_power_l2_w": round_to(r.active_power_l2_w, 1),
                "active_power_l3_w": round_to(r.active_power_l3_w, 1),
                "voltage_l1_v": round_to(r.voltage_l1_v, 1),
                "voltage_l2_v": round_to(r.voltage_l2_v, 1),
                "voltage_l3_v": round_to(r.voltage_l3_v, 1),
                "current_l1_a": round_to(r.current_l1_a, 2),
                "current_l2_a": round_to(r.current_l2_a, 2),
                "current_l3_a": round_to(r.current_l3_a, 2),
                "power_factor": round_to(r.power_factor, 2),
                "frequency_hz": round_to(r.frequency_hz, 2),
                "total_energy_kwh": round_to(r.total_energy_kwh, 2),
            },
        })
    }
}

/// Meter simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    pub base_power_kw: f64,
    pub peak_power_kw: f64,
    pub nominal_voltage_v: f64,
    pub voltage_variance_pct: f64,
    pub nominal_frequency_hz: f64,
    pub frequency_variance_hz: f64,
    pub power_factor_min: f64,
    pub power_factor_max: f64,
    pub initial_energy_kwh: f64,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            base_power_kw: 10.0,
            peak_power_kw: 25.0,
            nominal_voltage_v: 230.0,
            voltage_variance_pct: 5.0,
            nominal_frequency_hz: 50.0,
            frequency_variance_hz: 0.05,
            power_factor_min: 0.95,
            power_factor_max: 0.99,
            initial_energy_kwh: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MeterReading {
        MeterReading {
            timestamp: "2024-06-12T12:00:00Z".parse().unwrap(),
            meter_id: "meter-001".to_string(),
            readings: MeterReadings {
                active_power_l1_w: 6_133.333_7,
                active_power_l2_w: 6_021.18,
                active_power_l3_w: 6_245.49,
                voltage_l1_v: 229.948,
                voltage_l2_v: 231.202,
                voltage_l3_v: 228.77,
                current_l1_a: 27.481_2,
                current_l2_a: 26.902,
                current_l3_a: 28.113,
                power_factor: 0.971_4,
                frequency_hz: 50.021_7,
                total_energy_kwh: 74_412.507_3,
            },
        }
    }

    #[test]
    fn test_total_active_power() {
        let total = sample().readings.total_active_power_w();
        assert!((total - 18_400.003_7).abs() < 1e-9);
    }

    #[test]
    fn test_wire_payload_rounding() {
        let wire = sample().to_wire();
        assert_eq!(wire["readings"]["active_power_l1_w"], 6133.3);
        assert_eq!(wire["readings"]["voltage_l1_v"], 229.9);
        assert_eq!(wire["readings"]["current_l1_a"], 27.48);
        assert_eq!(wire["readings"]["power_factor"], 0.97);
        assert_eq!(wire["readings"]["frequency_hz"], 50.02);
        assert_eq!(wire["readings"]["total_energy_kwh"], 74412.51);
    }
}
