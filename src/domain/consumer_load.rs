//! Consumer load (energy-intensive device) reading and configuration types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum_macros::{Display, EnumString};

use super::{iso_z, round_to};

/// Device operating state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum DeviceState {
    On,
    Off,
}

/// Kind of consumer device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceType {
    IndustrialOven,
    Hvac,
    Compressor,
    Pump,
    Generic,
}

/// An operating window `[start_hour, end_hour)`.
///
/// `start_hour > end_hour` wraps midnight, e.g. 22-06 covers late evening
/// and early morning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl OperatingWindow {
    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            (self.start_hour..self.end_hour).contains(&hour)
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Consumer device reading at one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumerLoadReading {
    pub timestamp: DateTime<Utc>,
    pub device_id: String,
    pub device_type: DeviceType,
    pub device_state: DeviceState,
    /// 0 exactly when the device is off.
    pub device_power_kw: f64,
}

impl ConsumerLoadReading {
    pub fn to_wire(&self) -> Value {
        json!({
            "timestamp": iso_z(self.timestamp),
            "device_id": self.device_id,
            "device_type": self.device_type.to_string(),
            "device_state": self.device_state.to_string(),
            "device_power_kw": round_to(self.device_power_kw, 3),
        })
    }
}

/// Consumer device parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerLoadConfig {
    pub device_type: DeviceType,
    pub rated_power_kw: f64,
    /// Relative power variance when on, in percent of rated power.
    pub power_variance_pct: f64,
    /// Probability of being on inside an operating window, in percent.
    pub duty_cycle_pct: f64,
    pub operating_windows: Vec<OperatingWindow>,
    pub operate_on_weekends: bool,
}

impl Default for ConsumerLoadConfig {
    fn default() -> Self {
        Self {
            device_type: DeviceType::IndustrialOven,
            rated_power_kw: 3.0,
            power_variance_pct: 5.0,
            duty_cycle_pct: 70.0,
            operating_windows: vec![
                OperatingWindow { start_hour: 7, end_hour: 9 },
                OperatingWindow { start_hour: 11, end_hour: 13 },
                OperatingWindow { start_hour: 15, end_hour: 17 },
            ],
            operate_on_weekends: false,
        }
    }
}

impl ConsumerLoadConfig {
    /// Total hours per day covered by the operating windows.
    pub fn operating_hours_per_day(&self) -> f64 {
        self.operating_windows
            .iter()
            .map(|w| {
                if w.start_hour <= w.end_hour {
                    (w.end_hour - w.start_hour) as f64
                } else {
                    (24 - w.start_hour + w.end_hour) as f64
                }
            })
            .sum()
    }

    /// Expected daily consumption given schedule and duty cycle.
    pub fn estimated_daily_energy_kwh(&self) -> f64 {
        let effective_hours = self.operating_hours_per_day() * self.duty_cycle_pct / 100.0;
        self.rated_power_kw * effective_hours
    }
}
