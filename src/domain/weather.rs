//! Weather reading and configuration types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{iso_z, round_to};

/// Geographic location of a weather station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub latitude: f64,
    pub longitude: f64,
}

/// Measured environmental conditions at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_ms: f64,
    /// Compass direction in `[0, 360)`, 0 = north.
    pub wind_direction_deg: f64,
    pub cloud_cover_pct: f64,
    /// Global Horizontal Irradiance.
    pub ghi_w_m2: f64,
    /// Direct Normal Irradiance.
    pub dni_w_m2: f64,
    /// Diffuse Horizontal Irradiance.
    pub dhi_w_m2: f64,
}

/// Complete weather feed payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReading {
    pub timestamp: DateTime<Utc>,
    pub location: LocationData,
    pub conditions: WeatherConditions,
}

impl WeatherReading {
    pub fn to_wire(&self) -> Value {
        json!({
            "timestamp": iso_z(self.timestamp),
            "location": {
                "latitude": round_to(self.location.latitude, 4),
                "longitude": round_to(self.location.longitude, 4),
            },
            "conditions": {
                "temperature_c": round_to(self.conditions.temperature_c, 1),
                "humidity_pct": round_to(self.conditions.humidity_pct, 1),
                "wind_speed_ms": round_to(self.conditions.wind_speed_ms, 1),
                "wind_direction_deg": round_to(self.conditions.wind_direction_deg, 0),
                "cloud_cover_pct": round_to(self.conditions.cloud_cover_pct, 1),
                "ghi_w_m2": round_to(self.conditions.ghi_w_m2, 1),
                "dni_w_m2": round_to(self.conditions.dni_w_m2, 1),
                "dhi_w_m2": round_to(self.conditions.dhi_w_m2, 1),
            },
        })
    }
}

/// Weather station configuration. Defaults model Berlin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub latitude: f64,
    pub longitude: f64,

    pub base_temperature_summer_c: f64,
    pub base_temperature_winter_c: f64,
    pub daily_temp_amplitude_c: f64,
    pub temperature_variance_c: f64,

    pub max_clear_sky_ghi_w_m2: f64,

    pub base_cloud_cover_pct: f64,
    pub cloud_variance_pct: f64,

    pub base_wind_speed_ms: f64,
    pub wind_variance_ms: f64,
    pub prevailing_wind_direction_deg: f64,
    pub wind_direction_variance_deg: f64,

    pub base_humidity_pct: f64,
    pub humidity_variance_pct: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            latitude: 52.52,
            longitude: 13.405,
            base_temperature_summer_c: 20.0,
            base_temperature_winter_c: 2.0,
            daily_temp_amplitude_c: 8.0,
            temperature_variance_c: 2.0,
            max_clear_sky_ghi_w_m2: 1000.0,
            base_cloud_cover_pct: 40.0,
            cloud_variance_pct: 20.0,
            base_wind_speed_ms: 4.0,
            wind_variance_ms: 3.0,
            prevailing_wind_direction_deg: 270.0,
            wind_direction_variance_deg: 45.0,
            base_humidity_pct: 65.0,
            humidity_variance_pct: 15.0,
        }
    }
}
