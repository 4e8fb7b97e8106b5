//! # Weather Generator
//!
//! Correlated environmental data feed: temperature with diurnal and
//! seasonal cycles, cloud cover, wind, humidity and the irradiance triple
//! that drives PV generation.
//!
//! The order of random draws per timestamp is part of the determinism
//! contract and must not change: cloud cover, temperature, humidity, wind
//! speed, wind direction from the per-timestamp stream, then irradiance
//! micro-variability from a second stream keyed `"{entity_id}:irr"`.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::core::{DeterministicRng, IntervalMinutes, RandomStream, TimeSeriesGenerator};
use crate::domain::{LocationData, WeatherConditions, WeatherConfig, WeatherReading};
use crate::simulation::solar;

/// Seasonal temperature factor in `[-1, 1]`: +1 at the July peak (day 182),
/// -1 in deep winter.
pub fn seasonal_factor(timestamp: DateTime<Utc>) -> f64 {
    let day_of_year = timestamp.ordinal() as f64;
    (2.0 * PI * (day_of_year - 182.0) / 365.0).cos()
}

/// Diurnal temperature factor in `[-1, 1]`: +1 at the 15:00 UTC peak.
pub fn diurnal_factor(timestamp: DateTime<Utc>) -> f64 {
    let hour = timestamp.hour() as f64 + timestamp.minute() as f64 / 60.0;
    (2.0 * PI * (hour - 15.0) / 24.0).cos()
}

fn temperature(timestamp: DateTime<Utc>, config: &WeatherConfig, rng: &mut RandomStream) -> f64 {
    let seasonal = seasonal_factor(timestamp);
    let midpoint = (config.base_temperature_summer_c + config.base_temperature_winter_c) / 2.0;
    let amplitude = (config.base_temperature_summer_c - config.base_temperature_winter_c) / 2.0;
    let seasonal_temp = midpoint + amplitude * seasonal;

    // Daily swing is damped in winter, full in summer.
    let effective_amplitude =
        config.daily_temp_amplitude_c * (0.6 + 0.4 * (seasonal + 1.0) / 2.0);
    let base = seasonal_temp + effective_amplitude * diurnal_factor(timestamp);

    base + rng.normal(0.0, config.temperature_variance_c)
}

/// Relative humidity, inversely correlated with temperature at roughly
/// -1 %/degC above 15 degC, clamped to `[20, 95]`.
fn humidity(temperature_c: f64, config: &WeatherConfig, rng: &mut RandomStream) -> f64 {
    let temp_effect = (temperature_c - 15.0).max(0.0);
    let value = config.base_humidity_pct - temp_effect + rng.normal(0.0, config.humidity_variance_pct);
    value.clamp(20.0, 95.0)
}

fn wind_speed(timestamp: DateTime<Utc>, config: &WeatherConfig, rng: &mut RandomStream) -> f64 {
    let hour = timestamp.hour() as f64 + timestamp.minute() as f64 / 60.0;
    // Thermal convection peaks mid-afternoon, calm around 06:00.
    let angle = 2.0 * PI * (hour - 14.0) / 24.0;
    let factor = (1.0 - 0.4 * angle.cos()).clamp(0.6, 1.4);

    (config.base_wind_speed_ms * factor + rng.normal(0.0, config.wind_variance_ms)).max(0.0)
}

fn wind_direction(config: &WeatherConfig, rng: &mut RandomStream) -> f64 {
    let direction = config.prevailing_wind_direction_deg
        + rng.normal(0.0, config.wind_direction_variance_deg);
    direction.rem_euclid(360.0)
}

fn cloud_cover(timestamp: DateTime<Utc>, config: &WeatherConfig, rng: &mut RandomStream) -> f64 {
    let hour = timestamp.hour() as f64 + timestamp.minute() as f64 / 60.0;
    // Convective build-up peaks around 15:00.
    let angle = 2.0 * PI * (hour - 15.0) / 24.0;
    let diurnal = -0.15 * angle.cos();

    let cover = config.base_cloud_cover_pct * (1.0 + diurnal)
        + rng.normal(0.0, config.cloud_variance_pct);
    cover.clamp(0.0, 100.0)
}

/// Environmental data feed for one weather station.
pub struct WeatherSimulator {
    entity_id: String,
    rng: DeterministicRng,
    interval: IntervalMinutes,
    config: WeatherConfig,
}

impl WeatherSimulator {
    pub fn new(
        entity_id: impl Into<String>,
        rng: DeterministicRng,
        interval: IntervalMinutes,
        config: WeatherConfig,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            rng,
            interval,
            config,
        }
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    /// Clone with a different interval, for history queries.
    pub fn with_interval(&self, interval: IntervalMinutes) -> Self {
        Self::new(
            self.entity_id.clone(),
            self.rng,
            interval,
            self.config.clone(),
        )
    }

    /// GHI only, for PV coupling.
    pub fn ghi_for_pv(&self, timestamp: DateTime<Utc>) -> f64 {
        self.generate_value(timestamp).conditions.ghi_w_m2
    }

    /// Ambient temperature only, for PV module-temperature modelling.
    pub fn temperature_for_pv(&self, timestamp: DateTime<Utc>) -> f64 {
        self.generate_value(timestamp).conditions.temperature_c
    }
}

impl TimeSeriesGenerator for WeatherSimulator {
    type Value = WeatherReading;

    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn interval(&self) -> IntervalMinutes {
        self.interval
    }

    fn generate_value(&self, timestamp: DateTime<Utc>) -> WeatherReading {
        let ts_ms = timestamp.timestamp_millis();
        let mut stream = self.rng.timestamp_stream(&self.entity_id, ts_ms);

        // Draw order is contractual; see module docs.
        let cloud = cloud_cover(timestamp, &self.config, &mut stream);
        let temperature_c = temperature(timestamp, &self.config, &mut stream);
        let humidity_pct = humidity(temperature_c, &self.config, &mut stream);
        let wind_speed_ms = wind_speed(timestamp, &self.config, &mut stream);
        let wind_direction_deg = wind_direction(&self.config, &mut stream);

        // Separate sub-stream so irradiance noise stays uncorrelated with
        // the draws above.
        let mut irr_stream = self
            .rng
            .timestamp_stream(&format!("{}:irr", self.entity_id), ts_ms);
        let irradiance = solar::full_irradiance(
            timestamp,
            self.config.latitude,
            self.config.longitude,
            cloud,
            self.config.max_clear_sky_ghi_w_m2,
            Some(&mut irr_stream),
        );

        WeatherReading {
            timestamp,
            location: LocationData {
                latitude: self.config.latitude,
                longitude: self.config.longitude,
            },
            conditions: WeatherConditions {
                temperature_c,
                humidity_pct,
                wind_speed_ms,
                wind_direction_deg,
                cloud_cover_pct: cloud,
                ghi_w_m2: irradiance.ghi_w_m2,
                dni_w_m2: irradiance.dni_w_m2,
                dhi_w_m2: irradiance.dhi_w_m2,
            },
        }
    }
}
