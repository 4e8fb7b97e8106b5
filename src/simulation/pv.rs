//! # PV Generation
//!
//! Photovoltaic output correlated with the weather feed:
//!
//! ```text
//! P = min(P_nom, P_nom x (G / 1000) x (1 + gamma x (T_mod - T_ref)) x (1 - losses))
//! ```
//!
//! The daily energy counter is a pure function of the timestamp: it is the
//! integral of generated power from UTC midnight through the aligned
//! timestamp, recomputed per call. That keeps the generator stateless, so
//! concurrent and out-of-order queries agree with a sequential replay, and
//! the counter resets at midnight by construction.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::core::{IntervalMinutes, TimeSeriesGenerator};
use crate::domain::{PvConfig, PvReading, PvReadings};
use crate::simulation::weather::WeatherSimulator;

/// Standard Test Conditions irradiance.
const STC_IRRADIANCE_W_M2: f64 = 1000.0;

/// Photovoltaic generation feed for one PV system.
///
/// Holds a shared handle to its weather station; the weather generator has
/// no back-reference, so adding or removing PV systems never touches it.
pub struct PvGenerationSimulator {
    entity_id: String,
    interval: IntervalMinutes,
    config: PvConfig,
    weather: Arc<WeatherSimulator>,
}

impl PvGenerationSimulator {
    pub fn new(
        entity_id: impl Into<String>,
        weather: Arc<WeatherSimulator>,
        interval: IntervalMinutes,
        config: PvConfig,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            interval,
            config,
            weather,
        }
    }

    pub fn config(&self) -> &PvConfig {
        &self.config
    }

    pub fn nominal_capacity_kwp(&self) -> f64 {
        self.config.nominal_capacity_kwp
    }

    /// Clone with a different interval, for history queries. The interval
    /// also changes the daily-energy integration step.
    pub fn with_interval(&self, interval: IntervalMinutes) -> Self {
        Self {
            entity_id: self.entity_id.clone(),
            interval,
            config: self.config.clone(),
            weather: Arc::new(self.weather.with_interval(interval)),
        }
    }

    /// Module temperature from the simplified NOCT model:
    /// `T_mod = T_amb + (NOCT - 20) x G / 800`.
    pub fn module_temperature(&self, ambient_temp_c: f64, irradiance_w_m2: f64) -> f64 {
        if irradiance_w_m2 <= 0.0 {
            return ambient_temp_c;
        }
        ambient_temp_c + (self.config.noct_c - 20.0) * (irradiance_w_m2 / 800.0)
    }

    /// Temperature derating factor, clamped to `[0, 1.2]`; cold modules may
    /// exceed nameplate slightly.
    pub fn temperature_derating(&self, module_temp_c: f64) -> f64 {
        let temp_diff = module_temp_c - self.config.reference_temperature_c;
        let derating = 1.0 + (self.config.temperature_coefficient_pct_per_c / 100.0) * temp_diff;
        derating.clamp(0.0, 1.2)
    }

    /// Power output in kW, exactly 0 without irradiance and capped at the
    /// nominal capacity.
    pub fn power_output(&self, irradiance_w_m2: f64, module_temp_c: f64) -> f64 {
        if irradiance_w_m2 <= 0.0 {
            return 0.0;
        }

        let irradiance_factor = irradiance_w_m2 / STC_IRRADIANCE_W_M2;
        let temp_factor = self.temperature_derating(module_temp_c);
        let loss_factor = 1.0 - self.config.system_losses_pct / 100.0;

        let power_kw =
            self.config.nominal_capacity_kwp * irradiance_factor * temp_factor * loss_factor;
        power_kw.min(self.config.nominal_capacity_kwp)
    }

    /// Reported efficiency: output relative to the lossless theoretical
    /// output at the current irradiance, as a percentage in `[0, 100]`.
    pub fn efficiency(&self, power_output_kw: f64, irradiance_w_m2: f64) -> f64 {
        if irradiance_w_m2 <= 0.0 || power_output_kw <= 0.0 {
            return 0.0;
        }
        let theoretical_max =
            self.config.nominal_capacity_kwp * (irradiance_w_m2 / STC_IRRADIANCE_W_M2);
        if theoretical_max <= 0.0 {
            return 0.0;
        }
        (power_output_kw / theoretical_max * 100.0).min(100.0)
    }

    /// Power at one aligned timestamp, driven by the weather feed.
    fn power_at(&self, timestamp: DateTime<Utc>) -> f64 {
        let conditions = self.weather.generate_value(timestamp).conditions;
        let module_temp = self.module_temperature(conditions.temperature_c, conditions.ghi_w_m2);
        self.power_output(conditions.ghi_w_m2, module_temp)
    }

    /// Cumulative energy since UTC midnight, through `timestamp` inclusive.
    fn daily_energy_kwh(&self, timestamp: DateTime<Utc>) -> f64 {
        let date = timestamp.date_naive();
        let midnight = Utc
            .from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight exists"));
        let step = self.interval.as_duration();
        let interval_hours = self.interval.minutes() as f64 / 60.0;

        let mut energy = 0.0;
        let mut current = midnight;
        while current <= timestamp {
            energy += self.power_at(current) * interval_hours;
            current += step;
        }
        energy
    }

    /// One full UTC day of readings at the configured interval.
    pub fn generate_daily_profile(&self, date: DateTime<Utc>) -> Vec<PvReading> {
        let midnight = Utc.from_utc_datetime(
            &date
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .expect("midnight exists"),
        );
        let points_per_day = (24 * 60 / self.interval.minutes()) as usize;
        self.generate_batch(midnight, points_per_day)
            .into_iter()
            .map(|point| point.value)
            .collect()
    }
}

impl TimeSeriesGenerator for PvGenerationSimulator {
    type Value = PvReading;

    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn interval(&self) -> IntervalMinutes {
        self.interval
    }

    fn generate_value(&self, timestamp: DateTime<Utc>) -> PvReading {
        // Weather at the exact same aligned timestamp; the weather
        // generator is pure, so this resolves to the same reading every
        // protocol surface sees.
        let conditions = self.weather.generate_value(timestamp).conditions;

        let irradiance_w_m2 = conditions.ghi_w_m2;
        let module_temperature_c =
            self.module_temperature(conditions.temperature_c, irradiance_w_m2);
        let power_output_kw = self.power_output(irradiance_w_m2, module_temperature_c);

        PvReading {
            timestamp,
            system_id: self.entity_id.clone(),
            readings: PvReadings {
                power_output_kw,
                daily_energy_kwh: self.daily_energy_kwh(timestamp),
                irradiance_w_m2,
                module_temperature_c,
                efficiency_pct: self.efficiency(power_output_kw, irradiance_w_m2),
            },
        }
    }
}
