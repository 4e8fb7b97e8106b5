//! # Consumer-Load Generator
//!
//! Energy-intensive devices (ovens, HVAC, compressors) with calendar-based
//! operating windows and a stochastic duty cycle. State is i.i.d. per
//! interval given the schedule; there is no hysteresis between adjacent
//! timestamps, so every reading is reproducible in isolation.

use chrono::{DateTime, Timelike, Utc};

use crate::core::{DeterministicRng, IntervalMinutes, RandomStream, TimeSeriesGenerator};
use crate::domain::{ConsumerLoadConfig, ConsumerLoadReading, DeviceState};
use crate::simulation::load_curves::is_weekend;

/// Schedule- and duty-cycle-driven device feed.
pub struct ConsumerLoadSimulator {
    entity_id: String,
    rng: DeterministicRng,
    interval: IntervalMinutes,
    config: ConsumerLoadConfig,
}

impl ConsumerLoadSimulator {
    pub fn new(
        entity_id: impl Into<String>,
        rng: DeterministicRng,
        interval: IntervalMinutes,
        config: ConsumerLoadConfig,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            rng,
            interval,
            config,
        }
    }

    pub fn config(&self) -> &ConsumerLoadConfig {
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

    /// Whether the schedule permits operation at this time. Duty-cycle
    /// randomness is not consulted.
    pub fn is_operating(&self, timestamp: DateTime<Utc>) -> bool {
        if is_weekend(timestamp) && !self.config.operate_on_weekends {
            return false;
        }
        let hour = timestamp.hour();
        self.config
            .operating_windows
            .iter()
            .any(|window| window.contains_hour(hour))
    }

    fn device_state(&self, timestamp: DateTime<Utc>, stream: &mut RandomStream) -> DeviceState {
        if !self.is_operating(timestamp) {
            return DeviceState::Off;
        }
        if stream.bernoulli(self.config.duty_cycle_pct / 100.0) {
            DeviceState::On
        } else {
            DeviceState::Off
        }
    }

    fn device_power(&self, state: DeviceState, stream: &mut RandomStream) -> f64 {
        if state == DeviceState::Off {
            return 0.0;
        }
        let variance = self.config.rated_power_kw * (self.config.power_variance_pct / 100.0);
        (self.config.rated_power_kw + stream.uniform(-variance, variance)).max(0.0)
    }
}

impl TimeSeriesGenerator for ConsumerLoadSimulator {
    type Value = ConsumerLoadReading;

    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn interval(&self) -> IntervalMinutes {
        self.interval
    }

    fn generate_value(&self, timestamp: DateTime<Utc>) -> ConsumerLoadReading {
        let ts_ms = timestamp.timestamp_millis();
        let mut stream = self.rng.timestamp_stream(&self.entity_id, ts_ms);

        // Draw order: duty-cycle Bernoulli, then the power variance draw
        // only when the device switched on.
        let device_state = self.device_state(timestamp, &mut stream);
        let device_power_kw = self.device_power(device_state, &mut stream);

        ConsumerLoadReading {
            timestamp,
            device_id: self.entity_id.clone(),
            device_type: self.config.device_type,
            device_state,
            device_power_kw,
        }
    }
}
