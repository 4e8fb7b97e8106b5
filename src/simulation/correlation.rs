//! # Correlation Engine
//!
//! Composes one reading per registered feed at a single aligned timestamp
//! into a [`CorrelatedSnapshot`] with derived metrics.
//!
//! Dependency order is contractual: weather is computed first, PV systems
//! resolve their weather handle at the same timestamp (the weather
//! generator is pure, so those calls agree), and meters, loads and the
//! price feed are mutually independent.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::{align_timestamp, IntervalMinutes, TimeRange, TimeSeriesGenerator};
use crate::domain::{
    ConsumerLoadReading, CorrelatedSnapshot, DerivedMetrics, MeterReading, PriceReading, PvReading,
};
use crate::simulation::{
    ConsumerLoadSimulator, EnergyMeterSimulator, EnergyPriceSimulator, PvGenerationSimulator,
    WeatherSimulator,
};

/// Synchronises all feeds on a shared time axis.
///
/// Holds shared handles into the engine's registries; it owns no generator
/// state of its own.
pub struct CorrelationEngine {
    weather: Option<Arc<WeatherSimulator>>,
    pv_systems: Vec<Arc<PvGenerationSimulator>>,
    meters: Vec<Arc<EnergyMeterSimulator>>,
    loads: Vec<Arc<ConsumerLoadSimulator>>,
    price: Option<Arc<EnergyPriceSimulator>>,
    interval: IntervalMinutes,
}

impl CorrelationEngine {
    pub fn new(
        weather: Option<Arc<WeatherSimulator>>,
        pv_systems: Vec<Arc<PvGenerationSimulator>>,
        meters: Vec<Arc<EnergyMeterSimulator>>,
        loads: Vec<Arc<ConsumerLoadSimulator>>,
        price: Option<Arc<EnergyPriceSimulator>>,
        interval: IntervalMinutes,
    ) -> Self {
        Self {
            weather,
            pv_systems,
            meters,
            loads,
            price,
            interval,
        }
    }

    pub fn interval(&self) -> IntervalMinutes {
        self.interval
    }

    /// Generate one snapshot; the input timestamp is aligned first and
    /// every contained reading carries the aligned timestamp.
    pub fn generate_snapshot(&self, timestamp: DateTime<Utc>) -> CorrelatedSnapshot {
        let aligned = align_timestamp(timestamp, self.interval);

        // Weather first: PV depends on it.
        let weather = self
            .weather
            .as_ref()
            .map(|sim| sim.generate_value(aligned));

        let pv_readings: Vec<PvReading> = self
            .pv_systems
            .iter()
            .map(|sim| sim.generate_value(aligned))
            .collect();

        let meter_readings: Vec<MeterReading> = self
            .meters
            .iter()
            .map(|sim| sim.generate_value(aligned))
            .collect();

        let consumer_loads: Vec<ConsumerLoadReading> = self
            .loads
            .iter()
            .map(|sim| sim.generate_value(aligned))
            .collect();

        let price = self.price.as_ref().map(|sim| sim.generate_value(aligned));

        let metrics = derive_metrics(&meter_readings, &consumer_loads, &pv_readings, price.as_ref());

        CorrelatedSnapshot {
            timestamp: aligned,
            weather,
            pv_readings,
            meter_readings,
            consumer_loads,
            price,
            metrics,
        }
    }

    /// Lazily walk aligned snapshots from `floor(start)` through
    /// `floor(end)` inclusive; used for backfill generation.
    pub fn iterate_range<'a>(&'a self, range: &TimeRange) -> SnapshotIter<'a> {
        SnapshotIter {
            engine: self,
            current: align_timestamp(range.start(), self.interval),
            end: align_timestamp(range.end(), self.interval),
        }
    }

    /// Eager variant of [`iterate_range`](Self::iterate_range).
    pub fn generate_range(&self, range: &TimeRange) -> Vec<CorrelatedSnapshot> {
        self.iterate_range(range).collect()
    }

    /// Generate `count` consecutive snapshots starting at `floor(start)`.
    pub fn generate_batch(&self, start: DateTime<Utc>, count: usize) -> Vec<CorrelatedSnapshot> {
        let mut current = align_timestamp(start, self.interval);
        let step = self.interval.as_duration();
        let mut snapshots = Vec::with_capacity(count);
        for _ in 0..count {
            snapshots.push(self.generate_snapshot(current));
            current += step;
        }
        snapshots
    }
}

/// Derived metrics over one snapshot's readings.
fn derive_metrics(
    meter_readings: &[MeterReading],
    consumer_loads: &[ConsumerLoadReading],
    pv_readings: &[PvReading],
    price: Option<&PriceReading>,
) -> DerivedMetrics {
    let meter_consumption_kw: f64 = meter_readings
        .iter()
        .map(|m| m.readings.total_active_power_w() / 1000.0)
        .sum();
    let load_consumption_kw: f64 = consumer_loads.iter().map(|l| l.device_power_kw).sum();
    let total_consumption_kw = meter_consumption_kw + load_consumption_kw;

    let total_generation_kw: f64 = pv_readings
        .iter()
        .map(|pv| pv.readings.power_output_kw)
        .sum();

    // Positive: importing from grid. Negative: exporting.
    let net_grid_power_kw = total_consumption_kw - total_generation_kw;

    let self_consumption_ratio = if total_generation_kw > 0.0 {
        (total_generation_kw.min(total_consumption_kw) / total_generation_kw).clamp(0.0, 1.0)
    } else {
        0.0
    };

    // Imports are charged at the spot price; exports earn nothing here.
    let current_cost_eur_per_hour = match price {
        Some(price) => net_grid_power_kw.max(0.0) * price.price_eur_per_kwh,
        None => 0.0,
    };

    DerivedMetrics {
        total_consumption_kw,
        total_generation_kw,
        net_grid_power_kw,
        self_consumption_ratio,
        current_cost_eur_per_hour,
    }
}

/// Lazy snapshot iterator over an aligned range.
pub struct SnapshotIter<'a> {
    engine: &'a CorrelationEngine,
    current: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Iterator for SnapshotIter<'_> {
    type Item = CorrelatedSnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current > self.end {
            return None;
        }
        let snapshot = self.engine.generate_snapshot(self.current);
        self.current += self.engine.interval.as_duration();
        Some(snapshot)
    }
}
