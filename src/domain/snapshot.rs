//! Correlated snapshot and derived metrics types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use super::{
    iso_z, round_to, ConsumerLoadReading, MeterReading, PriceReading, PvReading, WeatherReading,
};

/// Metrics derived from one correlated snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub total_consumption_kw: f64,
    pub total_generation_kw: f64,
    /// Positive = importing from grid, negative = exporting.
    pub net_grid_power_kw: f64,
    /// `min(generation, consumption) / generation`, 0 without generation.
    pub self_consumption_ratio: f64,
    /// `max(0, net) x price`; exports earn no feed-in credit here.
    pub current_cost_eur_per_hour: f64,
}

impl DerivedMetrics {
    pub fn to_wire(&self) -> Value {
        json!({
            "total_consumption_kw": round_to(self.total_consumption_kw, 3),
            "total_generation_kw": round_to(self.total_generation_kw, 3),
            "net_grid_power_kw": round_to(self.net_grid_power_kw, 3),
            "self_consumption_ratio": round_to(self.self_consumption_ratio, 4),
            "current_cost_eur_per_hour": round_to(self.current_cost_eur_per_hour, 4),
        })
    }
}

/// One reading per registered feed at a common aligned timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedSnapshot {
    pub timestamp: DateTime<Utc>,
    pub weather: Option<WeatherReading>,
    pub pv_readings: Vec<PvReading>,
    pub meter_readings: Vec<MeterReading>,
    pub consumer_loads: Vec<ConsumerLoadReading>,
    pub price: Option<PriceReading>,
    pub metrics: DerivedMetrics,
}

impl CorrelatedSnapshot {
    pub fn to_wire(&self) -> Value {
        json!({
            "timestamp": iso_z(self.timestamp),
            "weather": self.weather.as_ref().map(WeatherReading::to_wire),
            "pv_readings": self.pv_readings.iter().map(PvReading::to_wire).collect::<Vec<_>>(),
            "meter_readings": self.meter_readings.iter().map(MeterReading::to_wire).collect::<Vec<_>>(),
            "consumer_loads": self.consumer_loads.iter().map(ConsumerLoadReading::to_wire).collect::<Vec<_>>(),
            "price": self.price.as_ref().map(PriceReading::to_wire),
            "metrics": self.metrics.to_wire(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_wire() {
        let snapshot = CorrelatedSnapshot {
            timestamp: "2024-06-12T00:00:00Z".parse().unwrap(),
            weather: None,
            pv_readings: vec![],
            meter_readings: vec![],
            consumer_loads: vec![],
            price: None,
            metrics: DerivedMetrics {
                total_consumption_kw: 0.0,
                total_generation_kw: 0.0,
                net_grid_power_kw: 0.0,
                self_consumption_ratio: 0.0,
                current_cost_eur_per_hour: 0.0,
            },
        };

        let wire = snapshot.to_wire();
        assert_eq!(wire["timestamp"], "2024-06-12T00:00:00Z");
        assert!(wire["weather"].is_null());
        assert_eq!(wire["pv_readings"].as_array().unwrap().len(), 0);
        assert_eq!(wire["metrics"]["self_consumption_ratio"], 0.0);
    }
}
