//! # Engine Facade
//!
//! Mediates between the protocol surfaces and the generators. Owns the
//! deterministic RNG, the simulation clock and one typed registry per
//! generator kind; dispatch is static, there is no name-to-factory table.
//!
//! The engine is a plain value constructed from the validated
//! configuration and passed through handler state; tests build independent
//! engines per case.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::Display;
use tracing::info;

use crate::config::Config;
use crate::core::clock::{ClockState, SimulationClock};
use crate::core::rng::DeterministicRng;
use crate::core::series::{IntervalMinutes, TimeRange, TimeSeriesGenerator, TimeSeriesPoint};
use crate::domain::Reading;
use crate::error::{Result, SimulationError};
use crate::simulation::{
    ConsumerLoadSimulator, CorrelationEngine, EnergyMeterSimulator, EnergyPriceSimulator,
    PvGenerationSimulator, WeatherSimulator,
};

/// Engine lifecycle states, mapped onto the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Initialized,
    Running,
    Paused,
    Stopped,
}

/// Status summary surfaced over REST and MQTT.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub state: EngineState,
    pub simulation_time: DateTime<Utc>,
    pub seed: u64,
    pub acceleration: u32,
    pub entity_ids: Vec<String>,
}

/// Shared handle used by the protocol adapters.
pub type SharedEngine = Arc<parking_lot::RwLock<SimulationEngine>>;

/// Core simulation orchestrator.
pub struct SimulationEngine {
    config: Config,
    rng: DeterministicRng,
    clock: SimulationClock,
    interval: IntervalMinutes,
    started: bool,

    weather_stations: HashMap<String, Arc<WeatherSimulator>>,
    pv_systems: HashMap<String, Arc<PvGenerationSimulator>>,
    meters: HashMap<String, Arc<EnergyMeterSimulator>>,
    loads: HashMap<String, Arc<ConsumerLoadSimulator>>,
    price_feeds: HashMap<String, Arc<EnergyPriceSimulator>>,
}

impl SimulationEngine {
    /// Build an engine from validated configuration.
    ///
    /// Fails on duplicate entity ids and on PV systems referencing an
    /// unknown weather station; both are configuration errors and fatal at
    /// startup.
    pub fn new(config: Config) -> Result<Self> {
        let interval = config.simulation.interval()?;
        let start_time = config.simulation.start_time_parsed()?;
        let clock = SimulationClock::new(config.simulation.speed_factor, start_time)?;
        let rng = DeterministicRng::new(config.simulation.seed);

        let mut engine = Self {
            config,
            rng,
            clock,
            interval,
            started: false,
            weather_stations: HashMap::new(),
            pv_systems: HashMap::new(),
            meters: HashMap::new(),
            loads: HashMap::new(),
            price_feeds: HashMap::new(),
        };
        engine.build_generators()?;
        Ok(engine)
    }

    /// Instantiate every generator from the stored configuration, bound to
    /// the current RNG.
    fn build_generators(&mut self) -> Result<()> {
        self.weather_stations.clear();
        self.pv_systems.clear();
        self.meters.clear();
        self.loads.clear();
        self.price_feeds.clear();

        let mut seen = std::collections::HashSet::new();
        let mut claim = |id: &str| -> Result<()> {
            if !seen.insert(id.to_string()) {
                return Err(SimulationError::DuplicateEntity(id.to_string()));
            }
            Ok(())
        };

        let station = &self.config.weather_station;
        claim(&station.id)?;
        self.weather_stations.insert(
            station.id.clone(),
            Arc::new(WeatherSimulator::new(
                station.id.clone(),
                self.rng,
                self.interval,
                station.weather.clone(),
            )),
        );

        for entry in &self.config.meters {
            claim(&entry.id)?;
            self.meters.insert(
                entry.id.clone(),
                Arc::new(EnergyMeterSimulator::new(
                    entry.id.clone(),
                    self.rng,
                    self.interval,
                    entry.meter.clone(),
                )),
            );
        }

        for entry in &self.config.pv_systems {
            claim(&entry.id)?;
            let weather = self
                .weather_stations
                .get(&entry.pv.weather_station_id)
                .ok_or_else(|| SimulationError::MissingWeatherStation {
                    station_id: entry.pv.weather_station_id.clone(),
                    system_id: entry.id.clone(),
                })?;
            self.pv_systems.insert(
                entry.id.clone(),
                Arc::new(PvGenerationSimulator::new(
                    entry.id.clone(),
                    Arc::clone(weather),
                    self.interval,
                    entry.pv.clone(),
                )),
            );
        }

        for entry in &self.config.consumers {
            claim(&entry.id)?;
            self.loads.insert(
                entry.id.clone(),
                Arc::new(ConsumerLoadSimulator::new(
                    entry.id.clone(),
                    self.rng,
                    self.interval,
                    entry.consumer.clone(),
                )),
            );
        }

        let feed = &self.config.price_feed;
        claim(&feed.id)?;
        self.price_feeds.insert(
            feed.id.clone(),
            Arc::new(EnergyPriceSimulator::new(
                feed.id.clone(),
                self.rng,
                self.interval,
                feed.price.clone(),
            )),
        );

        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn interval(&self) -> IntervalMinutes {
        self.interval
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Current simulation time.
    pub fn simulation_time(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn state(&self) -> EngineState {
        match self.clock.state() {
            ClockState::Running => EngineState::Running,
            ClockState::Paused => EngineState::Paused,
            ClockState::Stopped if self.started => EngineState::Stopped,
            ClockState::Stopped => EngineState::Initialized,
        }
    }

    // --- registry access -------------------------------------------------

    pub fn weather_station(&self, id: &str) -> Option<&Arc<WeatherSimulator>> {
        self.weather_stations.get(id)
    }

    pub fn pv_system(&self, id: &str) -> Option<&Arc<PvGenerationSimulator>> {
        self.pv_systems.get(id)
    }

    pub fn meter(&self, id: &str) -> Option<&Arc<EnergyMeterSimulator>> {
        self.meters.get(id)
    }

    pub fn load(&self, id: &str) -> Option<&Arc<ConsumerLoadSimulator>> {
        self.loads.get(id)
    }

    pub fn price_feed(&self, id: &str) -> Option<&Arc<EnergyPriceSimulator>> {
        self.price_feeds.get(id)
    }

    pub fn default_price_feed(&self) -> Option<&Arc<EnergyPriceSimulator>> {
        self.price_feeds.get(&self.config.price_feed.id)
    }

    pub fn weather_station_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.weather_stations.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn pv_system_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.pv_systems.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn meter_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.meters.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn load_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.loads.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn price_feed_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.price_feeds.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Every registered entity id, sorted, across all kinds.
    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        ids.extend(self.weather_stations.keys().cloned());
        ids.extend(self.pv_systems.keys().cloned());
        ids.extend(self.meters.keys().cloned());
        ids.extend(self.loads.keys().cloned());
        ids.extend(self.price_feeds.keys().cloned());
        ids.sort();
        ids
    }

    /// Unit-id to meter-id mapping for the Modbus server.
    pub fn modbus_unit_map(&self) -> Result<HashMap<u8, String>> {
        let mut map = HashMap::new();
        for entry in &self.config.meters {
            if let Some(unit_id) = entry.modbus_unit_id {
                if !(1..=247).contains(&unit_id) {
                    return Err(SimulationError::InvalidUnitId(unit_id));
                }
                map.insert(unit_id, entry.id.clone());
            }
        }
        Ok(map)
    }

    // --- generation ------------------------------------------------------

    /// Reading for any entity at the current simulation time.
    pub fn generate_current(&self, entity_id: &str) -> Result<Reading> {
        self.generate_at(entity_id, self.clock.now())
    }

    /// Reading for any entity at a given timestamp (aligned internally).
    pub fn generate_at(&self, entity_id: &str, timestamp: DateTime<Utc>) -> Result<Reading> {
        if let Some(sim) = self.weather_stations.get(entity_id) {
            return Ok(Reading::Weather(sim.generate_at(timestamp).value));
        }
        if let Some(sim) = self.pv_systems.get(entity_id) {
            return Ok(Reading::Pv(sim.generate_at(timestamp).value));
        }
        if let Some(sim) = self.meters.get(entity_id) {
            return Ok(Reading::Meter(sim.generate_at(timestamp).value));
        }
        if let Some(sim) = self.loads.get(entity_id) {
            return Ok(Reading::Load(sim.generate_at(timestamp).value));
        }
        if let Some(sim) = self.price_feeds.get(entity_id) {
            return Ok(Reading::Price(sim.generate_at(timestamp).value));
        }
        Err(SimulationError::UnknownEntity(entity_id.to_string()))
    }

    /// Range of readings for any entity at a caller-chosen interval.
    ///
    /// Meters run in energy-tracking mode so the cumulative column
    /// reflects the emitted power curve.
    pub fn generate_range(
        &self,
        entity_id: &str,
        range: &TimeRange,
        interval: IntervalMinutes,
        limit: usize,
    ) -> Result<(Vec<Reading>, bool)> {
        fn take_limited<I: Iterator<Item = Reading>>(iter: I, limit: usize) -> (Vec<Reading>, bool) {
            let mut readings: Vec<Reading> = iter.take(limit + 1).collect();
            let has_more = readings.len() > limit;
            readings.truncate(limit);
            (readings, has_more)
        }

        if let Some(sim) = self.weather_stations.get(entity_id) {
            let sim = sim.with_interval(interval);
            return Ok(take_limited(
                sim.iterate_range(range)
                    .map(|p: TimeSeriesPoint<_>| Reading::Weather(p.value)),
                limit,
            ));
        }
        if let Some(sim) = self.pv_systems.get(entity_id) {
            let sim = sim.with_interval(interval);
            return Ok(take_limited(
                sim.iterate_range(range).map(|p| Reading::Pv(p.value)),
                limit,
            ));
        }
        if let Some(sim) = self.meters.get(entity_id) {
            let sim = sim.with_interval(interval);
            return Ok(take_limited(
                sim.iterate_range_with_energy_tracking(range).map(Reading::Meter),
                limit,
            ));
        }
        if let Some(sim) = self.loads.get(entity_id) {
            let sim = sim.with_interval(interval);
            return Ok(take_limited(
                sim.iterate_range(range).map(|p| Reading::Load(p.value)),
                limit,
            ));
        }
        if let Some(sim) = self.price_feeds.get(entity_id) {
            let sim = sim.with_interval(interval);
            return Ok(take_limited(
                sim.iterate_range(range).map(|p| Reading::Price(p.value)),
                limit,
            ));
        }
        Err(SimulationError::UnknownEntity(entity_id.to_string()))
    }

    /// One current reading per registered entity.
    pub fn generate_all_current(&self) -> HashMap<String, Reading> {
        let now = self.clock.now();
        self.entity_ids()
            .into_iter()
            .filter_map(|id| self.generate_at(&id, now).ok().map(|r| (id, r)))
            .collect()
    }

    /// Correlation engine over every registered generator.
    pub fn correlation(&self) -> CorrelationEngine {
        let mut pv: Vec<_> = self.pv_systems.iter().collect();
        pv.sort_by(|a, b| a.0.cmp(b.0));
        let mut meters: Vec<_> = self.meters.iter().collect();
        meters.sort_by(|a, b| a.0.cmp(b.0));
        let mut loads: Vec<_> = self.loads.iter().collect();
        loads.sort_by(|a, b| a.0.cmp(b.0));

        CorrelationEngine::new(
            self.weather_stations
                .get(&self.config.weather_station.id)
                .cloned(),
            pv.into_iter().map(|(_, sim)| Arc::clone(sim)).collect(),
            meters.into_iter().map(|(_, sim)| Arc::clone(sim)).collect(),
            loads.into_iter().map(|(_, sim)| Arc::clone(sim)).collect(),
            self.default_price_feed().cloned(),
            self.interval,
        )
    }

    // --- lifecycle -------------------------------------------------------

    /// Start (or resume) the simulation, optionally jumping to a start
    /// time first.
    pub fn start(&mut self, start_time: Option<DateTime<Utc>>) {
        if let Some(start) = start_time {
            self.clock.set_time(start);
        }
        self.clock.start();
        self.started = true;
        info!(state = %self.state(), "simulation started");
    }

    pub fn pause(&self) {
        self.clock.pause();
        info!(state = %self.state(), "simulation paused");
    }

    pub fn resume(&mut self) {
        self.clock.start();
        self.started = true;
    }

    pub fn stop(&mut self) {
        self.clock.stop();
        self.started = true;
        info!("simulation stopped");
    }

    pub fn set_acceleration(&self, acceleration: u32) -> Result<()> {
        self.clock.set_acceleration(acceleration)
    }

    /// Reseed the RNG and rebuild every generator without touching the
    /// clock. Configuration and entity identity are preserved.
    pub fn set_seed(&mut self, seed: u64) -> Result<()> {
        self.config.simulation.seed = seed;
        self.rng = DeterministicRng::new(seed);
        self.build_generators()?;
        info!(seed, "seed changed");
        Ok(())
    }

    /// Reset to `Initialized`: fresh RNG (optionally reseeded), clock back
    /// to the start time, every generator rebuilt with its preserved
    /// configuration.
    pub fn reset(
        &mut self,
        new_seed: Option<u64>,
        start_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        if let Some(seed) = new_seed {
            self.config.simulation.seed = seed;
            self.rng = DeterministicRng::new(seed);
        } else {
            self.rng = DeterministicRng::new(self.config.simulation.seed);
        }

        self.clock.reset(start_time);
        self.started = false;
        self.build_generators()?;
        info!(seed = self.seed(), "simulation reset");
        Ok(())
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state(),
            simulation_time: self.clock.now(),
            seed: self.seed(),
            acceleration: self.clock.acceleration(),
            entity_ids: self.entity_ids(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConsumerEntry, MeterEntry, PvSystemEntry};
    use crate::domain::{ConsumerLoadConfig, MeterConfig, PvConfig};

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn test_config(seed: u64) -> Config {
        let mut config = Config::default();
        config.simulation.seed = seed;
        config.simulation.start_time = Some("2024-06-12T00:00:00Z".to_string());
        config.meters.push(MeterEntry {
            id: "meter-001".to_string(),
            modbus_unit_id: Some(1),
            meter: MeterConfig::default(),
        });
        config.pv_systems.push(PvSystemEntry {
            id: "pv-001".to_string(),
            pv: PvConfig::default(),
        });
        config.consumers.push(ConsumerEntry {
            id: "oven-001".to_string(),
            consumer: ConsumerLoadConfig::default(),
        });
        config
    }

    #[test]
    fn test_engine_starts_initialized() {
        let engine = SimulationEngine::new(test_config(12345)).unwrap();
        assert_eq!(engine.state(), EngineState::Initialized);
        assert_eq!(engine.simulation_time(), ts("2024-06-12T00:00:00Z"));
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let mut config = test_config(12345);
        config.consumers.push(ConsumerEntry {
            id: "meter-001".to_string(),
            consumer: ConsumerLoadConfig::default(),
        });
        let err = SimulationEngine::new(config);
        assert!(matches!(err, Err(SimulationError::DuplicateEntity(_))));
    }

    #[test]
    fn test_missing_weather_station_rejected() {
        let mut config = test_config(12345);
        config.pv_systems[0].pv.weather_station_id = "weather-nowhere".to_string();
        let err = SimulationEngine::new(config);
        assert!(matches!(
            err,
            Err(SimulationError::MissingWeatherStation { .. })
        ));
    }

    #[test]
    fn test_unknown_entity_errors() {
        let engine = SimulationEngine::new(test_config(12345)).unwrap();
        let err = engine.generate_at("meter-042", ts("2024-06-12T10:00:00Z"));
        assert!(matches!(err, Err(SimulationError::UnknownEntity(_))));
    }

    #[test]
    fn test_generate_at_dispatch() {
        let engine = SimulationEngine::new(test_config(12345)).unwrap();
        let timestamp = ts("2024-06-12T10:07:00Z");

        assert!(matches!(
            engine.generate_at("meter-001", timestamp).unwrap(),
            Reading::Meter(_)
        ));
        assert!(matches!(
            engine.generate_at("pv-001", timestamp).unwrap(),
            Reading::Pv(_)
        ));
        assert!(matches!(
            engine.generate_at("weather-001", timestamp).unwrap(),
            Reading::Weather(_)
        ));
        assert!(matches!(
            engine.generate_at("oven-001", timestamp).unwrap(),
            Reading::Load(_)
        ));
        assert!(matches!(
            engine.generate_at("epex-spot-de", timestamp).unwrap(),
            Reading::Price(_)
        ));

        // Input alignment happens inside the dispatch.
        let reading = engine.generate_at("meter-001", timestamp).unwrap();
        assert_eq!(reading.timestamp(), ts("2024-06-12T10:00:00Z"));
    }

    #[test]
    fn test_generate_range_limit_and_has_more() {
        let engine = SimulationEngine::new(test_config(12345)).unwrap();
        let range =
            TimeRange::new(ts("2024-06-12T00:00:00Z"), ts("2024-06-12T23:45:00Z")).unwrap();

        let (readings, has_more) = engine
            .generate_range("meter-001", &range, IntervalMinutes::FifteenMinutes, 10)
            .unwrap();
        assert_eq!(readings.len(), 10);
        assert!(has_more);

        let (readings, has_more) = engine
            .generate_range("meter-001", &range, IntervalMinutes::FifteenMinutes, 1000)
            .unwrap();
        assert_eq!(readings.len(), 96);
        assert!(!has_more);
    }

    #[test]
    fn test_generate_range_hourly_interval() {
        let engine = SimulationEngine::new(test_config(12345)).unwrap();
        let range =
            TimeRange::new(ts("2024-06-12T00:00:00Z"), ts("2024-06-12T23:59:00Z")).unwrap();

        let (readings, _) = engine
            .generate_range("epex-spot-de", &range, IntervalMinutes::OneHour, 1000)
            .unwrap();
        assert_eq!(readings.len(), 24);
    }

    #[test]
    fn test_generate_all_current_covers_entities() {
        let engine = SimulationEngine::new(test_config(12345)).unwrap();
        let all = engine.generate_all_current();

        assert_eq!(all.len(), 5);
        assert!(all.contains_key("meter-001"));
        assert!(all.contains_key("pv-001"));
        assert!(all.contains_key("weather-001"));
        assert!(all.contains_key("oven-001"));
        assert!(all.contains_key("epex-spot-de"));
    }

    #[test]
    fn test_lifecycle_states() {
        let mut engine = SimulationEngine::new(test_config(12345)).unwrap();
        assert_eq!(engine.state(), EngineState::Initialized);

        engine.start(None);
        assert_eq!(engine.state(), EngineState::Running);

        engine.pause();
        assert_eq!(engine.state(), EngineState::Paused);

        engine.resume();
        assert_eq!(engine.state(), EngineState::Running);

        engine.stop();
        assert_eq!(engine.state(), EngineState::Stopped);

        engine.reset(None, None).unwrap();
        assert_eq!(engine.state(), EngineState::Initialized);
    }

    #[test]
    fn test_reset_preserves_entities_and_determinism() {
        let mut engine = SimulationEngine::new(test_config(12345)).unwrap();
        let timestamp = ts("2024-06-12T10:00:00Z");
        let before = engine.generate_at("meter-001", timestamp).unwrap();

        engine.reset(None, None).unwrap();
        let after = engine.generate_at("meter-001", timestamp).unwrap();
        assert_eq!(before, after);
        assert_eq!(engine.entity_ids().len(), 5);
    }

    #[test]
    fn test_reset_with_new_seed_changes_output() {
        let mut engine = SimulationEngine::new(test_config(12345)).unwrap();
        let timestamp = ts("2024-06-12T10:00:00Z");
        let before = engine.generate_at("meter-001", timestamp).unwrap();

        engine.reset(Some(99999), None).unwrap();
        assert_eq!(engine.seed(), 99999);
        let after = engine.generate_at("meter-001", timestamp).unwrap();
        assert_ne!(before, after);

        // Seeding back restores the original stream.
        engine.reset(Some(12345), None).unwrap();
        let restored = engine.generate_at("meter-001", timestamp).unwrap();
        assert_eq!(before, restored);
    }

    #[test]
    fn test_snapshot_contents() {
        let engine = SimulationEngine::new(test_config(12345)).unwrap();
        let snapshot = engine.snapshot();

        assert_eq!(snapshot.state, EngineState::Initialized);
        assert_eq!(snapshot.seed, 12345);
        assert_eq!(snapshot.acceleration, 1);
        assert_eq!(snapshot.entity_ids.len(), 5);
    }

    #[test]
    fn test_modbus_unit_map() {
        let engine = SimulationEngine::new(test_config(12345)).unwrap();
        let map = engine.modbus_unit_map().unwrap();
        assert_eq!(map.get(&1), Some(&"meter-001".to_string()));
    }

    #[test]
    fn test_correlation_engine_sees_all_feeds() {
        let engine = SimulationEngine::new(test_config(12345)).unwrap();
        let snapshot = engine.correlation().generate_snapshot(ts("2024-06-12T12:00:00Z"));

        assert!(snapshot.weather.is_some());
        assert_eq!(snapshot.pv_readings.len(), 1);
        assert_eq!(snapshot.meter_readings.len(), 1);
        assert_eq!(snapshot.consumer_loads.len(), 1);
        assert!(snapshot.price.is_some());
    }
}
