use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use validator::Validate;

use crate::core::series::{parse_timestamp, IntervalMinutes};
use crate::domain::{ConsumerLoadConfig, MeterConfig, PriceConfig, PvConfig, WeatherConfig};
use crate::error::SimulationError;

/// Top-level service configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct Config {
    #[validate(nested)]
    #[serde(default)]
    pub simulation: SimulationConfig,

    #[validate(nested)]
    #[serde(default)]
    pub http: HttpConfig,

    #[validate(nested)]
    #[serde(default)]
    pub mqtt: MqttConfig,

    #[validate(nested)]
    #[serde(default)]
    pub modbus: ModbusConfig,

    #[validate(nested)]
    #[serde(default)]
    pub weather_station: WeatherStationEntry,

    #[validate(nested)]
    #[serde(default)]
    pub price_feed: PriceFeedEntry,

    #[serde(default)]
    pub meters: Vec<MeterEntry>,

    #[serde(default)]
    pub pv_systems: Vec<PvSystemEntry>,

    #[serde(default)]
    pub consumers: Vec<ConsumerEntry>,
}

/// Simulation engine configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SimulationConfig {
    /// Base seed for all deterministic random streams
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Data interval in minutes; only 15 and 60 are supported
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,

    /// Simulation start time (ISO 8601); wall clock when absent
    #[serde(default)]
    pub start_time: Option<String>,

    /// Virtual time acceleration factor
    #[serde(default = "default_speed_factor")]
    #[validate(range(min = 1, max = 1000))]
    pub speed_factor: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            interval_minutes: default_interval_minutes(),
            start_time: None,
            speed_factor: default_speed_factor(),
        }
    }
}

impl SimulationConfig {
    pub fn interval(&self) -> Result<IntervalMinutes, SimulationError> {
        match self.interval_minutes {
            15 => Ok(IntervalMinutes::FifteenMinutes),
            60 => Ok(IntervalMinutes::OneHour),
            other => Err(SimulationError::InvalidInterval(format!("{other}min"))),
        }
    }

    pub fn start_time_parsed(
        &self,
    ) -> Result<Option<chrono::DateTime<chrono::Utc>>, SimulationError> {
        self.start_time
            .as_deref()
            .map(parse_timestamp)
            .transpose()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct HttpConfig {
    #[validate(length(min = 1))]
    #[serde(default = "default_host")]
    pub host: String,

    #[validate(range(min = 1, max = 65535))]
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_http_port(),
        }
    }
}

impl HttpConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("Failed to parse HTTP socket address")
    }
}

/// MQTT publisher configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct MqttConfig {
    #[serde(default)]
    pub enabled: bool,

    #[validate(length(min = 1))]
    #[serde(default = "default_mqtt_broker")]
    pub broker: String,

    #[validate(range(min = 1, max = 65535))]
    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    #[serde(default = "default_mqtt_client_id")]
    pub client_id: String,

    /// Real-time seconds between publish rounds
    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_publish_interval_secs")]
    pub publish_interval_secs: u64,

    /// Hours covered by the retained price forecast
    #[validate(range(min = 1, max = 168))]
    #[serde(default = "default_forecast_horizon_hours")]
    pub forecast_horizon_hours: u32,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            broker: default_mqtt_broker(),
            port: default_mqtt_port(),
            client_id: default_mqtt_client_id(),
            publish_interval_secs: default_publish_interval_secs(),
            forecast_horizon_hours: default_forecast_horizon_hours(),
        }
    }
}

/// Modbus TCP server configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ModbusConfig {
    #[serde(default)]
    pub enabled: bool,

    #[validate(length(min = 1))]
    #[serde(default = "default_host")]
    pub host: String,

    #[validate(range(min = 1, max = 65535))]
    #[serde(default = "default_modbus_port")]
    pub port: u16,
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_modbus_port(),
        }
    }
}

impl ModbusConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("Failed to parse Modbus socket address")
    }
}

/// Weather station entity
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct WeatherStationEntry {
    #[validate(length(min = 1))]
    #[serde(default = "default_weather_station_id")]
    pub id: String,

    #[serde(flatten)]
    pub weather: WeatherConfig,
}

impl Default for WeatherStationEntry {
    fn default() -> Self {
        Self {
            id: default_weather_station_id(),
            weather: WeatherConfig::default(),
        }
    }
}

/// Price feed entity
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PriceFeedEntry {
    #[validate(length(min = 1))]
    #[serde(default = "default_price_feed_id")]
    pub id: String,

    #[serde(flatten)]
    pub price: PriceConfig,
}

impl Default for PriceFeedEntry {
    fn default() -> Self {
        Self {
            id: default_price_feed_id(),
            price: PriceConfig::default(),
        }
    }
}

/// Energy meter entity
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_meter_entry"))]
pub struct MeterEntry {
    #[validate(length(min = 1))]
    pub id: String,

    /// Modbus unit id this meter is served on, if any
    #[serde(default)]
    pub modbus_unit_id: Option<u8>,

    #[serde(flatten)]
    pub meter: MeterConfig,
}

fn validate_meter_entry(entry: &MeterEntry) -> Result<(), validator::ValidationError> {
    if entry.meter.base_power_kw > entry.meter.peak_power_kw {
        return Err(validator::ValidationError::new(
            "base_power_kw must not exceed peak_power_kw",
        ));
    }
    if entry.meter.power_factor_min > entry.meter.power_factor_max {
        return Err(validator::ValidationError::new(
            "power_factor_min must not exceed power_factor_max",
        ));
    }
    if let Some(unit_id) = entry.modbus_unit_id {
        if !(1..=247).contains(&unit_id) {
            return Err(validator::ValidationError::new(
                "modbus_unit_id must be between 1 and 247",
            ));
        }
    }
    Ok(())
}

/// PV system entity
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_pv_entry"))]
pub struct PvSystemEntry {
    #[validate(length(min = 1))]
    pub id: String,

    #[serde(flatten)]
    pub pv: PvConfig,
}

fn validate_pv_entry(entry: &PvSystemEntry) -> Result<(), validator::ValidationError> {
    if entry.pv.nominal_capacity_kwp <= 0.0 {
        return Err(validator::ValidationError::new(
            "nominal_capacity_kwp must be positive",
        ));
    }
    if entry.pv.temperature_coefficient_pct_per_c > 0.0 {
        return Err(validator::ValidationError::new(
            "temperature_coefficient_pct_per_c must not be positive",
        ));
    }
    if !(0.0..=50.0).contains(&entry.pv.system_losses_pct) {
        return Err(validator::ValidationError::new(
            "system_losses_pct must be between 0 and 50",
        ));
    }
    Ok(())
}

/// Consumer load entity
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_consumer_entry"))]
pub struct ConsumerEntry {
    #[validate(length(min = 1))]
    pub id: String,

    #[serde(flatten)]
    pub consumer: ConsumerLoadConfig,
}

fn validate_consumer_entry(entry: &ConsumerEntry) -> Result<(), validator::ValidationError> {
    if !(0.0..=100.0).contains(&entry.consumer.duty_cycle_pct) {
        return Err(validator::ValidationError::new(
            "duty_cycle_pct must be between 0 and 100",
        ));
    }
    if entry.consumer.rated_power_kw < 0.0 {
        return Err(validator::ValidationError::new(
            "rated_power_kw must not be negative",
        ));
    }
    for window in &entry.consumer.operating_windows {
        if window.start_hour > 23 || window.end_hour > 23 {
            return Err(validator::ValidationError::new(
                "operating window hours must be between 0 and 23",
            ));
        }
    }
    Ok(())
}

// Default value functions
fn default_seed() -> u64 { 12345 }
fn default_interval_minutes() -> u32 { 15 }
fn default_speed_factor() -> u32 { 1 }
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_http_port() -> u16 { 8080 }
fn default_mqtt_broker() -> String { "localhost".to_string() }
fn default_mqtt_port() -> u16 { 1883 }
fn default_modbus_port() -> u16 { 502 }
fn default_mqtt_client_id() -> String { "facis-simulator".to_string() }
fn default_publish_interval_secs() -> u64 { 10 }
fn default_forecast_horizon_hours() -> u32 { 24 }
fn default_weather_station_id() -> String { "weather-001".to_string() }
fn default_price_feed_id() -> String { "epex-spot-de".to_string() }

impl Config {
    /// Load configuration from `config/default.toml` overridden by
    /// `FACIS__`-prefixed environment variables
    /// (`FACIS__SIMULATION__SEED` -> `simulation.seed`).
    pub fn load() -> Result<Self> {
        Self::load_from(Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("FACIS__").split("__")))
    }

    pub fn load_from(figment: Figment) -> Result<Self> {
        let config: Config = figment
            .extract()
            .context("Failed to parse configuration")?;

        config
            .validate()
            .context("Configuration validation failed")?;
        for entry in &config.meters {
            entry.validate().context("Invalid meter entry")?;
        }
        for entry in &config.pv_systems {
            entry.validate().context("Invalid PV system entry")?;
        }
        for entry in &config.consumers {
            entry.validate().context("Invalid consumer entry")?;
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            http: HttpConfig::default(),
            mqtt: MqttConfig::default(),
            modbus: ModbusConfig::default(),
            weather_station: WeatherStationEntry::default(),
            price_feed: PriceFeedEntry::default(),
            meters: vec![],
            pv_systems: vec![],
            consumers: vec![],
        }
    }
}
