//! # MQTT Topic Definitions
//!
//! Topic structure and QoS levels for every simulation feed:
//!
//! ```text
//! facis/energy/meter/{id}     - meter readings          (QoS 1)
//! facis/energy/pv/{id}        - PV generation data      (QoS 1)
//! facis/weather/current       - weather conditions      (QoS 0, retained)
//! facis/prices/spot           - spot prices             (QoS 1, retained)
//! facis/prices/forecast       - price forecast          (QoS 1, retained)
//! facis/loads/{device_type}   - consumer load data      (QoS 0)
//! facis/events/alerts         - system alerts           (QoS 2)
//! facis/simulation/status     - engine snapshot         (QoS 1, retained)
//! ```

use rumqttc::QoS;

/// Base topic prefix.
pub const PREFIX: &str = "facis";

/// Delivery settings for one topic family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicSpec {
    pub qos: QoS,
    pub retained: bool,
}

pub const METER: TopicSpec = TopicSpec { qos: QoS::AtLeastOnce, retained: false };
pub const PV: TopicSpec = TopicSpec { qos: QoS::AtLeastOnce, retained: false };
pub const WEATHER: TopicSpec = TopicSpec { qos: QoS::AtMostOnce, retained: true };
pub const PRICE_SPOT: TopicSpec = TopicSpec { qos: QoS::AtLeastOnce, retained: true };
pub const PRICE_FORECAST: TopicSpec = TopicSpec { qos: QoS::AtLeastOnce, retained: true };
pub const LOAD: TopicSpec = TopicSpec { qos: QoS::AtMostOnce, retained: false };
pub const ALERTS: TopicSpec = TopicSpec { qos: QoS::ExactlyOnce, retained: false };
pub const SIMULATION_STATUS: TopicSpec = TopicSpec { qos: QoS::AtLeastOnce, retained: true };

pub fn meter_topic(meter_id: &str) -> String {
    format!("{PREFIX}/energy/meter/{meter_id}")
}

pub fn pv_topic(system_id: &str) -> String {
    format!("{PREFIX}/energy/pv/{system_id}")
}

pub fn weather_topic() -> String {
    format!("{PREFIX}/weather/current")
}

pub fn spot_price_topic() -> String {
    format!("{PREFIX}/prices/spot")
}

pub fn forecast_price_topic() -> String {
    format!("{PREFIX}/prices/forecast")
}

pub fn load_topic(device_type: &str) -> String {
    format!("{PREFIX}/loads/{device_type}")
}

pub fn alerts_topic() -> String {
    format!("{PREFIX}/events/alerts")
}

pub fn simulation_status_topic() -> String {
    format!("{PREFIX}/simulation/status")
}
