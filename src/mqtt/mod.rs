//! MQTT surface: topic definitions and the broker publisher task.

pub mod publisher;
pub mod topics;

pub use publisher::{spawn, AlertEnvelope, MqttPublisher};
