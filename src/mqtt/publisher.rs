//! # MQTT Publisher
//!
//! Publishes every feed to the broker on a fixed real-time cadence,
//! reading the engine's current simulation time on each round. Broker
//! failures never reach the core: the publisher logs, backs off
//! exponentially (1 s to 60 s, doubling per failure) and reconnects.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rumqttc::{AsyncClient, ConnectionError, EventLoop, MqttOptions};
use serde_json::json;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::MqttConfig;
use crate::core::engine::SharedEngine;
use crate::core::TimeSeriesGenerator;
use crate::domain::iso_z;
use crate::mqtt::topics;

const RECONNECT_MIN_DELAY_SECS: u64 = 1;
const RECONNECT_MAX_DELAY_SECS: u64 = 60;

/// Envelope for `facis/events/alerts`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AlertEnvelope {
    pub timestamp: String,
    pub severity: String,
    pub source: String,
    pub message: String,
}

impl AlertEnvelope {
    pub fn new(
        timestamp: DateTime<Utc>,
        severity: impl Into<String>,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: iso_z(timestamp),
            severity: severity.into(),
            source: source.into(),
            message: message.into(),
        }
    }
}

/// MQTT publisher task.
pub struct MqttPublisher {
    client: AsyncClient,
    engine: SharedEngine,
    config: MqttConfig,
}

impl MqttPublisher {
    /// Create the client; the returned event loop must be driven by
    /// [`run`](Self::run).
    pub fn new(config: MqttConfig, engine: SharedEngine) -> (Self, EventLoop) {
        let mut options = MqttOptions::new(&config.client_id, &config.broker, config.port);
        options.set_keep_alive(Duration::from_secs(30));
        options.set_clean_session(true);

        let (client, event_loop) = AsyncClient::new(options, 64);
        (
            Self {
                client,
                engine,
                config,
            },
            event_loop,
        )
    }

    /// Drive the event loop and the publish cadence until the task is
    /// aborted.
    pub async fn run(self, mut event_loop: EventLoop) {
        info!(
            broker = %self.config.broker,
            port = self.config.port,
            interval_secs = self.config.publish_interval_secs,
            "starting MQTT publisher"
        );

        let mut ticker = interval(Duration::from_secs(self.config.publish_interval_secs));
        let mut reconnect_delay = RECONNECT_MIN_DELAY_SECS;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.publish_round().await;
                }
                event = event_loop.poll() => {
                    match event {
                        Ok(_) => {
                            reconnect_delay = RECONNECT_MIN_DELAY_SECS;
                        }
                        Err(error) => {
                            self.log_connection_error(&error, reconnect_delay);
                            tokio::time::sleep(Duration::from_secs(reconnect_delay)).await;
                            reconnect_delay =
                                (reconnect_delay * 2).min(RECONNECT_MAX_DELAY_SECS);
                        }
                    }
                }
            }
        }
    }

    fn log_connection_error(&self, error: &ConnectionError, delay_secs: u64) {
        warn!(
            %error,
            retry_in_secs = delay_secs,
            "MQTT broker unreachable, backing off"
        );
    }

    /// One publish round: every feed at the current simulation time, the
    /// refreshed price forecast and the engine snapshot (both retained for
    /// late subscribers).
    async fn publish_round(&self) {
        let (payloads, forecast, status) = {
            let engine = self.engine.read();
            let now = engine.simulation_time();

            let mut payloads: Vec<(String, topics::TopicSpec, serde_json::Value)> = Vec::new();

            for meter_id in engine.meter_ids() {
                if let Some(sim) = engine.meter(&meter_id) {
                    let reading = sim.generate_at(now).value;
                    payloads.push((topics::meter_topic(&meter_id), topics::METER, reading.to_wire()));
                }
            }
            for system_id in engine.pv_system_ids() {
                if let Some(sim) = engine.pv_system(&system_id) {
                    let reading = sim.generate_at(now).value;
                    payloads.push((topics::pv_topic(&system_id), topics::PV, reading.to_wire()));
                }
            }
            for station_id in engine.weather_station_ids() {
                if let Some(sim) = engine.weather_station(&station_id) {
                    let reading = sim.generate_at(now).value;
                    payloads.push((topics::weather_topic(), topics::WEATHER, reading.to_wire()));
                }
            }
            for device_id in engine.load_ids() {
                if let Some(sim) = engine.load(&device_id) {
                    let reading = sim.generate_at(now).value;
                    let topic = topics::load_topic(&reading.device_type.to_string());
                    payloads.push((topic, topics::LOAD, reading.to_wire()));
                }
            }
            if let Some(feed) = engine.default_price_feed() {
                let reading = feed.generate_at(now).value;
                payloads.push((topics::spot_price_topic(), topics::PRICE_SPOT, reading.to_wire()));
            }

            let forecast = engine.default_price_feed().map(|feed| {
                build_forecast_payload(feed, now, self.config.forecast_horizon_hours)
            });

            let status = json!({
                "state": engine.state().to_string(),
                "simulation_time": iso_z(now),
                "seed": engine.seed(),
                "acceleration": engine.clock().acceleration(),
                "entity_ids": engine.entity_ids(),
            });

            (payloads, forecast, status)
        };

        for (topic, spec, payload) in payloads {
            self.publish(&topic, spec, &payload).await;
        }
        if let Some(forecast) = forecast {
            self.publish(&topics::forecast_price_topic(), topics::PRICE_FORECAST, &forecast)
                .await;
        }
        self.publish(&topics::simulation_status_topic(), topics::SIMULATION_STATUS, &status)
            .await;
    }

    async fn publish(&self, topic: &str, spec: topics::TopicSpec, payload: &serde_json::Value) {
        if let Err(error) = self
            .client
            .publish(topic, spec.qos, spec.retained, payload.to_string())
            .await
        {
            warn!(%error, topic, "failed to enqueue MQTT publish");
        } else {
            debug!(topic, "published");
        }
    }

    /// Publish an alert envelope at QoS 2.
    pub async fn publish_alert(&self, alert: &AlertEnvelope) {
        let payload = serde_json::to_value(alert).unwrap_or_else(|_| json!({}));
        self.publish(&topics::alerts_topic(), topics::ALERTS, &payload)
            .await;
    }
}

/// Forecast payload for the retained `facis/prices/forecast` topic.
fn build_forecast_payload(
    feed: &crate::simulation::EnergyPriceSimulator,
    now: DateTime<Utc>,
    horizon_hours: u32,
) -> serde_json::Value {
    use crate::core::series::{IntervalMinutes, TimeRange};

    let end = now + chrono::Duration::hours(horizon_hours as i64);
    let hourly = feed.with_interval(IntervalMinutes::OneHour);
    let prices: Vec<serde_json::Value> = match TimeRange::new(now, end) {
        Ok(range) => hourly
            .iterate_range(&range)
            .map(|point| point.value.to_wire())
            .collect(),
        Err(_) => Vec::new(),
    };

    json!({
        "generated_at": iso_z(now),
        "horizon_hours": horizon_hours,
        "prices": prices,
    })
}

/// Spawn the publisher as a background task. Returns immediately; the task
/// reconnects on its own for the life of the process.
pub fn spawn(config: MqttConfig, engine: SharedEngine) -> tokio::task::JoinHandle<()> {
    let (publisher, event_loop) = MqttPublisher::new(config, engine);
    tokio::spawn(publisher.run(event_loop))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::engine::SimulationEngine;
    use std::sync::Arc;

    fn shared_engine() -> SharedEngine {
        let mut config = Config::default();
        config.simulation.start_time = Some("2024-06-12T00:00:00Z".to_string());
        Arc::new(parking_lot::RwLock::new(
            SimulationEngine::new(config).unwrap(),
        ))
    }

    #[test]
    fn test_forecast_payload_shape() {
        let engine = shared_engine();
        let guard = engine.read();
        let feed = guard.default_price_feed().unwrap();
        let now: DateTime<Utc> = "2024-06-12T00:00:00Z".parse().unwrap();

        let payload = build_forecast_payload(feed, now, 24);
        assert_eq!(payload["generated_at"], "2024-06-12T00:00:00Z");
        assert_eq!(payload["horizon_hours"], 24);
        // Inclusive alignment yields horizon + 1 hourly points.
        assert_eq!(payload["prices"].as_array().unwrap().len(), 25);
        assert!(payload["prices"][0]["price_eur_per_kwh"].is_number());
    }

    #[test]
    fn test_alert_envelope_serialises() {
        let alert = AlertEnvelope::new(
            "2024-06-12T00:00:00Z".parse().unwrap(),
            "warning",
            "simulation",
            "seed changed",
        );
        let value = serde_json::to_value(&alert).unwrap();
        assert_eq!(value["timestamp"], "2024-06-12T00:00:00Z");
        assert_eq!(value["severity"], "warning");
    }
}
