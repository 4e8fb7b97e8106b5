use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use tracing::{info, warn};

use facis_sim::api::{self, AppState};
use facis_sim::config::Config;
use facis_sim::core::engine::{SharedEngine, SimulationEngine};
use facis_sim::modbus::{self, MeterReadingProvider};
use facis_sim::mqtt;
use facis_sim::telemetry::{init_tracing, shutdown_signal};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load()?;
    let engine: SharedEngine = Arc::new(RwLock::new(SimulationEngine::new(cfg.clone())?));
    engine.write().start(None);

    if cfg.mqtt.enabled {
        mqtt::spawn(cfg.mqtt.clone(), Arc::clone(&engine));
    }

    if cfg.modbus.enabled {
        let units = engine.read().modbus_unit_map()?;
        if units.is_empty() {
            warn!("Modbus enabled but no meter carries a modbus_unit_id");
        }
        let addr = cfg.modbus.socket_addr()?;
        let provider = reading_provider(Arc::clone(&engine));
        tokio::spawn(async move {
            if let Err(error) = modbus::run_server(addr, units, provider).await {
                warn!(%error, "Modbus server terminated");
            }
        });
    }

    let state = AppState::new(Arc::clone(&engine));
    let app = api::router(state);

    let addr = cfg.http.socket_addr()?;
    info!(%addr, seed = engine.read().seed(), "starting FACIS simulation service");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}

/// Live lookup the Modbus data blocks refresh from on every read.
fn reading_provider(engine: SharedEngine) -> MeterReadingProvider {
    use facis_sim::core::TimeSeriesGenerator;

    Arc::new(move |meter_id: &str| {
        let engine = engine.read();
        let sim = engine.meter(meter_id)?;
        Some(sim.generate_at(engine.simulation_time()).value)
    })
}
