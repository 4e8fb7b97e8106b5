use axum::{
    routing::{get, post},
    Router,
};

use crate::api::{config, loads, meters, prices, pv, simulation, weather, AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        // Configuration
        .route("/config", get(config::get_config).post(config::update_config))
        // Meters
        .route("/meters", get(meters::list_meters))
        .route("/meters/:meter_id/current", get(meters::get_meter_current))
        .route("/meters/:meter_id/history", get(meters::get_meter_history))
        // PV systems
        .route("/pv", get(pv::list_pv_systems))
        .route("/pv/:system_id/current", get(pv::get_pv_current))
        .route("/pv/:system_id/history", get(pv::get_pv_history))
        // Weather stations
        .route("/weather", get(weather::list_weather_stations))
        .route(
            "/weather/:station_id/current",
            get(weather::get_weather_current),
        )
        .route(
            "/weather/:station_id/history",
            get(weather::get_weather_history),
        )
        // Consumer loads
        .route("/loads", get(loads::list_loads))
        .route("/loads/:device_id/current", get(loads::get_load_current))
        .route("/loads/:device_id/history", get(loads::get_load_history))
        // Prices
        .route("/prices/current", get(prices::get_current_price))
        .route("/prices/forecast", get(prices::get_price_forecast))
        .route("/prices/history", get(prices::get_price_history))
        // Simulation control
        .route("/simulation/start", post(simulation::start_simulation))
        .route("/simulation/pause", post(simulation::pause_simulation))
        .route("/simulation/reset", post(simulation::reset_simulation))
        .route("/simulation/status", get(simulation::get_status))
        .with_state(state)
}
