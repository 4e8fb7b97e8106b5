//! Simulation control endpoints.
//!
//! POST /api/v1/simulation/start
//! POST /api/v1/simulation/pause
//! POST /api/v1/simulation/reset
//! GET  /api/v1/simulation/status

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::{error::ApiError, AppState};
use crate::core::engine::EngineSnapshot;
use crate::core::series::parse_timestamp;
use crate::domain::iso_z;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub start_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub start_time: Option<String>,
}

/// Engine snapshot with the timestamp in wire form.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state: String,
    pub simulation_time: String,
    pub seed: u64,
    pub acceleration: u32,
    pub entity_ids: Vec<String>,
}

impl From<EngineSnapshot> for StatusResponse {
    fn from(snapshot: EngineSnapshot) -> Self {
        Self {
            state: snapshot.state.to_string(),
            simulation_time: iso_z(snapshot.simulation_time),
            seed: snapshot.seed,
            acceleration: snapshot.acceleration,
            entity_ids: snapshot.entity_ids,
        }
    }
}

pub async fn start_simulation(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let start_time = request
        .start_time
        .as_deref()
        .map(parse_timestamp)
        .transpose()
        .map_err(ApiError::from)?;

    let mut engine = state.engine.write();
    engine.start(start_time);
    Ok(Json(engine.snapshot().into()))
}

pub async fn pause_simulation(State(state): State<AppState>) -> Json<StatusResponse> {
    let engine = state.engine.read();
    engine.pause();
    Json(engine.snapshot().into())
}

pub async fn reset_simulation(
    State(state): State<AppState>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let start_time = request
        .start_time
        .as_deref()
        .map(parse_timestamp)
        .transpose()
        .map_err(ApiError::from)?;

    let mut engine = state.engine.write();
    engine.reset(request.seed, start_time)?;
    Ok(Json(engine.snapshot().into()))
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.engine.read().snapshot().into())
}
