//! Configuration endpoints: inspect the running engine and mutate seed or
//! acceleration.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::{error::ApiError, AppState};

/// GET /api/v1/config response
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub seed: u64,
    pub acceleration: u32,
    pub state: String,
    pub interval: String,
    pub entity_ids: Vec<String>,
}

/// POST /api/v1/config request
#[derive(Debug, Deserialize)]
pub struct ConfigUpdateRequest {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub acceleration: Option<u32>,
}

/// GET /api/v1/config - current engine configuration
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let engine = state.engine.read();
    Json(ConfigResponse {
        seed: engine.seed(),
        acceleration: engine.clock().acceleration(),
        state: engine.state().to_string(),
        interval: engine.interval().as_wire().to_string(),
        entity_ids: engine.entity_ids(),
    })
}

/// POST /api/v1/config - update seed and/or acceleration
///
/// A seed change reseeds the RNG and rebuilds every generator; entity ids
/// and configuration are preserved.
pub async fn update_config(
    State(state): State<AppState>,
    Json(request): Json<ConfigUpdateRequest>,
) -> Result<Json<ConfigResponse>, ApiError> {
    {
        let mut engine = state.engine.write();
        if let Some(acceleration) = request.acceleration {
            engine.set_acceleration(acceleration)?;
        }
        if let Some(seed) = request.seed {
            engine.set_seed(seed)?;
        }
    }
    Ok(get_config(State(state)).await)
}
