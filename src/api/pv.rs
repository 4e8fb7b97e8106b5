//! PV system endpoints.
//!
//! GET /api/v1/pv
//! GET /api/v1/pv/:system_id/current
//! GET /api/v1/pv/:system_id/history

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::api::{
    error::ApiError,
    response::{CurrentResponse, HistoryQuery, HistoryResponse, ListResponse},
    AppState,
};
use crate::core::TimeSeriesGenerator;
use crate::domain::Reading;

pub async fn list_pv_systems(State(state): State<AppState>) -> Json<ListResponse> {
    let ids = state.engine.read().pv_system_ids();
    Json(ListResponse {
        count: ids.len(),
        ids,
    })
}

pub async fn get_pv_current(
    State(state): State<AppState>,
    Path(system_id): Path<String>,
) -> Result<Json<CurrentResponse>, ApiError> {
    let engine = state.engine.read();
    let sim = engine
        .pv_system(&system_id)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown PV system: {system_id}")))?;

    let reading = sim.generate_at(engine.simulation_time()).value;
    Ok(Json(CurrentResponse {
        entity_id: system_id,
        reading: reading.to_wire(),
    }))
}

pub async fn get_pv_history(
    State(state): State<AppState>,
    Path(system_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let engine = state.engine.read();
    if engine.pv_system(&system_id).is_none() {
        return Err(ApiError::NotFound(format!("Unknown PV system: {system_id}")));
    }

    let params = query.resolve(engine.simulation_time())?;
    let (readings, has_more) =
        engine.generate_range(&system_id, &params.range, params.interval, params.limit)?;

    let payloads = readings.iter().map(Reading::to_wire).collect();
    Ok(Json(HistoryResponse::new(system_id, payloads, &params, has_more)))
}
