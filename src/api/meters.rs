//! Meter data endpoints.
//!
//! GET /api/v1/meters
//! GET /api/v1/meters/:meter_id/current
//! GET /api/v1/meters/:meter_id/history

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

pub async fn list_meters(State(state): State<AppState>) -> Json<ListResponse> {
    let ids = state.engine.read().meter_ids();
    Json(ListResponse {
        count: ids.len(),
        ids,
    })
}

pub async fn get_meter_current(
    State(state): State<AppState>,
    Path(meter_id): Path<String>,
) -> Result<Json<CurrentResponse>, ApiError> {
    let engine = state.engine.read();
    let sim = engine
        .meter(&meter_id)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown meter: {meter_id}")))?;

    let reading = sim.generate_at(engine.simulation_time()).value;
    Ok(Json(CurrentResponse {
        entity_id: meter_id,
        reading: reading.to_wire(),
    }))
}

/// History runs in energy-tracking mode: `total_energy_kwh` integrates the
/// emitted power curve across the range.
pub async fn get_meter_history(
    State(state): State<AppState>,
    Path(meter_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let engine = state.engine.read();
    if engine.meter(&meter_id).is_none() {
        return Err(ApiError::NotFound(format!("Unknown meter: {meter_id}")));
    }

    let params = query.resolve(engine.simulation_time())?;
    let (readings, has_more) =
        engine.generate_range(&meter_id, &params.range, params.interval, params.limit)?;

    let payloads = readings.iter().map(Reading::to_wire).collect();
    Ok(Json(HistoryResponse::new(meter_id, payloads, &params, has_more)))
}
