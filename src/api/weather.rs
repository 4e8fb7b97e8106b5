//! Weather station endpoints.
//!
//! GET /api/v1/weather
//! GET /api/v1/weather/:station_id/current
//! GET /api/v1/weather/:station_id/history

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

pub async fn list_weather_stations(State(state): State<AppState>) -> Json<ListResponse> {
    let ids = state.engine.read().weather_station_ids();
    Json(ListResponse {
        count: ids.len(),
        ids,
    })
}

pub async fn get_weather_current(
    State(state): State<AppState>,
    Path(station_id): Path<String>,
) -> Result<Json<CurrentResponse>, ApiError> {
    let engine = state.engine.read();
    let sim = engine
        .weather_station(&station_id)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown weather station: {station_id}")))?;

    let reading = sim.generate_at(engine.simulation_time()).value;
    Ok(Json(CurrentResponse {
        entity_id: station_id,
        reading: reading.to_wire(),
    }))
}

pub async fn get_weather_history(
    State(state): State<AppState>,
    Path(station_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let engine = state.engine.read();
    if engine.weather_station(&station_id).is_none() {
        return Err(ApiError::NotFound(format!(
            "Unknown weather station: {station_id}"
        )));
    }

    let params = query.resolve(engine.simulation_time())?;
    let (readings, has_more) =
        engine.generate_range(&station_id, &params.range, params.interval, params.limit)?;

    let payloads = readings.iter().map(Reading::to_wire).collect();
    Ok(Json(HistoryResponse::new(station_id, payloads, &params, has_more)))
}
