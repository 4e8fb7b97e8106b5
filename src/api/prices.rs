//! Price endpoints on the default feed.
//!
//! GET /api/v1/prices/current
//! GET /api/v1/prices/forecast
//! GET /api/v1/prices/history

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{
    error::ApiError,
    response::{CurrentResponse, HistoryQuery, HistoryResponse},
    AppState,
};
use crate::core::series::{IntervalMinutes, TimeRange};
use crate::core::TimeSeriesGenerator;
use crate::domain::{iso_z, Reading};

const MAX_FORECAST_HOURS: i64 = 168;

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    #[serde(default = "default_forecast_hours")]
    pub hours: i64,
    #[serde(default)]
    pub interval: Option<String>,
}

fn default_forecast_hours() -> i64 {
    24
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub feed_id: String,
    pub forecast: Vec<Value>,
    pub count: usize,
    pub start_time: String,
    pub end_time: String,
    pub interval: String,
}

pub async fn get_current_price(
    State(state): State<AppState>,
) -> Result<Json<CurrentResponse>, ApiError> {
    let engine = state.engine.read();
    let feed = engine
        .default_price_feed()
        .ok_or_else(|| ApiError::NotFound("Price feed not configured".to_string()))?;

    let reading = feed.generate_at(engine.simulation_time()).value;
    Ok(Json(CurrentResponse {
        entity_id: feed.entity_id().to_string(),
        reading: reading.to_wire(),
    }))
}

/// Forecast is a range query anchored at the current simulation time.
pub async fn get_price_forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ForecastResponse>, ApiError> {
    if !(1..=MAX_FORECAST_HOURS).contains(&query.hours) {
        return Err(ApiError::BadRequest(format!(
            "Forecast hours must be between 1 and {MAX_FORECAST_HOURS}, got {}",
            query.hours
        )));
    }
    let interval = match &query.interval {
        Some(raw) => IntervalMinutes::from_wire(raw).map_err(ApiError::from)?,
        None => IntervalMinutes::OneHour,
    };

    let engine = state.engine.read();
    let feed = engine
        .default_price_feed()
        .ok_or_else(|| ApiError::NotFound("Price feed not configured".to_string()))?;

    let now = engine.simulation_time();
    let end = now + Duration::hours(query.hours);
    let range = TimeRange::new(now, end).map_err(ApiError::from)?;

    let feed = feed.with_interval(interval);
    let forecast: Vec<Value> = feed
        .iterate_range(&range)
        .map(|point| point.value.to_wire())
        .collect();

    Ok(Json(ForecastResponse {
        feed_id: feed.entity_id().to_string(),
        count: forecast.len(),
        forecast,
        start_time: iso_z(now),
        end_time: iso_z(end),
        interval: interval.as_wire().to_string(),
    }))
}

pub async fn get_price_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let engine = state.engine.read();
    let feed_id = engine
        .default_price_feed()
        .ok_or_else(|| ApiError::NotFound("Price feed not configured".to_string()))?
        .entity_id()
        .to_string();

    let params = query.resolve(engine.simulation_time())?;
    let (readings, has_more) =
        engine.generate_range(&feed_id, &params.range, params.interval, params.limit)?;

    let payloads = readings.iter().map(Reading::to_wire).collect();
    Ok(Json(HistoryResponse::new(feed_id, payloads, &params, has_more)))
}
