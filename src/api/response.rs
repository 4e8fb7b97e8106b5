//! Shared response and query-parameter shapes for the data endpoints.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::series::{parse_timestamp, IntervalMinutes, TimeRange};
use crate::domain::iso_z;
use crate::error::SimulationError;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;
pub const MAX_HISTORY_LIMIT: usize = 1000;

/// Query parameters shared by every `history` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Resolved history parameters after validation.
pub struct HistoryParams {
    pub range: TimeRange,
    pub interval: IntervalMinutes,
    pub limit: usize,
}

impl HistoryQuery {
    /// Resolve against the current simulation time: a missing range
    /// defaults to the 24 hours ending now.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<HistoryParams, SimulationError> {
        let end = match &self.end_time {
            Some(raw) => parse_timestamp(raw)?,
            None => now,
        };
        let start = match &self.start_time {
            Some(raw) => parse_timestamp(raw)?,
            None => end - Duration::hours(24),
        };
        let range = TimeRange::new(start, end)?;

        let interval = match &self.interval {
            Some(raw) => IntervalMinutes::from_wire(raw)?,
            None => IntervalMinutes::FifteenMinutes,
        };

        let limit = self.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if limit == 0 || limit > MAX_HISTORY_LIMIT {
            return Err(SimulationError::LimitExceeded(limit));
        }

        Ok(HistoryParams {
            range,
            interval,
            limit,
        })
    }
}

/// Entity listing.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub ids: Vec<String>,
    pub count: usize,
}

/// One current reading.
#[derive(Debug, Serialize)]
pub struct CurrentResponse {
    pub entity_id: String,
    pub reading: Value,
}

/// Range query result with truncation marker and echoed parameters.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entity_id: String,
    pub readings: Vec<Value>,
    pub count: usize,
    pub limit: usize,
    pub has_more: bool,
    pub start_time: String,
    pub end_time: String,
    pub interval: String,
}

impl HistoryResponse {
    pub fn new(
        entity_id: impl Into<String>,
        readings: Vec<Value>,
        params: &HistoryParams,
        has_more: bool,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            count: readings.len(),
            readings,
            limit: params.limit,
            has_more,
            start_time: iso_z(params.range.start()),
            end_time: iso_z(params.range.end()),
            interval: params.interval.as_wire().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_defaults_to_last_24_hours() {
        let query = HistoryQuery {
            start_time: None,
            end_time: None,
            interval: None,
            limit: None,
        };
        let now = ts("2024-06-12T12:00:00Z");
        let params = query.resolve(now).unwrap();

        assert_eq!(params.range.end(), now);
        assert_eq!(params.range.start(), ts("2024-06-11T12:00:00Z"));
        assert_eq!(params.interval, IntervalMinutes::FifteenMinutes);
        assert_eq!(params.limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_rejects_bad_interval() {
        let query = HistoryQuery {
            start_time: None,
            end_time: None,
            interval: Some("5min".to_string()),
            limit: None,
        };
        assert!(query.resolve(ts("2024-06-12T12:00:00Z")).is_err());
    }

    #[test]
    fn test_rejects_limit_out_of_range() {
        for limit in [0usize, 1001] {
            let query = HistoryQuery {
                start_time: None,
                end_time: None,
                interval: None,
                limit: Some(limit),
            };
            assert!(query.resolve(ts("2024-06-12T12:00:00Z")).is_err());
        }
    }

    #[test]
    fn test_rejects_inverted_range() {
        let query = HistoryQuery {
            start_time: Some("2024-06-12T12:00:00Z".to_string()),
            end_time: Some("2024-06-12T00:00:00Z".to_string()),
            interval: None,
            limit: None,
        };
        assert!(query.resolve(ts("2024-06-13T00:00:00Z")).is_err());
    }
}
