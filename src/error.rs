use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors produced by the simulation core.
///
/// Validation and state violations are recoverable and are translated by the
/// API layer; configuration errors are fatal at engine construction.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Invalid time range: start {start} must be before end {end}")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Unsupported interval: {0} (expected 15min or 1hour)")]
    InvalidInterval(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Cannot advance simulation time backwards (current {current}, requested {requested})")]
    TimeReversal {
        current: DateTime<Utc>,
        requested: DateTime<Utc>,
    },

    #[error("Acceleration must be between 1 and 1000, got {0}")]
    InvalidAcceleration(u32),

    #[error("Limit must be between 1 and 1000, got {0}")]
    LimitExceeded(usize),

    #[error("Duplicate entity id: {0}")]
    DuplicateEntity(String),

    #[error("Weather station '{station_id}' referenced by PV system '{system_id}' does not exist")]
    MissingWeatherStation {
        station_id: String,
        system_id: String,
    },

    #[error("Modbus unit id must be between 1 and 247, got {0}")]
    InvalidUnitId(u8),
}

pub type Result<T> = std::result::Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimulationError::UnknownEntity("meter-042".to_string());
        assert_eq!(err.to_string(), "Unknown entity: meter-042");

        let err = SimulationError::InvalidUnitId(0);
        assert_eq!(err.to_string(), "Modbus unit id must be between 1 and 247, got 0");
    }
}
