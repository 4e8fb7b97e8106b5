//! # Time-Series Foundation
//!
//! Interval alignment, time ranges and the generator trait every simulator
//! implements. Generators are lazy and stateless: the same input timestamp
//! always recomputes the same output, which makes range queries
//! restartable, parallelisable over disjoint timestamps and replay-correct
//! after arbitrary seeking.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// Supported generation intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalMinutes {
    FifteenMinutes,
    OneHour,
}

impl IntervalMinutes {
    pub fn minutes(&self) -> i64 {
        match self {
            IntervalMinutes::FifteenMinutes => 15,
            IntervalMinutes::OneHour => 60,
        }
    }

    pub fn seconds(&self) -> i64 {
        self.minutes() * 60
    }

    pub fn as_duration(&self) -> Duration {
        Duration::minutes(self.minutes())
    }

    /// Parse the wire form used by the REST API (`15min` / `1hour`).
    pub fn from_wire(value: &str) -> Result<Self, SimulationError> {
        match value {
            "15min" => Ok(IntervalMinutes::FifteenMinutes),
            "1hour" => Ok(IntervalMinutes::OneHour),
            other => Err(SimulationError::InvalidInterval(other.to_string())),
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            IntervalMinutes::FifteenMinutes => "15min",
            IntervalMinutes::OneHour => "1hour",
        }
    }
}

/// Floor a timestamp to the greatest interval boundary at or before it (UTC).
pub fn align_timestamp(timestamp: DateTime<Utc>, interval: IntervalMinutes) -> DateTime<Utc> {
    let interval_secs = interval.seconds();
    let aligned = timestamp.timestamp().div_euclid(interval_secs) * interval_secs;
    Utc.timestamp_opt(aligned, 0)
        .single()
        .expect("aligned epoch seconds are always representable")
}

/// A validated half-open-by-construction time range (`start < end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SimulationError> {
        if start >= end {
            return Err(SimulationError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn from_iso(start_iso: &str, end_iso: &str) -> Result<Self, SimulationError> {
        let start = parse_timestamp(start_iso)?;
        let end = parse_timestamp(end_iso)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Number of whole intervals contained in the range.
    pub fn count_intervals(&self, interval: IntervalMinutes) -> i64 {
        let total_minutes = (self.end - self.start).num_minutes();
        total_minutes / interval.minutes()
    }
}

/// Parse an ISO-8601 timestamp, assuming UTC when no offset is given.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, SimulationError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    // Offset-free form, interpreted as UTC.
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(SimulationError::InvalidTimestamp(value.to_string()))
}

/// A single point in a generated series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint<T> {
    pub timestamp: DateTime<Utc>,
    pub value: T,
}

impl<T> TimeSeriesPoint<T> {
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

/// Common surface of every feed generator.
///
/// `generate_value` is the single domain-specific hook; everything else is
/// alignment and iteration plumbing shared by all implementations.
pub trait TimeSeriesGenerator {
    type Value;

    fn entity_id(&self) -> &str;

    fn interval(&self) -> IntervalMinutes;

    /// Generate the value for an already-aligned timestamp.
    fn generate_value(&self, timestamp: DateTime<Utc>) -> Self::Value;

    /// Align the input timestamp and generate a point at the boundary.
    fn generate_at(&self, timestamp: DateTime<Utc>) -> TimeSeriesPoint<Self::Value> {
        let aligned = align_timestamp(timestamp, self.interval());
        TimeSeriesPoint {
            timestamp: aligned,
            value: self.generate_value(aligned),
        }
    }

    /// Lazily walk aligned timestamps from `floor(start)` through
    /// `floor(end)` inclusive. Month- and year-scale queries must not
    /// materialise eagerly, so this is the primary range accessor.
    fn iterate_range(&self, range: &TimeRange) -> RangeIter<'_, Self>
    where
        Self: Sized,
    {
        RangeIter {
            generator: self,
            current: align_timestamp(range.start(), self.interval()),
            end: align_timestamp(range.end(), self.interval()),
        }
    }

    /// Eager variant of [`iterate_range`](Self::iterate_range).
    fn generate_range(&self, range: &TimeRange) -> Vec<TimeSeriesPoint<Self::Value>>
    where
        Self: Sized,
    {
        self.iterate_range(range).collect()
    }

    /// Generate `count` consecutive points starting at `floor(start)`.
    fn generate_batch(
        &self,
        start: DateTime<Utc>,
        count: usize,
    ) -> Vec<TimeSeriesPoint<Self::Value>>
    where
        Self: Sized,
    {
        let step = self.interval().as_duration();
        let mut current = align_timestamp(start, self.interval());
        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            points.push(TimeSeriesPoint {
                timestamp: current,
                value: self.generate_value(current),
            });
            current += step;
        }
        points
    }
}

/// Lazy iterator over aligned timestamps of a range.
pub struct RangeIter<'a, G: TimeSeriesGenerator> {
    generator: &'a G,
    current: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl<G: TimeSeriesGenerator> Iterator for RangeIter<'_, G> {
    type Item = TimeSeriesPoint<G::Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current > self.end {
            return None;
        }
        let point = TimeSeriesPoint {
            timestamp: self.current,
            value: self.generator.generate_value(self.current),
        };
        self.current += self.generator.interval().as_duration();
        Some(point)
    }
}
