//! Cross-instance determinism properties: independent engines built from
//! the same configuration must agree byte-for-byte, regardless of query
//! order.

use chrono::{DateTime, Duration, Utc};

use facis_sim::config::{Config, ConsumerEntry, MeterEntry, PvSystemEntry};
use facis_sim::core::engine::SimulationEngine;
use facis_sim::core::{align_timestamp, IntervalMinutes};
use facis_sim::domain::{ConsumerLoadConfig, MeterConfig, PvConfig};

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn test_config(seed: u64) -> Config {
    let mut config = Config::default();
    config.simulation.seed = seed;
    config.simulation.start_time = Some("2024-06-12T00:00:00Z".to_string());
    config.meters.push(MeterEntry {
        id: "meter-001".to_string(),
        modbus_unit_id: Some(1),
        meter: MeterConfig::default(),
    });
    config.pv_systems.push(PvSystemEntry {
        id: "pv-001".to_string(),
        pv: PvConfig::default(),
    });
    config.consumers.push(ConsumerEntry {
        id: "oven-001".to_string(),
        consumer: ConsumerLoadConfig::default(),
    });
    config
}

fn engine(seed: u64) -> SimulationEngine {
    SimulationEngine::new(test_config(seed)).unwrap()
}

/// Property 1: two independent engine instances produce identical
/// readings, field by field, for every entity and timestamp.
#[test]
fn independent_instances_agree() {
    let a = engine(12345);
    let b = engine(12345);

    let mut timestamp = ts("2024-06-12T00:00:00Z");
    for _ in 0..96 {
        for entity in a.entity_ids() {
            let reading_a = a.generate_at(&entity, timestamp).unwrap();
            let reading_b = b.generate_at(&entity, timestamp).unwrap();
            // Wire payloads are canonical JSON with fixed rounding, so
            // string equality is byte-for-byte equality.
            assert_eq!(
                reading_a.to_wire().to_string(),
                reading_b.to_wire().to_string(),
                "mismatch for {entity} at {timestamp}"
            );
            assert_eq!(reading_a, reading_b);
        }
        timestamp += Duration::minutes(15);
    }
}

/// Different seeds must not agree.
#[test]
fn different_seeds_disagree() {
    let a = engine(12345);
    let b = engine(54321);
    let timestamp = ts("2024-06-12T12:00:00Z");

    for entity in ["meter-001", "weather-001", "epex-spot-de"] {
        assert_ne!(
            a.generate_at(entity, timestamp).unwrap(),
            b.generate_at(entity, timestamp).unwrap()
        );
    }
}

/// Property 2: the multiset of readings over a set of timestamps is
/// independent of query order.
#[test]
fn query_order_is_irrelevant() {
    let eng = engine(12345);

    let timestamps: Vec<DateTime<Utc>> = (0..48)
        .map(|i| ts("2024-06-12T00:00:00Z") + Duration::minutes(15 * i))
        .collect();

    let forward: Vec<String> = timestamps
        .iter()
        .map(|t| eng.generate_at("meter-001", *t).unwrap().to_wire().to_string())
        .collect();

    // Reverse, then a shuffled-ish interleaved order.
    let backward: Vec<String> = timestamps
        .iter()
        .rev()
        .map(|t| eng.generate_at("meter-001", *t).unwrap().to_wire().to_string())
        .collect();

    let interleaved: Vec<String> = timestamps
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let index = if i % 2 == 0 { i / 2 } else { timestamps.len() - 1 - i / 2 };
            eng.generate_at("meter-001", timestamps[index])
                .unwrap()
                .to_wire()
                .to_string()
        })
        .collect();

    let mut sorted_forward = forward.clone();
    sorted_forward.sort();
    let mut sorted_backward = backward;
    sorted_backward.sort();
    let mut sorted_interleaved = interleaved;
    sorted_interleaved.sort();

    assert_eq!(sorted_forward, sorted_backward);
    assert_eq!(sorted_forward, sorted_interleaved);
}

/// Property 3: alignment is idempotent and generation aligns its input.
#[test]
fn alignment_idempotence() {
    let eng = engine(12345);

    for raw in [
        "2024-06-12T10:07:42Z",
        "2024-06-12T10:00:00Z",
        "2024-12-31T23:59:59Z",
        "2024-02-29T13:14:15Z",
    ] {
        let t = ts(raw);
        for interval in [IntervalMinutes::FifteenMinutes, IntervalMinutes::OneHour] {
            let once = align_timestamp(t, interval);
            assert_eq!(align_timestamp(once, interval), once);
        }

        for entity in eng.entity_ids() {
            let raw_reading = eng.generate_at(&entity, t).unwrap();
            let aligned_reading = eng
                .generate_at(&entity, align_timestamp(t, IntervalMinutes::FifteenMinutes))
                .unwrap();
            assert_eq!(raw_reading, aligned_reading);
        }
    }
}

/// Correlated snapshots inherit all of the above: identical across
/// instances and internally aligned.
#[test]
fn snapshots_agree_across_instances() {
    let a = engine(12345);
    let b = engine(12345);

    let mut timestamp = ts("2024-06-21T00:00:00Z");
    for _ in 0..24 {
        let snap_a = a.correlation().generate_snapshot(timestamp);
        let snap_b = b.correlation().generate_snapshot(timestamp);
        assert_eq!(snap_a.to_wire().to_string(), snap_b.to_wire().to_string());

        for reading in &snap_a.meter_readings {
            assert_eq!(reading.timestamp, snap_a.timestamp);
        }
        for reading in &snap_a.pv_readings {
            assert_eq!(reading.timestamp, snap_a.timestamp);
        }
        timestamp += Duration::hours(1);
    }
}

/// Reset with the original seed restores the exact stream; a range query
/// before the reset does not perturb anything (laziness, no hidden
/// state).
#[test]
fn reset_restores_streams() {
    let mut eng = engine(12345);
    let timestamp = ts("2024-06-12T10:00:00Z");

    let before = eng.generate_at("pv-001", timestamp).unwrap();

    // Burn through a day of range queries.
    let range = facis_sim::core::TimeRange::new(
        ts("2024-06-12T00:00:00Z"),
        ts("2024-06-13T00:00:00Z"),
    )
    .unwrap();
    let _ = eng
        .generate_range("pv-001", &range, IntervalMinutes::FifteenMinutes, 1000)
        .unwrap();

    let after_queries = eng.generate_at("pv-001", timestamp).unwrap();
    assert_eq!(before, after_queries);

    eng.reset(None, None).unwrap();
    let after_reset = eng.generate_at("pv-001", timestamp).unwrap();
    assert_eq!(before, after_reset);
}
