//! REST contract tests over the full router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use parking_lot::RwLock;
use serde_json::Value;
use tower::ServiceExt;

use facis_sim::api::{self, AppState};
use facis_sim::config::{Config, ConsumerEntry, MeterEntry, PvSystemEntry};
use facis_sim::core::engine::SimulationEngine;
use facis_sim::domain::{ConsumerLoadConfig, MeterConfig, PvConfig};

fn test_app() -> Router {
    let mut config = Config::default();
    config.simulation.seed = 12345;
    config.simulation.start_time = Some("2024-06-12T12:00:00Z".to_string());
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

    let engine = Arc::new(RwLock::new(SimulationEngine::new(config).unwrap()));
    api::router(AppState::new(engine))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_reports_service() {
    let app = test_app();
    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "facis-sim");
}

#[tokio::test]
async fn config_roundtrip() {
    let app = test_app();

    let (status, body) = get(&app, "/api/v1/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seed"], 12345);
    assert_eq!(body["state"], "initialized");
    assert_eq!(body["entity_ids"].as_array().unwrap().len(), 5);

    let (status, body) = post(
        &app,
        "/api/v1/config",
        serde_json::json!({"seed": 777, "acceleration": 60}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seed"], 777);
    assert_eq!(body["acceleration"], 60);
}

#[tokio::test]
async fn config_rejects_bad_acceleration() {
    let app = test_app();
    let (status, body) = post(
        &app,
        "/api/v1/config",
        serde_json::json!({"acceleration": 5000}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");
}

#[tokio::test]
async fn meters_list_current_history() {
    let app = test_app();

    let (status, body) = get(&app, "/api/v1/meters").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ids"], serde_json::json!(["meter-001"]));

    let (status, body) = get(&app, "/api/v1/meters/meter-001/current").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reading"]["meter_id"], "meter-001");
    assert_eq!(body["reading"]["timestamp"], "2024-06-12T12:00:00Z");
    assert!(body["reading"]["readings"]["active_power_l1_w"].is_number());

    let (status, body) = get(
        &app,
        "/api/v1/meters/meter-001/history?start_time=2024-06-12T00:00:00Z&end_time=2024-06-12T06:00:00Z&interval=15min&limit=10",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 10);
    assert_eq!(body["has_more"], true);
    assert_eq!(body["interval"], "15min");
    assert_eq!(body["start_time"], "2024-06-12T00:00:00Z");

    // Energy tracking: monotone non-decreasing across the page.
    let readings = body["readings"].as_array().unwrap();
    let mut previous = f64::NEG_INFINITY;
    for reading in readings {
        let energy = reading["readings"]["total_energy_kwh"].as_f64().unwrap();
        assert!(energy >= previous);
        previous = energy;
    }
}

#[tokio::test]
async fn unknown_entity_is_404() {
    let app = test_app();

    for uri in [
        "/api/v1/meters/meter-042/current",
        "/api/v1/pv/pv-042/history",
        "/api/v1/weather/nowhere/current",
        "/api/v1/loads/ghost/current",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"], "NotFound");
    }
}

#[tokio::test]
async fn invalid_history_params_are_400() {
    let app = test_app();

    let (status, _) = get(&app, "/api/v1/meters/meter-001/history?interval=5min").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/api/v1/meters/meter-001/history?limit=2000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(
        &app,
        "/api/v1/meters/meter-001/history?start_time=2024-06-12T12:00:00Z&end_time=2024-06-12T00:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pv_current_has_expected_fields() {
    let app = test_app();
    let (status, body) = get(&app, "/api/v1/pv/pv-001/current").await;

    assert_eq!(status, StatusCode::OK);
    let readings = &body["reading"]["readings"];
    for field in [
        "power_output_kw",
        "daily_energy_kwh",
        "irradiance_w_m2",
        "module_temperature_c",
        "efficiency_pct",
    ] {
        assert!(readings[field].is_number(), "missing {field}");
    }
}

#[tokio::test]
async fn price_forecast_spans_requested_horizon() {
    let app = test_app();

    let (status, body) = get(&app, "/api/v1/prices/forecast?hours=24&interval=1hour").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interval"], "1hour");
    // Inclusive alignment yields horizon + 1 points.
    assert_eq!(body["count"], 25);
    assert_eq!(body["start_time"], "2024-06-12T12:00:00Z");

    let (status, _) = get(&app, "/api/v1/prices/forecast?hours=200").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn weather_current_matches_wire_shape() {
    let app = test_app();
    let (status, body) = get(&app, "/api/v1/weather/weather-001/current").await;

    assert_eq!(status, StatusCode::OK);
    let conditions = &body["reading"]["conditions"];
    assert!(conditions["ghi_w_m2"].as_f64().unwrap() >= 0.0);
    assert!(conditions["temperature_c"].is_number());
    assert_eq!(body["reading"]["location"]["latitude"], 52.52);
}

#[tokio::test]
async fn simulation_lifecycle_over_http() {
    let app = test_app();

    let (status, body) = get(&app, "/api/v1/simulation/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "initialized");
    assert_eq!(body["simulation_time"], "2024-06-12T12:00:00Z");

    let (status, body) = post(&app, "/api/v1/simulation/start", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "running");

    let (status, body) = post(&app, "/api/v1/simulation/pause", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "paused");

    let (status, body) = post(
        &app,
        "/api/v1/simulation/reset",
        serde_json::json!({"seed": 999, "start_time": "2024-01-01T00:00:00Z"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "initialized");
    assert_eq!(body["seed"], 999);
    assert_eq!(body["simulation_time"], "2024-01-01T00:00:00Z");
}

#[tokio::test]
async fn identical_engines_serve_identical_responses() {
    let app_a = test_app();
    let app_b = test_app();

    for uri in [
        "/api/v1/meters/meter-001/current",
        "/api/v1/pv/pv-001/current",
        "/api/v1/weather/weather-001/current",
        "/api/v1/prices/current",
        "/api/v1/loads/oven-001/current",
    ] {
        let (_, body_a) = get(&app_a, uri).await;
        let (_, body_b) = get(&app_b, uri).await;
        assert_eq!(body_a, body_b, "{uri}");
    }
}
