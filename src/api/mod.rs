//! # REST Surface
//!
//! Axum router over the engine facade. Handlers are thin adapters: decode
//! parameters, call the engine, serialise the wire payload.

pub mod config;
pub mod error;
pub mod health;
pub mod loads;
pub mod meters;
pub mod prices;
pub mod pv;
pub mod response;
pub mod simulation;
pub mod v1;
pub mod weather;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::core::engine::SharedEngine;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
}

impl AppState {
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", v1::router(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
