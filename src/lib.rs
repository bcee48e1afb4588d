//! Collection routing service
//!
//! Sweep clustering of daily pickup demand into capacity- and time-bounded
//! vehicle clusters, nearest-neighbor tour sequencing and multi-day
//! carry-forward scheduling, served over an axum REST API backed by
//! PostgreSQL.

pub mod algorithms;
pub mod cache;
pub mod config;
pub mod controllers;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use middleware::cors::cors_middleware;
use state::AppState;

/// Build the full application router
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/locations", routes::location_routes::create_location_router())
        .nest("/vehicles", routes::vehicle_routes::create_vehicle_router())
        .nest("/pengepul", routes::daily_demand_routes::create_daily_demand_router())
        .nest("/clusters", routes::clustering_routes::create_clustering_router());

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(cors_middleware(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness check, does not touch the database
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "travel_cache": {
            "entries": state.travel_cache.len().await,
            "redis": state.travel_cache.has_redis(),
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
