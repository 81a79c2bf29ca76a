//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/stats`   : connected clients and dispatch counters (JSON)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app_state::AppState;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.stats();
    Json(json!({
        "clients": state.core().clients.len(),
        "dispatched_total": stats.dispatched_total(),
        "in_flight": stats.in_flight(),
        "max_concurrent_dispatch": stats.max_concurrent(),
    }))
}
