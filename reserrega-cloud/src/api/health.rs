//! Health check endpoint

use axum::{Json, extract::State};

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "reserrega-cloud",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.environment.as_str(),
    }))
}
