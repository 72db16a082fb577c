//! Time-travel harness endpoints
//!
//! The router layer rejects production before any extractor runs, and each
//! harness action re-checks the environment as its first statement.

use axum::{
    Json, Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::billing::Subscription;

use crate::billing::ResourceSweep;
use crate::harness::{self, MockTimeStatus, SetSubscription};
use crate::state::AppState;

use super::ApiResult;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/dev/time", get(get_time).post(set_time).delete(clear_time))
        .route("/api/dev/time/advance", post(advance_time))
        .route("/api/dev/subscription", post(set_subscription))
        .layer(middleware::from_fn_with_state(state, non_production_only))
}

async fn non_production_only(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = harness::ensure_non_production(state.environment) {
        tracing::warn!(path = %request.uri().path(), "Harness request rejected in production");
        return e.into_response();
    }
    next.run(request).await
}

/// GET /api/dev/time
pub async fn get_time(State(state): State<AppState>) -> ApiResult<MockTimeStatus> {
    let status = harness::mock_time_status(state.environment, &*state.store, &*state.clock)
        .await
        .map_err(|e| e.into_app_error(state.environment))?;
    Ok(Json(status))
}

#[derive(Debug, Deserialize)]
pub struct SetTimeRequest {
    /// RFC 3339
    pub now: DateTime<Utc>,
}

/// POST /api/dev/time
pub async fn set_time(
    State(state): State<AppState>,
    Json(req): Json<SetTimeRequest>,
) -> ApiResult<MockTimeStatus> {
    let now = harness::set_mock_time(state.environment, &*state.store, req.now)
        .await
        .map_err(|e| e.into_app_error(state.environment))?;
    Ok(Json(MockTimeStatus {
        mock_now: Some(now),
        effective_now: now,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AdvanceTimeRequest {
    pub days: i64,
}

/// POST /api/dev/time/advance
pub async fn advance_time(
    State(state): State<AppState>,
    Json(req): Json<AdvanceTimeRequest>,
) -> ApiResult<MockTimeStatus> {
    let now = harness::advance_mock_time(state.environment, &*state.store, &*state.clock, req.days)
        .await
        .map_err(|e| e.into_app_error(state.environment))?;
    Ok(Json(MockTimeStatus {
        mock_now: Some(now),
        effective_now: now,
    }))
}

/// DELETE /api/dev/time
pub async fn clear_time(State(state): State<AppState>) -> ApiResult<MockTimeStatus> {
    harness::clear_mock_time(state.environment, &*state.store)
        .await
        .map_err(|e| e.into_app_error(state.environment))?;
    Ok(Json(MockTimeStatus {
        mock_now: None,
        effective_now: state.clock.now(),
    }))
}

#[derive(Debug, Serialize)]
pub struct SetSubscriptionResponse {
    pub subscription: Subscription,
    pub resources: ResourceSweep,
}

/// POST /api/dev/subscription
pub async fn set_subscription(
    State(state): State<AppState>,
    Json(req): Json<SetSubscription>,
) -> ApiResult<SetSubscriptionResponse> {
    let (subscription, resources) =
        harness::set_subscription(state.environment, &*state.store, &*state.clock, req)
            .await
            .map_err(|e| e.into_app_error(state.environment))?;
    Ok(Json(SetSubscriptionResponse {
        subscription,
        resources,
    }))
}
