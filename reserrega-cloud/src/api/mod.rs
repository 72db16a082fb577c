//! API routes for reserrega-cloud

pub mod auth;
pub mod dashboard;
pub mod dev;
pub mod health;
pub mod stripe_webhook;
pub mod subscription;

use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use shared::error::AppError;
use tower_http::trace::TraceLayer;

use crate::auth::account_gate;
use crate::auth::rate_limit::login_rate_limit;
use crate::config::Environment;
use crate::error::ServiceError;
use crate::state::AppState;
use crate::store::BoxError;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Map a store or infrastructure error to a client error, sanitized in production
pub(crate) fn internal_error<E: Into<BoxError>>(
    environment: Environment,
) -> impl FnOnce(E) -> AppError {
    move |e| ServiceError::Db(e.into()).into_app_error(environment)
}

/// Create the combined router
///
/// Every route sits behind the account gate; public paths are let through by
/// the route policy table.
pub fn create_router(state: AppState) -> Router {
    let login = Router::new()
        .route("/api/auth/login", post(auth::login))
        .layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    // Stripe webhook (signature-verified, raw body)
    let webhook = Router::new().route("/stripe/webhook", post(stripe_webhook::handle_webhook));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/login", get(auth::login_page))
        .route("/api/auth/logout", post(auth::logout))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/settings", get(dashboard::get_settings))
        .route("/api/settings", get(dashboard::get_settings))
        .route("/api/store/overview", get(dashboard::store_overview))
        .route("/api/subscription", get(subscription::get_subscription))
        .route(
            "/api/subscription/resources/{resource_type}",
            get(subscription::list_resources).post(subscription::create_resource),
        )
        .merge(login)
        .merge(webhook)
        .merge(dev::router(state.clone()))
        .layer(middleware::from_fn_with_state(state.clone(), account_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
