//! Authentication endpoints: login page, login, logout

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use shared::account::Role;
use shared::error::{AppError, ErrorCode};

use super::internal_error;
use crate::auth::session;
use crate::state::AppState;
use crate::util::verify_password;

/// POST /api/auth/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
    pub company_id: String,
    pub role: Role,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let email = req.email.trim().to_lowercase();
    let user = state
        .store
        .find_user_by_email(&email)
        .await
        .map_err(internal_error(state.environment))?
        .ok_or_else(|| AppError::new(ErrorCode::InvalidCredentials))?;

    if !verify_password(&req.password, &user.hashed_password) {
        return Err(AppError::new(ErrorCode::InvalidCredentials));
    }

    if !user.status.can_login() {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let (token, claims) = session::create_token(
        &user.id,
        &user.company_id,
        user.role,
        &state.jwt_secret,
        state.session_ttl_hours,
    )
    .map_err(internal_error(state.environment))?;

    tracing::info!(user_id = %user.id, company_id = %user.company_id, sid = %claims.sid, "User logged in");

    let cookie = session::session_cookie(
        &token,
        state.session_ttl_hours,
        state.environment.is_production(),
    );
    let body = LoginResponse {
        token,
        user_id: user.id,
        company_id: user.company_id,
        role: user.role,
    };
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Json(body)).into_response())
}

/// POST /api/auth/logout
///
/// Always clears the cookie; a still-valid token is also revoked.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    if let Some(token) = session::extract_token(&headers)
        && let Ok(claims) = session::decode_token(&token, &state.jwt_secret)
    {
        state
            .store
            .revoke_session(&claims.sid, claims.expires_at_millis())
            .await
            .map_err(internal_error(state.environment))?;
        tracing::info!(user_id = %claims.sub, sid = %claims.sid, "User logged out");
    }

    let cookie = session::clear_cookie(state.environment.is_production());
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(serde_json::json!({ "logged_out": true })),
    )
        .into_response())
}

#[derive(Deserialize)]
pub struct LoginPageQuery {
    pub reason: Option<String>,
}

/// GET /login
pub async fn login_page(Query(query): Query<LoginPageQuery>) -> Json<serde_json::Value> {
    let notice = match query.reason.as_deref() {
        Some("account_inactive") => Some(ErrorCode::AccountDisabled.message()),
        _ => None,
    };
    Json(serde_json::json!({
        "login_endpoint": "/api/auth/login",
        "notice": notice,
    }))
}
