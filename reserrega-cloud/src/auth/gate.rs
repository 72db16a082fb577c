//! Account gate
//!
//! Runs in front of every route. For protected paths, in order:
//!
//! 1. verify the session token and that it was not revoked
//! 2. reload role and account status from the user record
//! 3. inactive account: sign out, redirect to `/login?reason=account_inactive`
//! 4. multi-tenant with billing: evaluate the subscription policy; the
//!    inactive sanction signs out and redirects to `/dashboard`
//! 5. role check from the route policy table
//!
//! Session and user errors fail closed. Subscription lookup errors fail open.

use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use shared::account::AccountStatus;
use shared::billing::policy::SANCTION_REDIRECT;
use shared::error::{AppError, ErrorCode};

use super::route_policy::{self, Access};
use super::session::{self, CurrentUser};
use crate::billing::{self, BillingState};
use crate::clock::RequestClock;
use crate::state::AppState;

pub const LOGIN_PAGE: &str = "/login";
pub const ACCOUNT_INACTIVE_REDIRECT: &str = "/login?reason=account_inactive";

/// Everything the gate resolved, available to handlers as an extension
#[derive(Debug, Clone)]
pub struct GateContext {
    pub user: CurrentUser,
    /// `None` when billing is disabled or the deployment is single-tenant
    pub billing: Option<BillingState>,
    pub clock: RequestClock,
}

pub async fn account_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let access = route_policy::resolve(&path);
    if access == Access::Public {
        return next.run(request).await;
    }
    let api = route_policy::is_api_path(&path);
    let secure = state.environment.is_production();

    // 1. Session
    let Some(token) = session::extract_token(request.headers()) else {
        return unauthenticated(api, None, secure);
    };
    let claims = match session::decode_token(&token, &state.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => return unauthenticated(api, Some(e.code), secure),
    };
    match state.store.is_session_revoked(&claims.sid).await {
        Ok(false) => {}
        Ok(true) => return unauthenticated(api, Some(ErrorCode::SessionExpired), secure),
        Err(e) => {
            tracing::warn!(error = %e, "Session revocation check failed, denying request");
            return unauthenticated(api, None, secure);
        }
    }

    // 2. User record
    let user = match state.store.find_user(&claims.sub).await {
        Ok(Some(user)) if user.company_id == claims.company_id => user,
        Ok(_) => {
            tracing::debug!(user_id = %claims.sub, "Session user missing or moved company");
            return unauthenticated(api, None, secure);
        }
        Err(e) => {
            tracing::warn!(user_id = %claims.sub, error = %e, "User lookup failed, denying request");
            return unauthenticated(api, None, secure);
        }
    };

    // 3. Account sanction
    if user.status == AccountStatus::Inactive {
        tracing::info!(user_id = %user.id, "Inactive account, signing out");
        return sign_out(&state, &claims.sid, claims.expires_at_millis(), ACCOUNT_INACTIVE_REDIRECT)
            .await;
    }

    let clock = RequestClock::resolve(state.environment, &*state.store, &*state.clock).await;

    // 4. Subscription policy
    let billing = if state.multi_tenant && state.billing_enabled {
        Some(billing::load_billing_state(&*state.store, &user.company_id, clock.now_millis()).await)
    } else {
        None
    };
    if let Some(b) = &billing
        && b.decision.is_sanctioned()
        && path != SANCTION_REDIRECT
    {
        tracing::info!(
            company_id = %user.company_id,
            user_id = %user.id,
            path = %path,
            "Company subscription inactive, signing out"
        );
        let target = b.decision.redirect_to.as_deref().unwrap_or(SANCTION_REDIRECT);
        return sign_out(&state, &claims.sid, claims.expires_at_millis(), target).await;
    }

    // 5. Role
    if !access.allows(user.role) {
        tracing::debug!(user_id = %user.id, role = user.role.as_db(), path = %path, "Role denied");
        return if api {
            AppError::new(ErrorCode::RoleRequired).into_response()
        } else {
            Redirect::to(SANCTION_REDIRECT).into_response()
        };
    }

    let session_expires_at = claims.expires_at_millis();
    request.extensions_mut().insert(GateContext {
        user: CurrentUser {
            user_id: user.id,
            company_id: user.company_id,
            role: user.role,
            session_id: claims.sid,
            session_expires_at,
        },
        billing,
        clock,
    });

    next.run(request).await
}

/// Fail closed: 401 for the API, login redirect for pages. The cookie is
/// cleared so a broken session is not replayed.
fn unauthenticated(api: bool, code: Option<ErrorCode>, secure: bool) -> Response {
    let clear = AppendHeaders([(SET_COOKIE, session::clear_cookie(secure))]);
    if api {
        let err = AppError::new(code.unwrap_or(ErrorCode::NotAuthenticated));
        (clear, err).into_response()
    } else {
        (clear, Redirect::to(LOGIN_PAGE)).into_response()
    }
}

/// Revoke the session, clear the cookie and redirect
async fn sign_out(state: &AppState, session_id: &str, expires_at: i64, target: &str) -> Response {
    if let Err(e) = state.store.revoke_session(session_id, expires_at).await {
        // The cookie is still cleared; the token stays valid until expiry
        tracing::error!(error = %e, "Failed to revoke session");
    }
    let clear = AppendHeaders([(SET_COOKIE, session::clear_cookie(state.environment.is_production()))]);
    (clear, Redirect::to(target)).into_response()
}
