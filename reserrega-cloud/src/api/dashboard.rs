//! Landing pages: dashboard, admin settings, store desk

use axum::{Extension, Json, extract::State};
use serde::Serialize;
use shared::account::Role;
use shared::billing::{ResourceType, SubscriptionDecision};

use crate::auth::GateContext;
use crate::state::AppState;

use super::{ApiResult, internal_error};

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub user_id: String,
    pub company_id: String,
    pub role: Role,
    /// Unix millis; the page warns before the session runs out
    pub session_expires_at: i64,
    /// Banner content; `None` when billing is not enforced
    pub subscription: Option<SubscriptionDecision>,
}

/// GET /dashboard
///
/// Safe landing page: it is never short-circuited by the inactive sanction,
/// so the blocked message and contact button can be shown here.
pub async fn dashboard(Extension(ctx): Extension<GateContext>) -> Json<DashboardView> {
    Json(DashboardView {
        user_id: ctx.user.user_id,
        company_id: ctx.user.company_id,
        role: ctx.user.role,
        session_expires_at: ctx.user.session_expires_at,
        subscription: ctx.billing.map(|b| b.decision),
    })
}

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub company_id: String,
    pub environment: &'static str,
    pub multi_tenant: bool,
    pub billing_enabled: bool,
    pub session_ttl_hours: i64,
}

/// GET /settings, GET /api/settings (admin only)
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(ctx): Extension<GateContext>,
) -> ApiResult<SettingsView> {
    Ok(Json(SettingsView {
        company_id: ctx.user.company_id,
        environment: state.environment.as_str(),
        multi_tenant: state.multi_tenant,
        billing_enabled: state.billing_enabled,
        session_ttl_hours: state.session_ttl_hours,
    }))
}

#[derive(Debug, Serialize)]
pub struct ResourceCount {
    pub resource_type: ResourceType,
    pub active: usize,
    pub inactive: usize,
}

/// GET /api/store/overview (sellers and admins)
pub async fn store_overview(
    State(state): State<AppState>,
    Extension(ctx): Extension<GateContext>,
) -> ApiResult<Vec<ResourceCount>> {
    let mut counts = Vec::with_capacity(ResourceType::ALL.len());
    for resource_type in ResourceType::ALL {
        let resources = state
            .store
            .list_resources(&ctx.user.company_id, resource_type)
            .await
            .map_err(internal_error(state.environment))?;
        let active = resources.iter().filter(|r| r.active).count();
        counts.push(ResourceCount {
            resource_type,
            active,
            inactive: resources.len() - active,
        });
    }
    Ok(Json(counts))
}
