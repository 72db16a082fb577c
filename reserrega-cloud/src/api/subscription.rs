//! Subscription status and capped resources of the caller's company

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::billing::{
    FREE_PLAN_LIMITS, PlanType, ResourceType, SubscriptionDecision, should_mark_resource_inactive,
};
use shared::error::{AppError, ErrorCode};

use crate::auth::GateContext;
use crate::billing::{self, BillingState, ResourceOverview, ResourceView};
use crate::state::AppState;
use crate::store::ResourceRecord;

use super::{ApiResult, internal_error};

#[derive(Debug, Serialize)]
pub struct FreeLimit {
    pub resource_type: ResourceType,
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub company_id: String,
    pub billing_enforced: bool,
    pub decision: SubscriptionDecision,
    pub stored_plan: Option<PlanType>,
    pub current_period_end: Option<i64>,
    pub days_until_expiration: Option<i64>,
    pub days_expired: Option<i64>,
    pub free_limits: Vec<FreeLimit>,
    /// The instant expiration math used
    pub now: DateTime<Utc>,
    pub mock_time: bool,
}

/// GET /api/subscription
pub async fn get_subscription(
    Extension(ctx): Extension<GateContext>,
) -> ApiResult<SubscriptionResponse> {
    let free_limits = FREE_PLAN_LIMITS
        .iter()
        .map(|&(resource_type, limit)| FreeLimit {
            resource_type,
            limit,
        })
        .collect();

    let response = match ctx.billing {
        Some(BillingState {
            decision,
            stored_plan,
            current_period_end,
            expiration,
        }) => SubscriptionResponse {
            company_id: ctx.user.company_id,
            billing_enforced: true,
            decision,
            stored_plan,
            current_period_end,
            days_until_expiration: expiration.days_until_expiration,
            days_expired: expiration.days_expired,
            free_limits,
            now: ctx.clock.now,
            mock_time: ctx.clock.mocked,
        },
        None => SubscriptionResponse {
            company_id: ctx.user.company_id,
            billing_enforced: false,
            decision: SubscriptionDecision::fail_open(),
            stored_plan: None,
            current_period_end: None,
            days_until_expiration: None,
            days_expired: None,
            free_limits: Vec::new(),
            now: ctx.clock.now,
            mock_time: ctx.clock.mocked,
        },
    };
    Ok(Json(response))
}

fn parse_resource_type(raw: &str) -> Result<ResourceType, AppError> {
    ResourceType::from_db(raw).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::UnknownResourceType,
            format!("Unknown resource type: {raw}"),
        )
    })
}

/// GET /api/subscription/resources/{resource_type}
pub async fn list_resources(
    State(state): State<AppState>,
    Extension(ctx): Extension<GateContext>,
    Path(resource_type): Path<String>,
) -> ApiResult<ResourceOverview> {
    let resource_type = parse_resource_type(&resource_type)?;
    let resources = state
        .store
        .list_resources(&ctx.user.company_id, resource_type)
        .await
        .map_err(internal_error(state.environment))?;
    let plan = ctx.billing.as_ref().map(|b| b.decision.current_plan);
    Ok(Json(billing::resource_overview(resource_type, plan, resources)))
}

#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    pub name: String,
}

/// POST /api/subscription/resources/{resource_type}
pub async fn create_resource(
    State(state): State<AppState>,
    Extension(ctx): Extension<GateContext>,
    Path(resource_type): Path<String>,
    Json(req): Json<CreateResourceRequest>,
) -> Result<(StatusCode, Json<ResourceView>), AppError> {
    let resource_type = parse_resource_type(&resource_type)?;
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::with_message(ErrorCode::RequiredField, "name is required"));
    }

    let existing = state
        .store
        .list_resources(&ctx.user.company_id, resource_type)
        .await
        .map_err(internal_error(state.environment))?;

    if let Some(b) = &ctx.billing {
        if !b.decision.can_create_resources {
            return Err(AppError::with_message(
                ErrorCode::FeatureNotAvailable,
                b.decision.message.clone(),
            ));
        }
        if should_mark_resource_inactive(existing.len(), resource_type, b.decision.current_plan) {
            return Err(AppError::new(ErrorCode::ResourceLimitReached)
                .with_detail("resource_type", resource_type.as_db())
                .with_detail("limit", shared::billing::free_limit(resource_type)));
        }
    }

    let record = ResourceRecord {
        id: uuid::Uuid::new_v4().to_string(),
        company_id: ctx.user.company_id.clone(),
        resource_type,
        name: name.to_string(),
        active: true,
        created_at: state.clock.now().timestamp_millis(),
    };
    state
        .store
        .create_resource(&record)
        .await
        .map_err(internal_error(state.environment))?;

    tracing::info!(
        company_id = %record.company_id,
        resource_type = resource_type.as_db(),
        resource_id = %record.id,
        "Resource created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ResourceView {
            id: record.id,
            name: record.name,
            active: true,
            over_limit: false,
            created_at: record.created_at,
        }),
    ))
}
