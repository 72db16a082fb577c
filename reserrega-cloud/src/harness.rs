//! Time-travel harness (non-production only)
//!
//! Overrides "now" for expiration math and writes subscription rows without
//! going through the payment provider. Every action checks the environment
//! before anything else.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared::billing::{PlanType, Subscription, SubscriptionStatus};
use shared::error::{AppError, ErrorCode};

use crate::billing::{self, ResourceSweep};
use crate::clock::Clock;
use crate::config::Environment;
use crate::error::ServiceResult;
use crate::store::Store;

/// Largest single jump accepted by `advance_mock_time`
pub const MAX_ADVANCE_DAYS: i64 = 3650;

pub fn ensure_non_production(environment: Environment) -> Result<(), AppError> {
    if environment.is_production() {
        return Err(AppError::new(ErrorCode::NotAvailableInProduction));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MockTimeStatus {
    pub mock_now: Option<DateTime<Utc>>,
    pub effective_now: DateTime<Utc>,
}

pub async fn mock_time_status(
    environment: Environment,
    store: &dyn Store,
    clock: &dyn Clock,
) -> ServiceResult<MockTimeStatus> {
    ensure_non_production(environment)?;
    let mock_now = store.mock_now().await?;
    Ok(MockTimeStatus {
        mock_now,
        effective_now: mock_now.unwrap_or_else(|| clock.now()),
    })
}

pub async fn set_mock_time(
    environment: Environment,
    store: &dyn Store,
    now: DateTime<Utc>,
) -> ServiceResult<DateTime<Utc>> {
    ensure_non_production(environment)?;
    store.set_mock_now(now).await?;
    tracing::info!(mock_now = %now, "Mock time set");
    Ok(now)
}

/// Move mock time forward (or back) by whole days, starting from the wall
/// clock when no mock time is set.
pub async fn advance_mock_time(
    environment: Environment,
    store: &dyn Store,
    clock: &dyn Clock,
    days: i64,
) -> ServiceResult<DateTime<Utc>> {
    ensure_non_production(environment)?;
    if days.abs() > MAX_ADVANCE_DAYS {
        return Err(AppError::validation(format!(
            "days must be within ±{MAX_ADVANCE_DAYS}"
        ))
        .into());
    }

    let base = store.mock_now().await?.unwrap_or_else(|| clock.now());
    let next = Duration::try_days(days)
        .and_then(|d| base.checked_add_signed(d))
        .ok_or_else(|| AppError::validation("days out of range"))?;
    store.set_mock_now(next).await?;
    tracing::info!(days, mock_now = %next, "Mock time advanced");
    Ok(next)
}

pub async fn clear_mock_time(environment: Environment, store: &dyn Store) -> ServiceResult<()> {
    ensure_non_production(environment)?;
    store.clear_mock_now().await?;
    tracing::info!("Mock time cleared");
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetSubscription {
    pub company_id: String,
    pub plan: PlanType,
    pub status: SubscriptionStatus,
    /// Unix millis
    pub current_period_end: Option<i64>,
}

/// Write a subscription row as if the provider had sent it
///
/// The row is stamped after the current one so it always becomes current.
pub async fn set_subscription(
    environment: Environment,
    store: &dyn Store,
    clock: &dyn Clock,
    input: SetSubscription,
) -> ServiceResult<(Subscription, ResourceSweep)> {
    ensure_non_production(environment)?;
    if input.company_id.trim().is_empty() {
        return Err(AppError::with_message(ErrorCode::RequiredField, "company_id is required").into());
    }
    if let Some(end) = input.current_period_end
        && DateTime::from_timestamp_millis(end).is_none()
    {
        return Err(AppError::validation("current_period_end out of range").into());
    }

    let wall = clock.now().timestamp_millis();
    let previous = store.current_subscription(&input.company_id).await?;
    let updated_at = previous.map_or(wall, |p| wall.max(p.updated_at + 1));

    let subscription = Subscription {
        company_id: input.company_id,
        plan: input.plan,
        status: input.status,
        provider_subscription_id: None,
        current_period_end: input.current_period_end,
        updated_at,
    };

    // Entitlements follow the effective clock so mock time drives expiration
    let effective_now = store
        .mock_now()
        .await?
        .map_or(wall, |t| t.timestamp_millis());
    let sweep = billing::apply_subscription(store, &subscription, effective_now).await?;
    Ok((subscription, sweep))
}
