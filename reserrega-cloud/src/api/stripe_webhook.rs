//! Stripe webhook handler
//!
//! POST /stripe/webhook: subscription lifecycle events (raw body for signature verification)

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use shared::billing::{PlanType, Subscription, SubscriptionStatus};
use shared::error::{AppError, ErrorCode};

use crate::billing;
use crate::clock::RequestClock;
use crate::state::AppState;
use crate::stripe;

/// Handle incoming Stripe webhook events
///
/// Must receive the raw body (not JSON) for HMAC signature verification.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // 1. Stripe-Signature header
    let Some(sig_header) = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Missing Stripe-Signature header");
        return AppError::new(ErrorCode::WebhookSignatureInvalid).into_response();
    };

    // 2. Verify signature
    let now = state.clock.now();
    if let Err(e) = stripe::verify_webhook_signature(
        &body,
        sig_header,
        &state.stripe_webhook_secret,
        now.timestamp(),
    ) {
        tracing::warn!(error = %e, "Webhook signature verification failed");
        return AppError::new(ErrorCode::WebhookSignatureInvalid).into_response();
    }

    // 3. Parse JSON event
    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse webhook JSON");
            return AppError::new(ErrorCode::WebhookPayloadInvalid).into_response();
        }
    };

    let event_type = event["type"].as_str().unwrap_or("");
    let Some(event_id) = event["id"].as_str() else {
        tracing::warn!("Webhook event missing id");
        return AppError::with_message(ErrorCode::WebhookPayloadInvalid, "Event id is missing")
            .into_response();
    };
    tracing::info!(event_type = event_type, event_id = event_id, "Received Stripe webhook");

    // 4. Idempotency: record first, a duplicate insert means already handled
    match state
        .store
        .record_webhook_event(event_id, event_type, now.timestamp_millis())
        .await
    {
        Ok(false) => {
            tracing::info!(event_id = event_id, "Duplicate webhook event, skipping");
            return StatusCode::OK.into_response();
        }
        Err(e) => {
            tracing::error!(%e, "Store error recording webhook event");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        Ok(true) => {}
    }

    // 5. Handle event types
    let status = match event_type {
        "customer.subscription.created" | "customer.subscription.updated" => {
            handle_subscription_changed(&state, &event, false).await
        }
        "customer.subscription.deleted" => handle_subscription_changed(&state, &event, true).await,
        _ => {
            tracing::debug!(event_type = event_type, "Unhandled webhook event type");
            StatusCode::OK
        }
    };

    // A failed apply must not swallow Stripe's retry
    if status.is_server_error()
        && let Err(e) = state.store.forget_webhook_event(event_id).await
    {
        tracing::error!(%e, event_id = event_id, "Failed to release webhook event for retry");
    }
    status.into_response()
}

/// customer.subscription.* → write the subscription row, re-align resources
async fn handle_subscription_changed(
    state: &AppState,
    event: &serde_json::Value,
    deleted: bool,
) -> StatusCode {
    let Some(obj) = event.get("data").and_then(|d| d.get("object")) else {
        return StatusCode::OK;
    };

    let Some(sub_id) = obj["id"].as_str() else {
        tracing::warn!("Subscription event missing id");
        return StatusCode::OK;
    };

    let Some(company_id) = obj
        .get("metadata")
        .and_then(|m| m["company_id"].as_str())
        .filter(|c| !c.is_empty())
    else {
        tracing::warn!(subscription_id = sub_id, "Subscription event without metadata.company_id");
        return StatusCode::OK;
    };

    let status = if deleted {
        SubscriptionStatus::Canceled
    } else {
        let raw = obj["status"].as_str().unwrap_or("");
        match stripe::map_provider_status(raw) {
            Some(s) => s,
            None => {
                tracing::warn!(subscription_id = sub_id, status = raw, "Unknown Stripe subscription status");
                return StatusCode::OK;
            }
        }
    };

    let plan = match state.prices.plan_of(obj) {
        Some(plan) => plan,
        None => {
            tracing::warn!(subscription_id = sub_id, "Could not resolve plan, keeping current plan");
            current_plan(state, company_id).await
        }
    };

    let subscription = Subscription {
        company_id: company_id.to_string(),
        plan,
        status,
        provider_subscription_id: Some(sub_id.to_string()),
        current_period_end: period_end_millis(obj),
        updated_at: state.clock.now().timestamp_millis(),
    };

    let clock = RequestClock::resolve(state.environment, &*state.store, &*state.clock).await;
    match billing::apply_subscription(&*state.store, &subscription, clock.now_millis()).await {
        Ok(sweep) => {
            tracing::info!(
                company_id = company_id,
                subscription_id = sub_id,
                status = status.as_db(),
                plan = plan.as_db(),
                deactivated = sweep.deactivated.len(),
                reactivated = sweep.reactivated.len(),
                "Subscription updated from Stripe"
            );
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(%e, subscription_id = sub_id, "Failed to apply subscription");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn current_plan(state: &AppState, company_id: &str) -> PlanType {
    match state.store.current_subscription(company_id).await {
        Ok(Some(sub)) => sub.plan,
        Ok(None) => PlanType::Free,
        Err(e) => {
            tracing::warn!(%e, company_id = company_id, "Subscription lookup failed, assuming free");
            PlanType::Free
        }
    }
}

/// Period end in millis; Stripe sends seconds, on the object or on its first item
fn period_end_millis(obj: &serde_json::Value) -> Option<i64> {
    obj["current_period_end"]
        .as_i64()
        .or_else(|| {
            obj.get("items")
                .and_then(|i| i.get("data"))
                .and_then(|d| d.as_array())
                .and_then(|a| a.first())
                .and_then(|item| item["current_period_end"].as_i64())
        })
        .and_then(|secs| secs.checked_mul(1000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_end_from_object_or_item() {
        let top = serde_json::json!({"current_period_end": 1_700_000_000});
        assert_eq!(period_end_millis(&top), Some(1_700_000_000_000));

        let item = serde_json::json!({"items": {"data": [{"current_period_end": 5}]}});
        assert_eq!(period_end_millis(&item), Some(5_000));

        let huge = serde_json::json!({"current_period_end": i64::MAX});
        assert_eq!(period_end_millis(&huge), None);

        assert_eq!(period_end_millis(&serde_json::json!({})), None);
    }
}
