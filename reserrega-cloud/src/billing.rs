//! Subscription state at request time
//!
//! Loads the current subscription of a company, evaluates the policy and
//! keeps capped resources in line with the effective plan.

use serde::Serialize;
use shared::billing::{
    ExpirationDays, PlanType, ResourceType, Subscription, SubscriptionDecision, evaluate,
    expiration_days, free_limit, should_mark_resource_inactive,
};

use crate::store::{ResourceRecord, Store, StoreResult};

/// Policy outcome plus the row it was computed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingState {
    pub decision: SubscriptionDecision,
    /// Stored plan, before any downgrade applied by the policy
    pub stored_plan: Option<PlanType>,
    pub current_period_end: Option<i64>,
    #[serde(flatten)]
    pub expiration: ExpirationDays,
}

impl BillingState {
    fn from_subscription(subscription: Option<&Subscription>, now_millis: i64) -> Self {
        let snapshot = subscription.map(|s| s.snapshot(now_millis));
        Self {
            decision: evaluate(snapshot.as_ref()),
            stored_plan: subscription.map(|s| s.plan),
            current_period_end: subscription.and_then(|s| s.current_period_end),
            expiration: expiration_days(
                subscription.and_then(|s| s.current_period_end),
                now_millis,
            ),
        }
    }
}

/// Evaluate the policy for a company at `now_millis`
///
/// A failed lookup is treated exactly like a missing row (fail-open).
pub async fn load_billing_state(store: &dyn Store, company_id: &str, now_millis: i64) -> BillingState {
    match store.current_subscription(company_id).await {
        Ok(subscription) => BillingState::from_subscription(subscription.as_ref(), now_millis),
        Err(e) => {
            tracing::warn!(
                company_id = %company_id,
                error = %e,
                "Subscription lookup failed, falling back to free plan"
            );
            BillingState::from_subscription(None, now_millis)
        }
    }
}

/// Resources whose `active` flag changed during a sweep
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSweep {
    pub deactivated: Vec<String>,
    pub reactivated: Vec<String>,
}

/// Align every capped resource of a company with `plan`
///
/// Resources are walked oldest first; those past the free cap are marked
/// inactive (never deleted). Under a paid plan everything is active again.
pub async fn enforce_plan_limits(
    store: &dyn Store,
    company_id: &str,
    plan: PlanType,
) -> StoreResult<ResourceSweep> {
    let mut sweep = ResourceSweep::default();
    for resource_type in ResourceType::ALL {
        let resources = store.list_resources(company_id, resource_type).await?;
        for (index, resource) in resources.iter().enumerate() {
            let active = !should_mark_resource_inactive(index, resource_type, plan);
            if resource.active == active {
                continue;
            }
            store.set_resource_active(&resource.id, active).await?;
            if active {
                sweep.reactivated.push(resource.id.clone());
            } else {
                sweep.deactivated.push(resource.id.clone());
            }
        }
    }

    if !sweep.deactivated.is_empty() || !sweep.reactivated.is_empty() {
        tracing::info!(
            company_id = %company_id,
            plan = plan.as_db(),
            deactivated = sweep.deactivated.len(),
            reactivated = sweep.reactivated.len(),
            "Resource limits enforced"
        );
    }
    Ok(sweep)
}

/// Downgrade sweep: apply the free caps regardless of the stored plan
pub async fn enforce_free_limits(store: &dyn Store, company_id: &str) -> StoreResult<ResourceSweep> {
    enforce_plan_limits(store, company_id, PlanType::Free).await
}

/// Persist a subscription row and re-align resources with the plan it grants
///
/// Shared by the payment webhook and the non-production harness, the only
/// two writers of subscription rows.
pub async fn apply_subscription(
    store: &dyn Store,
    subscription: &Subscription,
    now_millis: i64,
) -> StoreResult<ResourceSweep> {
    store.save_subscription(subscription).await?;
    let decision = evaluate(Some(&subscription.snapshot(now_millis)));
    tracing::info!(
        company_id = %subscription.company_id,
        status = subscription.status.as_db(),
        plan = subscription.plan.as_db(),
        effective_plan = decision.current_plan.as_db(),
        "Subscription saved"
    );
    enforce_plan_limits(store, &subscription.company_id, decision.current_plan).await
}

/// One resource as listed to the client
#[derive(Debug, Clone, Serialize)]
pub struct ResourceView {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub over_limit: bool,
    pub created_at: i64,
}

/// Resources of one type with the cap of the effective plan applied
#[derive(Debug, Clone, Serialize)]
pub struct ResourceOverview {
    pub resource_type: ResourceType,
    /// `None` when billing is not enforced
    pub plan: Option<PlanType>,
    /// `None` when the plan has no cap
    pub limit: Option<usize>,
    pub items: Vec<ResourceView>,
}

pub fn resource_overview(
    resource_type: ResourceType,
    plan: Option<PlanType>,
    resources: Vec<ResourceRecord>,
) -> ResourceOverview {
    let items = resources
        .into_iter()
        .enumerate()
        .map(|(index, r)| ResourceView {
            over_limit: plan
                .is_some_and(|p| should_mark_resource_inactive(index, resource_type, p)),
            id: r.id,
            name: r.name,
            active: r.active,
            created_at: r.created_at,
        })
        .collect();
    ResourceOverview {
        resource_type,
        plan,
        limit: (plan == Some(PlanType::Free)).then(|| free_limit(resource_type)),
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shared::billing::SubscriptionStatus;

    fn tariff(company: &str, n: i64) -> ResourceRecord {
        ResourceRecord {
            id: format!("tariff-{n}"),
            company_id: company.into(),
            resource_type: ResourceType::Tariffs,
            name: format!("Tariff {n}"),
            active: true,
            created_at: n,
        }
    }

    async fn past_due_pro(store: &MemoryStore) {
        store
            .save_subscription(&Subscription {
                company_id: "c-1".into(),
                plan: PlanType::Pro,
                status: SubscriptionStatus::PastDue,
                provider_subscription_id: None,
                current_period_end: None,
                updated_at: 1,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_row_and_failed_lookup_agree() {
        let store = MemoryStore::new();
        let missing = load_billing_state(&store, "c-1", 0).await;
        past_due_pro(&store).await;
        store.fail_subscription_lookups(true);
        let failed = load_billing_state(&store, "c-1", 0).await;

        assert_eq!(missing.decision, failed.decision);
        assert_eq!(missing.decision, SubscriptionDecision::fail_open());
    }

    #[tokio::test]
    async fn test_past_due_pro_with_four_tariffs() {
        let store = MemoryStore::new();
        past_due_pro(&store).await;
        for n in 0..4 {
            store.create_resource(&tariff("c-1", n)).await.unwrap();
        }

        let state = load_billing_state(&store, "c-1", 0).await;
        assert!(state.decision.can_create_resources);
        assert_eq!(state.decision.current_plan, PlanType::Free);
        assert_eq!(state.stored_plan, Some(PlanType::Pro));

        let sweep = enforce_plan_limits(&store, "c-1", state.decision.current_plan)
            .await
            .unwrap();
        assert_eq!(sweep.deactivated, vec!["tariff-3".to_string()]);

        let listed = store.list_resources("c-1", ResourceType::Tariffs).await.unwrap();
        let overview = resource_overview(ResourceType::Tariffs, Some(PlanType::Free), listed);
        let flags: Vec<bool> = overview.items.iter().map(|i| i.over_limit).collect();
        assert_eq!(flags, vec![false, false, false, true]);
        assert!(!overview.items[3].active);
        assert_eq!(overview.limit, Some(3));
    }

    #[tokio::test]
    async fn test_upgrade_reactivates_resources() {
        let store = MemoryStore::new();
        for n in 0..4 {
            store.create_resource(&tariff("c-1", n)).await.unwrap();
        }
        enforce_free_limits(&store, "c-1").await.unwrap();

        let sweep = enforce_plan_limits(&store, "c-1", PlanType::Pro).await.unwrap();
        assert_eq!(sweep.reactivated, vec!["tariff-3".to_string()]);
        assert!(sweep.deactivated.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let store = MemoryStore::new();
        for n in 0..6 {
            store.create_resource(&tariff("c-1", n)).await.unwrap();
        }
        let first = enforce_free_limits(&store, "c-1").await.unwrap();
        assert_eq!(first.deactivated.len(), 3);
        let second = enforce_free_limits(&store, "c-1").await.unwrap();
        assert_eq!(second, ResourceSweep::default());
    }
}
