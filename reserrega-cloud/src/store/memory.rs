//! In-memory store
//!
//! Failure switches let tests exercise the fail-open (billing) and
//! fail-closed (identity) paths of the gate.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::billing::{ResourceType, Subscription};
use tokio::sync::RwLock;

use super::{ResourceRecord, Store, StoreResult, UserRecord};

#[derive(Default)]
struct Inner {
    users: HashMap<String, UserRecord>,
    /// Append-only history, current = latest `updated_at`
    subscriptions: Vec<Subscription>,
    revoked_sessions: HashMap<String, i64>,
    mock_now: Option<DateTime<Utc>>,
    resources: Vec<ResourceRecord>,
    webhook_events: HashSet<String>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    fail_subscription_lookups: Arc<AtomicBool>,
    fail_user_lookups: Arc<AtomicBool>,
    fail_next_save: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: UserRecord) {
        self.inner.write().await.users.insert(user.id.clone(), user);
    }

    pub async fn set_user_status(&self, user_id: &str, status: shared::account::AccountStatus) {
        if let Some(user) = self.inner.write().await.users.get_mut(user_id) {
            user.status = status;
        }
    }

    /// Make every subscription lookup fail until switched off
    pub fn fail_subscription_lookups(&self, fail: bool) {
        self.fail_subscription_lookups.store(fail, Ordering::SeqCst);
    }

    /// Make every user lookup fail until switched off
    pub fn fail_user_lookups(&self, fail: bool) {
        self.fail_user_lookups.store(fail, Ordering::SeqCst);
    }

    /// Make the next `save_subscription` fail once
    pub fn fail_next_subscription_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }

    pub async fn resources(&self, company_id: &str) -> Vec<ResourceRecord> {
        self.inner
            .read()
            .await
            .resources
            .iter()
            .filter(|r| r.company_id == company_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, user_id: &str) -> StoreResult<Option<UserRecord>> {
        if self.fail_user_lookups.load(Ordering::SeqCst) {
            return Err("user lookup unavailable".into());
        }
        Ok(self.inner.read().await.users.get(user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        if self.fail_user_lookups.load(Ordering::SeqCst) {
            return Err("user lookup unavailable".into());
        }
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn current_subscription(&self, company_id: &str) -> StoreResult<Option<Subscription>> {
        if self.fail_subscription_lookups.load(Ordering::SeqCst) {
            return Err("subscription lookup unavailable".into());
        }
        // max_by_key keeps the last of equal maxima, so a later write wins ties
        Ok(self
            .inner
            .read()
            .await
            .subscriptions
            .iter()
            .filter(|s| s.company_id == company_id)
            .max_by_key(|s| s.updated_at)
            .cloned())
    }

    async fn save_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err("subscription write failed".into());
        }
        let mut inner = self.inner.write().await;
        if let Some(provider_id) = &subscription.provider_subscription_id
            && let Some(existing) = inner
                .subscriptions
                .iter_mut()
                .find(|s| s.provider_subscription_id.as_ref() == Some(provider_id))
        {
            *existing = subscription.clone();
            return Ok(());
        }
        inner.subscriptions.push(subscription.clone());
        Ok(())
    }

    async fn revoke_session(&self, session_id: &str, expires_at: i64) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .revoked_sessions
            .insert(session_id.to_owned(), expires_at);
        Ok(())
    }

    async fn is_session_revoked(&self, session_id: &str) -> StoreResult<bool> {
        Ok(self
            .inner
            .read()
            .await
            .revoked_sessions
            .contains_key(session_id))
    }

    async fn purge_revoked_sessions(&self, now: i64) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.revoked_sessions.len();
        inner.revoked_sessions.retain(|_, expires_at| *expires_at >= now);
        Ok((before - inner.revoked_sessions.len()) as u64)
    }

    async fn mock_now(&self) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self.inner.read().await.mock_now)
    }

    async fn set_mock_now(&self, now: DateTime<Utc>) -> StoreResult<()> {
        self.inner.write().await.mock_now = Some(now);
        Ok(())
    }

    async fn clear_mock_now(&self) -> StoreResult<()> {
        self.inner.write().await.mock_now = None;
        Ok(())
    }

    async fn list_resources(
        &self,
        company_id: &str,
        resource_type: ResourceType,
    ) -> StoreResult<Vec<ResourceRecord>> {
        let mut out: Vec<ResourceRecord> = self
            .inner
            .read()
            .await
            .resources
            .iter()
            .filter(|r| r.company_id == company_id && r.resource_type == resource_type)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn create_resource(&self, resource: &ResourceRecord) -> StoreResult<()> {
        self.inner.write().await.resources.push(resource.clone());
        Ok(())
    }

    async fn set_resource_active(&self, resource_id: &str, active: bool) -> StoreResult<()> {
        if let Some(r) = self
            .inner
            .write()
            .await
            .resources
            .iter_mut()
            .find(|r| r.id == resource_id)
        {
            r.active = active;
        }
        Ok(())
    }

    async fn record_webhook_event(
        &self,
        event_id: &str,
        _event_type: &str,
        _processed_at: i64,
    ) -> StoreResult<bool> {
        Ok(self
            .inner
            .write()
            .await
            .webhook_events
            .insert(event_id.to_owned()))
    }

    async fn forget_webhook_event(&self, event_id: &str) -> StoreResult<()> {
        self.inner.write().await.webhook_events.remove(event_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::billing::{PlanType, SubscriptionStatus};

    fn sub(company: &str, status: SubscriptionStatus, updated_at: i64) -> Subscription {
        Subscription {
            company_id: company.into(),
            plan: PlanType::Pro,
            status,
            provider_subscription_id: None,
            current_period_end: None,
            updated_at,
        }
    }

    #[tokio::test]
    async fn test_current_subscription_is_latest() {
        let store = MemoryStore::new();
        store.save_subscription(&sub("c-1", SubscriptionStatus::Active, 20)).await.unwrap();
        store.save_subscription(&sub("c-1", SubscriptionStatus::Canceled, 10)).await.unwrap();
        store.save_subscription(&sub("c-2", SubscriptionStatus::Inactive, 99)).await.unwrap();

        let current = store.current_subscription("c-1").await.unwrap().unwrap();
        assert_eq!(current.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn test_provider_rows_are_upserted() {
        let store = MemoryStore::new();
        let mut s = sub("c-1", SubscriptionStatus::Active, 1);
        s.provider_subscription_id = Some("sub_1".into());
        store.save_subscription(&s).await.unwrap();
        s.status = SubscriptionStatus::PastDue;
        s.updated_at = 2;
        store.save_subscription(&s).await.unwrap();

        assert_eq!(store.inner.read().await.subscriptions.len(), 1);
        let current = store.current_subscription("c-1").await.unwrap().unwrap();
        assert_eq!(current.status, SubscriptionStatus::PastDue);
    }

    #[tokio::test]
    async fn test_lookup_failure_switch() {
        let store = MemoryStore::new();
        store.fail_subscription_lookups(true);
        assert!(store.current_subscription("c-1").await.is_err());
        store.fail_subscription_lookups(false);
        assert!(store.current_subscription("c-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_webhook_events_are_idempotent() {
        let store = MemoryStore::new();
        assert!(store.record_webhook_event("evt_1", "x", 0).await.unwrap());
        assert!(!store.record_webhook_event("evt_1", "x", 0).await.unwrap());

        store.forget_webhook_event("evt_1").await.unwrap();
        assert!(store.record_webhook_event("evt_1", "x", 0).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_save_is_one_shot() {
        let store = MemoryStore::new();
        store.fail_next_subscription_save();
        assert!(store.save_subscription(&sub("c-1", SubscriptionStatus::Active, 1)).await.is_err());
        store.save_subscription(&sub("c-1", SubscriptionStatus::Active, 1)).await.unwrap();
        assert!(store.current_subscription("c-1").await.unwrap().is_some());
    }
}
