use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::billing::{ResourceType, Subscription};
use sqlx::PgPool;

use super::{ResourceRecord, Store, StoreResult, UserRecord};
use crate::db;

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user(&self, user_id: &str) -> StoreResult<Option<UserRecord>> {
        db::users::find_by_id(&self.pool, user_id).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        db::users::find_by_email(&self.pool, email).await
    }

    async fn current_subscription(&self, company_id: &str) -> StoreResult<Option<Subscription>> {
        db::subscriptions::find_current(&self.pool, company_id).await
    }

    async fn save_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        let id = uuid::Uuid::new_v4().to_string();
        if subscription.provider_subscription_id.is_some() {
            db::subscriptions::upsert_provider(&self.pool, subscription, &id).await?;
        } else {
            db::subscriptions::insert(&self.pool, subscription, &id).await?;
        }
        Ok(())
    }

    async fn revoke_session(&self, session_id: &str, expires_at: i64) -> StoreResult<()> {
        db::sessions::revoke(&self.pool, session_id, expires_at).await?;
        Ok(())
    }

    async fn is_session_revoked(&self, session_id: &str) -> StoreResult<bool> {
        Ok(db::sessions::is_revoked(&self.pool, session_id).await?)
    }

    async fn purge_revoked_sessions(&self, now: i64) -> StoreResult<u64> {
        Ok(db::sessions::purge_expired(&self.pool, now).await?)
    }

    async fn mock_now(&self) -> StoreResult<Option<DateTime<Utc>>> {
        let Some(raw) = db::app_config::get(&self.pool, db::app_config::MOCK_NOW_KEY).await? else {
            return Ok(None);
        };
        let parsed = DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| format!("Invalid mock_now value {raw:?}: {e}"))?;
        Ok(Some(parsed.with_timezone(&Utc)))
    }

    async fn set_mock_now(&self, now: DateTime<Utc>) -> StoreResult<()> {
        db::app_config::set(&self.pool, db::app_config::MOCK_NOW_KEY, &now.to_rfc3339()).await?;
        Ok(())
    }

    async fn clear_mock_now(&self) -> StoreResult<()> {
        db::app_config::delete(&self.pool, db::app_config::MOCK_NOW_KEY).await?;
        Ok(())
    }

    async fn list_resources(
        &self,
        company_id: &str,
        resource_type: ResourceType,
    ) -> StoreResult<Vec<ResourceRecord>> {
        Ok(db::resources::list(&self.pool, company_id, resource_type).await?)
    }

    async fn create_resource(&self, resource: &ResourceRecord) -> StoreResult<()> {
        db::resources::create(&self.pool, resource).await?;
        Ok(())
    }

    async fn set_resource_active(&self, resource_id: &str, active: bool) -> StoreResult<()> {
        db::resources::set_active(&self.pool, resource_id, active).await?;
        Ok(())
    }

    async fn record_webhook_event(
        &self,
        event_id: &str,
        event_type: &str,
        processed_at: i64,
    ) -> StoreResult<bool> {
        Ok(db::webhook_events::record(&self.pool, event_id, event_type, processed_at).await?)
    }

    async fn forget_webhook_event(&self, event_id: &str) -> StoreResult<()> {
        db::webhook_events::forget(&self.pool, event_id).await?;
        Ok(())
    }
}
