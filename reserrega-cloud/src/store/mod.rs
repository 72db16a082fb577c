//! Persistence seam used by the gate, the harness and the webhook
//!
//! [`PgStore`] is the production implementation; [`MemoryStore`] backs the
//! integration tests and local experiments.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::account::{AccountStatus, Role};
use shared::billing::{ResourceType, Subscription};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
pub type StoreResult<T> = Result<T, BoxError>;

/// User row as the gate needs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub company_id: String,
    pub email: String,
    pub hashed_password: String,
    pub role: Role,
    pub status: AccountStatus,
}

/// A capped company resource (tariff, budget, seat)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub id: String,
    pub company_id: String,
    pub resource_type: ResourceType,
    pub name: String,
    pub active: bool,
    pub created_at: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
    // Users

    async fn find_user(&self, user_id: &str) -> StoreResult<Option<UserRecord>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    // Subscriptions

    /// Most recent subscription row of a company by `updated_at`
    async fn current_subscription(&self, company_id: &str) -> StoreResult<Option<Subscription>>;

    /// Upsert by provider subscription id; rows without one are appended
    async fn save_subscription(&self, subscription: &Subscription) -> StoreResult<()>;

    // Sessions

    async fn revoke_session(&self, session_id: &str, expires_at: i64) -> StoreResult<()>;

    async fn is_session_revoked(&self, session_id: &str) -> StoreResult<bool>;

    /// Drop revocations whose token expired before `now`
    async fn purge_revoked_sessions(&self, now: i64) -> StoreResult<u64>;

    // Mock time (non-production harness)

    async fn mock_now(&self) -> StoreResult<Option<DateTime<Utc>>>;

    async fn set_mock_now(&self, now: DateTime<Utc>) -> StoreResult<()>;

    async fn clear_mock_now(&self) -> StoreResult<()>;

    // Resources

    /// Resources of one type, oldest first
    async fn list_resources(
        &self,
        company_id: &str,
        resource_type: ResourceType,
    ) -> StoreResult<Vec<ResourceRecord>>;

    async fn create_resource(&self, resource: &ResourceRecord) -> StoreResult<()>;

    async fn set_resource_active(&self, resource_id: &str, active: bool) -> StoreResult<()>;

    // Webhooks

    /// Returns `false` when the event was already processed
    async fn record_webhook_event(
        &self,
        event_id: &str,
        event_type: &str,
        processed_at: i64,
    ) -> StoreResult<bool>;

    /// Undo `record_webhook_event` after a failed apply
    async fn forget_webhook_event(&self, event_id: &str) -> StoreResult<()>;
}
