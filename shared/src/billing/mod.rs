//! Subscription billing domain
//!
//! Subscription rows are written by the payment provider webhook (or the
//! non-production harness); everything in here only reads them.

pub mod expiration;
pub mod limits;
pub mod policy;

pub use expiration::{ExpirationDays, expiration_days};
pub use limits::{FREE_PLAN_LIMITS, free_limit, should_mark_resource_inactive};
pub use policy::{PolicyBranch, SubscriptionDecision, SubscriptionSnapshot, evaluate};

use serde::{Deserialize, Serialize};

/// Subscription status as persisted by the payment webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid and in good standing
    Active,
    /// Trial period, full access
    Trialing,
    /// Charge failed, provider is retrying
    PastDue,
    /// Terminated by the customer or after retries ran out
    Canceled,
    /// Sanction applied by the operator
    Inactive,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 5] = [
        Self::Active,
        Self::Trialing,
        Self::PastDue,
        Self::Canceled,
        Self::Inactive,
    ];

    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "trialing" => Some(Self::Trialing),
            "past_due" => Some(Self::PastDue),
            "canceled" => Some(Self::Canceled),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Inactive => "inactive",
        }
    }

    /// Statuses that cap entitlements at the free plan
    pub fn forces_free_plan(&self) -> bool {
        matches!(self, Self::PastDue | Self::Canceled)
    }
}

/// Plan type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Free,
    Pro,
    Enterprise,
}

impl PlanType {
    pub const ALL: [PlanType; 3] = [Self::Free, Self::Pro, Self::Enterprise];

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Self::Free),
            "pro" => Some(Self::Pro),
            "enterprise" => Some(Self::Enterprise),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Name shown to end users
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Pro => "Pro",
            Self::Enterprise => "Enterprise",
        }
    }
}

/// Resource kinds that carry a free-plan cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Tariffs,
    Budgets,
    Users,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [Self::Tariffs, Self::Budgets, Self::Users];

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "tariffs" => Some(Self::Tariffs),
            "budgets" => Some(Self::Budgets),
            "users" => Some(Self::Users),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Tariffs => "tariffs",
            Self::Budgets => "budgets",
            Self::Users => "users",
        }
    }
}

/// Current subscription row of a company (most recent by `updated_at`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub company_id: String,
    pub plan: PlanType,
    pub status: SubscriptionStatus,
    /// Payment provider subscription id, absent for harness-created rows
    pub provider_subscription_id: Option<String>,
    /// End of the current billing or trial period (Unix millis)
    pub current_period_end: Option<i64>,
    /// Unix millis
    pub updated_at: i64,
}

impl Subscription {
    /// Snapshot of this row as seen at `now_millis`
    pub fn snapshot(&self, now_millis: i64) -> SubscriptionSnapshot {
        let days = expiration_days(self.current_period_end, now_millis);
        SubscriptionSnapshot {
            status: self.status,
            plan: self.plan,
            days_until_expiration: days.days_until_expiration,
            days_expired: days.days_expired,
        }
    }
}
