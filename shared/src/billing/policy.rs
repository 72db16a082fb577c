//! Subscription state policy
//!
//! Maps the current subscription of a company to what the account may do.
//! The table is ordered and the first matching branch wins:
//!
//! | # | Condition            | blocked | can_upgrade | can_create_resources | contact | plan   |
//! |---|----------------------|---------|-------------|----------------------|---------|--------|
//! | 1 | no row / lookup fail | no      | yes         | yes                  | no      | free   |
//! | 2 | inactive             | yes     | no          | no                   | yes     | stored |
//! | 3 | canceled             | no      | yes         | stored plan is free  | yes     | free   |
//! | 4 | past_due             | no      | yes         | yes (free caps)      | no      | free   |
//! | 5 | trialing             | no      | yes         | yes                  | no      | stored |
//! | 6 | active               | no      | yes         | yes                  | no      | stored |
//!
//! State transitions never happen here; the payment webhook or the
//! non-production harness rewrites the row and the next request re-evaluates.

use serde::{Deserialize, Serialize};

use super::{PlanType, SubscriptionStatus};

/// Safe landing page for sanctioned companies
pub const SANCTION_REDIRECT: &str = "/dashboard";

/// Days after a failed charge before the provider gives up retrying
pub const PAST_DUE_GRACE_DAYS: i64 = 7;

/// Policy input: the persisted row plus expiration days at "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    pub status: SubscriptionStatus,
    pub plan: PlanType,
    pub days_until_expiration: Option<i64>,
    pub days_expired: Option<i64>,
}

/// Which row of the decision table applied to an existing row (rows 2 to 6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyBranch {
    Sanctioned,
    Canceled,
    PastDue,
    Trialing,
    Active,
}

impl PolicyBranch {
    /// Select the decision table row for a snapshot
    pub fn classify(snapshot: &SubscriptionSnapshot) -> Self {
        match snapshot.status {
            SubscriptionStatus::Inactive => Self::Sanctioned,
            SubscriptionStatus::Canceled => Self::Canceled,
            SubscriptionStatus::PastDue => Self::PastDue,
            SubscriptionStatus::Trialing => Self::Trialing,
            SubscriptionStatus::Active => Self::Active,
        }
    }
}

/// Immutable outcome of the policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionDecision {
    pub status: SubscriptionStatus,
    pub blocked: bool,
    pub redirect_to: Option<String>,
    pub message: String,
    pub can_upgrade: bool,
    pub can_create_resources: bool,
    pub show_contact_button: bool,
    /// Effective plan for entitlement checks, not necessarily the stored one
    pub current_plan: PlanType,
}

impl SubscriptionDecision {
    /// Decision used when there is no subscription data at all
    pub fn fail_open() -> Self {
        Self {
            status: SubscriptionStatus::Active,
            blocked: false,
            redirect_to: None,
            message: String::new(),
            can_upgrade: true,
            can_create_resources: true,
            show_contact_button: false,
            current_plan: PlanType::Free,
        }
    }

    /// True only for the inactive sanction
    pub fn is_sanctioned(&self) -> bool {
        self.blocked && self.status == SubscriptionStatus::Inactive
    }
}

/// Evaluate the policy. `None` covers both "no row" and "lookup failed".
pub fn evaluate(snapshot: Option<&SubscriptionSnapshot>) -> SubscriptionDecision {
    let Some(snapshot) = snapshot else {
        return SubscriptionDecision::fail_open();
    };

    match PolicyBranch::classify(snapshot) {
        PolicyBranch::Sanctioned => SubscriptionDecision {
            status: SubscriptionStatus::Inactive,
            blocked: true,
            redirect_to: Some(SANCTION_REDIRECT.to_string()),
            message: "Your account has been suspended. Contact support to restore access."
                .to_string(),
            can_upgrade: false,
            can_create_resources: false,
            show_contact_button: true,
            current_plan: snapshot.plan,
        },
        PolicyBranch::Canceled => SubscriptionDecision {
            status: SubscriptionStatus::Canceled,
            blocked: false,
            redirect_to: None,
            message: canceled_message(snapshot),
            can_upgrade: true,
            can_create_resources: snapshot.plan == PlanType::Free,
            show_contact_button: true,
            current_plan: PlanType::Free,
        },
        PolicyBranch::PastDue => SubscriptionDecision {
            status: SubscriptionStatus::PastDue,
            blocked: false,
            redirect_to: None,
            message: past_due_message(snapshot),
            can_upgrade: true,
            can_create_resources: true,
            show_contact_button: false,
            current_plan: PlanType::Free,
        },
        PolicyBranch::Trialing => SubscriptionDecision {
            status: SubscriptionStatus::Trialing,
            blocked: false,
            redirect_to: None,
            message: trial_message(snapshot),
            can_upgrade: true,
            can_create_resources: true,
            show_contact_button: false,
            current_plan: snapshot.plan,
        },
        PolicyBranch::Active => SubscriptionDecision {
            status: SubscriptionStatus::Active,
            blocked: false,
            redirect_to: None,
            message: String::new(),
            can_upgrade: true,
            can_create_resources: true,
            show_contact_button: false,
            current_plan: snapshot.plan,
        },
    }
}

fn canceled_message(snapshot: &SubscriptionSnapshot) -> String {
    if snapshot.plan == PlanType::Free {
        "Your subscription has been canceled. You are on the Free plan.".to_string()
    } else {
        format!(
            "Your {} subscription has been canceled. Free plan limits apply until you upgrade again.",
            snapshot.plan.display_name()
        )
    }
}

fn past_due_message(snapshot: &SubscriptionSnapshot) -> String {
    let base = "Your last payment failed. Free plan limits apply until the payment method is updated.";
    match snapshot.days_expired {
        Some(days) if days < PAST_DUE_GRACE_DAYS => {
            let left = PAST_DUE_GRACE_DAYS - days;
            format!("{base} {} left before the subscription is canceled.", plural_days(left))
        }
        Some(_) => format!("{base} The grace period has ended."),
        None => base.to_string(),
    }
}

fn trial_message(snapshot: &SubscriptionSnapshot) -> String {
    let plan = snapshot.plan.display_name();
    match (snapshot.days_until_expiration, snapshot.days_expired) {
        (Some(days), _) => format!("You are trying the {plan} plan. {} remaining.", plural_days(days)),
        (None, Some(_)) => format!("Your {plan} trial has ended."),
        (None, None) => format!("You are trying the {plan} plan."),
    }
}

fn plural_days(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}
