use shared::billing::{PlanType, Subscription, SubscriptionStatus};
use sqlx::PgPool;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    company_id: String,
    plan: String,
    status: String,
    provider_subscription_id: Option<String>,
    current_period_end: Option<i64>,
    updated_at: i64,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = BoxError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let plan = PlanType::from_db(&row.plan)
            .ok_or_else(|| format!("Unknown plan in subscriptions: {}", row.plan))?;
        let status = SubscriptionStatus::from_db(&row.status)
            .ok_or_else(|| format!("Unknown status in subscriptions: {}", row.status))?;
        Ok(Subscription {
            company_id: row.company_id,
            plan,
            status,
            provider_subscription_id: row.provider_subscription_id,
            current_period_end: row.current_period_end,
            updated_at: row.updated_at,
        })
    }
}

/// Current subscription of a company (most recent row)
pub async fn find_current(
    pool: &PgPool,
    company_id: &str,
) -> Result<Option<Subscription>, BoxError> {
    let row = sqlx::query_as::<_, SubscriptionRow>(
        "SELECT company_id, plan, status, provider_subscription_id, current_period_end, updated_at
            FROM subscriptions
            WHERE company_id = $1
            ORDER BY updated_at DESC
            LIMIT 1",
    )
    .bind(company_id)
    .fetch_optional(pool)
    .await?;

    row.map(Subscription::try_from).transpose()
}

/// Provider-backed rows are upserted on the provider id
pub async fn upsert_provider(pool: &PgPool, sub: &Subscription, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO subscriptions (id, company_id, plan, status, provider_subscription_id, current_period_end, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (provider_subscription_id) DO UPDATE SET
            company_id = $2, plan = $3, status = $4,
            current_period_end = $6, updated_at = $7",
    )
    .bind(id)
    .bind(&sub.company_id)
    .bind(sub.plan.as_db())
    .bind(sub.status.as_db())
    .bind(&sub.provider_subscription_id)
    .bind(sub.current_period_end)
    .bind(sub.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Rows without a provider id (harness) are appended
pub async fn insert(pool: &PgPool, sub: &Subscription, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO subscriptions (id, company_id, plan, status, provider_subscription_id, current_period_end, updated_at)
         VALUES ($1, $2, $3, $4, NULL, $5, $6)",
    )
    .bind(id)
    .bind(&sub.company_id)
    .bind(sub.plan.as_db())
    .bind(sub.status.as_db())
    .bind(sub.current_period_end)
    .bind(sub.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}
