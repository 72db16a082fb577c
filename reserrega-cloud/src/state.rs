//! Application state for reserrega-cloud

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::rate_limit::RateLimiter;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, Environment};
use crate::store::{BoxError, PgStore, Store};
use crate::stripe::PriceCatalog;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Wall clock; mock time is layered on top per request
    pub clock: Arc<dyn Clock>,
    pub environment: Environment,
    /// JWT secret for session tokens
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    pub prices: PriceCatalog,
    pub multi_tenant: bool,
    pub billing_enabled: bool,
    /// Rate limiter for the login route
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Connect to PostgreSQL, run migrations and build the state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self::with_store(
            config,
            Arc::new(PgStore::new(pool)),
            Arc::new(SystemClock),
        ))
    }

    /// Build the state around an existing store and clock
    pub fn with_store(config: &Config, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            environment: config.environment,
            jwt_secret: config.jwt_secret.clone(),
            session_ttl_hours: config.session_ttl_hours,
            stripe_webhook_secret: config.stripe_webhook_secret.clone(),
            prices: PriceCatalog {
                pro_price_id: config.stripe_pro_price_id.clone(),
                enterprise_price_id: config.stripe_enterprise_price_id.clone(),
            },
            multi_tenant: config.multi_tenant,
            billing_enabled: config.billing_enabled,
            rate_limiter: RateLimiter::new(),
        }
    }
}
