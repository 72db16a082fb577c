//! Cloud server configuration

use std::fmt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Deployment environment
///
/// The single switch behind the time-travel harness, detailed error
/// messages and secure cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Unknown values are treated as production
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "test" => Self::Development,
            "staging" => Self::Staging,
            _ => Self::Production,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloud server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: Environment,
    /// JWT secret for session tokens
    pub jwt_secret: String,
    /// Session lifetime
    pub session_ttl_hours: i64,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Stripe Price ID for the Pro plan
    pub stripe_pro_price_id: String,
    /// Stripe Price ID for the Enterprise plan
    pub stripe_enterprise_price_id: String,
    /// Companies are separate tenants
    pub multi_tenant: bool,
    /// Subscription policy is enforced by the gate
    pub billing_enabled: bool,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: Environment) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != Environment::Development {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != Environment::Development {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn flag(name: &str, default: bool) -> bool {
        std::env::var(name)
            .ok()
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(default)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = Environment::parse(
            &std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        );

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment,
            jwt_secret: Self::require_secret("JWT_SECRET", environment)?,
            session_ttl_hours: std::env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .filter(|h: &i64| *h > 0)
                .unwrap_or(24),
            stripe_webhook_secret: Self::require_secret("STRIPE_WEBHOOK_SECRET", environment)?,
            stripe_pro_price_id: std::env::var("STRIPE_PRO_PRICE_ID")
                .unwrap_or_else(|_| "price_reserrega_pro".into()),
            stripe_enterprise_price_id: std::env::var("STRIPE_ENTERPRISE_PRICE_ID")
                .unwrap_or_else(|_| "price_reserrega_enterprise".into()),
            multi_tenant: Self::flag("MULTI_TENANT", true),
            billing_enabled: Self::flag("BILLING_ENABLED", true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(Environment::parse(" Staging "), Environment::Staging);
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("prod-eu"), Environment::Production);
    }

    #[test]
    fn test_only_production_is_production() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(!Environment::Development.is_production());
    }
}
