//! Unified service-layer error type for reserrega-cloud
//!
//! `ServiceError` bridges store errors (`sqlx::Error`, `BoxError`) and the
//! API-layer `AppError`. Handlers convert with `into_app_error`, which needs
//! the environment to decide how much of a store error the client sees.

use shared::error::{AppError, ErrorCode};

use crate::config::Environment;
use crate::store::BoxError;

/// Service-layer error
///
/// - `Db`: store/infrastructure errors (logged, sanitized in production)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl ServiceError {
    /// Convert for the client. Production gets the generic code message,
    /// other environments see the original error text.
    pub fn into_app_error(self, environment: Environment) -> AppError {
        match self {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, environment = %environment, "Service store error");
                if environment.is_production() {
                    AppError::new(ErrorCode::InternalError)
                } else {
                    AppError::with_message(ErrorCode::InternalError, db_err.to_string())
                }
            }
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_hides_store_message() {
        let err = ServiceError::Db("connection refused to 10.0.0.3".into());
        let app = err.into_app_error(Environment::Production);
        assert_eq!(app.code, ErrorCode::InternalError);
        assert!(!app.message.contains("10.0.0.3"));
    }

    #[test]
    fn test_development_keeps_store_message() {
        let err = ServiceError::Db("connection refused".into());
        let app = err.into_app_error(Environment::Development);
        assert_eq!(app.code, ErrorCode::InternalError);
        assert_eq!(app.message, "connection refused");
    }

    #[test]
    fn test_app_errors_pass_through() {
        let err = ServiceError::App(AppError::new(ErrorCode::ResourceLimitReached));
        let app = err.into_app_error(Environment::Production);
        assert_eq!(app.code, ErrorCode::ResourceLimitReached);
    }
}
