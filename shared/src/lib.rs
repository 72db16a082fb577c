//! Shared types for Reserrega
//!
//! Error types, account and billing domain types, and the subscription
//! policy used by the cloud service.

pub mod account;
pub mod billing;
pub mod error;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, ErrorCategory, ErrorCode};
