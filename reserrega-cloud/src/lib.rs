//! reserrega-cloud: subscription policy, account gate and time-travel harness
//!
//! - Evaluates the subscription policy on every protected request
//! - Issues and revokes sessions
//! - Receives Stripe subscription webhooks
//! - Exposes a non-production harness that overrides "now"

pub mod api;
pub mod auth;
pub mod billing;
pub mod clock;
pub mod config;
mod db;
pub mod error;
pub mod harness;
pub mod state;
pub mod store;
pub mod stripe;
pub mod util;
