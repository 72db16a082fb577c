//! Database access layer

pub mod app_config;
pub mod resources;
pub mod sessions;
pub mod subscriptions;
pub mod users;
pub mod webhook_events;
