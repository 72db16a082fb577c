//! Sessions, the account gate and login rate limiting

pub mod gate;
pub mod rate_limit;
pub mod route_policy;
pub mod session;

pub use gate::{GateContext, account_gate};
pub use session::CurrentUser;
