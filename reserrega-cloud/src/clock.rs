//! Request clock
//!
//! "Now" for expiration math is resolved once per request and passed down
//! explicitly. Outside production a stored mock time replaces the wall clock;
//! in production the store is never consulted.

use chrono::{DateTime, Utc};

use crate::config::Environment;
use crate::store::Store;

/// Wall-clock source
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The instant a request sees, and whether it came from mock time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestClock {
    pub now: DateTime<Utc>,
    pub mocked: bool,
}

impl RequestClock {
    pub async fn resolve(environment: Environment, store: &dyn Store, clock: &dyn Clock) -> Self {
        let wall = Self {
            now: clock.now(),
            mocked: false,
        };
        if environment.is_production() {
            return wall;
        }

        match store.mock_now().await {
            Ok(Some(now)) => Self { now, mocked: true },
            Ok(None) => wall,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read mock time, using wall clock");
                wall
            }
        }
    }

    pub fn now_millis(&self) -> i64 {
        self.now.timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_mock_time_used_outside_production() {
        let store = MemoryStore::new();
        store.set_mock_now(at(2030, 1, 1)).await.unwrap();
        let clock = FixedClock(at(2026, 5, 5));

        let resolved = RequestClock::resolve(Environment::Staging, &store, &clock).await;
        assert_eq!(resolved.now, at(2030, 1, 1));
        assert!(resolved.mocked);
    }

    #[tokio::test]
    async fn test_production_ignores_mock_time() {
        let store = MemoryStore::new();
        store.set_mock_now(at(2030, 1, 1)).await.unwrap();
        let clock = FixedClock(at(2026, 5, 5));

        let resolved = RequestClock::resolve(Environment::Production, &store, &clock).await;
        assert_eq!(resolved.now, at(2026, 5, 5));
        assert!(!resolved.mocked);
    }

    #[tokio::test]
    async fn test_unset_mock_time_falls_back_to_clock() {
        let store = MemoryStore::new();
        let clock = FixedClock(at(2026, 5, 5));

        let resolved = RequestClock::resolve(Environment::Development, &store, &clock).await;
        assert_eq!(resolved.now_millis(), at(2026, 5, 5).timestamp_millis());
        assert!(!resolved.mocked);
    }
}
