//! Expiration day arithmetic
//!
//! `now` is always supplied by the caller so a mock clock can drive it.

use serde::{Deserialize, Serialize};

use crate::util::MILLIS_PER_DAY;

/// Whole days relative to the end of the current period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationDays {
    /// Days left before the period ends, rounded up. `None` once it ended.
    pub days_until_expiration: Option<i64>,
    /// Full days elapsed since the period ended. `None` while it runs.
    pub days_expired: Option<i64>,
}

/// Compute expiration days for a period ending at `period_end` (Unix millis)
pub fn expiration_days(period_end: Option<i64>, now: i64) -> ExpirationDays {
    let Some(end) = period_end else {
        return ExpirationDays::default();
    };

    // Saturating: a far-off period end clamps instead of overflowing
    if end > now {
        let remaining = end.saturating_sub(now);
        let days = remaining / MILLIS_PER_DAY + i64::from(remaining % MILLIS_PER_DAY != 0);
        ExpirationDays {
            days_until_expiration: Some(days),
            days_expired: None,
        }
    } else {
        ExpirationDays {
            days_until_expiration: None,
            days_expired: Some(now.saturating_sub(end) / MILLIS_PER_DAY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = MILLIS_PER_DAY;

    #[test]
    fn test_no_period_end() {
        assert_eq!(expiration_days(None, 1_000), ExpirationDays::default());
    }

    #[test]
    fn test_partial_day_rounds_up() {
        let days = expiration_days(Some(DAY + 1), 0);
        assert_eq!(days.days_until_expiration, Some(2));
        assert_eq!(days.days_expired, None);
    }

    #[test]
    fn test_expired_counts_full_days() {
        let days = expiration_days(Some(0), 2 * DAY + DAY / 2);
        assert_eq!(days.days_until_expiration, None);
        assert_eq!(days.days_expired, Some(2));
    }

    #[test]
    fn test_extreme_period_ends_clamp() {
        let past = expiration_days(Some(i64::MIN), 0);
        assert_eq!(past.days_expired, Some(i64::MAX / DAY));
        assert_eq!(past.days_until_expiration, None);

        let future = expiration_days(Some(i64::MAX), -1);
        assert_eq!(future.days_until_expiration, Some(i64::MAX / DAY + 1));

        let far_now = expiration_days(Some(i64::MIN), i64::MAX);
        assert_eq!(far_now.days_expired, Some(i64::MAX / DAY));
    }

    #[test]
    fn test_expiring_exactly_now() {
        let days = expiration_days(Some(5 * DAY), 5 * DAY);
        assert_eq!(days.days_expired, Some(0));
    }
}
