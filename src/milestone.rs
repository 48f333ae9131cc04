//! Day arithmetic and milestone selection for the notification checks.

use crate::config::MilestonePolicy;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Calendar dates are compared as UTC midnight.
fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// `delta` in days, rounded towards positive infinity.
pub fn ceil_days(delta: TimeDelta) -> i64 {
    let millis = delta.num_milliseconds();
    millis.div_euclid(MILLIS_PER_DAY) + i64::from(millis.rem_euclid(MILLIS_PER_DAY) != 0)
}

/// `ceil((end_date - now) / 1 day)`
pub fn days_until(now: DateTime<Utc>, end_date: NaiveDate) -> i64 {
    ceil_days(midnight(end_date) - now)
}

/// `ceil((now - due_date) / 1 day)`
pub fn days_overdue(now: DateTime<Utc>, due_date: NaiveDate) -> i64 {
    ceil_days(now - midnight(due_date))
}

/// The expiring milestone to notify for a contract ending in `days` days.
pub fn expiring_milestone(policy: MilestonePolicy, milestones: &[i64], days: i64) -> Option<i64> {
    match policy {
        MilestonePolicy::Exact => milestones.contains(&days).then_some(days),
        // Tightest milestone already reached.
        MilestonePolicy::Ledger => milestones.iter().copied().filter(|m| *m >= days).min(),
    }
}

/// The overdue milestone to notify for a payment `days` days late.
pub fn overdue_milestone(policy: MilestonePolicy, interval: i64, days: i64) -> Option<i64> {
    if days <= 0 || interval <= 0 {
        return None;
    }
    match policy {
        MilestonePolicy::Exact => (days % interval == 0).then_some(days),
        MilestonePolicy::Ledger => {
            let reached = days / interval * interval;
            (reached > 0).then_some(reached)
        }
    }
}
