//! Priority/aging classification
//!
//! Pure functions of `(priority_level, created_at, now)`, re-evaluated on
//! every render or poll tick. Nothing here stores derived state: the age of
//! an order is always recomputed from its immutable `created_at`.

use crate::order::{DisplayOrder, OrderStatus, PriorityLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Visual severity derived from elapsed time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeSeverity {
    Nominal,
    Elevated,
    High,
    Critical,
}

impl AgeSeverity {
    /// Thresholds are strict: minute 31 is the first critical minute.
    pub fn from_elapsed_minutes(minutes: i64) -> Self {
        if minutes > 30 {
            AgeSeverity::Critical
        } else if minutes > 20 {
            AgeSeverity::High
        } else if minutes > 10 {
            AgeSeverity::Elevated
        } else {
            AgeSeverity::Nominal
        }
    }
}

/// Whole elapsed minutes since `created_at`, clamped at zero
///
/// Clock skew can put `created_at` slightly in the future; a negative age
/// would propagate into averages, so it is treated as zero.
pub fn elapsed_minutes(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_minutes().max(0)
}

/// Age severity of a single order at `now`
pub fn age_severity(order: &DisplayOrder, now: DateTime<Utc>) -> AgeSeverity {
    AgeSeverity::from_elapsed_minutes(elapsed_minutes(order.created_at, now))
}

/// Whether the order should carry the urgency flag
///
/// An explicit `urgent` priority is always flagged regardless of age; the
/// age threshold composes with it but never overwrites it.
pub fn is_urgent(order: &DisplayOrder, now: DateTime<Utc>) -> bool {
    order.priority_level == PriorityLevel::Urgent
        || age_severity(order, now) == AgeSeverity::Critical
}

/// Whether the "order aging" alert should fire (over 30 minutes old)
pub fn is_aging(order: &DisplayOrder, now: DateTime<Utc>) -> bool {
    age_severity(order, now) == AgeSeverity::Critical
}

/// Aggregate board statistics for a dashboard view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayStats {
    pub new_count: usize,
    pub preparing_count: usize,
    pub ready_count: usize,
    pub completed_count: usize,
    /// Orders carrying the urgency flag (explicit priority or critical age)
    pub urgent_count: usize,
    /// Mean age of open (non-completed) orders in whole minutes, 0 when empty
    pub average_age_minutes: i64,
    /// Age of the single oldest open order in whole minutes, 0 when empty
    pub oldest_age_minutes: i64,
}

impl DisplayStats {
    pub fn compute(orders: &[DisplayOrder], now: DateTime<Utc>) -> Self {
        let mut stats = DisplayStats::default();
        let mut open_count: i64 = 0;
        let mut total_age: i64 = 0;

        for order in orders {
            match order.status {
                OrderStatus::New => stats.new_count += 1,
                OrderStatus::Preparing => stats.preparing_count += 1,
                OrderStatus::Ready => stats.ready_count += 1,
                OrderStatus::Completed => stats.completed_count += 1,
            }

            if is_urgent(order, now) {
                stats.urgent_count += 1;
            }

            if order.is_open() {
                let age = elapsed_minutes(order.created_at, now);
                total_age += age;
                open_count += 1;
                stats.oldest_age_minutes = stats.oldest_age_minutes.max(age);
            }
        }

        // Empty working set yields 0, never a division error
        if open_count > 0 {
            stats.average_age_minutes = total_age / open_count;
        }

        stats
    }
}
