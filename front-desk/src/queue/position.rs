//! Queue position and wait estimate
//!
//! Position counts waiting parties of the same tenant that joined earlier on
//! the same business day. The estimate is delegated to a [`WaitEstimator`].

use crate::utils::time::local_date;
use chrono::Duration;
use chrono_tz::Tz;
use serde::Serialize;
use shared::models::QueueEntry;
use std::fmt::Debug;

/// Default minutes of wait per party ahead (inclusive of the guest's own)
pub const DEFAULT_MINUTES_PER_PARTY: u32 = 10;

/// Wait time model
pub trait WaitEstimator: Send + Sync + Debug {
    /// Estimated wait for a party at 1-based `position`
    fn estimate(&self, position: u32) -> Duration;
}

/// `position × per_party`
#[derive(Debug, Clone, Copy)]
pub struct LinearEstimator {
    per_party: Duration,
}

impl LinearEstimator {
    pub fn new(per_party: Duration) -> Self {
        Self { per_party }
    }

    pub fn minutes(per_party: u32) -> Self {
        Self::new(Duration::minutes(per_party as i64))
    }
}

impl Default for LinearEstimator {
    fn default() -> Self {
        Self::minutes(DEFAULT_MINUTES_PER_PARTY)
    }
}

impl WaitEstimator for LinearEstimator {
    fn estimate(&self, position: u32) -> Duration {
        self.per_party * position as i32
    }
}

/// Position of a waiting party plus its estimated wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueEstimate {
    pub position: u32,
    #[serde(serialize_with = "serialize_minutes")]
    pub wait: Duration,
}

impl QueueEstimate {
    pub fn wait_minutes(&self) -> i64 {
        self.wait.num_minutes()
    }
}

fn serialize_minutes<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(d.num_minutes())
}

/// 1-based position of `target` among waiting parties; `None` unless it is waiting
///
/// `entries` may contain anything: other tenants, other days, other
/// statuses and the target itself are ignored.
pub fn queue_position(entries: &[QueueEntry], target: &QueueEntry, tz: Tz) -> Option<u32> {
    if !target.is_waiting() {
        return None;
    }
    let day = local_date(target.created_at, tz);
    let ahead = entries
        .iter()
        .filter(|e| {
            e.id != target.id
                && e.is_waiting()
                && e.restaurant_slug == target.restaurant_slug
                && e.created_at < target.created_at
                && local_date(e.created_at, tz) == day
        })
        .count();
    Some(ahead as u32 + 1)
}

/// Position and estimate for a waiting party
pub fn estimate_for(
    entries: &[QueueEntry],
    target: &QueueEntry,
    tz: Tz,
    estimator: &dyn WaitEstimator,
) -> Option<QueueEstimate> {
    queue_position(entries, target, tz).map(|position| QueueEstimate {
        position,
        wait: estimator.estimate(position),
    })
}
