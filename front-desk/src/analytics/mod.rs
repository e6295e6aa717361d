//! Queue analytics
//!
//! Aggregates every queue entry created inside a date range (business
//! timezone) into summary numbers, a per-day series and a status breakdown.

use crate::utils::format::format_hour;
use crate::utils::time::{day_end, day_start, today};
use crate::utils::AppResult;
use chrono::{Days, NaiveDate, Timelike};
use chrono_tz::Tz;
use desk_client::{QueueFilter, RemoteGateway};
use serde::Serialize;
use shared::models::{QueueEntry, QueueStatus};
use std::collections::{BTreeMap, HashMap};

/// Length of the default range, counted back from today
pub const DEFAULT_RANGE_DAYS: u64 = 7;

/// Shown where no value can be derived
pub const NOT_AVAILABLE: &str = "N/A";

// ============================================================================
// Date Range
// ============================================================================

/// Inclusive `[start, end]` range of business dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// A start after the end collapses the range onto the start day
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Today and the seven days before it
    pub fn last_7_days(tz: Tz) -> Self {
        Self::ending_on(today(tz))
    }

    pub fn ending_on(end: NaiveDate) -> Self {
        let start = end.checked_sub_days(Days::new(DEFAULT_RANGE_DAYS)).unwrap_or(end);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Move the start; drags the end along when it would fall behind
    pub fn with_start(self, start: NaiveDate) -> Self {
        Self {
            start,
            end: self.end.max(start),
        }
    }

    /// Move the end; drags the start along when it would run past
    pub fn with_end(self, end: NaiveDate) -> Self {
        Self {
            start: self.start.min(end),
            end,
        }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end).contains(&date)
    }

    fn filter(&self, restaurant_slug: &str, tz: Tz) -> QueueFilter {
        QueueFilter::new()
            .restaurant(restaurant_slug)
            .created_between(day_start(self.start, tz), day_end(self.end, tz))
    }
}

// ============================================================================
// Report Types
// ============================================================================

/// Headline numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsSummary {
    pub total_queues: u64,
    pub total_guests: u64,
    pub cancelled: u64,
    /// Busiest creation hour, e.g. `7 PM - 8 PM`
    pub peak_hour: Option<String>,
    pub most_used_table: Option<i64>,
}

impl AnalyticsSummary {
    pub fn peak_hour_label(&self) -> &str {
        self.peak_hour.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn most_used_table_label(&self) -> String {
        self.most_used_table
            .map(|id| id.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub queues: u64,
    pub guests: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: QueueStatus,
    pub count: u64,
}

impl StatusCount {
    /// Capitalized status name for chart legends
    pub fn label(&self) -> String {
        let name = self.status.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Full analytics report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueAnalytics {
    pub range: DateRange,
    pub summary: AnalyticsSummary,
    /// One point per day in the range, zero-filled
    pub per_day: Vec<DailyCount>,
    /// Sorted by count, highest first
    pub status_distribution: Vec<StatusCount>,
}

impl QueueAnalytics {
    pub fn is_empty(&self) -> bool {
        self.summary.total_queues == 0
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Fold entries into a report; entries outside the range are ignored
pub fn aggregate(entries: &[QueueEntry], range: DateRange, tz: Tz) -> QueueAnalytics {
    let mut total_queues = 0u64;
    let mut total_guests = 0u64;
    let mut cancelled = 0u64;
    let mut per_date: HashMap<NaiveDate, (u64, u64)> = HashMap::new();
    let mut by_status: HashMap<QueueStatus, u64> = HashMap::new();
    // BTreeMap keys keep ties resolved toward the lowest hour / table id
    let mut by_hour: BTreeMap<u32, u64> = BTreeMap::new();
    let mut by_table: BTreeMap<i64, u64> = BTreeMap::new();

    for entry in entries {
        let local = entry.created_at.with_timezone(&tz);
        let date = local.date_naive();
        if !range.contains(date) {
            continue;
        }
        let guests = u64::try_from(entry.guests_count).unwrap_or(0);

        total_queues += 1;
        total_guests += guests;
        if entry.status == QueueStatus::Cancelled {
            cancelled += 1;
        }

        let day = per_date.entry(date).or_default();
        day.0 += 1;
        day.1 += guests;
        *by_status.entry(entry.status).or_default() += 1;
        *by_hour.entry(local.hour()).or_default() += 1;
        if let Some(table_id) = entry.table_id {
            *by_table.entry(table_id).or_default() += 1;
        }
    }

    let peak_hour = most_frequent(&by_hour)
        .map(|hour| format!("{} - {}", format_hour(hour), format_hour((hour + 1) % 24)));
    let most_used_table = most_frequent(&by_table);

    let per_day = range
        .days()
        .map(|date| {
            let (queues, guests) = per_date.get(&date).copied().unwrap_or_default();
            DailyCount {
                date,
                queues,
                guests,
            }
        })
        .collect();

    let mut status_distribution: Vec<StatusCount> = by_status
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect();
    status_distribution.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| lifecycle_rank(a.status).cmp(&lifecycle_rank(b.status)))
    });

    QueueAnalytics {
        range,
        summary: AnalyticsSummary {
            total_queues,
            total_guests,
            cancelled,
            peak_hour,
            most_used_table,
        },
        per_day,
        status_distribution,
    }
}

/// Key with the highest count; first key wins on ties
fn most_frequent<K: Copy + Ord>(counts: &BTreeMap<K, u64>) -> Option<K> {
    let mut best: Option<(K, u64)> = None;
    for (key, count) in counts {
        if best.is_none_or(|(_, top)| *count > top) {
            best = Some((*key, *count));
        }
    }
    best.map(|(key, _)| key)
}

fn lifecycle_rank(status: QueueStatus) -> u8 {
    match status {
        QueueStatus::Waiting => 0,
        QueueStatus::Assigned => 1,
        QueueStatus::Completed => 2,
        QueueStatus::Cancelled => 3,
    }
}

/// Read every entry the tenant created inside the range and aggregate it
pub async fn fetch(
    gateway: &dyn RemoteGateway,
    restaurant_slug: &str,
    range: DateRange,
    tz: Tz,
) -> AppResult<QueueAnalytics> {
    let entries = gateway
        .list_queue_entries(&range.filter(restaurant_slug, tz))
        .await?;
    let report = aggregate(&entries, range, tz);
    tracing::debug!(
        restaurant = %restaurant_slug,
        start = %range.start,
        end = %range.end,
        total = report.summary.total_queues,
        "Queue analytics computed"
    );
    Ok(report)
}
