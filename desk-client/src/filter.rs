//! Query filters shared by every gateway implementation
//!
//! Filters are plain data: the REST gateway renders them as PostgREST query
//! parameters, the in-memory gateway evaluates them with `matches`.

use chrono::{DateTime, SecondsFormat, Utc};
use shared::models::{DiningTable, QueueEntry, QueueStatus};

/// Filter for `queues` reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueFilter {
    pub restaurant_slug: Option<String>,
    /// Empty means any status
    pub statuses: Vec<QueueStatus>,
    /// Inclusive lower bound on `created_at`
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`
    pub created_before: Option<DateTime<Utc>>,
    pub table_id: Option<i64>,
}

impl QueueFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restaurant(mut self, slug: impl Into<String>) -> Self {
        self.restaurant_slug = Some(slug.into());
        self
    }

    pub fn statuses(mut self, statuses: impl IntoIterator<Item = QueueStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    /// `[from, before)` creation window
    pub fn created_between(mut self, from: DateTime<Utc>, before: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self.created_before = Some(before);
        self
    }

    pub fn table(mut self, table_id: i64) -> Self {
        self.table_id = Some(table_id);
        self
    }

    /// Evaluate the filter against a record
    pub fn matches(&self, entry: &QueueEntry) -> bool {
        if let Some(slug) = &self.restaurant_slug
            && &entry.restaurant_slug != slug
        {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&entry.status) {
            return false;
        }
        if let Some(from) = self.created_from
            && entry.created_at < from
        {
            return false;
        }
        if let Some(before) = self.created_before
            && entry.created_at >= before
        {
            return false;
        }
        if let Some(table_id) = self.table_id
            && entry.table_id != Some(table_id)
        {
            return false;
        }
        true
    }

    /// PostgREST query parameters, ordered by `created_at` ascending
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        if let Some(slug) = &self.restaurant_slug {
            pairs.push(("restaurant_slug".into(), format!("eq.{}", slug)));
        }
        if !self.statuses.is_empty() {
            let list = self
                .statuses
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("status".into(), format!("in.({})", list)));
        }
        if let Some(from) = self.created_from {
            pairs.push(("created_at".into(), format!("gte.{}", timestamp(from))));
        }
        if let Some(before) = self.created_before {
            pairs.push(("created_at".into(), format!("lt.{}", timestamp(before))));
        }
        if let Some(table_id) = self.table_id {
            pairs.push(("table_id".into(), format!("eq.{}", table_id)));
        }
        pairs.push(("order".into(), "created_at.asc".into()));
        pairs
    }
}

/// Ordering for `tables` reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableOrder {
    /// Load order, used by the dashboard board
    #[default]
    OldestFirst,
    /// Management listing
    NewestFirst,
}

/// Filter for `tables` reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFilter {
    pub restaurant_slug: Option<String>,
    pub id: Option<i64>,
    pub order: TableOrder,
    /// `(offset, limit)`; `None` reads everything
    pub range: Option<(u64, u64)>,
}

impl TableFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restaurant(mut self, slug: impl Into<String>) -> Self {
        self.restaurant_slug = Some(slug.into());
        self
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order = TableOrder::NewestFirst;
        self
    }

    /// 1-based page of `per_page` rows
    pub fn page(mut self, page: u64, per_page: u64) -> Self {
        let page = page.max(1);
        self.range = Some(((page - 1).saturating_mul(per_page), per_page));
        self
    }

    pub fn matches(&self, table: &DiningTable) -> bool {
        self.restaurant_slug
            .as_deref()
            .is_none_or(|slug| table.restaurant_slug == slug)
            && self.id.is_none_or(|id| table.id == id)
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        if let Some(slug) = &self.restaurant_slug {
            pairs.push(("restaurant_slug".into(), format!("eq.{}", slug)));
        }
        if let Some(id) = self.id {
            pairs.push(("id".into(), format!("eq.{}", id)));
        }
        let order = match self.order {
            TableOrder::OldestFirst => "created_at.asc,id.asc",
            TableOrder::NewestFirst => "created_at.desc,id.desc",
        };
        pairs.push(("order".into(), order.into()));
        if let Some((offset, limit)) = self.range {
            pairs.push(("offset".into(), offset.to_string()));
            pairs.push(("limit".into(), limit.to_string()));
        }
        pairs
    }
}

/// One page of rows plus the exact total behind it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    /// Number of pages of `per_page` rows, never less than one
    pub fn page_count(&self, per_page: u64) -> u64 {
        if per_page == 0 {
            return 1;
        }
        self.total.div_ceil(per_page).max(1)
    }
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(status: QueueStatus, minute: u32, table_id: Option<i64>) -> QueueEntry {
        QueueEntry {
            id: minute as i64,
            name: "n".into(),
            phone: "1".into(),
            email: "e@x.io".into(),
            guests_count: 2,
            status,
            table_id,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, minute, 0).unwrap(),
            restaurant_slug: "spice-house".into(),
        }
    }

    #[test]
    fn test_queue_filter_matches_window_and_status() {
        let from = Utc.with_ymd_and_hms(2026, 3, 1, 10, 5, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2026, 3, 1, 10, 10, 0).unwrap();
        let filter = QueueFilter::new()
            .restaurant("spice-house")
            .statuses(QueueStatus::ACTIVE)
            .created_between(from, before);

        assert!(filter.matches(&entry(QueueStatus::Waiting, 5, None)));
        assert!(!filter.matches(&entry(QueueStatus::Waiting, 10, None)));
        assert!(!filter.matches(&entry(QueueStatus::Waiting, 4, None)));
        assert!(!filter.matches(&entry(QueueStatus::Completed, 6, Some(1))));

        let other_tenant = QueueFilter::new().restaurant("noodle-bar");
        assert!(!other_tenant.matches(&entry(QueueStatus::Waiting, 5, None)));
    }

    #[test]
    fn test_queue_filter_query_pairs() {
        let from = Utc.with_ymd_and_hms(2026, 3, 1, 16, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap();
        let pairs = QueueFilter::new()
            .restaurant("spice-house")
            .statuses(QueueStatus::ACTIVE)
            .created_between(from, before)
            .to_query_pairs();

        let rendered: Vec<String> = pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        assert_eq!(
            rendered,
            vec![
                "select=*",
                "restaurant_slug=eq.spice-house",
                "status=in.(waiting,assigned)",
                "created_at=gte.2026-03-01T16:00:00.000Z",
                "created_at=lt.2026-03-02T16:00:00.000Z",
                "order=created_at.asc",
            ]
        );
    }

    #[test]
    fn test_table_filter_page() {
        let filter = TableFilter::new().newest_first().page(3, 10);
        assert_eq!(filter.range, Some((20, 10)));
        let pairs = filter.to_query_pairs();
        assert!(pairs.contains(&("offset".into(), "20".into())));
        assert!(pairs.contains(&("order".into(), "created_at.desc,id.desc".into())));

        assert_eq!(TableFilter::new().page(0, 10).range, Some((0, 10)));
        assert_eq!(
            TableFilter::new().page(u64::MAX, 10).range,
            Some((u64::MAX, 10))
        );
    }

    #[test]
    fn test_table_filter_by_id() {
        let filter = TableFilter::new().restaurant("spice-house").id(55);
        let pairs = filter.to_query_pairs();
        assert!(pairs.contains(&("restaurant_slug".into(), "eq.spice-house".into())));
        assert!(pairs.contains(&("id".into(), "eq.55".into())));
    }

    #[test]
    fn test_page_count() {
        let page = |total| Page::<()> { items: vec![], total };
        assert_eq!(page(0).page_count(10), 1);
        assert_eq!(page(10).page_count(10), 1);
        assert_eq!(page(11).page_count(10), 2);
    }
}
