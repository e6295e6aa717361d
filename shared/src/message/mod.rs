//! 变更通知消息类型定义
//!
//! Change notifications delivered by a gateway change feed. They carry just
//! enough to decide whether a reload is needed; the engine never patches its
//! board from a notification payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Collection a change was observed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeChannel {
    Queues,
    Tables,
}

impl ChangeChannel {
    /// Backend table name
    pub fn table_name(&self) -> &'static str {
        match self {
            ChangeChannel::Queues => "queues",
            ChangeChannel::Tables => "tables",
        }
    }
}

impl fmt::Display for ChangeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One change notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub channel: ChangeChannel,
    pub kind: ChangeKind,
    /// Row id, when the feed knows it
    pub record_id: Option<i64>,
    /// Tenant of the changed row
    pub restaurant_slug: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(
        channel: ChangeChannel,
        kind: ChangeKind,
        record_id: Option<i64>,
        restaurant_slug: Option<String>,
    ) -> Self {
        Self {
            channel,
            kind,
            record_id,
            restaurant_slug,
            timestamp: Utc::now(),
        }
    }

    /// Whether a subscriber scoped to `slug` on `channel` should see this event
    pub fn matches(&self, channel: ChangeChannel, slug: &str) -> bool {
        self.channel == channel
            && self
                .restaurant_slug
                .as_deref()
                .is_none_or(|s| s == slug)
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} on {}", self.kind, self.channel)?;
        if let Some(id) = self.record_id {
            write!(f, " #{}", id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_tenant_scope() {
        let event = ChangeEvent::new(
            ChangeChannel::Queues,
            ChangeKind::Insert,
            Some(3),
            Some("spice-house".into()),
        );
        assert!(event.matches(ChangeChannel::Queues, "spice-house"));
        assert!(!event.matches(ChangeChannel::Queues, "noodle-bar"));
        assert!(!event.matches(ChangeChannel::Tables, "spice-house"));

        let unscoped = ChangeEvent::new(ChangeChannel::Tables, ChangeKind::Delete, Some(1), None);
        assert!(unscoped.matches(ChangeChannel::Tables, "anything"));
    }

    #[test]
    fn test_display() {
        let event = ChangeEvent::new(ChangeChannel::Queues, ChangeKind::Update, Some(7), None);
        assert_eq!(event.to_string(), "Update on queues #7");
    }

    #[test]
    fn test_kind_wire_format() {
        assert_eq!(serde_json::to_string(&ChangeKind::Delete).unwrap(), "\"DELETE\"");
    }
}
