//! 轮询式变更通知
//!
//! The REST gateway has no push channel, so a change feed polls a compact
//! projection of the tenant's rows and diffs it against the previous poll.

use super::RestGateway;
use crate::gateway::ChangeFeed;
use crate::ClientResult;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use shared::message::{ChangeChannel, ChangeEvent, ChangeKind};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

const FEED_CAPACITY: usize = 64;

/// Queue rows older than this are not watched
const QUEUE_LOOKBACK_DAYS: i64 = 2;

/// Fingerprint differ for one collection
#[derive(Debug)]
pub struct ChangeDiff {
    channel: ChangeChannel,
    restaurant_slug: String,
    rows: HashMap<i64, String>,
    primed: bool,
}

impl ChangeDiff {
    pub fn new(channel: ChangeChannel, restaurant_slug: impl Into<String>) -> Self {
        Self {
            channel,
            restaurant_slug: restaurant_slug.into(),
            rows: HashMap::new(),
            primed: false,
        }
    }

    /// Replace the snapshot and report what changed; the first call only primes
    pub fn apply(&mut self, rows: Vec<(i64, String)>) -> Vec<ChangeEvent> {
        let next: HashMap<i64, String> = rows.into_iter().collect();
        let mut events = Vec::new();

        if self.primed {
            for (id, print) in &next {
                match self.rows.get(id) {
                    None => events.push(self.event(ChangeKind::Insert, *id)),
                    Some(old) if old != print => events.push(self.event(ChangeKind::Update, *id)),
                    Some(_) => {}
                }
            }
            for id in self.rows.keys() {
                if !next.contains_key(id) {
                    events.push(self.event(ChangeKind::Delete, *id));
                }
            }
            events.sort_by_key(|e| e.record_id);
        }

        self.rows = next;
        self.primed = true;
        events
    }

    fn event(&self, kind: ChangeKind, id: i64) -> ChangeEvent {
        ChangeEvent::new(
            self.channel,
            kind,
            Some(id),
            Some(self.restaurant_slug.clone()),
        )
    }
}

impl RestGateway {
    async fn fingerprints(
        &self,
        channel: ChangeChannel,
        restaurant_slug: &str,
    ) -> ClientResult<Vec<(i64, String)>> {
        let mut query = vec![
            ("restaurant_slug".to_string(), format!("eq.{}", restaurant_slug)),
            ("order".to_string(), "id.asc".to_string()),
        ];
        match channel {
            ChangeChannel::Queues => {
                let since = Utc::now() - ChronoDuration::days(QUEUE_LOOKBACK_DAYS);
                query.push(("select".into(), "id,status,table_id".into()));
                query.push((
                    "created_at".into(),
                    format!("gte.{}", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ));
            }
            ChangeChannel::Tables => {
                query.push(("select".into(), "id,name,capacity,color".into()));
            }
        }

        let rows: Vec<serde_json::Map<String, serde_json::Value>> =
            self.select(channel.table_name(), &query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.get("id")?.as_i64()?;
                Some((id, serde_json::Value::Object(row).to_string()))
            })
            .collect())
    }
}

pub(super) fn spawn_poller(
    gateway: RestGateway,
    channel: ChangeChannel,
    restaurant_slug: String,
) -> ChangeFeed {
    let (tx, rx) = mpsc::channel(FEED_CAPACITY);
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        let mut diff = ChangeDiff::new(channel, restaurant_slug.clone());
        let mut ticker = tokio::time::interval(gateway.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match gateway.fingerprints(channel, &restaurant_slug).await {
                Ok(rows) => {
                    for event in diff.apply(rows) {
                        tracing::debug!(event = %event, "Change detected");
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(channel = %channel, restaurant = %restaurant_slug, "Change poll failed: {}", e);
                }
            }
        }
        tracing::debug!(channel = %channel, "Change feed stopped");
    });

    ChangeFeed::new(rx, cancel)
}
