//! REST gateway - PostgREST collections and GoTrue auth over HTTP

mod auth;
mod realtime;

use crate::filter::{Page, QueueFilter, TableFilter};
use crate::gateway::{parse_rows, ChangeFeed, RemoteGateway};
use crate::{ClientConfig, ClientError, ClientResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::message::ChangeChannel;
use shared::models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, QueueEntry, QueueEntryCreate, QueueEntryRow,
    QueueEntryUpdate, Restaurant, StaffProfile,
};
use std::sync::Arc;
use uuid::Uuid;

pub use realtime::ChangeDiff;

/// 后端返回的错误响应格式 (PostgREST / GoTrue)
#[derive(Debug, Default, Deserialize)]
struct BackendErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

impl BackendErrorBody {
    fn text(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

/// HTTP gateway to the hosted backend
#[derive(Debug, Clone)]
pub struct RestGateway {
    client: Client,
    config: ClientConfig,
    token: Arc<RwLock<Option<String>>>,
}

impl RestGateway {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let token = Arc::new(RwLock::new(config.access_token.clone()));
        Ok(Self {
            client,
            config,
            token,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Use a user access token for subsequent requests
    pub fn set_access_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Fall back to the anon key
    pub fn clear_access_token(&self) {
        *self.token.write() = None;
    }

    pub fn access_token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self
            .access_token()
            .unwrap_or_else(|| self.config.api_key.clone());
        self.client
            .request(method, url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(bearer)
    }

    fn rest(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, &self.config.rest_url(table))
    }

    async fn error_from(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let (message, details) = match serde_json::from_str::<BackendErrorBody>(&text) {
            Ok(mut body) => {
                let details = body.details.take();
                (body.text().unwrap_or_else(|| text.clone()), details)
            }
            Err(_) => (text, None),
        };
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(message)
            }
            StatusCode::CONFLICT => ClientError::Conflict(message),
            _ => ClientError::Api {
                status: status.as_u16(),
                message,
                details,
            },
        }
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn handle_empty(response: reqwest::Response) -> ClientResult<()> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(String, String)],
    ) -> ClientResult<Vec<T>> {
        let response = self.rest(Method::GET, table).query(query).send().await?;
        Self::handle_response(response).await
    }

    /// Select with `Prefer: count=exact`, returning rows and the total
    async fn select_counted<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(String, String)],
    ) -> ClientResult<(Vec<T>, u64)> {
        let response = self
            .rest(Method::GET, table)
            .header("Prefer", "count=exact")
            .query(query)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let total = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| ClientError::InvalidResponse("missing Content-Range total".into()))?;
        let bytes = response.bytes().await?;
        Ok((serde_json::from_slice(&bytes)?, total))
    }

    /// Row write on `tables` narrowed to one restaurant's table
    fn table_write(&self, method: Method, restaurant_slug: &str, id: i64) -> RequestBuilder {
        self.rest(method, "tables")
            .header("Prefer", "return=representation")
            .query(&table_key(restaurant_slug, id))
    }

    /// Write and return the affected rows
    async fn write_returning<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        table: &str,
        query: &[(String, String)],
        body: &B,
    ) -> ClientResult<Vec<T>> {
        let response = self
            .rest(method, table)
            .header("Prefer", "return=representation")
            .query(query)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }
}

/// Total from a PostgREST `Content-Range` header (`0-9/42`, `*/0`)
pub fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

fn eq(column: &str, value: impl std::fmt::Display) -> (String, String) {
    (column.to_string(), format!("eq.{}", value))
}

fn table_key(restaurant_slug: &str, id: i64) -> [(String, String); 2] {
    [eq("id", id), eq("restaurant_slug", restaurant_slug)]
}

fn single<T>(rows: Vec<T>, what: &str) -> ClientResult<T> {
    rows.into_iter()
        .next()
        .ok_or_else(|| ClientError::NotFound(what.to_string()))
}

fn single_entry(rows: Vec<QueueEntryRow>, id: Option<i64>) -> ClientResult<QueueEntry> {
    let row = single(rows, "queue entry")?;
    QueueEntry::try_from(row).map_err(|e| {
        tracing::warn!(entry_id = ?id, "Backend returned invalid queue row: {}", e);
        ClientError::InvalidResponse(e.message)
    })
}

#[async_trait]
impl RemoteGateway for RestGateway {
    async fn list_queue_entries(&self, filter: &QueueFilter) -> ClientResult<Vec<QueueEntry>> {
        let rows: Vec<QueueEntryRow> = self.select("queues", &filter.to_query_pairs()).await?;
        tracing::debug!(rows = rows.len(), "Fetched queue rows");
        Ok(parse_rows(rows))
    }

    async fn get_queue_entry(&self, id: i64) -> ClientResult<Option<QueueEntry>> {
        let query = vec![("select".into(), "*".into()), eq("id", id)];
        let rows: Vec<QueueEntryRow> = self.select("queues", &query).await?;
        Ok(parse_rows(rows).into_iter().next())
    }

    async fn insert_queue_entry(&self, entry: &QueueEntryCreate) -> ClientResult<QueueEntry> {
        let rows: Vec<QueueEntryRow> = self
            .write_returning(Method::POST, "queues", &[], entry)
            .await?;
        single_entry(rows, None)
    }

    async fn update_queue_entry(
        &self,
        id: i64,
        update: &QueueEntryUpdate,
    ) -> ClientResult<QueueEntry> {
        let rows: Vec<QueueEntryRow> = self
            .write_returning(Method::PATCH, "queues", &[eq("id", id)], update)
            .await?;
        single_entry(rows, Some(id))
    }

    async fn list_tables(&self, filter: &TableFilter) -> ClientResult<Page<DiningTable>> {
        let (items, total) = self
            .select_counted("tables", &filter.to_query_pairs())
            .await?;
        Ok(Page { items, total })
    }

    async fn insert_table(&self, table: &DiningTableCreate) -> ClientResult<DiningTable> {
        let rows = self
            .write_returning(Method::POST, "tables", &[], table)
            .await?;
        single(rows, "table")
    }

    async fn update_table(
        &self,
        restaurant_slug: &str,
        id: i64,
        update: &DiningTableUpdate,
    ) -> ClientResult<DiningTable> {
        let response = self
            .table_write(Method::PATCH, restaurant_slug, id)
            .json(update)
            .send()
            .await?;
        let rows: Vec<DiningTable> = Self::handle_response(response).await?;
        single(rows, &format!("table {}", id))
    }

    async fn delete_table(&self, restaurant_slug: &str, id: i64) -> ClientResult<()> {
        let response = self
            .table_write(Method::DELETE, restaurant_slug, id)
            .send()
            .await?;
        // an unmatched filter deletes nothing and still answers 200
        let rows: Vec<DiningTable> = Self::handle_response(response).await?;
        single(rows, &format!("table {}", id)).map(|_| ())
    }

    async fn count_table_references(&self, table_id: i64) -> ClientResult<u64> {
        let query = vec![
            ("select".into(), "id".into()),
            eq("table_id", table_id),
            ("limit".into(), "1".into()),
        ];
        let (_, total) = self
            .select_counted::<serde_json::Value>("queues", &query)
            .await?;
        Ok(total)
    }

    async fn get_restaurant(&self, slug: &str) -> ClientResult<Option<Restaurant>> {
        let query = vec![
            ("select".into(), "*".into()),
            eq("slug", slug),
            ("limit".into(), "1".into()),
        ];
        let rows: Vec<Restaurant> = self.select("restaurant", &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn get_profile(&self, user_id: Uuid) -> ClientResult<Option<StaffProfile>> {
        let query = vec![
            ("select".into(), "*,restaurant(*)".into()),
            eq("id", user_id),
            ("limit".into(), "1".into()),
        ];
        let rows: Vec<StaffProfile> = self.select("profiles", &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn subscribe(
        &self,
        channel: ChangeChannel,
        restaurant_slug: &str,
    ) -> ClientResult<ChangeFeed> {
        tracing::info!(channel = %channel, restaurant = restaurant_slug, interval_ms = self.config.poll_interval.as_millis() as u64, "Starting polling change feed");
        Ok(realtime::spawn_poller(
            self.clone(),
            channel,
            restaurant_slug.to_string(),
        ))
    }
}
