//! Table management service
//!
//! Paginated listing with reference counts, validated create/update and a
//! delete that refuses tables still referenced by any queue entry.

use crate::utils::validation::{validate_required_text, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN};
use crate::utils::{AppError, AppResult, ErrorCode};
use desk_client::{ClientError, RemoteGateway, TableFilter};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate};
use std::sync::Arc;

/// Rows per management page
pub const TABLES_PER_PAGE: u64 = 10;

/// Color keys offered by the management form
pub const TABLE_COLORS: [&str; 10] = [
    "bg-red-500",
    "bg-orange-500",
    "bg-amber-500",
    "bg-yellow-500",
    "bg-lime-500",
    "bg-green-500",
    "bg-teal-500",
    "bg-blue-500",
    "bg-indigo-500",
    "bg-purple-500",
];

pub const DEFAULT_TABLE_COLOR: &str = TABLE_COLORS[0];

/// Create / edit form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableForm {
    pub name: String,
    pub capacity: i32,
    pub color: String,
}

impl Default for TableForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            capacity: 0,
            color: DEFAULT_TABLE_COLOR.to_string(),
        }
    }
}

impl From<&DiningTable> for TableForm {
    fn from(table: &DiningTable) -> Self {
        Self {
            name: table.name.clone(),
            capacity: table.capacity,
            color: table.color.clone(),
        }
    }
}

impl TableForm {
    pub fn validate(&self) -> AppResult<()> {
        validate_required_text(&self.name, "name", MAX_NAME_LEN)?;
        if self.capacity <= 0 {
            return Err(AppError::new(ErrorCode::InvalidCapacity)
                .with_detail("field", "capacity")
                .with_detail("capacity", self.capacity));
        }
        validate_required_text(&self.color, "color", MAX_SHORT_TEXT_LEN)?;
        Ok(())
    }
}

/// One listed table with its reference count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub table: DiningTable,
    /// Queue entries of any status referencing the table
    pub queue_count: u64,
    pub deletable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePage {
    /// 1-based
    pub page: u64,
    /// Never less than one
    pub total_pages: u64,
    pub total: u64,
    pub rows: Vec<TableRow>,
}

impl TablePage {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Table CRUD scoped to one restaurant
#[derive(Clone)]
pub struct TableService {
    gateway: Arc<dyn RemoteGateway>,
    restaurant_slug: String,
}

impl std::fmt::Debug for TableService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableService")
            .field("restaurant_slug", &self.restaurant_slug)
            .finish()
    }
}

impl TableService {
    pub fn new(gateway: Arc<dyn RemoteGateway>, restaurant_slug: impl Into<String>) -> Self {
        Self {
            gateway,
            restaurant_slug: restaurant_slug.into(),
        }
    }

    /// Newest tables first, [`TABLES_PER_PAGE`] per page
    pub async fn list_page(&self, page: u64) -> AppResult<TablePage> {
        let page = page.max(1);
        let filter = TableFilter::new()
            .restaurant(self.restaurant_slug.clone())
            .newest_first()
            .page(page, TABLES_PER_PAGE);
        let result = self.gateway.list_tables(&filter).await?;
        let total_pages = result.page_count(TABLES_PER_PAGE);

        let counts = try_join_all(
            result
                .items
                .iter()
                .map(|t| self.gateway.count_table_references(t.id)),
        )
        .await?;

        let rows = result
            .items
            .into_iter()
            .zip(counts)
            .map(|(table, queue_count)| TableRow {
                table,
                queue_count,
                deletable: queue_count == 0,
            })
            .collect();

        Ok(TablePage {
            page,
            total_pages,
            total: result.total,
            rows,
        })
    }

    pub async fn create(&self, form: &TableForm) -> AppResult<DiningTable> {
        form.validate()?;
        let create = DiningTableCreate {
            name: form.name.trim().to_string(),
            capacity: form.capacity,
            color: form.color.clone(),
            restaurant_slug: self.restaurant_slug.clone(),
        };
        let table = self.gateway.insert_table(&create).await?;
        tracing::info!(table_id = table.id, name = %table.name, capacity = table.capacity, "Table created");
        Ok(table)
    }

    pub async fn update(&self, id: i64, form: &TableForm) -> AppResult<DiningTable> {
        form.validate()?;
        let update = DiningTableUpdate {
            name: Some(form.name.trim().to_string()),
            capacity: Some(form.capacity),
            color: Some(form.color.clone()),
        };
        self.ensure_owned(id).await?;
        let table = self
            .gateway
            .update_table(&self.restaurant_slug, id, &update)
            .await
            .map_err(|e| table_error(id, e))?;
        tracing::info!(table_id = id, "Table updated");
        Ok(table)
    }

    /// Refuses with `TableInUse` before any delete request is sent
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.ensure_owned(id).await?;
        let references = self.gateway.count_table_references(id).await?;
        if references > 0 {
            tracing::warn!(table_id = id, references, "Refusing to delete referenced table");
            return Err(AppError::new(ErrorCode::TableInUse)
                .with_detail("table_id", id)
                .with_detail("references", references));
        }
        self.gateway
            .delete_table(&self.restaurant_slug, id)
            .await
            .map_err(|e| table_error(id, e))?;
        tracing::info!(table_id = id, "Table deleted");
        Ok(())
    }

    /// `TableNotFound` unless the table belongs to this restaurant
    async fn ensure_owned(&self, id: i64) -> AppResult<()> {
        let filter = TableFilter::new()
            .restaurant(self.restaurant_slug.clone())
            .id(id);
        if self.gateway.list_tables(&filter).await?.items.is_empty() {
            tracing::warn!(table_id = id, restaurant = %self.restaurant_slug, "Table not owned by restaurant");
            return Err(table_not_found(id));
        }
        Ok(())
    }
}

fn table_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::TableNotFound).with_detail("table_id", id)
}

fn table_error(id: i64, err: ClientError) -> AppError {
    match err {
        ClientError::NotFound(_) => table_not_found(id),
        other => other.into(),
    }
}
