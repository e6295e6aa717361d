//! 桌台管理 (Table Lifecycle Guard)

pub mod service;

pub use service::{
    DEFAULT_TABLE_COLOR, TABLE_COLORS, TABLES_PER_PAGE, TableForm, TablePage, TableRow,
    TableService,
};
