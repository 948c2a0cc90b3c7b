//! Database layer for drive115-dl
//!
//! SQLite persistence for per-node static data (trigger watermarks and the
//! like).
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`static_data`] - Per-node key-value rows, and the
//!   [`StaticDataStore`](crate::static_data::StaticDataStore) implementation

use sqlx::{FromRow, sqlite::SqlitePool};

mod migrations;
mod static_data;

/// Static data record from database
#[derive(Debug, Clone, FromRow)]
pub struct StaticDataRow {
    /// Owning node instance
    pub node_id: String,
    /// Key within the node's data
    pub key: String,
    /// Stored value
    pub value: String,
    /// Unix timestamp of the last write
    pub updated_at: i64,
}

/// Database handle for drive115-dl
pub struct Database {
    pool: SqlitePool,
}
