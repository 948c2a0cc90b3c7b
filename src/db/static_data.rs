//! Per-node static data rows.

use crate::error::DatabaseError;
use crate::static_data::StaticDataStore;
use crate::{Error, Result};
use async_trait::async_trait;

use super::{Database, StaticDataRow};

impl Database {
    /// Get one value for a node
    pub async fn get_static_value(&self, node_id: &str, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar(
            r#"
            SELECT value FROM node_static_data WHERE node_id = ? AND key = ?
            "#,
        )
        .bind(node_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get static data: {}",
                e
            )))
        })?;

        Ok(value)
    }

    /// Insert or replace one value for a node
    pub async fn set_static_value(&self, node_id: &str, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO node_static_data (node_id, key, value, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(node_id, key) DO UPDATE SET value = excluded.value,
                                                   updated_at = excluded.updated_at
            "#,
        )
        .bind(node_id)
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to set static data: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// All rows of a node, ordered by key
    pub async fn get_node_static_data(&self, node_id: &str) -> Result<Vec<StaticDataRow>> {
        let rows = sqlx::query_as::<_, StaticDataRow>(
            r#"
            SELECT node_id, key, value, updated_at
            FROM node_static_data
            WHERE node_id = ?
            ORDER BY key ASC
            "#,
        )
        .bind(node_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get node static data: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Forget everything stored for a node
    ///
    /// Returns the number of rows removed. Clearing a trigger's data makes its
    /// next poll start again from the configured start date.
    pub async fn clear_node(&self, node_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM node_static_data WHERE node_id = ?")
            .bind(node_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to clear node static data: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl StaticDataStore for Database {
    async fn get(&self, node_id: &str, key: &str) -> Result<Option<String>> {
        self.get_static_value(node_id, key).await
    }

    async fn set(&self, node_id: &str, key: &str, value: &str) -> Result<()> {
        self.set_static_value(node_id, key, value).await
    }
}
