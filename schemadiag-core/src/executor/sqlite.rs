//! SQLite executor backed by a lazily connected sqlx pool.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/database.db`, `sqlite://./relative.db` or a bare path
//! - In-memory: `sqlite::memory:` or `:memory:`
//!
//! File databases are opened read-only.

use super::{QueryExecutor, with_timeout};
use crate::{DiagnosticsConfig, Result, error::DiagnosticError, models::Row, sql::Dialect};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo};
use std::str::FromStr;
use std::time::Duration;

/// Executor for SQLite targets.
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Creates an executor without opening a connection yet.
    ///
    /// # Errors
    /// Returns a configuration error if the connection string cannot be parsed.
    pub fn connect_lazy(connection_string: &str, config: &DiagnosticsConfig) -> Result<Self> {
        let normalized = normalize_connection_string(connection_string);
        let in_memory = normalized.contains(":memory:") || normalized.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(&normalized).map_err(|e| {
            DiagnosticError::configuration(format!("Invalid SQLite connection string: {e}"))
        })?;
        if !in_memory {
            options = options.read_only(true);
        }

        // Each in-memory connection is its own database, so keep exactly one.
        let max_connections = if in_memory {
            1
        } else {
            u32::try_from(config.max_concurrency).unwrap_or(u32::MAX).max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_lazy_with(options);

        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch_rows(&self, sql: &str, timeout: Duration) -> Result<Vec<Row>> {
        with_timeout(timeout, async {
            let mut conn = self.pool.acquire().await?;
            let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;
            rows.iter().map(row_to_text).collect()
        })
        .await
    }
}

fn row_to_text(row: &SqliteRow) -> Result<Row> {
    (0..row.columns().len())
        .map(|index| value_to_text(row, index))
        .collect()
}

/// Renders one value as text: TEXT, INTEGER, REAL and BLOB storage classes.
fn value_to_text(row: &SqliteRow, index: usize) -> Result<Option<String>> {
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return Ok(value);
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return Ok(value.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()));
    }

    let column = &row.columns()[index];
    Err(DiagnosticError::catalog(format!(
        "column '{}' has unsupported type {}",
        column.name(),
        column.type_info().name()
    )))
}

/// Normalizes shorthand forms to a `sqlite:` URL.
fn normalize_connection_string(connection_string: &str) -> String {
    if connection_string == ":memory:" {
        return "sqlite::memory:".to_string();
    }
    if connection_string.starts_with("sqlite:") {
        return connection_string.to_string();
    }
    format!("sqlite://{connection_string}")
}
