//! PostgreSQL executor backed by a lazily connected sqlx pool.

use super::{QueryExecutor, server_timeout_statement, with_timeout};
use crate::{DiagnosticsConfig, Result, error::DiagnosticError, models::Row, sql::Dialect};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Executor as _, Row as _, TypeInfo};
use std::str::FromStr;
use std::time::Duration;

/// Executor for PostgreSQL targets.
pub struct PostgresExecutor {
    pool: PgPool,
}

impl PostgresExecutor {
    /// Creates an executor without opening a connection yet.
    ///
    /// # Errors
    /// Returns a configuration error if the URL cannot be parsed.
    pub fn connect_lazy(connection_string: &str, config: &DiagnosticsConfig) -> Result<Self> {
        let options = PgConnectOptions::from_str(connection_string).map_err(|e| {
            DiagnosticError::configuration(format!("Invalid PostgreSQL connection string: {e}"))
        })?;
        let options = options.application_name("schemadiag");

        let pool = PgPoolOptions::new()
            .max_connections(u32::try_from(config.max_concurrency).unwrap_or(u32::MAX).max(1))
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Duration::from_secs(60))
            .connect_lazy_with(options);

        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for PostgresExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch_rows(&self, sql: &str, timeout: Duration) -> Result<Vec<Row>> {
        with_timeout(timeout, async {
            let mut conn = self.pool.acquire().await?;
            if let Some(limit) = server_timeout_statement(Dialect::Postgres, timeout) {
                (&mut *conn).execute(limit.as_str()).await?;
            }
            let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;
            rows.iter().map(row_to_text).collect()
        })
        .await
    }
}

fn row_to_text(row: &PgRow) -> Result<Row> {
    (0..row.columns().len())
        .map(|index| value_to_text(row, index))
        .collect()
}

/// Renders one value as text.
///
/// Catalog statements cast names and types to `text`; this ladder covers
/// counts, flags and the common scalar types of sampled user columns.
fn value_to_text(row: &PgRow, index: usize) -> Result<Option<String>> {
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return Ok(value);
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<i32>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<i16>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<f32>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<uuid::Uuid>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index) {
        return Ok(value.map(|v| v.to_rfc3339()));
    }
    if let Ok(value) = row.try_get::<Option<chrono::NaiveDateTime>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<chrono::NaiveDate>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<chrono::NaiveTime>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return Ok(value.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()));
    }

    let column = &row.columns()[index];
    Err(DiagnosticError::catalog(format!(
        "column '{}' has unsupported type {}; cast it to text",
        column.name(),
        column.type_info().name()
    )))
}
