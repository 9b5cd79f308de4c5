//! Catalog metadata readers.
//!
//! Structural checks read the target's catalog through [`CatalogReader`]
//! and evaluate their rules in Rust. The statements themselves live in
//! [`queries`], one set per dialect.

pub mod queries;

use crate::executor::QueryExecutor;
use crate::{Result, error::DiagnosticError};
use queries::CatalogQueries;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A base table, identified by schema and name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// References one column of this table.
    pub fn column(&self, column: impl Into<String>) -> ColumnRef {
        ColumnRef {
            table: self.clone(),
            column: column.into(),
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A column of a base table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: TableRef,
    pub column: String,
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Column descriptor read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub column: ColumnRef,
    pub data_type: String,
    pub nullable: bool,
    pub ordinal: u32,
}

/// One column of a primary key or unique index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumn {
    pub column: ColumnRef,
    pub index_name: String,
    pub is_primary: bool,
    /// Number of key columns in the owning index
    pub key_width: u32,
}

/// One column pair of a declared foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyColumn {
    pub constraint: String,
    pub child: ColumnRef,
    pub parent: ColumnRef,
}

/// An index reported by a usage or physical-statistics view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStat {
    pub table: TableRef,
    pub index_name: String,
    /// Fragmentation percentage, when the statement reports one
    pub fragmentation: Option<String>,
}

impl std::fmt::Display for IndexStat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.index_name)?;
        if let Some(percent) = &self.fragmentation {
            write!(f, " ({percent}%)")?;
        }
        Ok(())
    }
}

/// Typed access to text-rendered catalog rows.
pub(crate) trait RowExt {
    /// Non-null text value at `index`.
    fn get_text(&self, index: usize, context: &str) -> Result<String>;

    /// 0/1 style flag at `index`.
    fn get_flag(&self, index: usize, context: &str) -> Result<bool>;

    /// Non-negative integer at `index`.
    fn get_count(&self, index: usize, context: &str) -> Result<u64>;
}

impl RowExt for [Option<String>] {
    fn get_text(&self, index: usize, context: &str) -> Result<String> {
        match self.get(index) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(DiagnosticError::catalog(format!(
                "{context}: column {index} is NULL"
            ))),
            None => Err(DiagnosticError::catalog(format!(
                "{context}: expected at least {} column(s), got {}",
                index.saturating_add(1),
                self.len()
            ))),
        }
    }

    fn get_flag(&self, index: usize, context: &str) -> Result<bool> {
        let value = self.get_text(index, context)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "t" | "yes" => Ok(true),
            "0" | "false" | "f" | "no" => Ok(false),
            other => Err(DiagnosticError::catalog(format!(
                "{context}: '{other}' is not a flag"
            ))),
        }
    }

    fn get_count(&self, index: usize, context: &str) -> Result<u64> {
        let value = self.get_text(index, context)?;
        value.trim().parse::<u64>().map_err(|_| {
            DiagnosticError::catalog(format!("{context}: '{value}' is not a count"))
        })
    }
}

/// Reads catalog metadata through an executor.
pub struct CatalogReader<'a> {
    executor: &'a dyn QueryExecutor,
    queries: &'static CatalogQueries,
    timeout: Duration,
}

impl<'a> CatalogReader<'a> {
    pub fn new(executor: &'a dyn QueryExecutor, timeout: Duration) -> Self {
        Self {
            executor,
            queries: CatalogQueries::for_dialect(executor.dialect()),
            timeout,
        }
    }

    /// All user base tables.
    pub async fn tables(&self) -> Result<Vec<TableRef>> {
        let rows = self.executor.fetch_rows(self.queries.tables, self.timeout).await?;
        rows.iter()
            .map(|row| {
                Ok(TableRef::new(
                    row.get_text(0, "tables")?,
                    row.get_text(1, "tables")?,
                ))
            })
            .collect()
    }

    /// Every column of every user base table.
    pub async fn columns(&self) -> Result<Vec<ColumnInfo>> {
        let rows = self.executor.fetch_rows(self.queries.columns, self.timeout).await?;
        rows.iter()
            .map(|row| {
                let table = TableRef::new(row.get_text(0, "columns")?, row.get_text(1, "columns")?);
                Ok(ColumnInfo {
                    column: table.column(row.get_text(2, "columns")?),
                    // Untyped SQLite columns report an empty type
                    data_type: row
                        .get(3)
                        .and_then(Clone::clone)
                        .unwrap_or_default(),
                    nullable: row.get_flag(4, "columns")?,
                    ordinal: u32::try_from(row.get_count(5, "columns")?).unwrap_or(u32::MAX),
                })
            })
            .collect()
    }

    /// Columns of primary keys and unique indexes.
    ///
    /// Expression index members have no column name and are skipped.
    pub async fn key_columns(&self) -> Result<Vec<KeyColumn>> {
        let rows = self
            .executor
            .fetch_rows(self.queries.key_columns, self.timeout)
            .await?;
        let mut keys = Vec::with_capacity(rows.len());
        for row in &rows {
            if matches!(row.get(3), Some(None)) {
                continue;
            }
            let table = TableRef::new(row.get_text(0, "key columns")?, row.get_text(1, "key columns")?);
            keys.push(KeyColumn {
                column: table.column(row.get_text(3, "key columns")?),
                index_name: row.get_text(2, "key columns")?,
                is_primary: row.get_flag(4, "key columns")?,
                key_width: u32::try_from(row.get_count(5, "key columns")?).unwrap_or(u32::MAX),
            });
        }
        Ok(keys)
    }

    /// Column pairs of declared foreign keys.
    pub async fn foreign_keys(&self) -> Result<Vec<ForeignKeyColumn>> {
        let rows = self
            .executor
            .fetch_rows(self.queries.foreign_keys, self.timeout)
            .await?;
        rows.iter()
            .map(|row| {
                let context = "foreign keys";
                let child = TableRef::new(row.get_text(1, context)?, row.get_text(2, context)?);
                let parent = TableRef::new(row.get_text(4, context)?, row.get_text(5, context)?);
                Ok(ForeignKeyColumn {
                    constraint: row.get_text(0, context)?,
                    child: child.column(row.get_text(3, context)?),
                    parent: parent.column(row.get_text(6, context)?),
                })
            })
            .collect()
    }

    /// Non-key indexes with no recorded reads since statistics were reset.
    ///
    /// # Errors
    /// Returns `UnsupportedFeature` where the engine keeps no usage statistics.
    pub async fn unused_indexes(&self) -> Result<Vec<IndexStat>> {
        let sql = self.queries.unused_indexes.ok_or_else(|| {
            DiagnosticError::unsupported_feature(
                "Index usage statistics",
                self.executor.dialect().to_string(),
            )
        })?;
        self.index_stats(sql, "unused indexes").await
    }

    /// Indexes above the fragmentation threshold.
    ///
    /// # Errors
    /// Returns `UnsupportedFeature` where the engine exposes no physical statistics.
    pub async fn fragmented_indexes(&self) -> Result<Vec<IndexStat>> {
        let sql = self.queries.fragmented_indexes.ok_or_else(|| {
            DiagnosticError::unsupported_feature(
                "Index fragmentation statistics",
                self.executor.dialect().to_string(),
            )
        })?;
        self.index_stats(sql, "fragmented indexes").await
    }

    async fn index_stats(&self, sql: &str, context: &str) -> Result<Vec<IndexStat>> {
        let rows = self.executor.fetch_rows(sql, self.timeout).await?;
        rows.iter()
            .map(|row| {
                Ok(IndexStat {
                    table: TableRef::new(row.get_text(0, context)?, row.get_text(1, context)?),
                    index_name: row.get_text(2, context)?,
                    fragmentation: row.get(3).cloned().flatten(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_refs_display() {
        let table = TableRef::new("dbo", "Orders");
        assert_eq!(table.to_string(), "dbo.Orders");
        assert_eq!(table.column("CustomerId").to_string(), "dbo.Orders.CustomerId");
    }

    #[test]
    fn test_row_ext_text() {
        let r = row(&[Some("main"), None]);
        assert_eq!(r.get_text(0, "test").unwrap(), "main");
        assert!(r.get_text(1, "test").unwrap_err().to_string().contains("NULL"));
        assert!(r.get_text(5, "test").is_err());
    }

    #[test]
    fn test_row_ext_flags_and_counts() {
        let r = row(&[Some("1"), Some("false"), Some("maybe"), Some("42"), Some("-1")]);
        assert!(r.get_flag(0, "test").unwrap());
        assert!(!r.get_flag(1, "test").unwrap());
        assert!(r.get_flag(2, "test").is_err());
        assert_eq!(r.get_count(3, "test").unwrap(), 42);
        assert!(r.get_count(4, "test").is_err());
    }

    #[test]
    fn test_index_stat_display() {
        let stat = IndexStat {
            table: TableRef::new("dbo", "Orders"),
            index_name: "IX_Orders_Date".to_string(),
            fragmentation: Some("37.50".to_string()),
        };
        assert_eq!(stat.to_string(), "dbo.Orders.IX_Orders_Date (37.50%)");
    }
}
