//! Primary key and unique constraint checks.

use super::{Check, CheckContext, NamePatterns, category};
use crate::Result;
use crate::catalog::{ColumnInfo, KeyColumn, TableRef};
use crate::models::{CheckInfo, CheckOutcome};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

define_check!(
    /// Tables with no primary key.
    MissingPrimaryKeys,
    1,
    "Missing Primary Keys",
    category::KEYS_AND_CONSTRAINTS,
    "MISSING_PK"
);

define_check!(
    /// Email/Sku-like columns not covered by a single-column unique or primary key.
    MissingUniqueConstraints,
    6,
    "Missing Unique Constraints",
    category::KEYS_AND_CONSTRAINTS,
    "MISSING_UNIQUE_CONSTRAINTS"
);

define_check!(
    /// Primary keys spanning more than one column.
    CompositePrimaryKeyReview,
    20,
    "Composite Primary Key Review",
    category::KEYS_AND_CONSTRAINTS,
    "COMPOSITE_PK_REVIEW"
);

#[async_trait]
impl Check for MissingPrimaryKeys {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let catalog = ctx.catalog();
        let tables = catalog.tables().await?;
        let keys = catalog.key_columns().await?;
        let items = tables_without_primary_key(&tables, &keys);
        Ok(ctx.outcome(items, "All tables have primary keys defined", |n, list| {
            format!("Found {n} table(s) with no PK: {list}")
        }))
    }
}

#[async_trait]
impl Check for MissingUniqueConstraints {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let catalog = ctx.catalog();
        let columns = catalog.columns().await?;
        let keys = catalog.key_columns().await?;
        let items = identifiers_without_unique_key(&columns, &keys);
        Ok(ctx.outcome(
            items,
            "No Email/Sku-like columns without unique constraints",
            |n, list| format!("Found {n} column(s): {list}"),
        ))
    }
}

#[async_trait]
impl Check for CompositePrimaryKeyReview {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let keys = ctx.catalog().key_columns().await?;
        let items = composite_primary_keys(&keys);
        Ok(ctx.outcome(items, "No composite primary keys; nothing to review", |n, list| {
            format!("Found {n} table(s) with composite PK: {list}")
        }))
    }
}

fn tables_without_primary_key(tables: &[TableRef], keys: &[KeyColumn]) -> Vec<String> {
    let keyed: BTreeSet<&TableRef> = keys
        .iter()
        .filter(|key| key.is_primary)
        .map(|key| &key.column.table)
        .collect();
    tables
        .iter()
        .filter(|table| !keyed.contains(table))
        .map(ToString::to_string)
        .collect()
}

fn identifiers_without_unique_key(columns: &[ColumnInfo], keys: &[KeyColumn]) -> Vec<String> {
    let patterns = NamePatterns::instance();
    let unique: BTreeSet<_> = keys
        .iter()
        .filter(|key| key.key_width == 1)
        .map(|key| &key.column)
        .collect();
    columns
        .iter()
        .filter(|info| patterns.unique_identifier.is_match(&info.column.column))
        .filter(|info| !unique.contains(&info.column))
        .map(|info| info.column.to_string())
        .collect()
}

fn composite_primary_keys(keys: &[KeyColumn]) -> Vec<String> {
    let widths: BTreeMap<&TableRef, u32> = keys
        .iter()
        .filter(|key| key.is_primary && key.key_width > 1)
        .map(|key| (&key.column.table, key.key_width))
        .collect();
    widths
        .into_iter()
        .map(|(table, width)| format!("{table} ({width} cols)"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> TableRef {
        TableRef::new("main", name)
    }

    fn key(table_name: &str, column: &str, is_primary: bool, key_width: u32) -> KeyColumn {
        KeyColumn {
            column: table(table_name).column(column),
            index_name: if is_primary { "PRIMARY".into() } else { format!("ux_{column}") },
            is_primary,
            key_width,
        }
    }

    fn column(table_name: &str, name: &str) -> ColumnInfo {
        ColumnInfo {
            column: table(table_name).column(name),
            data_type: "TEXT".into(),
            nullable: true,
            ordinal: 1,
        }
    }

    #[test]
    fn test_tables_without_primary_key() {
        let tables = vec![table("Customers"), table("AuditLog"), table("Orders")];
        let keys = vec![
            key("Customers", "CustomerId", true, 1),
            key("AuditLog", "Email", false, 1),
            key("Orders", "OrderId", true, 1),
        ];
        assert_eq!(tables_without_primary_key(&tables, &keys), vec!["main.AuditLog"]);
    }

    #[test]
    fn test_identifiers_without_unique_key() {
        let columns = vec![
            column("Customers", "Email"),
            column("Customers", "BackupEmail"),
            column("Products", "Sku"),
            column("Products", "EmailVerified"),
        ];
        let keys = vec![
            key("Customers", "Email", false, 1),
            // a composite key does not make Sku unique on its own
            key("Products", "Sku", false, 2),
        ];
        assert_eq!(
            identifiers_without_unique_key(&columns, &keys),
            vec!["main.Customers.BackupEmail", "main.Products.Sku"]
        );
    }

    #[test]
    fn test_composite_primary_keys() {
        let keys = vec![
            key("OrderLines", "OrderId", true, 2),
            key("OrderLines", "LineNo", true, 2),
            key("Orders", "OrderId", true, 1),
            key("Tags", "Slug", false, 2),
        ];
        assert_eq!(composite_primary_keys(&keys), vec!["main.OrderLines (2 cols)"]);
    }
}
