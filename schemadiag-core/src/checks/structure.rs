//! Table shape checks.

use super::{Check, CheckContext, NamePatterns, category};
use crate::Result;
use crate::catalog::{ColumnInfo, KeyColumn, TableRef};
use crate::models::{CheckInfo, CheckOutcome};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

define_check!(
    /// Tables where more than half of the columns are nullable.
    ExtremeNullableRatio,
    3,
    "Extreme Nullable Ratio",
    category::SCHEMA_AND_STRUCTURE,
    "EXTREME_NULLABLE_RATIO"
);

define_check!(
    /// Tables that look like junctions (two or more `...Id` columns) with no multi-column key.
    SuspectedJunctionMissingKey,
    4,
    "Suspected Junction Missing Key",
    category::SCHEMA_AND_STRUCTURE,
    "JUNCTION_MISSING_KEY"
);

#[async_trait]
impl Check for ExtremeNullableRatio {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let columns = ctx.catalog().columns().await?;
        let items = mostly_nullable_tables(&columns);
        Ok(ctx.outcome(items, "No tables with extreme nullable ratio", |n, list| {
            format!("Found {n} table(s) with >50% nullable columns: {list}")
        }))
    }
}

#[async_trait]
impl Check for SuspectedJunctionMissingKey {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let catalog = ctx.catalog();
        let columns = catalog.columns().await?;
        let keys = catalog.key_columns().await?;
        let items = junctions_without_composite_key(&columns, &keys);
        Ok(ctx.outcome(
            items,
            "No suspected junction tables without composite key",
            |n, list| format!("Found {n} table(s): {list}"),
        ))
    }
}

fn mostly_nullable_tables(columns: &[ColumnInfo]) -> Vec<String> {
    // table -> (nullable, total)
    let mut counts: BTreeMap<&TableRef, (usize, usize)> = BTreeMap::new();
    for info in columns {
        let entry = counts.entry(&info.column.table).or_default();
        if info.nullable {
            entry.0 = entry.0.saturating_add(1);
        }
        entry.1 = entry.1.saturating_add(1);
    }
    counts
        .into_iter()
        .filter(|(_, (nullable, total))| nullable.saturating_mul(2) > *total)
        .map(|(table, _)| table.to_string())
        .collect()
}

fn junctions_without_composite_key(columns: &[ColumnInfo], keys: &[KeyColumn]) -> Vec<String> {
    let patterns = NamePatterns::instance();
    let mut id_columns: BTreeMap<&TableRef, usize> = BTreeMap::new();
    for info in columns {
        if patterns.id_suffix.is_match(&info.column.column) {
            let count = id_columns.entry(&info.column.table).or_default();
            *count = count.saturating_add(1);
        }
    }
    let composite: BTreeSet<&TableRef> = keys
        .iter()
        .filter(|key| key.key_width >= 2)
        .map(|key| &key.column.table)
        .collect();
    id_columns
        .into_iter()
        .filter(|(table, count)| *count >= 2 && !composite.contains(table))
        .map(|(table, _)| table.to_string())
        .collect()
}
