//! Schema overview: always runs, whatever category filter is applied.

use super::{Check, CheckContext, category};
use crate::Result;
use crate::models::{CheckInfo, CheckOutcome};
use async_trait::async_trait;
use std::collections::BTreeSet;

define_check!(
    /// Counts of schemas, tables, columns, primary keys and declared relationships.
    SchemaSummary,
    15,
    "Schema Summary",
    category::SCHEMA_OVERVIEW,
    "SCHEMA_SUMMARY"
);

/// Catalog totals shown by [`SchemaSummary`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SchemaCounts {
    schemas: usize,
    tables: usize,
    columns: usize,
    primary_keys: usize,
    relationships: usize,
}

impl SchemaCounts {
    fn message(&self) -> String {
        let relationships = if self.relationships == 0 {
            "no relationships".to_string()
        } else {
            plural(self.relationships, "relationship", "relationships")
        };
        [
            plural(self.schemas, "schema", "schemas"),
            plural(self.tables, "table", "tables"),
            plural(self.columns, "column", "columns"),
            plural(self.primary_keys, "primary key", "primary keys"),
            relationships,
        ]
        .join(" • ")
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

#[async_trait]
impl Check for SchemaSummary {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let catalog = ctx.catalog();
        let tables = catalog.tables().await?;
        let columns = catalog.columns().await?;
        let keys = catalog.key_columns().await?;
        let foreign_keys = catalog.foreign_keys().await?;

        let counts = SchemaCounts {
            schemas: tables.iter().map(|t| &t.schema).collect::<BTreeSet<_>>().len(),
            tables: tables.len(),
            columns: columns.len(),
            primary_keys: keys
                .iter()
                .filter(|key| key.is_primary)
                .map(|key| &key.column.table)
                .collect::<BTreeSet<_>>()
                .len(),
            relationships: foreign_keys
                .iter()
                .map(|fk| (&fk.child.table, &fk.constraint))
                .collect::<BTreeSet<_>>()
                .len(),
        };
        Ok(CheckOutcome::pass(counts.message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_message() {
        let counts = SchemaCounts {
            schemas: 1,
            tables: 4,
            columns: 17,
            primary_keys: 3,
            relationships: 0,
        };
        assert_eq!(
            counts.message(),
            "1 schema • 4 tables • 17 columns • 3 primary keys • no relationships"
        );

        let counts = SchemaCounts {
            schemas: 2,
            tables: 1,
            columns: 1,
            primary_keys: 1,
            relationships: 1,
        };
        assert_eq!(
            counts.message(),
            "2 schemas • 1 table • 1 column • 1 primary key • 1 relationship"
        );
    }
}
