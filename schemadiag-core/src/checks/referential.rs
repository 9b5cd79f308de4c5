//! Relationship checks: inferred-but-undeclared foreign keys, orphans,
//! weak foreign key targets and circular dependencies.
//!
//! Missing-FK and orphan detection consume the inferred relationship graph
//! (see [`crate::relationships`]); every other check here reads declared
//! foreign keys only.

use super::{Check, CheckContext, NamePatterns, category, first_count};
use crate::Result;
use crate::catalog::{ColumnInfo, ColumnRef, ForeignKeyColumn, KeyColumn, TableRef};
use crate::cycles::nodes_in_cycles;
use crate::models::{CheckInfo, CheckOutcome};
use crate::relationships::{RelationshipGraph, declared_edges, dependency_graph, orphan_candidate};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

define_check!(
    /// Name-matched relationships with no declared foreign key.
    MissingForeignKeys,
    7,
    "Missing Foreign Keys",
    category::REFERENTIAL_INTEGRITY,
    "MISSING_FOREIGN_KEYS"
);

define_check!(
    /// Child rows whose value matches no parent row, per inferred relationship.
    OrphanRecords,
    8,
    "Orphan Records",
    category::REFERENTIAL_INTEGRITY,
    "ORPHAN_RECORDS"
);

define_check!(
    /// Declared foreign keys referencing a column outside every primary or unique key.
    ForeignKeyTargetNotUnique,
    22,
    "FK Target Not Unique",
    category::REFERENTIAL_INTEGRITY,
    "FK_TARGET_NOT_UNIQUE"
);

define_check!(
    /// Declared foreign key columns that allow NULL.
    NullableForeignKeyColumns,
    23,
    "Nullable FK Columns",
    category::REFERENTIAL_INTEGRITY,
    "NULLABLE_FK_COLUMNS"
);

define_check!(
    /// Tables taking part in a circular chain of declared foreign keys.
    CircularForeignKeys,
    25,
    "Circular FK Dependencies",
    category::REFERENTIAL_INTEGRITY,
    "CIRCULAR_FK"
);

define_check!(
    /// `<x>_type` + `<x>_id` column pairs whose id column has no foreign key.
    PolymorphicRelationship,
    27,
    "Polymorphic Relationship (No FK)",
    category::REFERENTIAL_INTEGRITY,
    "POLYMORPHIC_RELATIONSHIP"
);

#[async_trait]
impl Check for MissingForeignKeys {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let graph = RelationshipGraph::load(&ctx.catalog()).await?;
        let items: Vec<String> = graph
            .missing_foreign_keys()
            .iter()
            .map(ToString::to_string)
            .collect();
        Ok(ctx.outcome(
            items,
            "No missing FK relationships found (all enforced by DB or N/A)",
            |n, list| {
                format!(
                    "Found {n} relationship(s) without FK (consider adding FK or document as app-managed): {list}"
                )
            },
        ))
    }
}

#[async_trait]
impl Check for OrphanRecords {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let graph = RelationshipGraph::load(&ctx.catalog()).await?;
        let candidates: Vec<_> = graph
            .inferred
            .iter()
            .map(|edge| orphan_candidate(ctx.dialect(), edge))
            .collect();
        if candidates.is_empty() {
            return Ok(CheckOutcome::pass("No orphan records found"));
        }

        let buckets = ctx.run_batched(&candidates).await;
        let items: Vec<String> = buckets
            .iter()
            .filter_map(|(label, rows)| {
                let count = first_count(rows);
                (count > 0).then(|| format!("{label} ({count} orphan(s))"))
            })
            .collect();
        Ok(ctx.outcome(items, "No orphan records found", |_, list| {
            format!("Found orphan(s): {list}")
        }))
    }
}

#[async_trait]
impl Check for ForeignKeyTargetNotUnique {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let catalog = ctx.catalog();
        let foreign_keys = catalog.foreign_keys().await?;
        let keys = catalog.key_columns().await?;
        let items = non_unique_targets(&foreign_keys, &keys);
        Ok(ctx.outcome(items, "All FK targets are UNIQUE or PK", |_, list| {
            format!("FK references non-unique/non-PK column: {list}")
        }))
    }
}

#[async_trait]
impl Check for NullableForeignKeyColumns {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let catalog = ctx.catalog();
        let foreign_keys = catalog.foreign_keys().await?;
        let columns = catalog.columns().await?;
        let items = nullable_foreign_key_columns(&foreign_keys, &columns);
        Ok(ctx.outcome(items, "No nullable FK columns found", |_, list| {
            format!("FK columns that allow NULL; review if required: {list}")
        }))
    }
}

#[async_trait]
impl Check for CircularForeignKeys {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let foreign_keys = ctx.catalog().foreign_keys().await?;
        let graph = dependency_graph(&declared_edges(&foreign_keys));
        let items: Vec<String> = nodes_in_cycles(&graph)
            .iter()
            .map(ToString::to_string)
            .collect();
        Ok(ctx.outcome(items, "No circular FK dependencies", |_, list| {
            format!("Circular FK dependency detected: {list}")
        }))
    }
}

#[async_trait]
impl Check for PolymorphicRelationship {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let catalog = ctx.catalog();
        let columns = catalog.columns().await?;
        let foreign_keys = catalog.foreign_keys().await?;
        let items = polymorphic_pairs_without_fk(&columns, &foreign_keys);
        Ok(ctx.outcome(
            items,
            "No polymorphic-style type+id pairs without FK",
            |_, list| format!("Polymorphic-style columns with no FK; integrity not enforced: {list}"),
        ))
    }
}

fn non_unique_targets(foreign_keys: &[ForeignKeyColumn], keys: &[KeyColumn]) -> Vec<String> {
    let keyed: BTreeSet<&ColumnRef> = keys.iter().map(|key| &key.column).collect();
    foreign_keys
        .iter()
        .filter(|fk| !keyed.contains(&fk.parent))
        .map(|fk| format!("{} ({}) -> {}", fk.child.table, fk.constraint, fk.parent))
        .collect()
}

fn nullable_foreign_key_columns(
    foreign_keys: &[ForeignKeyColumn],
    columns: &[ColumnInfo],
) -> Vec<String> {
    let nullable: BTreeSet<&ColumnRef> = columns
        .iter()
        .filter(|info| info.nullable)
        .map(|info| &info.column)
        .collect();
    foreign_keys
        .iter()
        .filter(|fk| nullable.contains(&fk.child))
        .map(|fk| format!("{} (FK: {})", fk.child, fk.constraint))
        .collect()
}

fn polymorphic_pairs_without_fk(
    columns: &[ColumnInfo],
    foreign_keys: &[ForeignKeyColumn],
) -> Vec<String> {
    let patterns = NamePatterns::instance();
    let fk_children: BTreeSet<&ColumnRef> = foreign_keys.iter().map(|fk| &fk.child).collect();

    // table -> lowercase prefix -> (type column, id column)
    let mut pairs: BTreeMap<&TableRef, BTreeMap<String, (Option<&str>, Option<&ColumnRef>)>> =
        BTreeMap::new();
    for info in columns {
        let name = info.column.column.as_str();
        if let Some(caps) = patterns.polymorphic_type.captures(name) {
            let prefix = caps[1].to_lowercase();
            pairs
                .entry(&info.column.table)
                .or_default()
                .entry(prefix)
                .or_default()
                .0 = Some(name);
        } else if let Some(caps) = patterns.polymorphic_id.captures(name) {
            let prefix = caps[1].to_lowercase();
            pairs
                .entry(&info.column.table)
                .or_default()
                .entry(prefix)
                .or_default()
                .1 = Some(&info.column);
        }
    }

    let mut items = Vec::new();
    for (table, by_prefix) in pairs {
        for (type_column, id_column) in by_prefix.into_values() {
            if let (Some(type_column), Some(id_column)) = (type_column, id_column)
                && !fk_children.contains(id_column)
            {
                items.push(format!("{table}: {type_column}, {}", id_column.column));
            }
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(table: &str, name: &str) -> ColumnRef {
        TableRef::new("main", table).column(name)
    }

    fn fk(constraint: &str, child: ColumnRef, parent: ColumnRef) -> ForeignKeyColumn {
        ForeignKeyColumn {
            constraint: constraint.into(),
            child,
            parent,
        }
    }

    fn info(table: &str, name: &str, nullable: bool) -> ColumnInfo {
        ColumnInfo {
            column: col(table, name),
            data_type: "INTEGER".into(),
            nullable,
            ordinal: 1,
        }
    }

    #[test]
    fn test_non_unique_targets() {
        let foreign_keys = vec![
            fk("fk_orders_customer", col("Orders", "CustomerId"), col("Customers", "CustomerId")),
            fk("fk_orders_region", col("Orders", "RegionCode"), col("Regions", "Code")),
        ];
        let keys = vec![KeyColumn {
            column: col("Customers", "CustomerId"),
            index_name: "PRIMARY".into(),
            is_primary: true,
            key_width: 1,
        }];
        assert_eq!(
            non_unique_targets(&foreign_keys, &keys),
            vec!["main.Orders (fk_orders_region) -> main.Regions.Code"]
        );
    }

    #[test]
    fn test_nullable_foreign_key_columns() {
        let foreign_keys = vec![
            fk("fk_orders_customer", col("Orders", "CustomerId"), col("Customers", "CustomerId")),
            fk("fk_orders_coupon", col("Orders", "CouponId"), col("Coupons", "CouponId")),
        ];
        let columns = vec![
            info("Orders", "CustomerId", false),
            info("Orders", "CouponId", true),
        ];
        assert_eq!(
            nullable_foreign_key_columns(&foreign_keys, &columns),
            vec!["main.Orders.CouponId (FK: fk_orders_coupon)"]
        );
    }

    #[test]
    fn test_polymorphic_pairs_without_fk() {
        let columns = vec![
            info("Comments", "commentable_type", false),
            info("Comments", "Commentable_Id", false),
            info("Attachments", "owner_type", false),
            info("Attachments", "owner_id", false),
            info("Likes", "target_type", false),
        ];
        let foreign_keys = vec![fk(
            "fk_attachments_owner",
            col("Attachments", "owner_id"),
            col("Owners", "id"),
        )];
        assert_eq!(
            polymorphic_pairs_without_fk(&columns, &foreign_keys),
            vec!["main.Comments: commentable_type, Commentable_Id"]
        );
    }
}
