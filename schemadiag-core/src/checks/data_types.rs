//! Data type consistency checks.

use super::{Check, CheckContext, NamePatterns, category};
use crate::Result;
use crate::catalog::ColumnInfo;
use crate::models::{CheckInfo, CheckOutcome};
use crate::relationships::{RelationshipGraph, type_mismatches};
use async_trait::async_trait;

define_check!(
    /// Name-matched relationships whose two columns have different declared types.
    ForeignKeyTypeMismatch,
    9,
    "ForeignKey Type Mismatch",
    category::DATA_TYPE_CONSISTENCY,
    "FK_TYPE_MISMATCH"
);

define_check!(
    /// Money-like columns stored as approximate numerics.
    MoneyStoredAsFloat,
    10,
    "Money Stored As Float",
    category::DATA_TYPE_CONSISTENCY,
    "MONEY_AS_FLOAT"
);

#[async_trait]
impl Check for ForeignKeyTypeMismatch {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let graph = RelationshipGraph::load(&ctx.catalog()).await?;
        let items: Vec<String> = type_mismatches(&graph.inferred, &graph.columns)
            .iter()
            .map(ToString::to_string)
            .collect();
        Ok(ctx.outcome(items, "No FK type mismatches found", |n, list| {
            format!("Found {n} mismatch(es): {list}")
        }))
    }
}

#[async_trait]
impl Check for MoneyStoredAsFloat {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let columns = ctx.catalog().columns().await?;
        let items = money_as_float(&columns);
        Ok(ctx.outcome(items, "No money-like columns stored as float/real", |n, list| {
            format!("Found {n} column(s): {list}")
        }))
    }
}

fn money_as_float(columns: &[ColumnInfo]) -> Vec<String> {
    let patterns = NamePatterns::instance();
    columns
        .iter()
        .filter(|info| patterns.money.is_match(&info.column.column))
        .filter(|info| patterns.float_type.is_match(info.data_type.trim()))
        .map(|info| info.column.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TableRef;

    fn column(name: &str, data_type: &str) -> ColumnInfo {
        ColumnInfo {
            column: TableRef::new("dbo", "Invoices").column(name),
            data_type: data_type.into(),
            nullable: false,
            ordinal: 1,
        }
    }

    #[test]
    fn test_money_as_float() {
        let columns = vec![
            column("TotalAmount", "float"),
            column("UnitPrice", "double precision"),
            column("Discount", "real"),
            column("TaxAmount", "decimal(18,2)"),
            column("MoneyBack", "REAL"),
        ];
        assert_eq!(
            money_as_float(&columns),
            vec![
                "dbo.Invoices.TotalAmount",
                "dbo.Invoices.UnitPrice",
                "dbo.Invoices.MoneyBack"
            ]
        );
    }
}
