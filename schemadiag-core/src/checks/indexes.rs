//! Index health checks backed by engine statistics.
//!
//! SQLite keeps neither usage nor fragmentation statistics and PostgreSQL
//! exposes no fragmentation view without extensions; on those engines the
//! catalog reader reports the feature as unsupported.

use super::{Check, CheckContext, category};
use crate::Result;
use crate::models::{CheckInfo, CheckOutcome};
use async_trait::async_trait;

define_check!(
    /// Non-key indexes with no reads since statistics were last reset.
    UnusedIndexes,
    12,
    "Unused Indexes",
    category::INDEX_HEALTH,
    "UNUSED_INDEXES"
);

define_check!(
    /// Indexes over 10% fragmented with at least 8 pages.
    Fragmentation,
    13,
    "Fragmentation",
    category::INDEX_HEALTH,
    "FRAGMENTATION"
);

#[async_trait]
impl Check for UnusedIndexes {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let items: Vec<String> = ctx
            .catalog()
            .unused_indexes()
            .await?
            .iter()
            .map(ToString::to_string)
            .collect();
        Ok(ctx.outcome(items, "No unused indexes found", |n, list| {
            format!("Found {n} unused index(es): {list}")
        }))
    }
}

#[async_trait]
impl Check for Fragmentation {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let items: Vec<String> = ctx
            .catalog()
            .fragmented_indexes()
            .await?
            .iter()
            .map(ToString::to_string)
            .collect();
        Ok(ctx.outcome(items, "No significant index fragmentation", |n, list| {
            format!("Found {n} fragmented index(es): {list}")
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{FakeExecutor, context};
    use crate::error::DiagnosticError;
    use crate::models::CheckStatus;
    use crate::sql::Dialect;

    #[tokio::test]
    async fn test_unused_indexes_reported() {
        let ctx = context(FakeExecutor::new(Dialect::Postgres).respond(
            "pg_stat_user_indexes",
            vec![vec![Some("public"), Some("orders"), Some("ix_orders_note")]],
        ));
        let outcome = UnusedIndexes::new().execute(&ctx).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Warning);
        assert_eq!(
            outcome.message,
            "Found 1 unused index(es): public.orders.ix_orders_note"
        );
    }

    #[tokio::test]
    async fn test_fragmentation_reported_with_percent() {
        let ctx = context(FakeExecutor::new(Dialect::SqlServer).respond(
            "avg_fragmentation_in_percent",
            vec![vec![
                Some("dbo"),
                Some("Orders"),
                Some("IX_Orders_Date"),
                Some("42.5"),
            ]],
        ));
        let outcome = Fragmentation::new().execute(&ctx).await.unwrap();
        assert_eq!(outcome.evidence, vec!["dbo.Orders.IX_Orders_Date (42.5%)"]);
    }

    #[tokio::test]
    async fn test_sqlite_statistics_unsupported() {
        let ctx = context(FakeExecutor::new(Dialect::Sqlite));
        let error = Fragmentation::new().execute(&ctx).await.unwrap_err();
        assert!(matches!(error, DiagnosticError::UnsupportedFeature { .. }));
        let error = UnusedIndexes::new().execute(&ctx).await.unwrap_err();
        assert!(matches!(error, DiagnosticError::UnsupportedFeature { .. }));
    }
}
