//! Batched candidate execution.
//!
//! Many checks probe one query per table or column. Instead of one round
//! trip each, candidates are merged into `UNION ALL` statements of up to
//! `batch_size` derived tables, each prefixed with a literal label column:
//!
//! ```sql
//! SELECT 'orders.customer_id' AS "__diag_label", q.* FROM (<inner query>) AS q
//! UNION ALL
//! SELECT 'lines.order_id' AS "__diag_label", q.* FROM (<inner query>) AS q
//! ```
//!
//! Rows are split back into per-label buckets by that column, which is then
//! stripped. When a merged statement fails, every candidate of that batch is
//! re-run on its own; a candidate that still fails is logged and skipped.
//! Each bucket holds exactly what the candidate's inner query returns alone.

use crate::executor::QueryExecutor;
use crate::models::{Candidate, Row};
use crate::sql::Dialect;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Name of the synthetic label column.
pub const LABEL_COLUMN: &str = "__diag_label";

/// Builds the merged statement for one batch.
pub fn build_union_statement(dialect: Dialect, candidates: &[&Candidate]) -> String {
    let label_column = dialect.quote_identifier(LABEL_COLUMN);
    candidates
        .iter()
        .map(|candidate| {
            format!(
                "SELECT {} AS {label_column}, q.* FROM ({}) AS q",
                dialect.string_literal(&candidate.label),
                inner_query(&candidate.query)
            )
        })
        .collect::<Vec<_>>()
        .join("\nUNION ALL\n")
}

fn inner_query(query: &str) -> &str {
    query.trim().trim_end_matches(';').trim_end()
}

/// Runs candidates in batches and returns their rows keyed by label.
///
/// Every candidate that executed successfully has a bucket, possibly empty.
/// Candidates with a label already seen in this call, and candidates whose
/// query fails even on its own, have none.
pub async fn run_batched(
    executor: &dyn QueryExecutor,
    candidates: &[Candidate],
    batch_size: usize,
    timeout: Duration,
) -> BTreeMap<String, Vec<Row>> {
    let mut seen = BTreeSet::new();
    let unique: Vec<&Candidate> = candidates
        .iter()
        .filter(|candidate| {
            let fresh = seen.insert(candidate.label.as_str());
            if !fresh {
                tracing::warn!("Skipping candidate with duplicate label '{}'", candidate.label);
            }
            fresh
        })
        .collect();

    let mut results = BTreeMap::new();
    for (index, batch) in unique.chunks(batch_size.max(1)).enumerate() {
        let statement = build_union_statement(executor.dialect(), batch);
        tracing::debug!(
            "Executing batch {} with {} candidate(s)",
            index.saturating_add(1),
            batch.len()
        );

        match executor.fetch_rows(&statement, timeout).await {
            Ok(rows) => demultiplex(batch, rows, &mut results),
            Err(error) => {
                tracing::warn!(
                    "Batched statement with {} candidate(s) failed ({}); running candidates individually",
                    batch.len(),
                    error
                );
                run_individually(executor, batch, timeout, &mut results).await;
            }
        }
    }

    results
}

fn demultiplex(batch: &[&Candidate], rows: Vec<Row>, results: &mut BTreeMap<String, Vec<Row>>) {
    for candidate in batch {
        results.entry(candidate.label.clone()).or_insert_with(Vec::new);
    }

    for row in rows {
        let mut values = row.into_iter();
        let Some(Some(label)) = values.next() else {
            tracing::trace!("Dropping batched row without a label");
            continue;
        };
        match results.get_mut(&label) {
            Some(bucket) => bucket.push(values.collect()),
            None => tracing::trace!("Dropping batched row with unknown label '{}'", label),
        }
    }
}

async fn run_individually(
    executor: &dyn QueryExecutor,
    batch: &[&Candidate],
    timeout: Duration,
    results: &mut BTreeMap<String, Vec<Row>>,
) {
    for candidate in batch {
        match executor
            .fetch_rows(inner_query(&candidate.query), timeout)
            .await
        {
            Ok(rows) => {
                results.insert(candidate.label.clone(), rows);
            }
            Err(error) => {
                tracing::warn!("Skipping candidate '{}': {}", candidate.label, error);
            }
        }
    }
}
