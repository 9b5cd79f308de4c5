//! Data quality checks that sample row data through the batched executor.
//!
//! Candidate columns are picked from catalog metadata by name, capped at
//! `max_candidates` per check, and probed with one small query each.

use super::{Check, CheckContext, NamePatterns, category, first_count};
use crate::Result;
use crate::catalog::ColumnInfo;
use crate::models::{Candidate, CheckInfo, CheckOutcome, Row};
use crate::sql::Dialect;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

/// Mixed-casing examples kept per column.
const CASING_EXAMPLES: usize = 5;

define_check!(
    /// Key-like columns (Code, Email, Sku, Name) holding repeated values.
    DuplicateRecords,
    17,
    "Duplicate Records",
    category::DATA_QUALITY,
    "DUPLICATE_RECORDS"
);

define_check!(
    /// Status-like text columns with mixed casing or stray whitespace.
    InconsistentFormats,
    28,
    "Inconsistent Formats",
    category::DATA_QUALITY,
    "INCONSISTENT_FORMATS"
);

#[async_trait]
impl Check for DuplicateRecords {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let columns = ctx.catalog().columns().await?;
        let patterns = NamePatterns::instance();
        let candidates: Vec<Candidate> = columns
            .iter()
            .filter(|info| patterns.duplicate_key.is_match(&info.column.column))
            .take(ctx.config().max_candidates)
            .map(|info| duplicate_candidate(ctx.dialect(), info))
            .collect();
        if candidates.is_empty() {
            return Ok(CheckOutcome::pass(
                "No duplicate values found in key-like columns",
            ));
        }

        let buckets = ctx.run_batched(&candidates).await;
        let items: Vec<String> = buckets
            .iter()
            .filter_map(|(label, rows)| {
                let count = first_count(rows);
                (count > 0).then(|| format!("{label} ({count} duplicate value(s))"))
            })
            .collect();
        Ok(ctx.outcome(
            items,
            "No duplicate values found in key-like columns",
            |n, list| format!("Found duplicates in {n} column(s): {list}"),
        ))
    }
}

#[async_trait]
impl Check for InconsistentFormats {
    fn info(&self) -> &CheckInfo {
        &self.info
    }

    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome> {
        let columns = ctx.catalog().columns().await?;
        let patterns = NamePatterns::instance();
        let sample_size = ctx.config().format_sample_size;
        let candidates: Vec<Candidate> = columns
            .iter()
            .filter(|info| patterns.text_type.is_match(&info.data_type))
            .filter(|info| patterns.status_like.is_match(&info.column.column))
            .take(ctx.config().max_candidates)
            .map(|info| {
                let column = &info.column;
                Candidate::new(
                    column.to_string(),
                    ctx.dialect().distinct_sample(
                        &column.table.schema,
                        &column.table.name,
                        &column.column,
                        sample_size,
                    ),
                )
            })
            .collect();
        if candidates.is_empty() {
            return Ok(CheckOutcome::pass(
                "No inconsistent formats found in status-like columns",
            ));
        }

        let buckets = ctx.run_batched(&candidates).await;
        let mut items = Vec::new();
        for (label, rows) in &buckets {
            let findings = detect_inconsistencies(sample_values(rows));
            if !findings.casing_examples.is_empty() {
                let examples = findings
                    .casing_examples
                    .iter()
                    .take(CASING_EXAMPLES)
                    .map(|value| format!("'{value}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                items.push(format!("{label}: mixed casing (e.g. {examples})"));
            }
            if findings.whitespace_count > 0 {
                items.push(format!(
                    "{label}: leading/trailing whitespace in {} value(s)",
                    findings.whitespace_count
                ));
            }
        }
        Ok(ctx.outcome(
            items,
            "No inconsistent formats found in status-like columns",
            |_, list| format!("Found format issue(s): {list}"),
        ))
    }
}

fn duplicate_candidate(dialect: Dialect, info: &ColumnInfo) -> Candidate {
    let col = dialect.quote_identifier(&info.column.column);
    let table = dialect.qualified_table(&info.column.table.schema, &info.column.table.name);
    Candidate::new(
        info.column.to_string(),
        format!(
            "SELECT COUNT(*) AS duplicate_count FROM (SELECT {col} FROM {table} \
             WHERE {col} IS NOT NULL GROUP BY {col} HAVING COUNT(*) > 1) AS d"
        ),
    )
}

fn sample_values(rows: &[Row]) -> impl Iterator<Item = &str> {
    rows.iter()
        .filter_map(|row| row.first().and_then(Option::as_deref))
}

/// Format problems found in one column's distinct values.
#[derive(Debug, Default, PartialEq, Eq)]
struct FormatFindings {
    /// Spellings that collide once trimmed and lowercased, up to five per group
    casing_examples: Vec<String>,
    /// Values with leading or trailing whitespace
    whitespace_count: usize,
}

/// Groups values by their trimmed lowercase form; a group holding more than
/// one distinct spelling is mixed casing. Blank values only count towards
/// whitespace.
fn detect_inconsistencies<'a>(values: impl IntoIterator<Item = &'a str>) -> FormatFindings {
    let mut findings = FormatFindings::default();
    let mut groups: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
    for value in values {
        let trimmed = value.trim();
        if trimmed != value {
            findings.whitespace_count = findings.whitespace_count.saturating_add(1);
        }
        if trimmed.is_empty() {
            continue;
        }
        groups
            .entry(trimmed.to_lowercase())
            .or_default()
            .insert(value);
    }
    for spellings in groups.into_values().filter(|set| set.len() > 1) {
        findings
            .casing_examples
            .extend(spellings.into_iter().take(CASING_EXAMPLES).map(str::to_string));
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TableRef;

    #[test]
    fn test_detect_mixed_casing() {
        let findings = detect_inconsistencies(["Active", "active", "ACTIVE", "Closed"]);
        assert_eq!(findings.casing_examples, vec!["ACTIVE", "Active", "active"]);
        assert_eq!(findings.whitespace_count, 0);
    }

    #[test]
    fn test_detect_whitespace() {
        let findings = detect_inconsistencies(["Open", "Closed ", " Pending"]);
        assert_eq!(findings.whitespace_count, 2);
        assert!(findings.casing_examples.is_empty());
    }

    #[test]
    fn test_whitespace_variant_counts_as_second_spelling() {
        let findings = detect_inconsistencies(["Open", "Open "]);
        assert_eq!(findings.whitespace_count, 1);
        assert_eq!(findings.casing_examples, vec!["Open", "Open "]);
    }

    #[test]
    fn test_every_colliding_group_contributes() {
        let findings = detect_inconsistencies(["Male", "male", "Female", "FEMALE", "  "]);
        assert_eq!(findings.casing_examples, vec!["FEMALE", "Female", "Male", "male"]);
        assert_eq!(findings.whitespace_count, 1);
    }

    #[test]
    fn test_clean_values() {
        assert_eq!(
            detect_inconsistencies(["Open", "Closed", "Pending"]),
            FormatFindings::default()
        );
    }

    #[test]
    fn test_duplicate_candidate_query() {
        let info = ColumnInfo {
            column: TableRef::new("dbo", "Products").column("Sku"),
            data_type: "nvarchar".into(),
            nullable: false,
            ordinal: 2,
        };
        let candidate = duplicate_candidate(Dialect::SqlServer, &info);
        assert_eq!(candidate.label, "dbo.Products.Sku");
        assert_eq!(
            candidate.query,
            "SELECT COUNT(*) AS duplicate_count FROM (SELECT [Sku] FROM [dbo].[Products] \
             WHERE [Sku] IS NOT NULL GROUP BY [Sku] HAVING COUNT(*) > 1) AS d"
        );
    }
}
