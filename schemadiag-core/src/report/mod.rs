//! Categorized report built from a flat result list.
//!
//! Results are grouped by category (case-insensitively, first spelling
//! wins), categories are sorted case-insensitively with
//! [`UNCATEGORIZED`] last, and entries inside a category are ordered by
//! check id. Non-passing entries carry an [`Explanation`] from the
//! [`glossary`].

pub mod glossary;

pub use glossary::Explanation;

use crate::models::{CheckResult, CheckStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category used for results with a blank category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A complete, serializable scan report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub database: ReportDatabase,
    pub summary: ReportSummary,
    pub categories: Vec<ReportCategory>,
}

/// The scanned target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDatabase {
    pub name: String,
    pub server: Option<String>,
    pub scanned_at: DateTime<Utc>,
}

/// Status counts and the sum of per-check elapsed times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub pass: usize,
    pub warn: usize,
    pub fail: usize,
    pub duration_ms: u64,
}

impl ReportSummary {
    pub fn total(&self) -> usize {
        self.pass
            .saturating_add(self.warn)
            .saturating_add(self.fail)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCategory {
    pub name: String,
    pub display_name: String,
    pub checks: Vec<ReportEntry>,
}

/// One check's result as shown in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub id: u32,
    pub code: String,
    pub category: String,
    pub name: String,
    pub title: String,
    pub status: CheckStatus,
    pub message: String,
    pub evidence: Vec<String>,
    pub item_count: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
}

impl ReportEntry {
    fn from_result(result: &CheckResult) -> Self {
        let item_count = result.evidence.len();
        let explanation = (result.status != CheckStatus::Pass)
            .then(|| glossary::explain(&result.code, item_count));
        Self {
            id: result.check_id,
            code: result.code.clone(),
            category: result.category.clone(),
            name: result.name.clone(),
            title: glossary::check_title(&result.code, &result.name),
            status: result.status,
            message: result.message.clone(),
            evidence: result.evidence.clone(),
            item_count,
            duration_ms: result.elapsed_ms(),
            explanation,
        }
    }
}

impl ScanReport {
    /// Builds a report from runner results.
    pub fn build(
        results: &[CheckResult],
        database_name: impl Into<String>,
        server: Option<String>,
        scanned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            scan_id: Uuid::new_v4(),
            database: ReportDatabase {
                name: database_name.into(),
                server,
                scanned_at,
            },
            summary: summarize(results),
            categories: categorize(results),
        }
    }

    /// Every entry, category by category.
    pub fn entries(&self) -> impl Iterator<Item = &ReportEntry> {
        self.categories.iter().flat_map(|c| c.checks.iter())
    }
}

fn summarize(results: &[CheckResult]) -> ReportSummary {
    let mut summary = ReportSummary::default();
    for result in results {
        match result.status {
            CheckStatus::Pass => summary.pass = summary.pass.saturating_add(1),
            CheckStatus::Warning => summary.warn = summary.warn.saturating_add(1),
            CheckStatus::Fail => summary.fail = summary.fail.saturating_add(1),
        }
        summary.duration_ms = summary.duration_ms.saturating_add(result.elapsed_ms());
    }
    summary
}

fn categorize(results: &[CheckResult]) -> Vec<ReportCategory> {
    let mut categories: Vec<ReportCategory> = Vec::new();
    for result in results {
        let name = match result.category.trim() {
            "" => UNCATEGORIZED,
            name => name,
        };
        let entry = ReportEntry::from_result(result);
        match categories
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
        {
            Some(category) => category.checks.push(entry),
            None => categories.push(ReportCategory {
                name: name.to_string(),
                display_name: glossary::category_display_name(name),
                checks: vec![entry],
            }),
        }
    }

    for category in &mut categories {
        category.checks.sort_by_key(|entry| entry.id);
    }
    categories.sort_by_key(|c| {
        (
            c.name.eq_ignore_ascii_case(UNCATEGORIZED),
            c.name.to_lowercase(),
        )
    });
    categories
}
