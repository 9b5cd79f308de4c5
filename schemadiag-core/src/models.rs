//! Core data models shared by checks, the runner and the report builder.
//!
//! Everything here is plain data: check identity, the outcome a check
//! produces, the result the runner records for it, and the candidate unit
//! the batched executor merges into one statement.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One row returned by a target database; every value rendered as text, NULL as `None`.
pub type Row = Vec<Option<String>>;

/// Outcome classification of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    /// No issue found
    Pass,
    /// Issue found; advisory
    Warning,
    /// The check could not run or could not detect the condition
    Fail,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "PASS"),
            CheckStatus::Warning => write!(f, "WARNING"),
            CheckStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Identity of a check: numeric id, display name, category and stable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInfo {
    pub id: u32,
    pub name: String,
    pub category: String,
    pub code: String,
}

impl CheckInfo {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        category: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            code: code.into(),
        }
    }
}

/// What a check returns when its rule ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub status: CheckStatus,
    pub message: String,
    pub evidence: Vec<String>,
}

impl CheckOutcome {
    /// A passing outcome with no evidence.
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Pass,
            message: message.into(),
            evidence: Vec::new(),
        }
    }

    /// An advisory outcome backed by the offending entities.
    pub fn warning(message: impl Into<String>, evidence: Vec<String>) -> Self {
        Self {
            status: CheckStatus::Warning,
            message: message.into(),
            evidence,
        }
    }

    /// A failing outcome.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            message: message.into(),
            evidence: Vec::new(),
        }
    }
}

/// The recorded result of one executed check.
///
/// Exactly one is produced per selected check, whatever happened during
/// its execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_id: u32,
    pub name: String,
    pub category: String,
    pub code: String,
    pub status: CheckStatus,
    pub message: String,
    #[serde(rename = "elapsed_ms", with = "duration_ms")]
    pub elapsed: Duration,
    pub evidence: Vec<String>,
}

impl CheckResult {
    /// Builds a result from a check's identity and its outcome.
    pub fn from_outcome(info: &CheckInfo, outcome: CheckOutcome, elapsed: Duration) -> Self {
        Self {
            check_id: info.id,
            name: info.name.clone(),
            category: info.category.clone(),
            code: info.code.clone(),
            status: outcome.status,
            message: outcome.message,
            elapsed,
            evidence: outcome.evidence,
        }
    }

    /// Builds a failing result carrying the check's identity.
    pub fn failed(info: &CheckInfo, message: impl Into<String>, elapsed: Duration) -> Self {
        Self::from_outcome(info, CheckOutcome::fail(message), elapsed)
    }

    /// Elapsed time in whole milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// One unit of a batched query pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Demultiplexing key; unique within one batched call
    pub label: String,
    /// Standalone SELECT whose rows belong to this candidate
    pub query: String,
}

impl Candidate {
    pub fn new(label: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            query: query.into(),
        }
    }
}

/// Joins the first `preview` items and appends " ... and K more" when truncated.
///
/// # Example
/// ```rust
/// use schemadiag_core::models::preview_list;
///
/// let items = vec!["a".to_string(), "b".to_string(), "c".to_string()];
/// assert_eq!(preview_list(&items, 2), "a, b ... and 1 more");
/// assert_eq!(preview_list(&items, 5), "a, b, c");
/// ```
pub fn preview_list(items: &[String], preview: usize) -> String {
    let shown = items
        .iter()
        .take(preview)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > preview {
        format!("{shown} ... and {} more", items.len().saturating_sub(preview))
    } else {
        shown
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
