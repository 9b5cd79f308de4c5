//! Check abstraction and the built-in check catalog.
//!
//! A [`Check`] encodes one rule: it reads catalog metadata (and sometimes
//! sampled rows) through a [`CheckContext`], classifies the outcome and
//! names the offending entities as evidence. Infrastructure failures are
//! returned as errors; the runner turns them into a failing result that
//! still carries the check's identity.

/// Declares a check struct holding its [`CheckInfo`].
macro_rules! define_check {
    ($(#[$meta:meta])* $name:ident, $id:expr, $title:expr, $category:expr, $code:expr) => {
        $(#[$meta])*
        pub struct $name {
            info: crate::models::CheckInfo,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    info: crate::models::CheckInfo::new($id, $title, $category, $code),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

mod data_quality;
mod data_types;
mod indexes;
mod keys;
mod overview;
mod referential;
pub mod registry;
mod structure;

pub use data_quality::{DuplicateRecords, InconsistentFormats};
pub use data_types::{ForeignKeyTypeMismatch, MoneyStoredAsFloat};
pub use indexes::{Fragmentation, UnusedIndexes};
pub use keys::{CompositePrimaryKeyReview, MissingPrimaryKeys, MissingUniqueConstraints};
pub use overview::SchemaSummary;
pub use referential::{
    CircularForeignKeys, ForeignKeyTargetNotUnique, MissingForeignKeys, NullableForeignKeyColumns,
    OrphanRecords, PolymorphicRelationship,
};
pub use registry::CheckRegistry;
pub use structure::{ExtremeNullableRatio, SuspectedJunctionMissingKey};

use crate::catalog::CatalogReader;
use crate::executor::QueryExecutor;
use crate::models::{Candidate, CheckInfo, CheckOutcome, Row, preview_list};
use crate::sql::Dialect;
use crate::{DiagnosticsConfig, Result};
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Category names used by the built-in checks.
pub mod category {
    pub const KEYS_AND_CONSTRAINTS: &str = "Keys & Constraints";
    pub const SCHEMA_AND_STRUCTURE: &str = "Schema & Structure";
    pub const REFERENTIAL_INTEGRITY: &str = "Referential Integrity";
    pub const DATA_TYPE_CONSISTENCY: &str = "Data Type Consistency";
    pub const INDEX_HEALTH: &str = "Index Health";
    pub const SCHEMA_OVERVIEW: &str = "Schema Overview";
    pub const DATA_QUALITY: &str = "Data Quality";
}

/// One diagnostic rule.
///
/// # Example
/// ```rust,ignore
/// struct AlwaysPass(CheckInfo);
///
/// #[async_trait]
/// impl Check for AlwaysPass {
///     fn info(&self) -> &CheckInfo { &self.0 }
///     async fn execute(&self, _ctx: &CheckContext) -> Result<CheckOutcome> {
///         Ok(CheckOutcome::pass("nothing to report"))
///     }
/// }
/// ```
#[async_trait]
pub trait Check: Send + Sync {
    /// Identity: id, display name, category and stable code.
    fn info(&self) -> &CheckInfo;

    /// Runs the rule against the target behind `ctx`.
    ///
    /// # Errors
    /// Returns an error when a round trip fails or the dialect cannot
    /// provide what the rule needs.
    async fn execute(&self, ctx: &CheckContext) -> Result<CheckOutcome>;
}

/// Everything a check may use while it runs.
///
/// Each round trip acquires its own connection from the executor, so one
/// context is shared by every concurrently running check.
pub struct CheckContext {
    executor: Arc<dyn QueryExecutor>,
    config: DiagnosticsConfig,
}

impl CheckContext {
    pub fn new(executor: Arc<dyn QueryExecutor>, config: DiagnosticsConfig) -> Self {
        Self { executor, config }
    }

    pub fn dialect(&self) -> Dialect {
        self.executor.dialect()
    }

    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    /// Runs one statement with the metadata timeout.
    pub async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        self.executor
            .fetch_rows(sql, self.config.metadata_timeout)
            .await
    }

    /// Runs candidates through the batched executor with the batch timeout.
    pub async fn run_batched(&self, candidates: &[Candidate]) -> BTreeMap<String, Vec<Row>> {
        crate::batch::run_batched(
            self.executor.as_ref(),
            candidates,
            self.config.batch_size,
            self.config.batch_timeout,
        )
        .await
    }

    /// Catalog reader bound to the metadata timeout.
    pub fn catalog(&self) -> CatalogReader<'_> {
        CatalogReader::new(self.executor.as_ref(), self.config.metadata_timeout)
    }

    /// First few evidence items followed by " ... and K more".
    pub fn preview(&self, items: &[String]) -> String {
        preview_list(items, self.config.evidence_preview)
    }

    /// Pass when `items` is empty, otherwise a warning whose message is
    /// built from the item count and the preview list.
    pub fn outcome(
        &self,
        items: Vec<String>,
        pass_message: &str,
        warning_message: impl FnOnce(usize, &str) -> String,
    ) -> CheckOutcome {
        if items.is_empty() {
            return CheckOutcome::pass(pass_message);
        }
        let message = warning_message(items.len(), &self.preview(&items));
        CheckOutcome::warning(message, items)
    }
}

/// Parses the single count a candidate query returns; missing or malformed rows count as zero.
pub(crate) fn first_count(rows: &[Row]) -> u64 {
    rows.first()
        .and_then(|row| row.first())
        .and_then(Option::as_deref)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Column-name and type heuristics shared by the checks.
pub(crate) struct NamePatterns {
    /// Email/Sku-like business identifiers expected to be unique
    pub unique_identifier: Regex,
    /// Natural-key-like columns probed for duplicate values
    pub duplicate_key: Regex,
    /// Monetary amounts
    pub money: Regex,
    /// Approximate numeric types
    pub float_type: Regex,
    /// `...Id`, `..._id` and bare `id` reference columns
    pub id_suffix: Regex,
    /// Status/type/enumerated columns
    pub status_like: Regex,
    /// Character types
    pub text_type: Regex,
    /// `<prefix>_type` half of a polymorphic pair
    pub polymorphic_type: Regex,
    /// `<prefix>_id` half of a polymorphic pair
    pub polymorphic_id: Regex,
}

impl NamePatterns {
    /// Gets the singleton instance of pre-compiled patterns.
    pub fn instance() -> &'static Self {
        static PATTERNS: OnceLock<NamePatterns> = OnceLock::new();
        PATTERNS.get_or_init(Self::compile)
    }

    fn compile() -> Self {
        Self {
            unique_identifier: Regex::new(r"(?i)(email|sku)$").expect("Invalid identifier pattern"),
            duplicate_key: Regex::new(r"(?i)(^name$|code$|email$|sku$)")
                .expect("Invalid duplicate key pattern"),
            money: Regex::new(r"(?i)(total|amount|price|money)").expect("Invalid money pattern"),
            float_type: Regex::new(r"(?i)^(float|real|double)\b").expect("Invalid float pattern"),
            id_suffix: Regex::new(r"(^|_)[Ii][Dd]$|[a-z0-9]Id$").expect("Invalid id pattern"),
            status_like: Regex::new(r"(?i)(status|type|gender|state|role)")
                .expect("Invalid status pattern"),
            text_type: Regex::new(r"(?i)(char|text|clob)").expect("Invalid text type pattern"),
            polymorphic_type: Regex::new(r"(?i)^(.+)_type$").expect("Invalid type pattern"),
            polymorphic_id: Regex::new(r"(?i)^(.+)_id$").expect("Invalid id pair pattern"),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for check unit tests.

    use super::*;
    use crate::error::DiagnosticError;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Executor answering statements by substring match, in registration order.
    pub struct FakeExecutor {
        dialect: Dialect,
        responses: Vec<(String, std::result::Result<Vec<Row>, String>)>,
        pub statements: Mutex<Vec<String>>,
    }

    impl FakeExecutor {
        pub fn new(dialect: Dialect) -> Self {
            Self {
                dialect,
                responses: Vec::new(),
                statements: Mutex::new(Vec::new()),
            }
        }

        pub fn respond(mut self, needle: &str, rows: Vec<Vec<Option<&str>>>) -> Self {
            let rows = rows
                .into_iter()
                .map(|row| row.into_iter().map(|v| v.map(str::to_string)).collect())
                .collect();
            self.responses.push((needle.to_string(), Ok(rows)));
            self
        }

        pub fn fail(mut self, needle: &str, message: &str) -> Self {
            self.responses
                .push((needle.to_string(), Err(message.to_string())));
            self
        }
    }

    #[async_trait]
    impl QueryExecutor for FakeExecutor {
        fn dialect(&self) -> Dialect {
            self.dialect
        }

        async fn fetch_rows(&self, sql: &str, _timeout: Duration) -> Result<Vec<Row>> {
            self.statements.lock().unwrap().push(sql.to_string());
            for (needle, response) in &self.responses {
                if sql.contains(needle.as_str()) {
                    return response
                        .clone()
                        .map_err(DiagnosticError::query_failed);
                }
            }
            Ok(Vec::new())
        }
    }

    pub fn context(executor: FakeExecutor) -> CheckContext {
        CheckContext::new(Arc::new(executor), DiagnosticsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_preview() {
        let ctx = testing::context(testing::FakeExecutor::new(Dialect::Sqlite));
        let pass = ctx.outcome(Vec::new(), "all good", |n, list| format!("{n}: {list}"));
        assert_eq!(pass.status, crate::models::CheckStatus::Pass);
        assert_eq!(pass.message, "all good");

        let items: Vec<String> = (0..12).map(|i| format!("t{i}")).collect();
        let warning = ctx.outcome(items, "all good", |n, list| format!("Found {n}: {list}"));
        assert_eq!(warning.status, crate::models::CheckStatus::Warning);
        assert!(warning.message.starts_with("Found 12: t0, t1"));
        assert!(warning.message.ends_with(" ... and 2 more"));
        assert_eq!(warning.evidence.len(), 12);
    }

    #[test]
    fn test_first_count() {
        assert_eq!(first_count(&[vec![Some("7".to_string())]]), 7);
        assert_eq!(first_count(&[vec![None]]), 0);
        assert_eq!(first_count(&[]), 0);
        assert_eq!(first_count(&[vec![Some("n/a".to_string())]]), 0);
    }

    #[test]
    fn test_name_patterns() {
        let p = NamePatterns::instance();
        assert!(p.unique_identifier.is_match("CustomerEmail"));
        assert!(p.unique_identifier.is_match("sku"));
        assert!(!p.unique_identifier.is_match("EmailVerified"));

        assert!(p.duplicate_key.is_match("Name"));
        assert!(p.duplicate_key.is_match("ProductCode"));
        assert!(!p.duplicate_key.is_match("FirstName"));

        assert!(p.float_type.is_match("double precision"));
        assert!(p.float_type.is_match("FLOAT"));
        assert!(!p.float_type.is_match("decimal(10,2)"));

        assert!(p.text_type.is_match("character varying"));
        assert!(p.text_type.is_match("nvarchar"));
        assert!(!p.text_type.is_match("integer"));

        assert!(p.id_suffix.is_match("OrderId"));
        assert!(p.id_suffix.is_match("customer_id"));
        assert!(p.id_suffix.is_match("ID"));
        assert!(p.id_suffix.is_match("Product2Id"));
        assert!(!p.id_suffix.is_match("Paid"));
        assert!(!p.id_suffix.is_match("Valid"));
        assert!(!p.id_suffix.is_match("Rapid"));

        let caps = p.polymorphic_type.captures("commentable_type").unwrap();
        assert_eq!(&caps[1], "commentable");
    }
}
