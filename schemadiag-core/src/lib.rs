//! Schema diagnostics engine for SchemaDiag.
//!
//! This crate inspects a live relational database's catalog and data
//! samples and reports schema-hygiene problems: missing keys, unenforced
//! relationships, orphaned rows, inconsistent types, unused or fragmented
//! indexes and similar issues.
//!
//! # Guarantees
//! - All database operations are read-only
//! - No credentials stored or logged in any result, report or log line
//! - One check's failure never affects another check's result
//!
//! # Architecture
//! - [`checks`]: the check abstraction, the built-in catalog and its registry
//! - [`runner`]: concurrent execution with bounded parallelism and fault isolation
//! - [`batch`]: `UNION ALL` batching of candidate queries with per-candidate fallback
//! - [`relationships`] and [`cycles`]: inferred/declared relationship graphs
//! - [`report`]: categorized report with human-readable explanations
//! - [`executor`]: per-driver query execution behind one trait
//!
//! # Example
//! ```rust,no_run
//! use schemadiag_core::{CheckRegistry, DiagnosticsConfig, DiagnosticsRunner, ScanReport};
//! use schemadiag_core::executor::describe_target;
//!
//! # async fn example() -> schemadiag_core::Result<()> {
//! let url = "postgres://auditor@localhost/sales";
//! let runner = DiagnosticsRunner::new(CheckRegistry::standard(), DiagnosticsConfig::default())?;
//! let results = runner.run(Some(url), None).await;
//!
//! let target = describe_target(url);
//! let report = ScanReport::build(&results, target.database, target.server, chrono::Utc::now());
//! println!("{} warning(s)", report.summary.warn);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod catalog;
pub mod checks;
pub mod config;
pub mod cycles;
pub mod error;
pub mod executor;
pub mod fault;
pub mod logging;
pub mod models;
pub mod relationships;
pub mod report;
pub mod runner;
pub mod sql;

// Re-export commonly used types
pub use checks::{Check, CheckContext, CheckRegistry};
pub use config::DiagnosticsConfig;
pub use error::{DiagnosticError, Result};
pub use executor::QueryExecutor;
pub use fault::FaultKind;
pub use models::{Candidate, CheckInfo, CheckOutcome, CheckResult, CheckStatus, Row};
pub use report::ScanReport;
pub use runner::DiagnosticsRunner;
pub use sql::Dialect;
