//! Concurrent check execution with fault isolation.
//!
//! Every selected check runs in its own tokio task behind a semaphore that
//! bounds how many run at once. Whatever happens inside a task (an error,
//! a timeout, a panic) is turned into exactly one result that carries the
//! check's own identity; sibling checks are never affected. Results are
//! returned in completion order.

use crate::checks::{Check, CheckContext, CheckRegistry};
use crate::error::{DiagnosticError, redact_database_url};
use crate::executor::{self, QueryExecutor};
use crate::models::{CheckInfo, CheckResult, CheckStatus};
use crate::{DiagnosticsConfig, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

/// Runs registry checks against one target database.
#[derive(Debug, Clone)]
pub struct DiagnosticsRunner {
    registry: CheckRegistry,
    config: DiagnosticsConfig,
}

impl DiagnosticsRunner {
    /// Creates a runner after validating `config`.
    ///
    /// # Errors
    /// Returns a configuration error if `config` fails validation.
    pub fn new(registry: CheckRegistry, config: DiagnosticsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { registry, config })
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    /// Connects to `connection_string` and runs the selected checks.
    ///
    /// A missing or blank connection string, or one that cannot be used at
    /// all (unrecognized format, driver not compiled in), yields an empty
    /// list. Every other failure is reported per check.
    pub async fn run(
        &self,
        connection_string: Option<&str>,
        category: Option<&str>,
    ) -> Vec<CheckResult> {
        let Some(connection_string) = connection_string
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            warn!("No connection string supplied; nothing to run");
            return Vec::new();
        };

        match executor::connect(connection_string, &self.config).await {
            Ok(executor) => {
                info!(
                    "Starting diagnostics against {}",
                    redact_database_url(connection_string)
                );
                self.run_with_executor(executor, category).await
            }
            Err(e) => {
                warn!(
                    "Cannot use connection string {}: {}",
                    redact_database_url(connection_string),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Runs the selected checks through an existing executor.
    pub async fn run_with_executor(
        &self,
        executor: Arc<dyn QueryExecutor>,
        category: Option<&str>,
    ) -> Vec<CheckResult> {
        let checks = self.registry.select(category);
        info!(
            "Running {} check(s) on {} with concurrency {}",
            checks.len(),
            executor.dialect(),
            self.config.max_concurrency
        );

        let started = Instant::now();
        let ctx = Arc::new(CheckContext::new(executor, self.config.clone()));
        let gate = Arc::new(Semaphore::new(self.config.max_concurrency));

        let mut tasks = FuturesUnordered::new();
        for check in checks {
            let info = check.info().clone();
            let spawned_at = Instant::now();
            let handle = tokio::spawn(run_check(check, Arc::clone(&ctx), Arc::clone(&gate)));
            tasks.push(async move {
                match handle.await {
                    Ok(result) => result,
                    Err(e) => aborted(&info, e, spawned_at.elapsed()),
                }
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(result) = tasks.next().await {
            results.push(result);
        }

        let count = |status| results.iter().filter(|r| r.status == status).count();
        info!(
            "Diagnostics finished in {:?}: {} passed, {} warning(s), {} failed",
            started.elapsed(),
            count(CheckStatus::Pass),
            count(CheckStatus::Warning),
            count(CheckStatus::Fail)
        );
        results
    }
}

async fn run_check(
    check: Arc<dyn Check>,
    ctx: Arc<CheckContext>,
    gate: Arc<Semaphore>,
) -> CheckResult {
    let info = check.info();
    let Ok(_permit) = gate.acquire().await else {
        return CheckResult::failed(info, "Check cancelled before it started", Duration::ZERO);
    };

    debug!("Running check {} ({})", info.code, info.name);
    let started = Instant::now();
    let outcome = check.execute(&ctx).await;
    let elapsed = started.elapsed();

    match outcome {
        Ok(outcome) => {
            debug!("Check {} finished: {} in {:?}", info.code, outcome.status, elapsed);
            CheckResult::from_outcome(info, outcome, elapsed)
        }
        Err(e) => {
            warn!("Check {} failed: {}", info.code, e);
            CheckResult::failed(info, failure_message(&e), elapsed)
        }
    }
}

/// Message of the failing result recorded for an error.
pub fn failure_message(error: &DiagnosticError) -> String {
    match error {
        DiagnosticError::UnsupportedFeature {
            feature,
            database_type,
        } => format!("Unable to detect: {feature} not available on {database_type}"),
        _ => {
            let kind = error.fault_kind();
            match error.code() {
                Some(code) => format!("Query failed | {kind} | Code: {code} | {error}"),
                None => format!("Query failed | {kind} | {error}"),
            }
        }
    }
}

fn aborted(info: &CheckInfo, error: JoinError, elapsed: Duration) -> CheckResult {
    let reason = if error.is_panic() {
        let payload = error.into_panic();
        payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "check panicked".to_string())
    } else {
        error.to_string()
    };
    warn!("Check {} aborted: {}", info.code, reason);
    CheckResult::failed(info, format!("Check aborted unexpectedly: {reason}"), elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultKind;

    #[test]
    fn test_failure_message_with_code() {
        let error = DiagnosticError::query(
            FaultKind::Authorization,
            Some("42501".into()),
            "permission denied for table pg_stat_user_indexes",
        );
        assert_eq!(
            failure_message(&error),
            "Query failed | ACCESS DENIED | Code: 42501 | permission denied for table pg_stat_user_indexes"
        );
    }

    #[test]
    fn test_failure_message_timeout() {
        let error = DiagnosticError::timeout(Duration::from_secs(10));
        assert_eq!(
            failure_message(&error),
            "Query failed | TIMEOUT | Statement exceeded timeout of 10s"
        );
    }

    #[test]
    fn test_failure_message_unsupported() {
        let error = DiagnosticError::unsupported_feature("Index fragmentation statistics", "SQLite");
        assert_eq!(
            failure_message(&error),
            "Unable to detect: Index fragmentation statistics not available on SQLite"
        );
    }
}
