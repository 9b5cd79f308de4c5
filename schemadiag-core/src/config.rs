//! Engine configuration.
//!
//! [`DiagnosticsConfig`] holds every tunable the runner, the batched
//! executor and the drivers consult. Defaults are what a scan uses when the
//! caller does not override anything.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::DiagnosticError;

/// Configuration for a diagnostics run.
///
/// # Example
/// ```rust
/// use schemadiag_core::DiagnosticsConfig;
/// use std::time::Duration;
///
/// let config = DiagnosticsConfig::default()
///     .with_max_concurrency(3)
///     .with_batch_timeout(Duration::from_secs(60));
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.batch_size, 25);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Maximum number of checks executing at the same time
    pub max_concurrency: usize,
    /// Maximum number of candidates merged into one statement
    pub batch_size: usize,
    /// Upper bound on candidates a single check probes
    pub max_candidates: usize,
    /// Distinct values sampled per column by format checks
    pub format_sample_size: usize,
    /// Timeout for catalog and other single statements
    pub metadata_timeout: Duration,
    /// Timeout for batched and per-candidate statements
    pub batch_timeout: Duration,
    /// Timeout for establishing a connection
    pub connect_timeout: Duration,
    /// Number of offending items spelled out in a result message
    pub evidence_preview: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            batch_size: 25,
            max_candidates: 25,
            format_sample_size: 100,
            metadata_timeout: Duration::from_secs(10),
            batch_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(15),
            evidence_preview: 10,
        }
    }
}

impl DiagnosticsConfig {
    /// Validates configuration parameters.
    ///
    /// # Errors
    /// Returns error if a limit is zero or out of its supported range
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_concurrency == 0 {
            return Err(DiagnosticError::configuration(
                "max_concurrency must be greater than 0",
            ));
        }

        if self.max_concurrency > 64 {
            return Err(DiagnosticError::configuration(
                "max_concurrency should not exceed 64",
            ));
        }

        if self.batch_size == 0 {
            return Err(DiagnosticError::configuration(
                "batch_size must be greater than 0",
            ));
        }

        if self.max_candidates == 0 {
            return Err(DiagnosticError::configuration(
                "max_candidates must be greater than 0",
            ));
        }

        if self.format_sample_size == 0 {
            return Err(DiagnosticError::configuration(
                "format_sample_size must be greater than 0",
            ));
        }

        for (name, timeout) in [
            ("metadata_timeout", self.metadata_timeout),
            ("batch_timeout", self.batch_timeout),
            ("connect_timeout", self.connect_timeout),
        ] {
            if timeout.is_zero() {
                return Err(DiagnosticError::configuration(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        if self.evidence_preview == 0 {
            return Err(DiagnosticError::configuration(
                "evidence_preview must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Builder method to set the concurrency limit.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Builder method to set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Builder method to set the candidate cap per check.
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Builder method to set the distinct-value sample size.
    pub fn with_format_sample_size(mut self, format_sample_size: usize) -> Self {
        self.format_sample_size = format_sample_size;
        self
    }

    /// Builder method to set the metadata statement timeout.
    pub fn with_metadata_timeout(mut self, timeout: Duration) -> Self {
        self.metadata_timeout = timeout;
        self
    }

    /// Builder method to set the batched statement timeout.
    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    /// Builder method to set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builder method to set how many evidence items a message spells out.
    pub fn with_evidence_preview(mut self, evidence_preview: usize) -> Self {
        self.evidence_preview = evidence_preview;
        self
    }
}
