//! Error types for the searchcap governor and its configuration loader.
//!
//! A budget violation is not an error: it is the expected way a governed run
//! ends and is modelled by `HookOutcome`. The variants here cover genuine
//! failures only.

use thiserror::Error;

/// The unified error type for the searchcap crates.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// A configuration document or override is missing, malformed, or names
    /// an unknown key.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A check interval <= 0 was supplied programmatically.
    #[error("check interval must be positive, got {value}")]
    InvalidCheckInterval { value: i64 },

    /// A measurement source (heap usage, clock) could not be queried.
    ///
    /// Only the check depending on that source is disabled; the governor
    /// keeps running.
    #[error("measurement source '{source_name}' unavailable: {reason}")]
    MeasurementUnavailable { source_name: String, reason: String },
}

/// Convenience alias used throughout the searchcap crates.
pub type BudgetResult<T> = Result<T, BudgetError>;
