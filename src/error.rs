//! Error types used by the executor runtime, work functions and result handlers.
//!
//! This module defines three enums:
//!
//! - [`RuntimeError`]: errors raised by the executor itself (bad configuration,
//!   failed start hook, a defective result handler).
//! - [`WorkError`]: errors returned by a work function for one item.
//! - [`HandleError`]: errors returned by the result handler.
//!
//! `WorkError` and `HandleError` both carry a distinguished `Abort` variant: it is
//! never reported as a per-item failure, it trips the run-wide kill switch.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the executor runtime.
///
/// A `RuntimeError` means the run either never started (configuration, start hook)
/// or was ended by a defect that must not go unnoticed (result handler failure).
/// Per-item failures and aborts are **not** runtime errors.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The executor configuration is invalid; no queue or task was created.
    #[error("invalid configuration: {reason}")]
    Config {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The start hook returned an error; no worker was started.
    #[error("start hook failed: {error}")]
    StartHook {
        /// The underlying error message.
        error: String,
    },

    /// The result handler returned an ordinary (non-abort) error.
    #[error("result handler failed: {error}")]
    HandlerFailed {
        /// The underlying error message.
        error: String,
    },

    /// The result handler panicked.
    #[error("result handler panicked: {info}")]
    HandlerPanicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The finisher task could not be joined (cancelled by the runtime).
    #[error("finisher task lost: {error}")]
    FinisherLost {
        /// Join error rendered as text.
        error: String,
    },

    /// The blocking entry point could not build its tokio runtime.
    #[error("failed to build runtime: {error}")]
    Runtime {
        /// The underlying I/O error message.
        error: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use dynexec::RuntimeError;
    ///
    /// let err = RuntimeError::Config { reason: "poll_period must be > 0".into() };
    /// assert_eq!(err.as_label(), "runtime_config");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Config { .. } => "runtime_config",
            RuntimeError::StartHook { .. } => "runtime_start_hook",
            RuntimeError::HandlerFailed { .. } => "runtime_handler_failed",
            RuntimeError::HandlerPanicked { .. } => "runtime_handler_panicked",
            RuntimeError::FinisherLost { .. } => "runtime_finisher_lost",
            RuntimeError::Runtime { .. } => "runtime_build_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::Config { reason } => format!("config: {reason}"),
            RuntimeError::StartHook { error } => format!("start hook: {error}"),
            RuntimeError::HandlerFailed { error } => format!("handler: {error}"),
            RuntimeError::HandlerPanicked { info } => format!("handler panic: {info}"),
            RuntimeError::FinisherLost { error } => format!("finisher: {error}"),
            RuntimeError::Runtime { error } => format!("runtime: {error}"),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        RuntimeError::Config {
            reason: reason.into(),
        }
    }

    pub(crate) fn non_zero(field: &str, value: Duration) -> Self {
        Self::config(format!("{field} must be greater than zero (got {value:?})"))
    }
}

/// # Errors produced by a work function.
///
/// - [`WorkError::Fail`] is reported to the handler as a
///   [`WorkResult::Failure`](crate::WorkResult::Failure) for the item; the run goes on.
/// - [`WorkError::Abort`] trips the kill switch; the item produces no result.
///
/// Any `anyhow::Error` converts into `Fail`, keeping its debug rendering
/// (error chain and backtrace, when captured) as the diagnostic:
///
/// ```
/// use dynexec::WorkError;
///
/// fn parse(s: &str) -> Result<u32, WorkError> {
///     let n: u32 = s.parse().map_err(anyhow::Error::from)?;
///     Ok(n)
/// }
///
/// let err = parse("x").unwrap_err();
/// assert_eq!(err.as_label(), "work_failed");
/// assert!(!err.is_abort());
/// ```
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkError {
    /// Processing this item failed.
    #[error("{message}")]
    Fail {
        /// Human-readable message.
        message: String,
        /// Opaque diagnostic (trace, chain) for observability.
        diagnostic: String,
    },

    /// Stop the whole run.
    #[error("abort requested: {reason}")]
    Abort {
        /// Why the run is being aborted.
        reason: String,
    },
}

impl WorkError {
    /// Creates an ordinary failure with an empty diagnostic.
    pub fn fail(message: impl fmt::Display) -> Self {
        WorkError::Fail {
            message: message.to_string(),
            diagnostic: String::new(),
        }
    }

    /// Creates an ordinary failure with an explicit diagnostic.
    pub fn fail_with(message: impl fmt::Display, diagnostic: impl Into<String>) -> Self {
        WorkError::Fail {
            message: message.to_string(),
            diagnostic: diagnostic.into(),
        }
    }

    /// Creates the abort signal.
    pub fn abort(reason: impl fmt::Display) -> Self {
        WorkError::Abort {
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for the abort signal.
    pub fn is_abort(&self) -> bool {
        matches!(self, WorkError::Abort { .. })
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Fail { .. } => "work_failed",
            WorkError::Abort { .. } => "work_abort",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            WorkError::Fail { message, .. } => format!("error: {message}"),
            WorkError::Abort { reason } => format!("abort: {reason}"),
        }
    }
}

impl From<anyhow::Error> for WorkError {
    fn from(err: anyhow::Error) -> Self {
        WorkError::Fail {
            message: format!("{err:#}"),
            diagnostic: format!("{err:?}"),
        }
    }
}

/// # Errors produced by the result handler.
///
/// - [`HandleError::Abort`] trips the kill switch and stops the finisher; the run
///   ends early without an error.
/// - [`HandleError::Fail`] is a handler defect: the run is stopped and
///   [`RuntimeError::HandlerFailed`] is returned from `run`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// The handler itself is broken.
    #[error("handler failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Stop the whole run.
    #[error("abort requested: {reason}")]
    Abort {
        /// Why the run is being aborted.
        reason: String,
    },
}

impl HandleError {
    /// Creates a handler failure.
    pub fn fail(error: impl fmt::Display) -> Self {
        HandleError::Fail {
            error: error.to_string(),
        }
    }

    /// Creates the abort signal.
    pub fn abort(reason: impl fmt::Display) -> Self {
        HandleError::Abort {
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for the abort signal.
    pub fn is_abort(&self) -> bool {
        matches!(self, HandleError::Abort { .. })
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandleError::Fail { .. } => "handle_failed",
            HandleError::Abort { .. } => "handle_abort",
        }
    }
}

impl From<anyhow::Error> for HandleError {
    fn from(err: anyhow::Error) -> Self {
        HandleError::Fail {
            error: format!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anyhow_conversion_keeps_chain_in_message_and_diagnostic() {
        let err = anyhow::anyhow!("disk full").context("writing item 7");
        let work: WorkError = err.into();
        match work {
            WorkError::Fail {
                message,
                diagnostic,
            } => {
                assert_eq!(message, "writing item 7: disk full");
                assert!(diagnostic.contains("disk full"));
                assert!(diagnostic.contains("writing item 7"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn abort_is_never_a_failure() {
        assert!(WorkError::abort("stop").is_abort());
        assert!(!WorkError::fail("boom").is_abort());
        assert!(HandleError::abort("stop").is_abort());
        assert!(!HandleError::fail("boom").is_abort());
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(WorkError::fail("x").as_label(), "work_failed");
        assert_eq!(WorkError::abort("x").as_label(), "work_abort");
        assert_eq!(HandleError::fail("x").as_label(), "handle_failed");
        assert_eq!(
            RuntimeError::non_zero("poll_period", Duration::ZERO).as_label(),
            "runtime_config"
        );
        assert_eq!(
            RuntimeError::HandlerPanicked { info: "x".into() }.as_message(),
            "handler panic: x"
        );
    }
}
