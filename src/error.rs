//! Error types used by the resolver runtime and its collaborators.
//!
//! This module defines three enums:
//!
//! - [`ScriptError`]: the script runtime could not start a resolving script.
//! - [`BusError`]: a message could not be registered for or delivered.
//! - [`RuntimeError`]: errors raised by the executor itself.
//!
//! None of them are used for expected resolution outcomes: a failed or cancelled
//! attempt is reported through flags on the action, never through `Err`.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by a [`ScriptRuntime`](crate::ScriptRuntime) when launching a script.
///
/// A launch failure is treated exactly like a failed attempt: the action finishes
/// unsuccessfully and the executor may retry.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// No addon/script is installed for the given plugin path.
    #[error("no script found for {path}")]
    NotFound {
        /// Plugin path that was requested.
        path: String,
    },

    /// The interpreter refused or failed to start the script.
    #[error("failed to launch script: {reason}")]
    Launch {
        /// Interpreter-provided reason.
        reason: String,
    },

    /// The runtime is shutting down or otherwise not accepting work.
    #[error("script runtime unavailable")]
    Unavailable,
}

impl ScriptError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use plugin_resolver::ScriptError;
    ///
    /// let err = ScriptError::Unavailable;
    /// assert_eq!(err.as_label(), "script_unavailable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ScriptError::NotFound { .. } => "script_not_found",
            ScriptError::Launch { .. } => "script_launch_failed",
            ScriptError::Unavailable => "script_unavailable",
        }
    }
}

/// # Errors produced by the [`MessageBus`](crate::MessageBus).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Nobody is registered under the target.
    #[error("unknown target '{target}'")]
    UnknownTarget {
        /// Target that was addressed.
        target: String,
    },

    /// A receiver is already registered under the target.
    #[error("target '{target}' already registered")]
    AlreadyRegistered {
        /// Target that was requested.
        target: String,
    },

    /// The target's mailbox is full (try again later).
    #[error("mailbox full")]
    Full,

    /// The target's mailbox was dropped.
    #[error("mailbox closed")]
    Closed,
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::UnknownTarget { .. } => "bus_unknown_target",
            BusError::AlreadyRegistered { .. } => "bus_already_registered",
            BusError::Full => "bus_full",
            BusError::Closed => "bus_closed",
        }
    }
}

/// # Errors produced by the executor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some resolutions were still in flight.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Paths of the resolutions that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use plugin_resolver::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(1), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck resolutions={stuck:?}")
            }
        }
    }
}
