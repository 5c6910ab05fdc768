//! Error types for pipelog.
//!
//! This module defines the error taxonomy using `thiserror` for structured error
//! handling. Errors compose via `?` and `From` conversions.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level application error used by the binary
//!   - [`StateError`] - Invariant violations in the state machine (caller bugs)
//!   - [`ProviderError`] - Log data provider failures
//!   - `ConfigError` / `LoggingError` - Startup failures
//!   - `TuiError` - Terminal/TUI rendering failures
//!
//! # Error Recovery Strategy
//!
//! Provider failures are **non-fatal**: the orchestrator records them on the affected
//! section (status `Error`, message shown inline) and every other section keeps working.
//! State errors are **fatal**: they indicate a dispatch with an unknown key or a corrupted
//! store, and propagate to the caller instead of degrading silently.

use crate::model::SectionKey;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error encompassing all failure modes.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Tracing could not be initialized.
    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// The state machine rejected an action.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Execution units could not be discovered.
    #[error("Failed to read log directory: {0}")]
    Source(#[from] ProviderError),

    /// Terminal or TUI rendering error.
    ///
    /// Fatal - without a working terminal, the TUI cannot function.
    #[error("Terminal error: {0}")]
    Terminal(#[from] crate::view::TuiError),
}

/// Invariant violations detected by transition functions.
///
/// These are programming errors on the caller side, never runtime or network
/// conditions. Transitions fail fast with one of these instead of returning a
/// partially updated state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// An action referenced a section key that is not in the store.
    #[error("Unknown section: {key}")]
    UnknownSection {
        /// The key that was not found.
        key: SectionKey,
    },

    /// `CreateSections` received the same key twice.
    #[error("Duplicate section key: {key}")]
    DuplicateSection {
        /// The repeated key.
        key: SectionKey,
    },

    /// `log_keys` and `data_map` no longer describe the same set of sections.
    #[error("Section order and section map diverged at key: {key}")]
    Divergence {
        /// First key found on only one side.
        key: SectionKey,
    },
}

/// Failures reported by a log data provider.
///
/// Recovered locally: the orchestrator maps these into a section `Error` state using
/// the `Display` text as the user-visible message.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider has no log content for this unit.
    #[error("No logs found for {key}")]
    NotFound {
        /// Unit that was requested.
        key: SectionKey,
    },

    /// I/O failure while reading logs.
    #[error("Failed to read logs for {key} from {path}: {source}")]
    Io {
        /// Unit that was requested.
        key: SectionKey,
        /// Location that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The log directory itself could not be listed.
    #[error("Failed to list {path}: {source}")]
    Discovery {
        /// Directory that was listed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The provider answered with an error payload.
    #[error("{message}")]
    Remote {
        /// Message to display in place of the section's lines.
        message: String,
    },

    /// The request was cancelled before it completed.
    #[error("Request cancelled")]
    Cancelled,
}
