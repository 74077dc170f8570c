// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the CSU tracker offline layer.
//!
//! Absence is never an error: lookups return `Ok(None)`. Per-item failures
//! inside a sync pass are logged by the engine and never escape as a
//! batch-level error.

use thiserror::Error;

/// The primary error type used across all adapter traits and core operations.
#[derive(Debug, Error)]
pub enum CsuError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transient storage failures (I/O, busy database, closed connection).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Structural damage found while reading records: a column holding a value
    /// of the wrong type, an undecodable stored document, or a corrupt file.
    ///
    /// This is the only storage failure that escalates to a full store reset.
    #[error("store corruption detected: {source}")]
    Corruption {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The local store could not be opened. Terminal for the session.
    #[error("local store unavailable: {0}")]
    StoreUnavailable(String),

    /// Network boundary failures (connection refused, non-success status).
    #[error("network error: {message}")]
    Network {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A record or payload failed shape validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CsuError {
    /// Builds a [`CsuError::Network`] without an underlying source.
    pub fn network(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Network {
            message: message.into(),
            status,
            source: None,
        }
    }

    /// Returns true for the corruption class that warrants `reset_database`.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption { .. })
    }
}
