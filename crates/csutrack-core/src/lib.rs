// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the CSU tracker offline layer.
//!
//! This crate provides the records owned by the local store, the
//! schema-versioned mutation envelope, the error taxonomy, and the adapter
//! traits the sync engine is written against.

pub mod error;
pub mod payload;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CsuError;
pub use payload::{FieldValue, FormFields, MutationBody, PayloadEnvelope, PAYLOAD_VERSION};
pub use types::{
    AdapterType, CachedPage, CachedUserData, DeadLetter, Entry, EntryDraft, EntryPayload,
    HealthStatus, HttpMethod, ResetOutcome, RetryOutcome, StoreStats, SyncQueueItem,
};

pub use traits::{LocalStore, Notifier, PluginAdapter, SyncTransport, ToastKind};
