// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Records owned by the local store and the common types used across
//! adapter trait boundaries.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CsuError;
use crate::payload::PayloadEnvelope;

/// Highest combined score accepted for a single entry.
pub const MAX_ENTRY_SCORE: u32 = 42;

/// Highest value of an itch or hive component score.
pub const MAX_COMPONENT_SCORE: u8 = 3;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Transport,
    Notifier,
    Fetcher,
}

/// HTTP verb recorded for a queued mutation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// A daily entry as submitted by the user, before the store stamps it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub score: u32,
    #[serde(default)]
    pub itch_score: u8,
    #[serde(default)]
    pub hive_score: u8,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub qol_data: BTreeMap<String, i64>,
}

impl EntryDraft {
    /// Checks the minimal shape required before an entry may be stored.
    pub fn validate(&self) -> Result<(), CsuError> {
        if self.itch_score > MAX_COMPONENT_SCORE {
            return Err(CsuError::Validation(format!(
                "itch_score must be between 0 and {MAX_COMPONENT_SCORE}, got {}",
                self.itch_score
            )));
        }
        if self.hive_score > MAX_COMPONENT_SCORE {
            return Err(CsuError::Validation(format!(
                "hive_score must be between 0 and {MAX_COMPONENT_SCORE}, got {}",
                self.hive_score
            )));
        }
        if self.score > MAX_ENTRY_SCORE {
            return Err(CsuError::Validation(format!(
                "score must be between 0 and {MAX_ENTRY_SCORE}, got {}",
                self.score
            )));
        }
        if self.triggers.iter().any(|t| t.trim().is_empty()) {
            return Err(CsuError::Validation("triggers must not contain blank names".into()));
        }
        Ok(())
    }

    /// Stamps the draft as a locally modified, not yet synced entry.
    pub fn into_entry(self, updated_at: DateTime<Utc>) -> Entry {
        Entry {
            date: self.date,
            score: self.score,
            itch_score: self.itch_score,
            hive_score: self.hive_score,
            notes: self.notes,
            photo_url: self.photo_url,
            triggers: self.triggers,
            qol_data: self.qol_data,
            synced: false,
            updated_at,
        }
    }
}

/// One calendar day's symptom log, keyed uniquely by `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub date: NaiveDate,
    pub score: u32,
    pub itch_score: u8,
    pub hive_score: u8,
    pub notes: String,
    pub photo_url: Option<String>,
    pub triggers: Vec<String>,
    pub qol_data: BTreeMap<String, i64>,
    pub synced: bool,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// The body sent to the per-date upsert endpoint.
    pub fn upsert_payload(&self) -> EntryPayload {
        EntryPayload {
            score: self.score,
            itch_score: self.itch_score,
            hive_score: self.hive_score,
            notes: self.notes.clone(),
            triggers: self.triggers.clone(),
        }
    }
}

/// Date-scoped entry body accepted by the server's idempotent upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPayload {
    pub score: u32,
    pub itch_score: u8,
    pub hive_score: u8,
    pub notes: String,
    pub triggers: Vec<String>,
}

/// A pending non-entry mutation awaiting replay.
///
/// `data` is an opaque, schema-versioned [`PayloadEnvelope`] document. It is
/// decoded only at the replay call site via [`SyncQueueItem::payload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncQueueItem {
    pub id: i64,
    pub endpoint: String,
    pub method: HttpMethod,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub retries: u32,
}

impl SyncQueueItem {
    /// Decodes the stored envelope.
    pub fn payload(&self) -> Result<PayloadEnvelope, CsuError> {
        PayloadEnvelope::decode(&self.data)
    }
}

/// A queue item moved aside after exhausting its retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub id: i64,
    pub endpoint: String,
    pub method: HttpMethod,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub retries: u32,
    pub evicted_at: DateTime<Utc>,
}

/// Result of recording a failed replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The item stays queued with the new retry count.
    Retrying { retries: u32 },
    /// The retry bound was exceeded and the item left the queue.
    Evicted { retries: u32 },
    /// No item with that id was queued.
    Missing,
}

/// Result of a `reset_database` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The store was destroyed and reopened empty.
    Completed,
    /// Another reset was already running; nothing was done.
    AlreadyInProgress,
}

/// An opaque named value cached for instant display.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedUserData {
    pub key: String,
    pub data: serde_json::Value,
    pub cached_at: DateTime<Utc>,
}

/// A full-page HTML snapshot keyed by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    pub url: String,
    pub html: String,
    pub cached_at: DateTime<Utc>,
}

/// Record counts for status displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub entries: u64,
    pub unsynced_entries: u64,
    pub queued: u64,
    pub dead_letters: u64,
}
