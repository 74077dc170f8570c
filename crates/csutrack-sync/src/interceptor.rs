// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Submission-time routing of opted-in forms.
//!
//! Online, every form goes through the normal request path. Offline, an
//! opted-in form is captured into the sync queue; daily log forms are also
//! written to the local entry collection so the entry shows up at once.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use csutrack_config::model::FormsConfig;
use csutrack_core::{
    CsuError, Entry, EntryDraft, FormFields, HttpMethod, LocalStore, Notifier, PayloadEnvelope,
    SyncTransport, ToastKind,
};

use crate::connectivity::ConnectivityMonitor;
use crate::csrf;

/// Confirmation shown after a form was captured offline.
pub const OFFLINE_SAVED_MESSAGE: &str = "Saved offline. It will sync when you're back online.";

/// A form submission as seen at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    /// Target of the form, usually a server-relative path.
    pub action: String,
    pub method: HttpMethod,
    /// The form carries the offline opt-in marker.
    pub offline_capable: bool,
    /// Field values in document order. Repeated names are kept.
    pub fields: Vec<(String, String)>,
    /// `Cookie` header of the page, used when the form has no token field.
    pub cookies: Option<String>,
}

impl FormSubmission {
    pub fn new(action: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            action: action.into(),
            method,
            offline_capable: true,
            fields: Vec::new(),
            cookies: None,
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn not_offline_capable(mut self) -> Self {
        self.offline_capable = false;
        self
    }
}

/// What the interceptor did with a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// The form has no opt-in marker and is never touched.
    NotIntercepted,
    /// Online: the normal submission proceeds.
    PassThrough,
    /// Offline: the default submission was suppressed and the form queued.
    Queued { id: i64, entry: Option<Entry> },
}

pub struct FormInterceptor {
    store: Arc<dyn LocalStore>,
    transport: Arc<dyn SyncTransport>,
    notifier: Arc<dyn Notifier>,
    monitor: ConnectivityMonitor,
    config: FormsConfig,
}

impl FormInterceptor {
    pub fn new(
        store: Arc<dyn LocalStore>,
        transport: Arc<dyn SyncTransport>,
        notifier: Arc<dyn Notifier>,
        monitor: ConnectivityMonitor,
        config: FormsConfig,
    ) -> Self {
        Self {
            store,
            transport,
            notifier,
            monitor,
            config,
        }
    }

    /// Routes one submission. `today` dates log forms that name no date.
    pub async fn handle(
        &self,
        submission: &FormSubmission,
        today: NaiveDate,
    ) -> Result<Disposition, CsuError> {
        if !submission.offline_capable {
            return Ok(Disposition::NotIntercepted);
        }
        if self.monitor.is_online() {
            debug!(action = %submission.action, "online, form submits normally");
            return Ok(Disposition::PassThrough);
        }

        let fields = FormFields::from_pairs(submission.fields.iter().cloned());
        if let Some(token) =
            csrf::resolve_token(Some(&fields), submission.cookies.as_deref(), &self.config)
        {
            self.remember_csrf_token(token).await;
        }

        let data = PayloadEnvelope::form(fields.clone()).encode()?;
        let id = self
            .store
            .queue_for_sync(&submission.action, submission.method, data)
            .await?;

        let entry = if self.is_log_submission(&submission.action) {
            self.save_log_entry(&fields, &submission.action, today).await
        } else {
            None
        };

        self.notifier.toast(OFFLINE_SAVED_MESSAGE, ToastKind::Success);
        debug!(id, action = %submission.action, has_entry = entry.is_some(), "form captured offline");
        Ok(Disposition::Queued { id, entry })
    }

    /// Hands the token to the transport and keeps it for later sessions.
    async fn remember_csrf_token(&self, token: String) {
        self.transport.set_csrf_token(Some(token.clone()));
        if let Err(e) = self
            .store
            .cache_user_data(csrf::CSRF_TOKEN_KEY, serde_json::Value::String(token))
            .await
        {
            warn!(error = %e, "CSRF token could not be stored for later sessions");
        }
    }

    fn is_log_submission(&self, action: &str) -> bool {
        action.contains(&self.config.log_path_marker)
    }

    /// The queued request is already durable, so a failure here only costs
    /// the immediate local view and is logged rather than returned.
    async fn save_log_entry(
        &self,
        fields: &FormFields,
        action: &str,
        today: NaiveDate,
    ) -> Option<Entry> {
        let draft = match entry_from_fields(fields, action, &self.config.log_path_marker, today) {
            Ok(draft) => draft,
            Err(e) => {
                warn!(action, error = %e, "queued log form could not be read as an entry");
                return None;
            }
        };
        match self.store.save_entry(draft).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(action, error = %e, "queued log form was not saved locally");
                None
            }
        }
    }
}

/// Builds an entry from daily log form fields.
///
/// The date comes from a `date` field, then from the path segment after the
/// log marker (`/tracking/log/2026-02-01/`), then `today`. A missing `score`
/// is the sum of the itch and hive components.
pub fn entry_from_fields(
    fields: &FormFields,
    action: &str,
    log_path_marker: &str,
    today: NaiveDate,
) -> Result<EntryDraft, CsuError> {
    let date = match fields.get("date").filter(|d| !d.trim().is_empty()) {
        Some(raw) => parse_date(raw)?,
        None => date_from_path(action, log_path_marker).unwrap_or(today),
    };

    let itch_score: u8 = parse_number(fields, "itch_score")?.unwrap_or(0);
    let hive_score: u8 = match parse_number(fields, "hive_count_score")? {
        Some(score) => score,
        None => parse_number(fields, "hive_score")?.unwrap_or(0),
    };
    let score: u32 = parse_number(fields, "score")?
        .unwrap_or(u32::from(itch_score) + u32::from(hive_score));

    let triggers = fields
        .get_all("triggers")
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    let mut qol_data = std::collections::BTreeMap::new();
    for (name, value) in fields.to_pairs() {
        if let Some(key) = name.strip_prefix("qol_")
            && let Ok(value) = value.trim().parse::<i64>()
        {
            qol_data.insert(key.to_string(), value);
        }
    }

    let draft = EntryDraft {
        date,
        score,
        itch_score,
        hive_score,
        notes: fields.get("notes").unwrap_or_default().to_string(),
        photo_url: None,
        triggers,
        qol_data,
    };
    draft.validate()?;
    Ok(draft)
}

fn parse_date(raw: &str) -> Result<NaiveDate, CsuError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| CsuError::Validation(format!("invalid date `{raw}`: {e}")))
}

fn date_from_path(action: &str, marker: &str) -> Option<NaiveDate> {
    let (_, rest) = action.split_once(marker)?;
    let segment = rest.split(['/', '?']).next()?;
    NaiveDate::parse_from_str(segment, "%Y-%m-%d").ok()
}

fn parse_number<T: std::str::FromStr>(fields: &FormFields, name: &str) -> Result<Option<T>, CsuError>
where
    T::Err: std::fmt::Display,
{
    match fields.get(name).map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| CsuError::Validation(format!("invalid {name} `{raw}`: {e}"))),
    }
}
