// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the CSU tracker offline layer.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CsuConfig {
    /// Application identity and logging.
    #[serde(default)]
    pub app: AppConfig,

    /// Local store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Sync engine and network boundary settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Form interception settings.
    #[serde(default)]
    pub forms: FormsConfig,

    /// Cache controller settings.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Default push notification template.
    #[serde(default)]
    pub push: PushConfig,
}

/// Application identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name used in notifications and status output.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_app_name() -> String {
    "CSU Tracker".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Local store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("csutrack").join("offline.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "offline.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Sync engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Base URL of the tracking server.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Path prefix of the per-date entry upsert resource.
    #[serde(default = "default_entry_endpoint")]
    pub entry_endpoint: String,

    /// Upper bound for a single replay request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Failed replays tolerated before a queued item is evicted.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Keep evicted items in a dead-letter collection instead of discarding them.
    #[serde(default = "default_dead_letter")]
    pub dead_letter: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            entry_endpoint: default_entry_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            dead_letter: default_dead_letter(),
        }
    }
}

fn default_server_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_entry_endpoint() -> String {
    "/api/tracking/entries/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

fn default_dead_letter() -> bool {
    true
}

/// Form interception configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FormsConfig {
    /// Target path fragment identifying daily log submissions.
    #[serde(default = "default_log_path_marker")]
    pub log_path_marker: String,

    /// Hidden form field carrying the CSRF token.
    #[serde(default = "default_csrf_field")]
    pub csrf_field: String,

    /// Cookie carrying the CSRF token.
    #[serde(default = "default_csrf_cookie")]
    pub csrf_cookie: String,

    /// Request header the token is sent in.
    #[serde(default = "default_csrf_header")]
    pub csrf_header: String,

    /// `Cookie` header of the signed-in session. Supplies the CSRF token
    /// when no captured form carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            log_path_marker: default_log_path_marker(),
            csrf_field: default_csrf_field(),
            csrf_cookie: default_csrf_cookie(),
            csrf_header: default_csrf_header(),
            cookie: None,
        }
    }
}

fn default_log_path_marker() -> String {
    "/tracking/log/".to_string()
}

fn default_csrf_field() -> String {
    "csrfmiddlewaretoken".to_string()
}

fn default_csrf_cookie() -> String {
    "csrftoken".to_string()
}

fn default_csrf_header() -> String {
    "X-CSRFToken".to_string()
}

/// Cache controller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Name of the current cache generation. Every other generation is
    /// deleted on activation.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin the worker is registered for (scheme, host and port).
    #[serde(default = "default_server_url")]
    pub origin: String,

    /// Path prefix of cache-first static assets.
    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,

    /// Path prefix of API requests, always served from the network.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Offline fallback document, always part of the install manifest.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Static assets pre-populated on install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            origin: default_server_url(),
            static_prefix: default_static_prefix(),
            api_prefix: default_api_prefix(),
            offline_page: default_offline_page(),
            precache: default_precache(),
        }
    }
}

impl WorkerConfig {
    /// Install manifest: the configured assets plus the offline page, deduplicated.
    pub fn install_manifest(&self) -> Vec<String> {
        let mut manifest: Vec<String> = Vec::with_capacity(self.precache.len() + 1);
        for asset in self.precache.iter().chain(std::iter::once(&self.offline_page)) {
            if !manifest.contains(asset) {
                manifest.push(asset.clone());
            }
        }
        manifest
    }
}

fn default_cache_version() -> String {
    "csu-tracker-static-v1".to_string()
}

fn default_static_prefix() -> String {
    "/static/".to_string()
}

fn default_api_prefix() -> String {
    "/api/".to_string()
}

fn default_offline_page() -> String {
    "/offline/".to_string()
}

fn default_precache() -> Vec<String> {
    vec![
        "/static/icons/icon-192x192.png".to_string(),
        "/static/icons/icon-512x512.png".to_string(),
        "/static/icons/badge-72x72.png".to_string(),
    ]
}

/// Default notification template merged under incoming push payloads.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PushConfig {
    #[serde(default = "default_push_title")]
    pub title: String,

    #[serde(default = "default_push_body")]
    pub body: String,

    #[serde(default = "default_push_icon")]
    pub icon: String,

    #[serde(default = "default_push_badge")]
    pub badge: String,

    #[serde(default = "default_push_tag")]
    pub tag: String,

    /// Page opened when a notification without its own target is clicked.
    #[serde(default = "default_log_path_marker")]
    pub url: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            title: default_push_title(),
            body: default_push_body(),
            icon: default_push_icon(),
            badge: default_push_badge(),
            tag: default_push_tag(),
            url: default_log_path_marker(),
        }
    }
}

fn default_push_title() -> String {
    "CSU Tracker".to_string()
}

fn default_push_body() -> String {
    "Time to log today's symptoms".to_string()
}

fn default_push_icon() -> String {
    "/static/icons/icon-192x192.png".to_string()
}

fn default_push_badge() -> String {
    "/static/icons/badge-72x72.png".to_string()
}

fn default_push_tag() -> String {
    "csu-tracker".to_string()
}
