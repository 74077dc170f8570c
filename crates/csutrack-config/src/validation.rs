// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: URL shapes, path prefixes, and numeric bounds.

use crate::diagnostic::ConfigError;
use crate::model::CsuConfig;

/// Largest accepted retry bound before eviction.
const MAX_RETRY_BOUND: u32 = 100;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CsuConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !matches!(
        config.app.log_level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        fail(format!(
            "app.log_level must be one of trace, debug, info, warn, error; got `{}`",
            config.app.log_level
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    for (key, value) in [
        ("sync.server_url", &config.sync.server_url),
        ("worker.origin", &config.worker.origin),
    ] {
        if !is_http_origin(value) {
            fail(format!("{key} must be an http(s) URL, got `{value}`"));
        }
    }

    for (key, value) in [
        ("sync.entry_endpoint", &config.sync.entry_endpoint),
        ("forms.log_path_marker", &config.forms.log_path_marker),
        ("worker.static_prefix", &config.worker.static_prefix),
        ("worker.api_prefix", &config.worker.api_prefix),
        ("worker.offline_page", &config.worker.offline_page),
        ("push.url", &config.push.url),
    ] {
        if !value.starts_with('/') {
            fail(format!("{key} must be an absolute path starting with `/`, got `{value}`"));
        }
    }

    if config.sync.request_timeout_secs == 0 {
        fail("sync.request_timeout_secs must be at least 1".to_string());
    }

    if config.sync.max_retries == 0 || config.sync.max_retries > MAX_RETRY_BOUND {
        fail(format!(
            "sync.max_retries must be between 1 and {MAX_RETRY_BOUND}, got {}",
            config.sync.max_retries
        ));
    }

    if config.worker.cache_version.trim().is_empty() {
        fail("worker.cache_version must not be empty".to_string());
    }

    for asset in &config.worker.precache {
        if !asset.starts_with(&config.worker.static_prefix) && *asset != config.worker.offline_page
        {
            fail(format!(
                "worker.precache entry `{asset}` is outside worker.static_prefix `{}`",
                config.worker.static_prefix
            ));
        }
    }

    if config.forms.csrf_header.trim().is_empty() {
        fail("forms.csrf_header must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_origin(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) => {
            let host = host.trim_end_matches('/');
            !host.is_empty() && !host.contains(char::is_whitespace)
        }
        None => false,
    }
}
