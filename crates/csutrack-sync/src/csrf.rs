// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSRF token discovery.
//!
//! The token is read from the form's hidden field when present, otherwise
//! from the cookie jar. Every mutating request carries whichever was found.

use csutrack_config::model::FormsConfig;
use csutrack_core::FormFields;

/// User-data key under which the last captured token is kept between sessions.
pub const CSRF_TOKEN_KEY: &str = "csrf_token";

/// Value of the hidden token field, if the form carried a non-empty one.
pub fn token_from_fields(fields: &FormFields, field_name: &str) -> Option<String> {
    fields
        .get(field_name)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Value of `cookie_name` in a `Cookie` header (`a=1; csrftoken=xyz`).
pub fn token_from_cookie(cookie_header: &str, cookie_name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|token| !token.is_empty())
}

/// Token from the configured session cookie, if one is set.
pub fn configured_token(config: &FormsConfig) -> Option<String> {
    config
        .cookie
        .as_deref()
        .and_then(|cookie| token_from_cookie(cookie, &config.csrf_cookie))
}

/// Hidden field first, then cookie.
pub fn resolve_token(
    fields: Option<&FormFields>,
    cookie_header: Option<&str>,
    config: &FormsConfig,
) -> Option<String> {
    fields
        .and_then(|f| token_from_fields(f, &config.csrf_field))
        .or_else(|| cookie_header.and_then(|c| token_from_cookie(c, &config.csrf_cookie)))
}
