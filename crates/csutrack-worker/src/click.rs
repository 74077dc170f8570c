// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification click routing.

use reqwest::Url;
use tracing::debug;

use csutrack_config::model::PushConfig;
use csutrack_core::CsuError;

use crate::platform::{Clients, NotificationSink};
use crate::policy::same_origin;
use crate::push::{ACTION_DISMISS, ACTION_LOG, Notification};

/// What a click led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Dismissed,
    /// An existing window was navigated and focused.
    Focused { client_id: String, url: String },
    Opened { client_id: String, url: String },
}

/// Target page for a click: the log page for the log action, then the
/// notification's own URL, then the configured default.
pub fn target_url(notification: &Notification, action: Option<&str>, push: &PushConfig) -> String {
    if action == Some(ACTION_LOG) {
        return push.url.clone();
    }
    notification
        .data
        .url
        .clone()
        .unwrap_or_else(|| push.url.clone())
}

/// Closes the notification and brings the target page to the front.
pub async fn handle_click(
    notification: &Notification,
    action: Option<&str>,
    origin: &str,
    push: &PushConfig,
    clients: &dyn Clients,
    sink: &dyn NotificationSink,
) -> Result<ClickOutcome, CsuError> {
    sink.close(&notification.tag);
    if action == Some(ACTION_DISMISS) {
        return Ok(ClickOutcome::Dismissed);
    }

    let url = absolute(origin, &target_url(notification, action, push))?;

    let windows = clients.match_all().await?;
    let existing = windows
        .into_iter()
        .find(|w| Url::parse(&w.url).is_ok_and(|u| same_origin(&u, origin)));

    if let Some(window) = existing {
        clients.navigate(&window.id, &url).await?;
        clients.focus(&window.id).await?;
        debug!(client_id = %window.id, %url, "focused existing window");
        return Ok(ClickOutcome::Focused {
            client_id: window.id,
            url,
        });
    }

    let client_id = clients.open_window(&url).await?;
    debug!(%client_id, %url, "opened new window");
    Ok(ClickOutcome::Opened { client_id, url })
}

fn absolute(origin: &str, target: &str) -> Result<String, CsuError> {
    let base = Url::parse(origin)
        .map_err(|e| CsuError::Config(format!("invalid worker origin `{origin}`: {e}")))?;
    base.join(target)
        .map(|u| u.to_string())
        .map_err(|e| CsuError::Validation(format!("invalid notification target `{target}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::PushPayload;

    #[test]
    fn log_action_always_targets_log_page() {
        let push = PushConfig::default();
        let raw = br#"{"data":{"url":"/tracking/history/"}}"#;
        let n = Notification::from_push(PushPayload::parse(Some(raw)), &push);
        assert_eq!(target_url(&n, Some(ACTION_LOG), &push), push.url);
        assert_eq!(target_url(&n, None, &push), "/tracking/history/");
    }

    #[test]
    fn relative_targets_resolve_against_origin() {
        assert_eq!(
            absolute("https://csu.example.org", "/tracking/log/").unwrap(),
            "https://csu.example.org/tracking/log/"
        );
        assert_eq!(
            absolute("https://csu.example.org", "https://csu.example.org/x/").unwrap(),
            "https://csu.example.org/x/"
        );
    }
}
