// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push message parsing and notification rendering.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use csutrack_config::model::PushConfig;

/// Action id that opens the daily log page.
pub const ACTION_LOG: &str = "log";
/// Action id that only closes the notification.
pub const ACTION_DISMISS: &str = "dismiss";

/// Incoming push payload. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub tag: Option<String>,
    pub data: PushData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PushData {
    pub url: Option<String>,
}

impl PushPayload {
    /// Parses a raw push body. A body that is not JSON is shown as plain
    /// text; an empty body yields the default template.
    ///
    /// Fields of a JSON object are read one by one: a field that is null or
    /// not a string is left to the template instead of discarding the rest.
    pub fn parse(raw: Option<&[u8]>) -> Self {
        let Some(raw) = raw.filter(|r| !r.iter().all(u8::is_ascii_whitespace)) else {
            return Self::default();
        };
        match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Object(fields)) => Self::from_fields(&fields),
            Ok(Value::String(text)) => Self::text(text),
            Ok(_) | Err(_) => {
                debug!("push payload is not a JSON object, showing it as text");
                Self::text(String::from_utf8_lossy(raw).trim().to_string())
            }
        }
    }

    fn text(body: String) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        let data = fields.get("data").and_then(Value::as_object);
        Self {
            title: string_field(fields, "title"),
            body: string_field(fields, "body"),
            icon: string_field(fields, "icon"),
            badge: string_field(fields, "badge"),
            tag: string_field(fields, "tag"),
            data: PushData {
                url: data.and_then(|data| string_field(data, "url")),
            },
        }
    }
}

fn string_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::String(value) => Some(value.clone()),
        Value::Null => None,
        other => {
            debug!(field = name, value = %other, "push field is not a string, using the template");
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// An OS notification ready to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    /// Stays on screen until the user acts on it.
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
    pub data: PushData,
}

impl Notification {
    /// Merges `payload` over the configured template.
    pub fn from_push(payload: PushPayload, template: &PushConfig) -> Self {
        Self {
            title: payload.title.unwrap_or_else(|| template.title.clone()),
            body: payload.body.unwrap_or_else(|| template.body.clone()),
            icon: payload.icon.unwrap_or_else(|| template.icon.clone()),
            badge: payload.badge.unwrap_or_else(|| template.badge.clone()),
            tag: payload.tag.unwrap_or_else(|| template.tag.clone()),
            require_interaction: true,
            actions: vec![
                NotificationAction {
                    action: ACTION_LOG.to_string(),
                    title: "Log now".to_string(),
                },
                NotificationAction {
                    action: ACTION_DISMISS.to_string(),
                    title: "Dismiss".to_string(),
                },
            ],
            data: PushData {
                url: Some(payload.data.url.unwrap_or_else(|| template.url.clone())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_push_uses_template() {
        let template = PushConfig::default();
        let n = Notification::from_push(PushPayload::parse(None), &template);
        assert_eq!(n.title, template.title);
        assert_eq!(n.body, template.body);
        assert_eq!(n.data.url.as_deref(), Some(template.url.as_str()));
        assert!(n.require_interaction);
        let actions: Vec<_> = n.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(actions, vec![ACTION_LOG, ACTION_DISMISS]);
    }

    #[test]
    fn payload_fields_override_template() {
        let raw = br#"{"title":"Reminder","tag":"daily","data":{"url":"/tracking/log/2026-02-01/"}}"#;
        let n = Notification::from_push(PushPayload::parse(Some(raw)), &PushConfig::default());
        assert_eq!(n.title, "Reminder");
        assert_eq!(n.tag, "daily");
        assert_eq!(n.body, PushConfig::default().body);
        assert_eq!(n.data.url.as_deref(), Some("/tracking/log/2026-02-01/"));
    }

    #[test]
    fn null_or_mistyped_fields_fall_back_per_field() {
        let raw = br#"{"title":"Reminder","body":null,"tag":7,"data":null}"#;
        let template = PushConfig::default();
        let n = Notification::from_push(PushPayload::parse(Some(raw)), &template);
        assert_eq!(n.title, "Reminder");
        assert_eq!(n.body, template.body);
        assert_eq!(n.tag, template.tag);
        assert_eq!(n.data.url.as_deref(), Some(template.url.as_str()));

        let raw = br#"{"data":{"url":42},"icon":"/static/bell.png"}"#;
        let payload = PushPayload::parse(Some(raw));
        assert_eq!(payload.icon.as_deref(), Some("/static/bell.png"));
        assert!(payload.data.url.is_none());
        assert!(payload.body.is_none());
    }

    #[test]
    fn text_push_becomes_body() {
        let payload = PushPayload::parse(Some(b"Don't forget today"));
        assert_eq!(payload.body.as_deref(), Some("Don't forget today"));
        assert!(payload.title.is_none());
    }

    #[test]
    fn whitespace_push_is_empty() {
        assert_eq!(PushPayload::parse(Some(b"  \n")), PushPayload::default());
    }
}
