// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema-versioned envelope for queued mutation bodies.
//!
//! Queued mutations can carry any form shape, so the store keeps them as
//! opaque bytes. The replay path decodes them through [`PayloadEnvelope`],
//! which checks the version before looking at any field.
//!
//! Version 1 layout:
//!
//! ```json
//! { "version": 1, "body": { "kind": "form", "fields": { "score": "4" } } }
//! { "version": 1, "body": { "kind": "json", "value": { "enabled": true } } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CsuError;

/// Envelope version written by this build.
pub const PAYLOAD_VERSION: u32 = 1;

/// A form field value. Repeated fields (checkbox groups) keep every value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

/// Submitted form values as a plain name-to-value mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormFields(BTreeMap<String, FieldValue>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collapses ordered `(name, value)` pairs into a mapping.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields = Self::new();
        for (name, value) in pairs {
            fields.append(name.into(), value.into());
        }
        fields
    }

    /// Adds a value, turning the field into a list when the name repeats.
    pub fn append(&mut self, name: String, value: String) {
        match self.0.remove(&name) {
            None => {
                self.0.insert(name, FieldValue::Single(value));
            }
            Some(FieldValue::Single(first)) => {
                self.0.insert(name, FieldValue::Multiple(vec![first, value]));
            }
            Some(FieldValue::Multiple(mut values)) => {
                values.push(value);
                self.0.insert(name, FieldValue::Multiple(values));
            }
        }
    }

    /// First value recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.0.get(name)? {
            FieldValue::Single(v) => Some(v.as_str()),
            FieldValue::Multiple(values) => values.first().map(String::as_str),
        }
    }

    /// Every value recorded for `name`, in submission order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        match self.0.get(name) {
            None => Vec::new(),
            Some(FieldValue::Single(v)) => vec![v.as_str()],
            Some(FieldValue::Multiple(values)) => values.iter().map(String::as_str).collect(),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flattens back into ordered pairs for urlencoded replay.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (name, value) in &self.0 {
            match value {
                FieldValue::Single(v) => pairs.push((name.clone(), v.clone())),
                FieldValue::Multiple(values) => {
                    pairs.extend(values.iter().map(|v| (name.clone(), v.clone())))
                }
            }
        }
        pairs
    }
}

/// The body kinds a queued mutation can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationBody {
    /// A captured HTML form submission, replayed urlencoded.
    Form { fields: FormFields },
    /// A JSON document, replayed as `application/json`.
    Json { value: serde_json::Value },
}

impl MutationBody {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Form { .. } => "application/x-www-form-urlencoded",
            Self::Json { .. } => "application/json",
        }
    }
}

/// Versioned wrapper persisted in `SyncQueueItem::data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadEnvelope {
    pub version: u32,
    pub body: MutationBody,
}

#[derive(Deserialize)]
struct RawEnvelope {
    version: u32,
    body: serde_json::Value,
}

impl PayloadEnvelope {
    pub fn form(fields: FormFields) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            body: MutationBody::Form { fields },
        }
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            body: MutationBody::Json { value },
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CsuError> {
        serde_json::to_vec(self)
            .map_err(|e| CsuError::Internal(format!("failed to encode payload envelope: {e}")))
    }

    /// Decodes stored bytes, rejecting versions this build does not know.
    pub fn decode(bytes: &[u8]) -> Result<Self, CsuError> {
        let raw: RawEnvelope = serde_json::from_slice(bytes)
            .map_err(|e| CsuError::Validation(format!("malformed payload envelope: {e}")))?;

        if raw.version != PAYLOAD_VERSION {
            return Err(CsuError::Validation(format!(
                "unsupported payload envelope version {}",
                raw.version
            )));
        }

        let body = serde_json::from_value(raw.body)
            .map_err(|e| CsuError::Validation(format!("malformed payload body: {e}")))?;
        Ok(Self {
            version: raw.version,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_names_become_lists() {
        let fields = FormFields::from_pairs([
            ("triggers", "heat"),
            ("score", "4"),
            ("triggers", "stress"),
        ]);
        assert_eq!(fields.get("score"), Some("4"));
        assert_eq!(fields.get_all("triggers"), vec!["heat", "stress"]);
        assert_eq!(fields.get("triggers"), Some("heat"));
        assert!(fields.get_all("missing").is_empty());
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn to_pairs_expands_lists() {
        let fields = FormFields::from_pairs([("a", "1"), ("b", "2"), ("b", "3")]);
        assert_eq!(
            fields.to_pairs(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("b".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn envelope_wire_layout() {
        let envelope = PayloadEnvelope::form(FormFields::from_pairs([("score", "4")]));
        let json: serde_json::Value =
            serde_json::from_slice(&envelope.encode().unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["body"]["kind"], "form");
        assert_eq!(json["body"]["fields"]["score"], "4");
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let bytes = br#"{"version": 7, "body": {"kind": "json", "value": null}}"#;
        let err = PayloadEnvelope::decode(bytes).unwrap_err();
        assert!(matches!(err, CsuError::Validation(msg) if msg.contains("version 7")));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(PayloadEnvelope::decode(b"not json").is_err());
        let unknown_kind = br#"{"version": 1, "body": {"kind": "xml", "value": "<a/>"}}"#;
        assert!(PayloadEnvelope::decode(unknown_kind).is_err());
    }

    #[test]
    fn json_body_content_type() {
        let envelope = PayloadEnvelope::json(serde_json::json!({"enabled": true}));
        assert_eq!(envelope.body.content_type(), "application/json");
        let decoded = PayloadEnvelope::decode(&envelope.encode().unwrap()).unwrap();
        assert_eq!(decoded, envelope);
    }
}
