//! Structured failure reported by a downstream capability.
//!
//! The wire shape is the one capabilities already emit:
//!
//! ```json
//! {
//!   "type": "VALIDATION_ERROR",
//!   "message": "Parameters validation error!",
//!   "data": [{ "field": "name", "message": "The 'name' field is required." }],
//!   "meta": { "$statuscode": 404, "status": "NOT_FOUND" }
//! }
//! ```
//!
//! Every field is optional. The `type` tag is decoded once here into
//! [`DownstreamErrorKind`] so that nothing past this boundary branches on strings.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Classification tag carried in `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DownstreamErrorKind {
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[serde(other)]
    Other,
}

/// One field violation from a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldViolation {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl FieldViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }
}

/// Overrides the capability placed in its call context metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContextMeta {
    #[serde(default, rename = "$statuscode", deserialize_with = "lenient_status_code")]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Error)]
#[error("{message}")]
pub struct DownstreamError {
    #[serde(default, rename = "type")]
    pub kind: Option<DownstreamErrorKind>,
    #[serde(default, deserialize_with = "violations")]
    pub data: Vec<FieldViolation>,
    #[serde(default, deserialize_with = "nullable_message")]
    pub message: String,
    #[serde(default)]
    pub meta: ContextMeta,
}

impl DownstreamError {
    /// Unclassified failure without overrides (normalizes to 500).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: None,
            data: Vec::new(),
            message: message.into(),
            meta: ContextMeta::default(),
        }
    }

    pub fn validation(message: impl Into<String>, violations: Vec<FieldViolation>) -> Self {
        Self {
            kind: Some(DownstreamErrorKind::Validation),
            data: violations,
            ..Self::new(message)
        }
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.meta.status_code = Some(status_code);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.meta.status = Some(status.into());
        self
    }
}

// `data` is only an array of violations for validation failures; other errors
// put arbitrary payloads there, which carry nothing we render.
fn violations<'de, D>(deserializer: D) -> Result<Vec<FieldViolation>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let Value::Array(items) = raw else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<FieldViolation>(item).ok())
        .collect())
}

fn nullable_message<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// Anything that is not a status-sized integer counts as no override.
fn lenient_status_code<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_u64().and_then(|code| u16::try_from(code).ok()))
}
