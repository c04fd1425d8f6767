//! Payload extraction.
//!
//! Pure functions that pull the `(direction, text, metadata)` triple out of a
//! [`RawPayload`]. None of them fail: absent or oddly shaped fields collapse
//! to empty defaults.

use serde_json::Value;

use crate::payload::{Direction, RawPayload};

/// Returns the payload's direction marker unchanged.
pub fn direction(payload: &RawPayload) -> &Direction {
    &payload.direction
}

/// Returns the payload text, or `""` when absent.
pub fn text(payload: &RawPayload) -> &str {
    payload.text.as_deref().unwrap_or_default()
}

/// Returns the inner mapping of every metadata fragment, in order.
///
/// Looks up `attachments.metadata`; anything other than an array yields an
/// empty list. A fragment without an inner `metadata` field is kept as
/// `null` so that positions stay aligned with the host's list.
pub fn metadata_list(payload: &RawPayload) -> Vec<Value> {
    match payload.attachments.get("metadata") {
        Some(Value::Array(fragments)) => fragments
            .iter()
            .map(|fragment| fragment.get("metadata").cloned().unwrap_or(Value::Null))
            .collect(),
        _ => Vec::new(),
    }
}

/// The extracted view of one event. Recomputed for every dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContext {
    pub direction: Direction,
    pub text: String,
    pub metadata: Vec<Value>,
}

impl ExtractedContext {
    pub fn from_payload(payload: &RawPayload) -> Self {
        Self {
            direction: direction(payload).clone(),
            text: text(payload).to_string(),
            metadata: metadata_list(payload),
        }
    }
}
