//! Inbound payload model.
//!
//! A [`RawPayload`] is whatever the chat widget hands to its `onMessage`
//! hook. Only three parts of it carry meaning for the engine:
//!
//! ```text
//! {
//!   "direction": "BOT" | "USER",          // also accepted as "type"
//!   "text": "Hello there",                // optional
//!   "attachments": {
//!     "metadata": [ { "metadata": { ... } }, ... ]   // optional
//!   }
//! }
//! ```
//!
//! Everything else is preserved untouched in [`RawPayload::extra`] so that
//! callbacks receive the payload exactly as the host sent it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire marker for bot-authored messages.
pub const DIRECTION_BOT: &str = "BOT";

/// Wire marker for user-authored messages.
pub const DIRECTION_USER: &str = "USER";

/// Whether a payload was authored by the bot or by the user.
///
/// Markers other than `BOT` and `USER` are kept verbatim in
/// [`Direction::Other`]; the lifecycle gate lets them through and rules
/// with a direction filter simply never match them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    /// Incoming message written by the bot.
    Bot,
    /// Outgoing message written by the user.
    User,
    /// Any marker the engine does not recognise.
    Other(String),
}

impl Direction {
    /// Returns the wire marker for this direction.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bot => DIRECTION_BOT,
            Self::User => DIRECTION_USER,
            Self::Other(marker) => marker,
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, Self::Bot)
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Self::User)
    }
}

impl From<String> for Direction {
    fn from(marker: String) -> Self {
        match marker.as_str() {
            DIRECTION_BOT => Self::Bot,
            DIRECTION_USER => Self::User,
            _ => Self::Other(marker),
        }
    }
}

impl From<&str> for Direction {
    fn from(marker: &str) -> Self {
        Self::from(marker.to_string())
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Other(marker) => marker,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A host-supplied message event, loosely structured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPayload {
    /// Direction marker, passed through unchanged.
    #[serde(alias = "type")]
    pub direction: Direction,

    /// Message text, if the host sent any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Attachment block. Only `attachments.metadata` is interpreted, and only
    /// when it is an array.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub attachments: Value,

    /// Remaining host fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawPayload {
    /// Creates a payload with no text and no attachments.
    pub fn new(direction: impl Into<Direction>) -> Self {
        Self {
            direction: direction.into(),
            text: None,
            attachments: Value::Null,
            extra: Map::new(),
        }
    }

    /// Shorthand for a bot-authored payload carrying `text`.
    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Direction::Bot).with_text(text)
    }

    /// Shorthand for a user-authored payload carrying `text`.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Direction::User).with_text(text)
    }

    /// Sets the message text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attaches metadata fragments, wrapping each one the way the widget does
    /// (`{ "metadata": fragment }`).
    pub fn with_metadata<I>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let wrapped: Vec<Value> = fragments
            .into_iter()
            .map(|fragment| {
                let mut wrapper = Map::new();
                wrapper.insert("metadata".to_string(), fragment);
                Value::Object(wrapper)
            })
            .collect();

        let mut attachments = match std::mem::take(&mut self.attachments) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        attachments.insert("metadata".to_string(), Value::Array(wrapped));
        self.attachments = Value::Object(attachments);
        self
    }

    /// Replaces the attachment block verbatim.
    pub fn with_attachments(mut self, attachments: Value) -> Self {
        self.attachments = attachments;
        self
    }
}
