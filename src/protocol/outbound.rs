//! Outbound (client → server) commands.
//!
//! # Format
//!
//! ```json
//! { "type": "requestFrame" }
//! { "type": "capture" }
//! ```
//!
//! Commands are fire-and-forget: nothing correlates a later server message
//! with the command that caused it.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value, to_string};

use crate::error::Result;

// ============================================================================
// Command
// ============================================================================

/// A command sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Ask the backend to push the latest frame.
    RequestFrame,
    /// Ask the backend to capture a still image.
    Capture,
    /// Any other command name with an optional payload.
    ///
    /// Object payloads are merged next to `type`; other payloads are sent
    /// under `data`.
    Custom {
        /// Value of the `type` field.
        name: String,
        /// Extra fields.
        payload: Option<Value>,
    },
}

impl Command {
    /// Creates a custom command.
    #[inline]
    #[must_use]
    pub fn custom(name: impl Into<String>, payload: Option<Value>) -> Self {
        Self::Custom {
            name: name.into(),
            payload,
        }
    }

    /// Returns the wire name of the command.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::RequestFrame => "requestFrame",
            Self::Capture => "capture",
            Self::Custom { name, .. } => name,
        }
    }

    /// Builds the JSON message.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut message = Map::new();
        message.insert("type".into(), Value::String(self.name().to_string()));

        if let Self::Custom {
            payload: Some(payload),
            ..
        } = self
        {
            match payload {
                Value::Object(fields) => {
                    for (key, value) in fields {
                        if key != "type" {
                            message.insert(key.clone(), value.clone());
                        }
                    }
                }
                other => {
                    message.insert("data".into(), other.clone());
                }
            }
        }

        Value::Object(message)
    }

    /// Serializes the command to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(to_string(&self.to_value())?)
    }
}

// ============================================================================
// Tests
// ============================================================================
