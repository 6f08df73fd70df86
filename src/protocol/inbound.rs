//! Inbound (server → client) messages.
//!
//! # Format
//!
//! ```json
//! { "type": "frame",  "image": "<base64>", "timestamp": 1718000000000 }
//! { "type": "status", "data": { ... } }
//! ```
//!
//! `timestamp` is optional and falls back to the local receipt time. Any
//! other `type` decodes to [`InboundMessage::Unknown`].

// ============================================================================
// Imports
// ============================================================================

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, from_str};

use crate::error::{Error, Result};

// ============================================================================
// Frame
// ============================================================================

/// One camera frame.
///
/// The image stays in its transport encoding (base64 text) until a renderer
/// asks for the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    image: String,
    timestamp: u64,
}

impl Frame {
    /// Creates a frame from a base64 image and an epoch-ms timestamp.
    #[inline]
    #[must_use]
    pub fn new(image: impl Into<String>, timestamp: u64) -> Self {
        Self {
            image: image.into(),
            timestamp,
        }
    }

    /// Returns the base64-encoded image.
    #[inline]
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Returns the capture timestamp in epoch milliseconds.
    #[inline]
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Decodes the image into its encoded bytes (typically JPEG).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Base64`] if the payload is not valid base64.
    pub fn decode_image(&self) -> Result<Vec<u8>> {
        Ok(STANDARD.decode(self.image.as_bytes())?)
    }

    /// Sniffs the image container format from its magic bytes.
    #[must_use]
    pub fn image_format(&self) -> Option<ImageFormat> {
        let bytes = self.decode_image().ok()?;
        image::guess_format(&bytes).ok()
    }
}

// ============================================================================
// InboundMessage
// ============================================================================

/// A decoded server message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Camera frame.
    Frame(Frame),
    /// Opaque device status.
    Status(Value),
    /// Unrecognized `type`; carries the type name for diagnostics.
    Unknown(String),
}

impl InboundMessage {
    /// Decodes a text payload, stamping frames without a timestamp with
    /// the current time.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the payload is not JSON
    /// - [`Error::MalformedMessage`] if it is not a typed message object
    pub fn decode(text: &str) -> Result<Self> {
        Self::decode_at(text, now_ms())
    }

    /// Decodes a text payload using `received_at` as the fallback timestamp.
    ///
    /// # Errors
    ///
    /// Same as [`InboundMessage::decode`].
    pub fn decode_at(text: &str, received_at: u64) -> Result<Self> {
        let value: Value = from_str(text)?;

        let Some(object) = value.as_object() else {
            return Err(Error::malformed("expected a JSON object"));
        };

        let Some(kind) = object.get("type").and_then(Value::as_str) else {
            return Err(Error::malformed("missing string field `type`"));
        };

        match kind {
            "frame" => {
                let image = object
                    .get("image")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::malformed("frame without string field `image`"))?;

                let timestamp = get_timestamp(object).unwrap_or(received_at);
                Ok(Self::Frame(Frame::new(image, timestamp)))
            }

            "status" => Ok(Self::Status(
                object.get("data").cloned().unwrap_or(Value::Null),
            )),

            other => Ok(Self::Unknown(other.to_string())),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Gets a positive timestamp; zero, negative and non-numeric values count as absent.
#[inline]
fn get_timestamp(object: &Map<String, Value>) -> Option<u64> {
    let value = object.get("timestamp")?;
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|t| t.is_finite() && *t >= 1.0)
                .map(|t| t as u64)
        })
        .filter(|t| *t > 0)
}

/// Current time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ============================================================================
// Tests
// ============================================================================
