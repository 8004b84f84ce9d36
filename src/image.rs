use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::IntakeError;

/// The only media type accepted from file intake and assumed for service output.
pub const PNG_MIME: &str = "image/png";

/// An encoded image held as base64 text plus its media type.
///
/// Payloads are immutable once produced. Source uploads and generated
/// mockups share this type, so a slot can be handed straight to a display
/// or download collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    data: String,
    mime_type: String,
}

impl ImagePayload {
    /// Wrap already-encoded base64 data without inspecting it.
    ///
    /// Used for payloads whose provenance is already trusted (e.g. the
    /// response parser has validated them).
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Accept raw bytes from file intake. Only `image/png` passes.
    pub fn from_png_bytes(bytes: &[u8], mime_type: &str) -> Result<Self, IntakeError> {
        check_png_mime(mime_type)?;
        if bytes.is_empty() {
            return Err(IntakeError::Unreadable("file is empty".into()));
        }
        Ok(Self::new(STANDARD.encode(bytes), mime_type))
    }

    /// Accept base64 text from file intake, e.g. the payload part of a data URL.
    pub fn from_base64(data: &str, mime_type: &str) -> Result<Self, IntakeError> {
        check_png_mime(mime_type)?;
        let data = data.trim();
        if data.is_empty() {
            return Err(IntakeError::Unreadable("no image data".into()));
        }
        STANDARD
            .decode(data)
            .map_err(|e| IntakeError::Unreadable(e.to_string()))?;
        Ok(Self::new(data, mime_type))
    }

    /// Base64-encoded image data.
    pub fn base64(&self) -> &str {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Decode to raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, IntakeError> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| IntakeError::Unreadable(e.to_string()))
    }

    /// `data:` URL suitable for direct display.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

fn check_png_mime(mime_type: &str) -> Result<(), IntakeError> {
    if mime_type.eq_ignore_ascii_case(PNG_MIME) {
        Ok(())
    } else {
        Err(IntakeError::UnsupportedType(mime_type.to_string()))
    }
}
