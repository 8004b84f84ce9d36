use base64::engine::general_purpose::STANDARD;
use base64::{DecodeError, Engine};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::image::ImagePayload;

/// A finished mockup ready to be written out by a download collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadArtifact {
    pub file_name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl DownloadArtifact {
    /// Decode `image` and name it `<prefix>-<unix millis>.<ext>`.
    pub fn new(
        image: &ImagePayload,
        prefix: &str,
        at: DateTime<Utc>,
    ) -> Result<Self, DecodeError> {
        Ok(Self {
            file_name: suggested_file_name(prefix, image.mime_type(), at),
            mime_type: image.mime_type().to_string(),
            bytes: STANDARD.decode(image.base64())?,
        })
    }
}

/// File name for a download, e.g. `mockup-1700000000000.png`.
pub fn suggested_file_name(prefix: &str, mime_type: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}.{}", prefix, at.timestamp_millis(), extension_for(mime_type))
}

fn extension_for(mime_type: &str) -> &str {
    match mime_type {
        "image/jpeg" => "jpg",
        other => other
            .strip_prefix("image/")
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("png"),
    }
}
