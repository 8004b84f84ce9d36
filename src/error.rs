use thiserror::Error;

/// Required inputs were missing, or the trigger conflicts with work in flight.
///
/// Validation failures never reach the generation service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No source image has been uploaded")]
    MissingImage,

    #[error("No mockup category has been selected")]
    MissingCategory,

    #[error("No source image has been uploaded and no category has been selected")]
    MissingInputs,

    #[error("Requested image count must be at least 1 (got {0})")]
    InvalidCount(u32),

    #[error("Unknown mockup category: {0}")]
    UnknownCategory(String),

    #[error("A batch generation is already in flight")]
    BatchInFlight,

    #[error("Cannot start a batch while {0} remake(s) are in flight")]
    OperationsInFlight(usize),

    #[error("Mockup #{} is already being remade", .index + 1)]
    SlotBusy { index: usize },

    #[error("Slot {index} does not exist ({len} slot(s) present)")]
    SlotOutOfRange { index: usize, len: usize },

    #[error("Mockup #{} has no finished result to remake", .index + 1)]
    SlotNotRemakeable { index: usize },

    #[error("Mockup #{} is not ready for download", .index + 1)]
    SlotNotReady { index: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors returned by the generation service boundary.
///
/// The orchestrator treats every variant the same way: the call failed as a
/// whole and nothing from it is applied.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// The service returned a non-success HTTP status.
    #[error("Generation service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response was missing expected fields or carried garbled data.
    #[error("{0}")]
    InvalidResponse(String),

    /// The service returned a different number of images than requested.
    #[error("Expected {expected} image(s) from the generation service, received {received}")]
    ShortResponse { expected: usize, received: usize },

    /// Quota or content-policy rejection reported by the service.
    #[error("Generation rejected: {0}")]
    Rejected(String),

    /// The response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reported by file intake when the upload is not a usable PNG.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("Only PNG files are accepted (got {0})")]
    UnsupportedType(String),

    #[error("Could not read the file: {0}")]
    Unreadable(String),
}

/// Top-level error for session operations.
#[derive(Error, Debug)]
pub enum MockupError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    /// A Ready slot holds image data that cannot be decoded.
    #[error("Mockup #{} cannot be downloaded: {reason}", .index + 1)]
    Download { index: usize, reason: String },
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, MockupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_errors_use_ordinals() {
        let err = ValidationError::SlotBusy { index: 2 };
        assert_eq!(err.to_string(), "Mockup #3 is already being remade");

        let err = ValidationError::SlotNotReady { index: 0 };
        assert!(err.to_string().contains("#1"));
    }

    #[test]
    fn test_short_response_message() {
        let err = GenerationError::ShortResponse {
            expected: 4,
            received: 3,
        };
        assert_eq!(
            err.to_string(),
            "Expected 4 image(s) from the generation service, received 3"
        );
    }

    #[test]
    fn test_mockup_error_is_transparent() {
        let err: MockupError = ValidationError::MissingCategory.into();
        assert_eq!(err.to_string(), "No mockup category has been selected");
        assert!(matches!(
            err,
            MockupError::Validation(ValidationError::MissingCategory)
        ));
    }

    #[test]
    fn test_download_error_uses_ordinal() {
        let err = MockupError::Download {
            index: 1,
            reason: "bad data".into(),
        };
        assert_eq!(err.to_string(), "Mockup #2 cannot be downloaded: bad data");
    }
}
