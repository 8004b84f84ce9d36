use serde::Serialize;

/// Shown when a batch generation fails for any reason.
pub const GLOBAL_FAILURE_MESSAGE: &str = "Failed to generate mockups. Please try again.";

/// Shown when generate or remake is triggered without an image and category.
pub const MISSING_INPUTS_MESSAGE: &str = "Please upload an image and select a category.";

/// Which operation a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "index")]
pub enum ErrorScope {
    /// The batch "generate" operation, or a trigger rejected before it ran.
    Global,
    /// A remake of the slot at this 0-based index.
    Slot(usize),
}

/// One human-readable message plus the scope it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorNotice {
    pub scope: ErrorScope,
    pub message: String,
}

/// Holds the message for the last operation, if it failed.
///
/// Starting any operation clears it; a failure replaces it.
#[derive(Debug, Clone, Default)]
pub struct ErrorSurface {
    current: Option<ErrorNotice>,
}

impl ErrorSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ErrorNotice> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn record_validation(&mut self, message: impl Into<String>) {
        self.current = Some(ErrorNotice {
            scope: ErrorScope::Global,
            message: message.into(),
        });
    }

    pub fn record_batch_failure(&mut self) {
        self.current = Some(ErrorNotice {
            scope: ErrorScope::Global,
            message: GLOBAL_FAILURE_MESSAGE.to_string(),
        });
    }

    /// Record a failed remake. The message names the slot by its 1-based ordinal.
    pub fn record_remake_failure(&mut self, index: usize) {
        self.current = Some(ErrorNotice {
            scope: ErrorScope::Slot(index),
            message: format!("Failed to remake mockup #{}.", index + 1),
        });
    }
}
