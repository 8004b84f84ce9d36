use std::time::Duration;

use crate::error::ValidationError;

/// Default number of mockups produced by one batch.
pub const DEFAULT_BATCH_SIZE: u32 = 4;

/// Configuration for the generation client and session.
///
/// Use [`StudioConfig::builder()`] for ergonomic construction,
/// [`StudioConfig::from_env()`] to read `MOCKUP_*` variables, or
/// [`StudioConfig::default()`] for a local service with four mockups per batch.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Base URL of the generation service.
    pub endpoint: String,

    /// Bearer token sent with each request, if any.
    pub api_key: Option<String>,

    /// Number of slots created by a batch generation.
    pub batch_size: u32,

    /// Per-request timeout. `None` waits for the service indefinitely.
    pub request_timeout: Option<Duration>,

    /// Prefix for suggested download file names.
    pub filename_prefix: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8787".to_string(),
            api_key: None,
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout: None,
            filename_prefix: "mockup".to_string(),
        }
    }
}

impl StudioConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> StudioConfigBuilder {
        StudioConfigBuilder::default()
    }

    /// Read `MOCKUP_ENDPOINT`, `MOCKUP_API_KEY`, `MOCKUP_BATCH_SIZE`,
    /// `MOCKUP_TIMEOUT_SECS` and `MOCKUP_FILENAME_PREFIX`, keeping defaults
    /// for anything unset.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();
        if let Some(endpoint) = lookup("MOCKUP_ENDPOINT") {
            builder = builder.with_endpoint(endpoint);
        }
        if let Some(key) = lookup("MOCKUP_API_KEY").filter(|k| !k.is_empty()) {
            builder = builder.with_api_key(key);
        }
        if let Some(raw) = lookup("MOCKUP_BATCH_SIZE") {
            let size = raw.trim().parse::<u32>().map_err(|e| {
                ValidationError::InvalidConfig(format!("MOCKUP_BATCH_SIZE={}: {}", raw, e))
            })?;
            builder = builder.with_batch_size(size);
        }
        if let Some(raw) = lookup("MOCKUP_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                ValidationError::InvalidConfig(format!("MOCKUP_TIMEOUT_SECS={}: {}", raw, e))
            })?;
            builder = builder.with_request_timeout(Duration::from_secs(secs));
        }
        if let Some(prefix) = lookup("MOCKUP_FILENAME_PREFIX") {
            builder = builder.with_filename_prefix(prefix);
        }
        builder.build()
    }
}

/// Builder for [`StudioConfig`].
#[derive(Default)]
pub struct StudioConfigBuilder {
    config: StudioConfig,
}

impl StudioConfigBuilder {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set how many mockups a batch produces.
    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    pub fn with_filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.filename_prefix = prefix.into();
        self
    }

    /// Build the final [`StudioConfig`]. A zero batch size is rejected.
    pub fn build(self) -> Result<StudioConfig, ValidationError> {
        if self.config.batch_size == 0 {
            return Err(ValidationError::InvalidCount(0));
        }
        Ok(self.config)
    }
}
