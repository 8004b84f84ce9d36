use std::future::Future;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::Value;

use crate::config::StudioConfig;
use crate::error::GenerationError;
use crate::image::{ImagePayload, PNG_MIME};
use crate::request::GenerationRequest;

/// The generation service boundary.
///
/// One call is one atomic outbound request: it either yields exactly
/// `request.count()` images, in variant order, or fails as a whole. A
/// single-image request may also succeed with no image at all.
/// Implementations must not retry on their own.
pub trait GenerationClient: Send + Sync {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<Vec<ImagePayload>, GenerationError>> + Send;
}

fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// HTTP client for a mockup generation service.
///
/// Sends `POST {endpoint}/generate` with the request's wire body and expects
/// `{"images": [...]}` back.
///
/// # Example
/// ```no_run
/// use mockup_studio::{GenerationClient, HttpGenerationClient};
///
/// # async fn example(request: mockup_studio::GenerationRequest) -> Result<(), mockup_studio::GenerationError> {
/// let client = HttpGenerationClient::new("http://127.0.0.1:8787").with_api_key("secret");
/// let images = client.generate(&request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl HttpGenerationClient {
    /// Create a new client pointing at the given service endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: normalize(endpoint.into()),
            api_key: None,
            timeout: None,
        }
    }

    /// Build a client from the endpoint, key and timeout of a [`StudioConfig`].
    pub fn from_config(config: &StudioConfig) -> Self {
        let mut client = Self::new(config.endpoint.clone());
        client.api_key = config.api_key.clone();
        client.timeout = config.request_timeout;
        client
    }

    /// Use a custom `reqwest::Client` (for connection pooling, proxies, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl GenerationClient for HttpGenerationClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<ImagePayload>, GenerationError> {
        let url = format!("{}/generate", self.endpoint);
        let mut builder = self.http.post(&url).json(&request.to_body());
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        tracing::debug!(
            url = %url,
            category = request.category().name,
            count = request.count(),
            "dispatching generation request"
        );

        let resp = builder.send().await.map_err(|e| GenerationError::Network {
            context: format!("Cannot reach the generation service at {}", self.endpoint),
            source: e,
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Http { status, body });
        }

        let body = resp.text().await.map_err(|e| GenerationError::Network {
            context: "Failed to read the generation service response".into(),
            source: e,
        })?;

        parse_body(&body, request.count() as usize)
    }
}

/// Decode a raw response body and hand it to [`parse_images`].
pub(crate) fn parse_body(
    body: &str,
    expected: usize,
) -> Result<Vec<ImagePayload>, GenerationError> {
    let json: Value = serde_json::from_str(body)?;
    parse_images(&json, expected)
}

/// Parse a `{"images": [...]}` response and check it carries `expected` images.
///
/// Entries may be bare base64 strings (PNG assumed) or objects with `data`
/// and an optional `mimeType`. An `error` field means the service refused
/// the request. When a single image was asked for, an empty list is passed
/// through so the caller can leave its slot as it was.
pub(crate) fn parse_images(
    json: &Value,
    expected: usize,
) -> Result<Vec<ImagePayload>, GenerationError> {
    if let Some(reason) = json.get("error").and_then(|v| v.as_str()) {
        return Err(GenerationError::Rejected(reason.to_string()));
    }

    let entries = json
        .get("images")
        .and_then(|v| v.as_array())
        .ok_or_else(|| GenerationError::InvalidResponse("Response missing images".into()))?;

    let images = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_entry(i, entry))
        .collect::<Result<Vec<_>, _>>()?;

    if images.len() != expected && !(expected == 1 && images.is_empty()) {
        return Err(GenerationError::ShortResponse {
            expected,
            received: images.len(),
        });
    }
    Ok(images)
}

fn parse_entry(index: usize, entry: &Value) -> Result<ImagePayload, GenerationError> {
    let (data, mime_type) = match entry {
        Value::String(data) => (data.as_str(), PNG_MIME),
        Value::Object(obj) => {
            let data = obj.get("data").and_then(|v| v.as_str()).ok_or_else(|| {
                GenerationError::InvalidResponse(format!("Image {} missing data", index))
            })?;
            let mime = obj
                .get("mimeType")
                .and_then(|v| v.as_str())
                .unwrap_or(PNG_MIME);
            (data, mime)
        }
        _ => {
            return Err(GenerationError::InvalidResponse(format!(
                "Image {} is neither a string nor an object",
                index
            )))
        }
    };

    if data.is_empty() || STANDARD.decode(data).is_err() {
        return Err(GenerationError::InvalidResponse(format!(
            "Image {} is not valid base64",
            index
        )));
    }
    Ok(ImagePayload::new(data, mime_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize("http://localhost:8787/".into()), "http://localhost:8787");
        assert_eq!(normalize("http://host:8787///".into()), "http://host:8787");
    }

    #[test]
    fn test_client_from_config() {
        let config = StudioConfig::builder()
            .with_endpoint("https://gen.example.com/")
            .with_api_key("k")
            .with_request_timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        let client = HttpGenerationClient::from_config(&config);
        assert_eq!(client.endpoint(), "https://gen.example.com");
        assert_eq!(client.api_key.as_deref(), Some("k"));
        assert_eq!(client.timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_parse_string_entries_in_order() {
        let json = json!({"images": ["QUFB", "QkJC"]});
        let images = parse_images(&json, 2).unwrap();
        assert_eq!(images[0].base64(), "QUFB");
        assert_eq!(images[1].base64(), "QkJC");
        assert_eq!(images[1].mime_type(), "image/png");
    }

    #[test]
    fn test_parse_object_entries() {
        let json = json!({"images": [{"data": "QUFB", "mimeType": "image/webp"}]});
        let images = parse_images(&json, 1).unwrap();
        assert_eq!(images[0].mime_type(), "image/webp");
    }

    #[test]
    fn test_short_response() {
        let json = json!({"images": ["QUFB"]});
        let err = parse_images(&json, 4).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::ShortResponse {
                expected: 4,
                received: 1
            }
        ));
    }

    #[test]
    fn test_empty_response_for_single_passes_through() {
        let json = json!({"images": []});
        assert!(parse_images(&json, 1).unwrap().is_empty());
    }

    #[test]
    fn test_empty_response_for_batch() {
        let json = json!({"images": []});
        assert!(matches!(
            parse_images(&json, 4),
            Err(GenerationError::ShortResponse {
                expected: 4,
                received: 0
            })
        ));
    }

    #[test]
    fn test_body_not_json() {
        let err = parse_body("<html>bad gateway</html>", 1).unwrap_err();
        assert!(matches!(err, GenerationError::Json(_)));
    }

    #[test]
    fn test_body_parsed() {
        let images = parse_body(r#"{"images":["QUFB","QkJC"]}"#, 2).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].base64(), "QkJC");
    }

    #[test]
    fn test_missing_images_field() {
        let json = json!({"result": "ok"});
        assert!(matches!(
            parse_images(&json, 1),
            Err(GenerationError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_garbled_entry() {
        let json = json!({"images": ["%%%"]});
        assert!(matches!(
            parse_images(&json, 1),
            Err(GenerationError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_policy_rejection() {
        let json = json!({"error": "quota exceeded"});
        let err = parse_images(&json, 4).unwrap_err();
        assert_eq!(err.to_string(), "Generation rejected: quota exceeded");
    }
}
