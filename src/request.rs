use serde::Serialize;

use crate::catalog::Category;
use crate::error::ValidationError;
use crate::image::ImagePayload;

/// One call's worth of input for the generation service.
///
/// Constructed fresh per invocation and never mutated afterwards; use
/// [`GenerationRequest::builder`] or [`build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    source_image: ImagePayload,
    category: Category,
    prompt: String,
    count: u32,
}

impl GenerationRequest {
    pub fn builder() -> GenerationRequestBuilder {
        GenerationRequestBuilder::default()
    }

    pub fn source_image(&self) -> &ImagePayload {
        &self.source_image
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Free-text style guidance. May be empty.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Number of images the service must return.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The JSON body sent over the wire.
    pub fn to_body(&self) -> GenerateBody<'_> {
        GenerateBody {
            image_base64: self.source_image.base64(),
            mime_type: self.source_image.mime_type(),
            category_name: self.category.name,
            prompt: &self.prompt,
            count: self.count,
        }
    }
}

/// Wire shape of a generation call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody<'a> {
    pub image_base64: &'a str,
    pub mime_type: &'a str,
    pub category_name: &'a str,
    pub prompt: &'a str,
    pub count: u32,
}

/// Builder for [`GenerationRequest`].
///
/// # Example
/// ```
/// use mockup_studio::{Category, GenerationRequest, ImagePayload};
///
/// let request = GenerationRequest::builder()
///     .image(ImagePayload::new("iVBORw0KGgo=", "image/png"))
///     .category(*Category::find("billboard").unwrap())
///     .prompt("night, city lights")
///     .count(4)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.count(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    image: Option<ImagePayload>,
    category: Option<Category>,
    prompt: String,
    count: u32,
}

impl Default for GenerationRequestBuilder {
    fn default() -> Self {
        Self {
            image: None,
            category: None,
            prompt: String::new(),
            count: 1,
        }
    }
}

impl GenerationRequestBuilder {
    pub fn image(mut self, image: ImagePayload) -> Self {
        self.image = Some(image);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set how many variants to request (must be at least 1).
    pub fn count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn build(self) -> Result<GenerationRequest, ValidationError> {
        let (source_image, category) = match (self.image, self.category) {
            (Some(image), Some(category)) => (image, category),
            (None, None) => return Err(ValidationError::MissingInputs),
            (None, Some(_)) => return Err(ValidationError::MissingImage),
            (Some(_), None) => return Err(ValidationError::MissingCategory),
        };
        if self.count == 0 {
            return Err(ValidationError::InvalidCount(self.count));
        }
        Ok(GenerationRequest {
            source_image,
            category,
            prompt: self.prompt,
            count: self.count,
        })
    }
}

/// Assemble a request from the current selections.
///
/// `image` is base64 text as produced by file intake. Fails when the image
/// or category is absent, or `count` is zero.
pub fn build(
    image: Option<&str>,
    mime_type: &str,
    category: Option<&Category>,
    prompt: &str,
    count: u32,
) -> Result<GenerationRequest, ValidationError> {
    let mut builder = GenerationRequest::builder().prompt(prompt).count(count);
    if let Some(data) = image {
        builder = builder.image(ImagePayload::new(data, mime_type));
    }
    if let Some(category) = category {
        builder = builder.category(*category);
    }
    builder.build()
}
