//! Vision-model abstraction layer for tagsmith.
//!
//! This crate defines the contract between the batch execution engine and
//! the per-provider analysis adapters. The engine only ever sees an opaque
//! [`VisionModel`]: something that takes an encoded image and either
//! resolves with a structured record or fails with a descriptive error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Represents an error that can occur when invoking a vision model.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelError {
    /// An error occurred during the API request (e.g., network issues, invalid request).
    #[error("Request Error: {0}")]
    RequestError(String),

    /// The provider returned an error (e.g., invalid input, server failure).
    #[error("Model Response Error: {0}")]
    ModelResponseError(String),

    /// The model's output could not be parsed into a structured record.
    #[error("Serialization Error: {0}")]
    SerializationError(String),

    /// The model provider is not supported or not configured.
    #[error("Unsupported Model Provider: {0}")]
    UnsupportedModelProvider(String),

    /// Provider quota exceeded or rate limit hit.
    #[error("Provider '{provider}' quota exceeded{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
    QuotaExceeded {
        /// The provider name (e.g., "openrouter", "gemini").
        provider: String,
        /// Optional error message from the provider.
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Other unexpected errors.
    #[error("Other Model Error: {0}")]
    Other(String),
}

/// A structured record produced for one analyzed image.
///
/// The schema is decided at run-configuration time by the user's template;
/// the engine never inspects specific keys except to merge in its two
/// computed fields (target file name and full output path).
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Progress callback passed into [`VisionModel::analyze`].
///
/// Carries a percentage in `0..=100` (relative to the adapter's own span of
/// work) and a short human-readable label.
pub type ProgressFn = Arc<dyn Fn(u8, &str) + Send + Sync>;

/// A base64-encoded image payload, ready to be embedded in an API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// MIME type of the source image (e.g., "image/jpeg").
    pub mime_type: String,
    /// Base64-encoded image bytes (no data-URL prefix).
    pub base64: String,
}

impl EncodedImage {
    /// Creates a new encoded image from a MIME type and base64 payload.
    #[must_use]
    pub fn new(mime_type: impl Into<String>, base64: impl Into<String>) -> Self {
        Self { mime_type: mime_type.into(), base64: base64.into() }
    }

    /// Renders the payload as a `data:` URL, the form most chat-completion
    /// APIs accept for inline images.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// A trait for vision-capable analysis models.
///
/// All models must be `Send + Sync` to allow concurrent use across tasks.
/// Implementations must fail with a descriptive [`ModelError`] on any
/// failure (network, auth, malformed response); the engine treats all
/// failures uniformly for retry purposes.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Analyzes one encoded image and returns a structured record.
    ///
    /// # Arguments
    /// * `image` - The encoded image payload
    /// * `on_progress` - Callback for coarse progress updates during the call
    ///
    /// # Errors
    /// Returns a `ModelError` if the analysis fails for any reason.
    async fn analyze(
        &self,
        image: &EncodedImage,
        on_progress: ProgressFn,
    ) -> Result<Record, ModelError>;

    /// Returns the provider identifier of this model (e.g., "groq").
    fn provider_id(&self) -> &str;

    /// Returns the model ID used for requests.
    fn model_id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_format() {
        let image = EncodedImage::new("image/png", "aGVsbG8=");
        assert_eq!(image.data_url(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_quota_exceeded_display() {
        let err = ModelError::QuotaExceeded {
            provider: "groq".to_string(),
            message: Some("rate limit".to_string()),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("groq"));
        assert!(msg.contains("rate limit"));

        let bare = ModelError::QuotaExceeded { provider: "gemini".to_string(), message: None };
        assert_eq!(format!("{}", bare), "Provider 'gemini' quota exceeded");
    }

    #[test]
    fn test_model_error_roundtrip() {
        let err = ModelError::RequestError("connection refused".to_string());
        let json = serde_json::to_string(&err).unwrap();
        let back: ModelError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
