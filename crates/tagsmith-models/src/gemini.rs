//! Google Gemini vision adapter.
//!
//! Gemini speaks its own `generateContent` wire format with inline image
//! data and key-in-query authentication, so it gets its own adapter instead
//! of going through the OpenAI-compatible one.

use crate::extract::extract_record;
use crate::prompt::PromptSpec;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tagsmith_abstraction::{EncodedImage, ModelError, ProgressFn, Record, VisionModel};
use tracing::{debug, error};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Vision adapter for Google's Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiVision {
    /// The model ID (e.g., "gemini-2.0-flash").
    model_id: String,
    /// The API key for authentication.
    api_key: String,
    /// The base URL for the Gemini API.
    base_url: String,
    /// The prompt sent with every image.
    prompt: PromptSpec,
    /// HTTP client for making requests.
    client: Client,
}

impl GeminiVision {
    /// Creates a new Gemini adapter.
    ///
    /// # Errors
    /// Returns `ModelError::UnsupportedModelProvider` if the API key is empty.
    pub fn new(model_id: String, api_key: String, prompt: PromptSpec) -> Result<Self, ModelError> {
        if api_key.is_empty() {
            return Err(ModelError::UnsupportedModelProvider(
                "gemini requires an API key".to_string(),
            ));
        }
        Ok(Self {
            model_id,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            prompt,
            client: Client::new(),
        })
    }

    /// Overrides the base URL. Intended for tests against a mock server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl VisionModel for GeminiVision {
    async fn analyze(
        &self,
        image: &EncodedImage,
        on_progress: ProgressFn,
    ) -> Result<Record, ModelError> {
        debug!(model_id = %self.model_id, "sending generateContent analysis request");
        on_progress(10, "sending request");

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model_id, self.api_key
        );

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiPart::Text { text: self.prompt.render() },
                    GeminiPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.base64.clone(),
                        },
                    },
                ],
            }],
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            error!(error = %e, "failed to send request to Gemini API");
            ModelError::RequestError(format!("Network error: {}", e))
        })?;

        on_progress(80, "parsing response");

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %body, "Gemini API returned error status");
            if status.as_u16() == 429 {
                return Err(ModelError::QuotaExceeded {
                    provider: "gemini".to_string(),
                    message: Some(body),
                });
            }
            return Err(ModelError::ModelResponseError(format!(
                "API error ({}): {}",
                status, body
            )));
        }

        let parsed: GeminiResponse = response.json().await.map_err(|e| {
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ModelError::ModelResponseError("no content in API response".to_string())
            })?;

        extract_record(&text)
    }

    fn provider_id(&self) -> &str {
        "gemini"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Gemini API request/response structures.

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Language;

    fn prompt() -> PromptSpec {
        PromptSpec::new("Describe the image", Language::English, "{}")
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = GeminiVision::new("gemini-2.0-flash".to_string(), String::new(), prompt());
        assert!(matches!(result, Err(ModelError::UnsupportedModelProvider(_))));
    }

    #[test]
    fn test_inline_data_serialization() {
        let part = GeminiPart::InlineData {
            inline_data: GeminiInlineData {
                mime_type: "image/jpeg".to_string(),
                data: "QUJD".to_string(),
            },
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(json["inline_data"]["data"], "QUJD");
    }

    #[test]
    fn test_provider_id() {
        let model =
            GeminiVision::new("gemini-2.0-flash".to_string(), "key".to_string(), prompt()).unwrap();
        assert_eq!(model.provider_id(), "gemini");
        assert_eq!(model.model_id(), "gemini-2.0-flash");
    }
}
