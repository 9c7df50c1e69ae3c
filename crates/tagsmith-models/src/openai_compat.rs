//! OpenAI-compatible vision adapter.
//!
//! Most hosted vision providers expose the same `chat/completions` wire
//! format; this single adapter covers all of them, parameterized by the
//! provider's endpoint and auth requirements.

use crate::extract::extract_record;
use crate::factory::ProviderKind;
use crate::prompt::PromptSpec;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tagsmith_abstraction::{EncodedImage, ModelError, ProgressFn, Record, VisionModel};
use tracing::{debug, error};

/// Vision adapter for OpenAI-chat-compatible providers.
#[derive(Debug, Clone)]
pub struct OpenAiCompatVision {
    /// Which compatible provider this instance talks to.
    provider: ProviderKind,
    /// The model ID (e.g., "llama-3.2-90b-vision-preview").
    model_id: String,
    /// The API key for authentication, if the provider requires one.
    api_key: Option<String>,
    /// The chat-completions endpoint URL.
    endpoint: String,
    /// Optional fixed seed for reproducible outputs (Pollinations).
    seed: Option<u64>,
    /// The prompt sent with every image.
    prompt: PromptSpec,
    /// HTTP client for making requests.
    client: Client,
}

impl OpenAiCompatVision {
    /// Creates a new adapter for the given provider.
    ///
    /// # Errors
    /// Returns `ModelError::UnsupportedModelProvider` if the provider
    /// requires an API key and none was supplied, or if the provider is not
    /// OpenAI-compatible.
    pub fn new(
        provider: ProviderKind,
        model_id: String,
        api_key: Option<String>,
        prompt: PromptSpec,
    ) -> Result<Self, ModelError> {
        if provider == ProviderKind::Gemini {
            return Err(ModelError::UnsupportedModelProvider(
                "gemini is not OpenAI-compatible; use GeminiVision".to_string(),
            ));
        }
        if provider.requires_api_key() && api_key.as_deref().unwrap_or("").is_empty() {
            return Err(ModelError::UnsupportedModelProvider(format!(
                "{} requires an API key",
                provider
            )));
        }

        let endpoint = Self::default_endpoint(provider, &model_id);
        Ok(Self { provider, model_id, api_key, endpoint, seed: None, prompt, client: Client::new() })
    }

    /// Sets a fixed generation seed (supported by Pollinations).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Overrides the endpoint URL. Intended for tests against a mock server.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    fn default_endpoint(provider: ProviderKind, model_id: &str) -> String {
        match provider {
            ProviderKind::Pollinations => {
                "https://gen.pollinations.ai/v1/chat/completions".to_string()
            }
            ProviderKind::OpenRouter => {
                "https://openrouter.ai/api/v1/chat/completions".to_string()
            }
            ProviderKind::Groq => "https://api.groq.com/openai/v1/chat/completions".to_string(),
            ProviderKind::Together => "https://api.together.xyz/v1/chat/completions".to_string(),
            ProviderKind::HuggingFace => format!(
                "https://api-inference.huggingface.co/models/{}/v1/chat/completions",
                model_id
            ),
            // Checked in new().
            ProviderKind::Gemini => String::new(),
        }
    }

    fn map_error_status(&self, status: reqwest::StatusCode, body: String) -> ModelError {
        // Quota and rate-limit responses get their own variant so callers
        // can surface them distinctly; everything else is a response error.
        if status.as_u16() == 402 || status.as_u16() == 429 {
            return ModelError::QuotaExceeded {
                provider: self.provider.to_string(),
                message: Some(body),
            };
        }
        if self.provider == ProviderKind::HuggingFace && body.contains("loading") {
            return ModelError::ModelResponseError(
                "model is still loading; wait ~30 seconds and retry".to_string(),
            );
        }
        ModelError::ModelResponseError(format!("API error ({}): {}", status, body))
    }
}

#[async_trait]
impl VisionModel for OpenAiCompatVision {
    async fn analyze(
        &self,
        image: &EncodedImage,
        on_progress: ProgressFn,
    ) -> Result<Record, ModelError> {
        debug!(
            provider = %self.provider,
            model_id = %self.model_id,
            "sending chat-completion analysis request"
        );
        on_progress(10, "sending request");

        let body = ChatRequest {
            model: self.model_id.clone(),
            messages: vec![ChatRequestMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text { text: self.prompt.render() },
                    ContentPart::ImageUrl { image_url: ImageUrl { url: image.data_url() } },
                ],
            }],
            max_tokens: 2000,
            temperature: 0.3,
            seed: self.seed,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        if self.provider == ProviderKind::OpenRouter {
            request = request
                .header("HTTP-Referer", "https://github.com/tagsmith/tagsmith")
                .header("X-Title", "tagsmith");
        }

        let response = request.send().await.map_err(|e| {
            error!(provider = %self.provider, error = %e, "failed to send analysis request");
            ModelError::RequestError(format!("Network error: {}", e))
        })?;

        on_progress(80, "parsing response");

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(provider = %self.provider, status = %status, error = %body, "provider returned error status");
            return Err(self.map_error_status(status, body));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                ModelError::ModelResponseError("no content in API response".to_string())
            })?;

        extract_record(&content)
    }

    fn provider_id(&self) -> &str {
        self.provider.as_str()
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Chat-completions request/response structures.

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatRequestMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}
