//! Adapter factory for creating vision models from configuration.
//!
//! This module maps a provider name plus run configuration onto a concrete
//! `VisionModel` instance, handling API key resolution from configuration
//! or provider-specific environment variables.

use crate::gemini::GeminiVision;
use crate::openai_compat::OpenAiCompatVision;
use crate::prompt::PromptSpec;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tagsmith_abstraction::{ModelError, VisionModel};
use tracing::debug;

/// Supported analysis providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Pollinations free tier (no API key required).
    Pollinations,
    /// OpenRouter (API key optional for free models).
    OpenRouter,
    /// Groq.
    Groq,
    /// Google Gemini.
    Gemini,
    /// HuggingFace inference endpoints.
    HuggingFace,
    /// Together AI.
    Together,
}

impl ProviderKind {
    /// Every supported provider, in display order.
    pub const ALL: [Self; 6] = [
        Self::Pollinations,
        Self::OpenRouter,
        Self::Groq,
        Self::Gemini,
        Self::HuggingFace,
        Self::Together,
    ];

    /// Stable lowercase identifier for this provider.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pollinations => "pollinations",
            Self::OpenRouter => "openrouter",
            Self::Groq => "groq",
            Self::Gemini => "gemini",
            Self::HuggingFace => "huggingface",
            Self::Together => "together",
        }
    }

    /// Whether the provider refuses requests without an API key.
    #[must_use]
    pub fn requires_api_key(self) -> bool {
        !matches!(self, Self::Pollinations | Self::OpenRouter)
    }

    /// Environment variable consulted when no key is configured.
    #[must_use]
    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::Pollinations => "POLLINATIONS_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::Groq => "GROQ_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::HuggingFace => "HUGGINGFACE_API_KEY",
            Self::Together => "TOGETHER_API_KEY",
        }
    }

    /// Default model ID used when the configuration does not name one.
    #[must_use]
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Pollinations => "openai",
            Self::OpenRouter => "qwen/qwen2.5-vl-72b-instruct:free",
            Self::Groq => "llama-3.2-90b-vision-preview",
            Self::Gemini => "gemini-2.0-flash",
            Self::HuggingFace => "Qwen/Qwen2-VL-7B-Instruct",
            Self::Together => "meta-llama/Llama-Vision-Free",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pollinations" => Ok(Self::Pollinations),
            "openrouter" => Ok(Self::OpenRouter),
            "groq" => Ok(Self::Groq),
            "gemini" | "google" => Ok(Self::Gemini),
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "together" => Ok(Self::Together),
            other => Err(ModelError::UnsupportedModelProvider(other.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider configuration for one run.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Which provider to use.
    pub provider: ProviderKind,
    /// The model ID; falls back to the provider default when `None`.
    pub model_id: Option<String>,
    /// Optional API key (if not provided, resolved from the environment).
    pub api_key: Option<String>,
    /// Optional fixed seed (supported by Pollinations).
    pub seed: Option<u64>,
}

impl ProviderConfig {
    /// Creates a configuration for the given provider with defaults.
    #[must_use]
    pub fn new(provider: ProviderKind) -> Self {
        Self { provider, model_id: None, api_key: None, seed: None }
    }

    /// Sets the model ID.
    #[must_use]
    pub fn with_model_id(mut self, model_id: String) -> Self {
        self.model_id = Some(model_id);
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| env::var(self.provider.api_key_env()).ok().filter(|k| !k.is_empty()))
    }
}

/// Builds a vision model from the given provider configuration and prompt.
///
/// # Errors
/// Returns a `ModelError` if the provider requires an API key and none is
/// available from configuration or the environment.
pub fn build_model(
    config: &ProviderConfig,
    prompt: PromptSpec,
) -> Result<Arc<dyn VisionModel>, ModelError> {
    let model_id = config
        .model_id
        .clone()
        .unwrap_or_else(|| config.provider.default_model().to_string());
    let api_key = config.resolve_api_key();

    debug!(provider = %config.provider, model_id = %model_id, "creating vision model");

    match config.provider {
        ProviderKind::Gemini => {
            let key = api_key.ok_or_else(|| {
                ModelError::UnsupportedModelProvider(format!(
                    "gemini requires an API key (set {})",
                    config.provider.api_key_env()
                ))
            })?;
            Ok(Arc::new(GeminiVision::new(model_id, key, prompt)?))
        }
        _ => {
            let mut model =
                OpenAiCompatVision::new(config.provider, model_id, api_key, prompt)?;
            if let Some(seed) = config.seed {
                model = model.with_seed(seed);
            }
            Ok(Arc::new(model))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Language;

    fn prompt() -> PromptSpec {
        PromptSpec::new("Describe the image", Language::English, "{}")
    }

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("groq".parse::<ProviderKind>().unwrap(), ProviderKind::Groq);
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("hf".parse::<ProviderKind>().unwrap(), ProviderKind::HuggingFace);
        assert!("dalle".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_build_keyless_provider() {
        let config = ProviderConfig::new(ProviderKind::Pollinations);
        let model = build_model(&config, prompt()).unwrap();
        assert_eq!(model.provider_id(), "pollinations");
        assert_eq!(model.model_id(), "openai");
    }

    #[test]
    fn test_build_with_explicit_key_and_model() {
        let config = ProviderConfig::new(ProviderKind::Groq)
            .with_model_id("custom-vision".to_string())
            .with_api_key("k".to_string());
        let model = build_model(&config, prompt()).unwrap();
        assert_eq!(model.provider_id(), "groq");
        assert_eq!(model.model_id(), "custom-vision");
    }

    #[test]
    fn test_build_gemini_without_key_fails() {
        // Only meaningful when the environment variable is absent.
        if env::var("GEMINI_API_KEY").is_ok() {
            return;
        }
        let config = ProviderConfig::new(ProviderKind::Gemini);
        assert!(build_model(&config, prompt()).is_err());
    }

    #[test]
    fn test_empty_configured_key_falls_through() {
        let config = ProviderConfig::new(ProviderKind::Pollinations).with_api_key(String::new());
        assert!(config.resolve_api_key().is_none() || env::var("POLLINATIONS_API_KEY").is_ok());
    }
}
