//! Vision-model adapter implementations for tagsmith.
//!
//! This crate provides concrete implementations of the `VisionModel` trait.
//!
//! # Supported Providers
//!
//! - **Pollinations**: free tier, OpenAI-compatible chat API
//! - **OpenRouter**: OpenAI-compatible chat API (API key optional for free models)
//! - **Groq**: OpenAI-compatible chat API (API key required)
//! - **Together**: OpenAI-compatible chat API (API key required)
//! - **HuggingFace**: OpenAI-compatible inference endpoint (API key required)
//! - **Gemini**: Google's generateContent API (API key required)

pub mod extract;
pub mod factory;
pub mod gemini;
pub mod openai_compat;
pub mod prompt;

pub use extract::extract_record;
pub use factory::{ProviderConfig, ProviderKind, build_model};
pub use gemini::GeminiVision;
pub use openai_compat::OpenAiCompatVision;
pub use prompt::{Language, PromptSpec};
