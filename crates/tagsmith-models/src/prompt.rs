//! Prompt assembly for analysis requests.
//!
//! Every adapter sends the same prompt shape: the user's base instruction,
//! an answer-language directive, and the JSON structure the model must fill
//! in. The structure text comes straight from the run configuration (a JSON
//! template or a structure derived from CSV columns) and is never
//! interpreted here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Answer language requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Answer in English only.
    #[default]
    English,
    /// Answer in Arabic only.
    Arabic,
    /// Answer in both Arabic and English.
    Bilingual,
}

impl Language {
    /// The directive appended to the prompt for this language.
    #[must_use]
    pub fn directive(self) -> &'static str {
        match self {
            Self::English => "Answer in English only.",
            Self::Arabic => "Answer in Arabic only.",
            Self::Bilingual => "Answer in both Arabic and English.",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Self::English),
            "ar" | "arabic" => Ok(Self::Arabic),
            "both" | "bilingual" => Ok(Self::Bilingual),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::English => write!(f, "english"),
            Self::Arabic => write!(f, "arabic"),
            Self::Bilingual => write!(f, "bilingual"),
        }
    }
}

/// The full prompt specification for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    /// Base instruction describing what to extract from the image.
    pub instruction: String,
    /// Answer language directive.
    pub language: Language,
    /// JSON structure the model must return, as display text.
    pub structure: String,
}

impl PromptSpec {
    /// Creates a new prompt specification.
    #[must_use]
    pub fn new(
        instruction: impl Into<String>,
        language: Language,
        structure: impl Into<String>,
    ) -> Self {
        Self { instruction: instruction.into(), language, structure: structure.into() }
    }

    /// Renders the complete prompt text sent alongside the image.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{}\n\n{}\n\nReturn only JSON with exactly this structure, no other text:\n{}",
            self.instruction,
            self.language.directive(),
            self.structure
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_str() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::English);
        assert_eq!("Arabic".parse::<Language>().unwrap(), Language::Arabic);
        assert_eq!("both".parse::<Language>().unwrap(), Language::Bilingual);
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn test_render_contains_all_sections() {
        let spec = PromptSpec::new(
            "Describe this product photo",
            Language::English,
            r#"{"title": "", "description": ""}"#,
        );
        let text = spec.render();
        assert!(text.starts_with("Describe this product photo"));
        assert!(text.contains("Answer in English only."));
        assert!(text.contains(r#"{"title": "", "description": ""}"#));
    }

    #[test]
    fn test_bilingual_directive() {
        let spec = PromptSpec::new("x", Language::Bilingual, "{}");
        assert!(spec.render().contains("both Arabic and English"));
    }
}
