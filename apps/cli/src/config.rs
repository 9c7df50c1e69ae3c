//! CLI configuration loading and merging.
//!
//! Precedence: CLI arguments, then the TOML config file, then defaults.
//! Provider API keys additionally fall back to the provider's environment
//! variable inside the model factory.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tagsmith_models::{Language, PromptSpec, ProviderKind};

const DEFAULT_CONFIG_FILE: &str = "tagsmith.toml";

const DEFAULT_INSTRUCTION: &str =
    "Analyze this image in detail and describe what it shows.";
const DEFAULT_STRUCTURE: &str = r#"{"title": "", "description": "", "tags": []}"#;

/// Which export files to write after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Both,
}

impl ExportFormat {
    fn parse(text: &str) -> anyhow::Result<Self> {
        match text.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "both" => Ok(Self::Both),
            other => anyhow::bail!("unknown export format '{other}' (expected json, csv, both)"),
        }
    }

    pub fn includes_json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }

    pub fn includes_csv(self) -> bool {
        matches!(self, Self::Csv | Self::Both)
    }
}

/// The config file shape. Every field is optional; anything absent falls
/// back to the built-in defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    provider: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    language: Option<String>,
    seed: Option<u64>,
    concurrency: Option<usize>,
    max_retries: Option<u32>,
    retry_delay_ms: Option<u64>,
    output_dir: Option<PathBuf>,
    format: Option<String>,
    rename: Option<String>,
    instruction: Option<String>,
    structure: Option<String>,
}

impl FileConfig {
    fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(explicit) => explicit.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }
}

/// Values given on the command line; they win over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub language: Option<String>,
    pub seed: Option<u64>,
    pub concurrency: Option<usize>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub format: Option<String>,
    pub rename: Option<String>,
    pub instruction: Option<String>,
    pub structure: Option<String>,
}

/// Fully resolved run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub seed: Option<u64>,
    pub concurrency: usize,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub output_dir: Option<PathBuf>,
    pub format: ExportFormat,
    pub rename: Option<String>,
    pub prompt: PromptSpec,
}

impl Settings {
    /// Loads the config file (if any) and applies CLI overrides on top.
    pub fn load(config_path: Option<&Path>, overrides: Overrides) -> anyhow::Result<Self> {
        let file = FileConfig::load(config_path)?;

        let provider_name = overrides
            .provider
            .or(file.provider)
            .unwrap_or_else(|| "pollinations".to_string());
        let provider: ProviderKind = provider_name
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))?;

        let language = match overrides.language.or(file.language) {
            Some(name) => name.parse::<Language>().map_err(|e| anyhow::anyhow!("{e}"))?,
            None => Language::default(),
        };
        let prompt = PromptSpec::new(
            overrides
                .instruction
                .or(file.instruction)
                .unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string()),
            language,
            overrides
                .structure
                .or(file.structure)
                .unwrap_or_else(|| DEFAULT_STRUCTURE.to_string()),
        );

        let format = match overrides.format.or(file.format) {
            Some(name) => ExportFormat::parse(&name)?,
            None => ExportFormat::Both,
        };

        let concurrency = overrides.concurrency.or(file.concurrency).unwrap_or(3);
        anyhow::ensure!(concurrency >= 1, "concurrency must be at least 1");

        Ok(Self {
            provider,
            model: overrides.model.or(file.model),
            api_key: overrides.api_key.or(file.api_key),
            seed: overrides.seed.or(file.seed),
            concurrency,
            max_retries: overrides.max_retries.or(file.max_retries).unwrap_or(2),
            retry_delay: Duration::from_millis(
                overrides.retry_delay_ms.or(file.retry_delay_ms).unwrap_or(2000),
            ),
            output_dir: overrides.output_dir.or(file.output_dir),
            format,
            rename: overrides.rename.or(file.rename),
            prompt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_config_file() {
        let settings = Settings::load(None, Overrides::default()).unwrap();
        assert_eq!(settings.provider, ProviderKind::Pollinations);
        assert_eq!(settings.concurrency, 3);
        assert_eq!(settings.max_retries, 2);
        assert_eq!(settings.retry_delay, Duration::from_millis(2000));
        assert_eq!(settings.format, ExportFormat::Both);
        assert_eq!(settings.prompt.language, Language::English);
    }

    #[test]
    fn test_cli_overrides_beat_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "provider = 'groq'\nconcurrency = 5\nformat = 'csv'").unwrap();

        let overrides = Overrides { concurrency: Some(8), ..Overrides::default() };
        let settings = Settings::load(Some(file.path()), overrides).unwrap();
        assert_eq!(settings.provider, ProviderKind::Groq);
        assert_eq!(settings.concurrency, 8);
        assert_eq!(settings.format, ExportFormat::Csv);
    }

    #[test]
    fn test_unknown_config_key_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "provder = 'groq'").unwrap();
        assert!(Settings::load(Some(file.path()), Overrides::default()).is_err());
    }

    #[test]
    fn test_bad_format_is_rejected() {
        let overrides =
            Overrides { format: Some("xlsx".to_string()), ..Overrides::default() };
        assert!(Settings::load(None, overrides).is_err());
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let overrides = Overrides { concurrency: Some(0), ..Overrides::default() };
        assert!(Settings::load(None, overrides).is_err());
    }
}
