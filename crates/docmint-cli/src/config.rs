//! Configuration management for the CLI.

use crate::cli::Cli;
use crate::error::{CliError, Result};
use docmint_extractor::ExtractorConfig;
use docmint_llm::{ProviderConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model service connection
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Transport retry policy
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Pipeline settings
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

impl AppConfig {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".docmint").join("config.toml"))
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist; a missing default file yields the
    /// defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Apply environment variables, then command-line flags.
    ///
    /// Flags win over the environment, which wins over the file.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        self.provider = std::mem::take(&mut self.provider).with_env_overrides();

        if let Some(key) = &cli.api_key {
            self.provider.api_key = key.clone();
        }
        if let Some(url) = &cli.base_url {
            self.provider.base_url = url.clone();
        }
        if let Some(model) = &cli.model {
            self.provider.model = model.clone();
        }
    }

    /// Validate the settings every command needs.
    pub fn validate(&self) -> Result<()> {
        self.extractor
            .validate()
            .map_err(|e| CliError::Config(format!("[extractor] {}", e)))?;
        self.retry
            .validate()
            .map_err(|e| CliError::Config(format!("[retry] {}", e)))?;
        Ok(())
    }

    /// Validate the model service settings as well.
    pub fn validate_provider(&self) -> Result<()> {
        self.validate()?;
        self.provider
            .validate()
            .map_err(|e| CliError::Config(format!("[provider] {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use docmint_extractor::ExhaustedPolicy;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.extractor.chunk_size, 4096);
        assert_eq!(config.retry.max_attempts, Some(8));
        assert_eq!(config.provider.model, "gpt-4o");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [provider]
            model = "gpt-4o-mini"

            [extractor]
            workers = 3
            on_exhausted = "abort"
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.provider.base_url, "https://api.openai.com/v1");
        assert_eq!(config.extractor.workers, 3);
        assert_eq!(config.extractor.on_exhausted, ExhaustedPolicy::Abort);
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_load_written_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.extractor.shuffle_seed = Some(11);
        config.provider.api_key = "secret".to_string();
        let contents = toml::to_string_pretty(&config).unwrap();
        assert!(!contents.contains("secret"));
        fs::write(&path, contents).unwrap();

        let loaded = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.extractor.shuffle_seed, Some(11));
        assert!(loaded.provider.api_key.is_empty());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = AppConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_flags_override_file() {
        let mut config = AppConfig::default();
        let cli = Cli::parse_from([
            "docmint",
            "--api-key",
            "flag-key",
            "--base-url",
            "http://localhost:8000/v1",
            "--model",
            "local",
            "chunk",
            "-i",
            "docs",
        ]);

        config.apply_overrides(&cli);

        assert_eq!(config.provider.api_key, "flag-key");
        assert_eq!(config.provider.base_url, "http://localhost:8000/v1");
        assert_eq!(config.provider.model, "local");
        assert!(config.validate_provider().is_ok());
    }

    #[test]
    fn test_invalid_sections_are_named() {
        let mut config = AppConfig::default();
        config.extractor.chunk_overlap = config.extractor.chunk_size;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("[extractor]"));

        let mut config = AppConfig::default();
        config.provider.api_key.clear();
        config.provider.model.clear();
        let err = config.validate_provider().unwrap_err();
        assert!(err.to_string().contains("[provider]"));
    }
}
