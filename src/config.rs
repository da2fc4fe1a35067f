use crate::compare::{CompareOptions, DEFAULT_MAX_TEXT_BYTES};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Unchanged lines shown around each change.
    pub context_lines: usize,
    /// Compute diffs and parameter changes, not just change kinds.
    pub include_diff: bool,
    /// File pairs above this size use the whole-file parameter fallback.
    pub max_text_bytes: usize,
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            context_lines: 3,
            include_diff: true,
            max_text_bytes: DEFAULT_MAX_TEXT_BYTES,
            output: OutputFormat::Text,
        }
    }
}

impl Config {
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_path(),
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("paramdiff")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.max_text_bytes >= 1, "max_text_bytes must be at least 1");
        anyhow::ensure!(
            self.context_lines <= 10_000,
            "context_lines must be at most 10000"
        );
        Ok(())
    }

    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            context: self.context_lines,
            include_diff: self.include_diff,
            max_bytes: self.max_text_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.context_lines, 3);
        assert!(config.include_diff);
        assert_eq!(config.max_text_bytes, 1_000_000);
        assert_eq!(config.output, OutputFormat::Text);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            context_lines = 0
            include_diff = false
            max_text_bytes = 2048
            output = "json"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.context_lines, 0);
        assert!(!config.include_diff);
        assert_eq!(config.max_text_bytes, 2048);
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"context_lines = 5"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.context_lines, 5);
        assert!(config.include_diff);
        assert_eq!(config.max_text_bytes, 1_000_000);
    }

    #[test]
    fn test_validation_max_bytes() {
        let config = Config {
            max_text_bytes: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_context() {
        let config = Config {
            context_lines: 20_000,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_compare_options_mirror_config() {
        let config = Config {
            context_lines: 1,
            include_diff: false,
            max_text_bytes: 10,
            output: OutputFormat::Json,
        };
        let options = config.compare_options();
        assert_eq!(options.context, 1);
        assert!(!options.include_diff);
        assert_eq!(options.max_bytes, 10);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config = Config::load(Some(&PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.context_lines, 3);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_text_bytes = 0\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
