use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chat::DEFAULT_CONTEXT_CHARS;
use crate::error::{AppError, Result};
use crate::models::{SummaryOptions, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PREVIEW_CHARS};

const APP_DIR: &str = "speedy-summary";
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub claude_api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    #[serde(default = "default_max_source_chars")]
    pub max_source_chars: usize,

    #[serde(default = "default_chat_context_chars")]
    pub chat_context_chars: usize,

    #[serde(default = "default_pdftotext_path")]
    pub pdftotext_path: String,

    #[serde(default)]
    pub default_options: SummaryOptions,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("history.db").to_string_lossy().to_string()
}

fn default_model() -> String {
    crate::ai::DEFAULT_MODEL.to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_preview_chars() -> usize {
    DEFAULT_PREVIEW_CHARS
}

fn default_max_source_chars() -> usize {
    100_000
}

fn default_chat_context_chars() -> usize {
    DEFAULT_CONTEXT_CHARS
}

fn default_pdftotext_path() -> String {
    "pdftotext".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            claude_api_key: None,
            model: default_model(),
            request_timeout_secs: default_request_timeout(),
            max_upload_bytes: default_max_upload_bytes(),
            preview_chars: default_preview_chars(),
            max_source_chars: default_max_source_chars(),
            chat_context_chars: default_chat_context_chars(),
            pdftotext_path: default_pdftotext_path(),
            default_options: SummaryOptions::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            config
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Key from the config file, falling back to the environment.
    pub fn api_key(&self) -> Option<String> {
        self.claude_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(AppError::Config("max_upload_bytes must be greater than 0".into()));
        }
        if self.preview_chars == 0 {
            return Err(AppError::Config("preview_chars must be greater than 0".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::Config("request_timeout_secs must be greater than 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SummaryLength, SummaryStyle};
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.preview_chars, 150);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
db_path = "/tmp/history.db"
preview_chars = 80

[default_options]
length = "long"
style = "bullet"
focus = "general"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.db_path, "/tmp/history.db");
        assert_eq!(config.preview_chars, 80);
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.default_options.length, SummaryLength::Long);
        assert_eq!(config.default_options.style, SummaryStyle::Bullet);
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_upload_bytes = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
    }
}
