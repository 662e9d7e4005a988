//! TrustAgent Configuration
//!
//! Model roles, Ollama endpoint and run log settings, injected into the
//! loop rather than held as globals.
//! Config file: $TRUSTAGENT_CONFIG or ~/.config/trustagent/config.toml

use crate::run_log::LogFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TRUSTAGENT_CONFIG";

/// Ollama connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub endpoint: String,
    /// Deadline for a single generation call
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            timeout_secs: 120,
        }
    }
}

/// One model role and its sampling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f64,
    /// Context window size
    pub num_ctx: u32,
    /// Maximum tokens to generate
    pub num_predict: u32,
    /// How long Ollama keeps the model loaded ("10m", "0", "1h")
    pub keep_alive: String,
}

impl ModelConfig {
    /// Fast generator used for answers and safe regeneration
    pub fn answer_default() -> Self {
        Self {
            model: "qwen2.5:3b".to_string(),
            temperature: 0.3,
            num_ctx: 2048,
            num_predict: 256,
            keep_alive: "10m".to_string(),
        }
    }

    /// Stronger, colder evaluator
    pub fn critic_default() -> Self {
        Self {
            model: "llama3:8b".to_string(),
            temperature: 0.1,
            num_ctx: 2048,
            num_predict: 200,
            keep_alive: "10m".to_string(),
        }
    }
}

fn default_answer_model() -> ModelConfig {
    ModelConfig::answer_default()
}

fn default_critic_model() -> ModelConfig {
    ModelConfig::critic_default()
}

/// Run log settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub path: PathBuf,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("runs.txt"),
            format: LogFormat::Text,
        }
    }
}

/// Main TrustAgent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustConfig {
    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default = "default_answer_model")]
    pub answer: ModelConfig,

    #[serde(default = "default_critic_model")]
    pub critic: ModelConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            answer: ModelConfig::answer_default(),
            critic: ModelConfig::critic_default(),
            log: LogConfig::default(),
        }
    }
}

impl TrustConfig {
    /// Get default user config path: ~/.config/trustagent/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("trustagent").join("config.toml"))
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. $TRUSTAGENT_CONFIG (must exist if set)
    /// 2. User config (~/.config/trustagent/config.toml)
    /// 3. Defaults
    pub fn load() -> Result<Self> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load_from(Path::new(&explicit));
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: TrustConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
        }

        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = TrustConfig::default();
        assert_eq!(config.answer.model, "qwen2.5:3b");
        assert_eq!(config.answer.num_predict, 256);
        assert_eq!(config.critic.model, "llama3:8b");
        assert_eq!(config.critic.num_predict, 200);
        assert_eq!(config.ollama.endpoint, "http://localhost:11434");
        assert_eq!(config.log.path, PathBuf::from("runs.txt"));
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_str = r#"
[critic]
model = "llama3:70b"
temperature = 0.0
num_ctx = 4096
num_predict = 128
keep_alive = "1h"

[log]
format = "jsonl"
"#;
        let config: TrustConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.critic.model, "llama3:70b");
        assert_eq!(config.critic.num_ctx, 4096);
        assert_eq!(config.answer, ModelConfig::answer_default());
        assert_eq!(config.log.format, LogFormat::Jsonl);
        assert_eq!(config.log.path, PathBuf::from("runs.txt"));
        assert_eq!(config.ollama, OllamaConfig::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: TrustConfig = toml::from_str("").unwrap();
        assert_eq!(config, TrustConfig::default());
    }

    #[test]
    fn test_save_and_load_from() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = TrustConfig::default();
        config.ollama.timeout_secs = 15;
        config.save_to(&path).unwrap();

        let loaded = TrustConfig::load_from(&path).unwrap();
        assert_eq!(loaded.ollama.timeout_secs, 15);
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = TrustConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
