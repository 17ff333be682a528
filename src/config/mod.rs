//! Configuration management
//!
//! Loads the pipeline configuration from TOML, applies `RAG_SECTION__KEY`
//! environment overrides and named profiles, and validates the result.

use crate::azure::AzureConfig;
use crate::chunking::ChunkingConfig;
use crate::embedding::{EmbeddingConfig, RetrievalConfig};
use crate::error::{RagError, Result};
use crate::generation::GenerationConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub azure: AzureConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlap: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RagError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| RagError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| RagError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| RagError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(mode) = overrides.embedding_mode {
            self.embedding.mode = mode;
        }
        if let Some(model) = overrides.embedding_model {
            self.embedding.model = model;
        }
        if let Some(chunk_size) = overrides.chunk_size {
            self.chunking.chunk_size = chunk_size;
        }
        if let Some(overlap) = overrides.overlap {
            self.chunking.overlap = overlap;
        }
        if let Some(top_k) = overrides.top_k {
            self.retrieval.top_k = top_k;
        }

        tracing::debug!("Applied profile {}", profile);
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: RAG_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    /// Apply `RAG_`-prefixed overrides from an arbitrary key/value source
    pub fn apply_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("RAG_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "CHUNKING__CHUNK_SIZE" => self.chunking.chunk_size = parse_value(path, value)?,
            "CHUNKING__OVERLAP" => self.chunking.overlap = parse_value(path, value)?,
            "RETRIEVAL__TOP_K" => self.retrieval.top_k = parse_value(path, value)?,
            "RETRIEVAL__DIMENSION" => self.retrieval.dimension = Some(parse_value(path, value)?),
            "EMBEDDING__MODE" => self.embedding.mode = value.to_string(),
            "EMBEDDING__MODEL" => self.embedding.model = value.to_string(),
            "EMBEDDING__MAX_CONCURRENT" => {
                self.embedding.max_concurrent = parse_value(path, value)?
            }
            "GENERATION__ANSWER_MAX_TOKENS" => {
                self.generation.answer_max_tokens = parse_value(path, value)?
            }
            "GENERATION__ANSWER_TEMPERATURE" => {
                self.generation.answer_temperature = parse_value(path, value)?
            }
            "AZURE__ENDPOINT" => self.azure.endpoint = value.to_string(),
            "AZURE__API_VERSION" => self.azure.api_version = value.to_string(),
            "AZURE__EMBEDDING_DEPLOYMENT" => self.azure.embedding_deployment = value.to_string(),
            "AZURE__COMPLETION_DEPLOYMENT" => {
                self.azure.completion_deployment = value.to_string()
            }
            "AZURE__TIMEOUT_SECS" => self.azure.timeout_secs = parse_value(path, value)?,
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RagError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("rag-pipeline").join("config.toml"))
    }
}

fn parse_value<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| RagError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            azure: AzureConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(vars(&[
            ("RAG_CHUNKING__CHUNK_SIZE", "200"),
            ("RAG_RETRIEVAL__TOP_K", "3"),
            ("RAG_AZURE__ENDPOINT", "https://other.openai.azure.com"),
            ("HOME", "/root"),
        ]));

        assert_eq!(config.chunking.chunk_size, 200);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.azure.endpoint, "https://other.openai.azure.com");
    }

    #[test]
    fn test_unparseable_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(vars(&[("RAG_CHUNKING__OVERLAP", "many")]));
        assert_eq!(config.chunking.overlap, 50);
    }

    #[test]
    fn test_apply_profile() {
        let mut config = Config::default();
        config.profiles.insert(
            "local".to_string(),
            ProfileOverrides {
                embedding_mode: Some("offline".to_string()),
                top_k: Some(8),
                ..ProfileOverrides::default()
            },
        );

        config.apply_profile("local").unwrap();
        assert!(config.embedding.is_offline());
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.chunking.chunk_size, 500);
    }

    #[test]
    fn test_unknown_profile() {
        let mut config = Config::default();
        assert!(matches!(
            config.apply_profile("missing"),
            Err(RagError::Config(_))
        ));
    }

    #[test]
    fn test_toml_round_trip_keeps_sections() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[_meta]"));
        assert!(text.contains("[chunking]"));
        assert!(text.contains("[azure]"));

        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let parsed: Config = toml::from_str("[_meta]\nschema_version = \"1.0.0\"\n").unwrap();
        assert_eq!(parsed.chunking, ChunkingConfig::default());
        assert_eq!(parsed.retrieval.top_k, 5);
        assert_eq!(parsed.azure.completion_deployment, "gpt-4o-mini");
    }
}
