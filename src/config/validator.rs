use crate::config::Config;
use crate::error::{RagError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every violation
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_chunking(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_generation(config, &mut errors);
        Self::validate_azure(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RagError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_chunking(config: &Config, errors: &mut Vec<ValidationError>) {
        let chunking = &config.chunking;
        if chunking.chunk_size == 0 {
            errors.push(ValidationError::new(
                "chunking.chunk_size",
                "Chunk size must be greater than 0",
            ));
        } else if chunking.overlap >= chunking.chunk_size {
            errors.push(ValidationError::new(
                "chunking.overlap",
                format!(
                    "Overlap ({}) must be smaller than chunk size ({})",
                    chunking.overlap, chunking.chunk_size
                ),
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.retrieval.top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.top_k",
                "top_k must be greater than 0",
            ));
        }

        if config.retrieval.dimension == Some(0) {
            errors.push(ValidationError::new(
                "retrieval.dimension",
                "Vector dimension must be greater than 0",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        let mode = &config.embedding.mode;
        if mode != "offline" && mode != "online" {
            errors.push(ValidationError::new(
                "embedding.mode",
                format!("Mode must be 'offline' or 'online', got '{}'", mode),
            ));
        }

        if config.embedding.is_offline() && config.embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty in offline mode",
            ));
        }

        if config.embedding.max_concurrent == 0 {
            errors.push(ValidationError::new(
                "embedding.max_concurrent",
                "max_concurrent must be greater than 0",
            ));
        }
    }

    fn validate_generation(config: &Config, errors: &mut Vec<ValidationError>) {
        let generation = &config.generation;

        for (path, temp) in [
            ("generation.answer_temperature", generation.answer_temperature),
            ("generation.summary_temperature", generation.summary_temperature),
        ] {
            if !(0.0..=2.0).contains(&temp) {
                errors.push(ValidationError::new(
                    path,
                    format!("Temperature must be between 0.0 and 2.0, got {}", temp),
                ));
            }
        }

        if generation.answer_max_tokens == 0 {
            errors.push(ValidationError::new(
                "generation.answer_max_tokens",
                "answer_max_tokens must be greater than 0",
            ));
        }

        if generation.summary_max_length == 0 {
            errors.push(ValidationError::new(
                "generation.summary_max_length",
                "summary_max_length must be greater than 0",
            ));
        }
    }

    fn validate_azure(config: &Config, errors: &mut Vec<ValidationError>) {
        let azure = &config.azure;

        // Completions always go through Azure; embeddings only in online mode
        let mut required = vec![
            ("azure.endpoint", &azure.endpoint),
            ("azure.api_version", &azure.api_version),
            ("azure.api_key_env", &azure.api_key_env),
            ("azure.completion_deployment", &azure.completion_deployment),
        ];
        if !config.embedding.is_offline() {
            required.push(("azure.embedding_deployment", &azure.embedding_deployment));
        }

        for (path, value) in required {
            if value.trim().is_empty() {
                errors.push(ValidationError::new(path, "Value cannot be empty"));
            }
        }

        if !azure.endpoint.is_empty() && !azure.endpoint.starts_with("https://") {
            errors.push(ValidationError::new(
                "azure.endpoint",
                format!("Endpoint must be an https:// URL, got '{}'", azure.endpoint),
            ));
        }

        if azure.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "azure.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }
}
