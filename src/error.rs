use crate::embedding::{EmbeddingError, VectorIndexError};
use crate::generation::GenerationError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the RAG pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// Generic configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Chunking parameters that would make the splitter loop or emit nothing
    #[error("Invalid configuration for {parameter}: {message}")]
    InvalidConfiguration {
        parameter: &'static str,
        message: String,
    },

    /// Caller supplied an out-of-range argument (top_k, max_length)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Query issued before any document was indexed
    #[error("Pipeline is not ready: index at least one non-empty document before querying")]
    NotReady,

    /// Vector index rejected an insertion or a search
    #[error("Vector index error: {0}")]
    VectorIndex(#[from] VectorIndexError),

    /// Embedding provider failed while indexing a passage
    #[error(
        "Embedding failed for document {document}, passage {passage} \
         ({embedded} passages embedded before the failure): {source}"
    )]
    Embedding {
        document: usize,
        passage: usize,
        embedded: usize,
        #[source]
        source: EmbeddingError,
    },

    /// Embedding provider failed on the query text
    #[error("Query embedding failed: {0}")]
    QueryEmbedding(#[source] EmbeddingError),

    /// Generation provider failed
    #[error("Generation failed during {stage}: {source}")]
    Generation {
        stage: GenerationStage,
        #[source]
        source: GenerationError,
    },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// Failures from the binary's own glue, such as a partially failed batch command
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Which generation call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    Answer,
    Summary,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationStage::Answer => write!(f, "answer generation"),
            GenerationStage::Summary => write!(f, "summarization"),
        }
    }
}

/// Coarse classification so callers can decide between retrying and fixing input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad chunking, top_k, max_length or config file contents
    Configuration,
    /// Embedding dimension disagreement or degenerate vectors
    Consistency,
    /// Operation not valid in the pipeline's current stage
    State,
    /// Embedding or generation backend failure
    Provider,
    /// Filesystem or serialization failure outside the core
    Io,
    /// Anything not covered above
    Other,
}

impl RagError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::Config(_)
            | RagError::ConfigValidation { .. }
            | RagError::ConfigNotFound { .. }
            | RagError::InvalidConfigValue { .. }
            | RagError::InvalidConfiguration { .. }
            | RagError::InvalidArgument(_)
            | RagError::Toml(_) => ErrorKind::Configuration,
            RagError::NotReady => ErrorKind::State,
            RagError::VectorIndex(e) => match e {
                VectorIndexError::EmptyIndex => ErrorKind::State,
                VectorIndexError::InvalidK | VectorIndexError::InvalidDimension => {
                    ErrorKind::Configuration
                }
                _ => ErrorKind::Consistency,
            },
            RagError::Embedding { source, .. } | RagError::QueryEmbedding(source) => {
                match source {
                    EmbeddingError::InvalidInput(_) => ErrorKind::Configuration,
                    _ => ErrorKind::Provider,
                }
            }
            RagError::Generation { .. } => ErrorKind::Provider,
            RagError::Io { .. } | RagError::TomlSerialization(_) => ErrorKind::Io,
            RagError::Other(_) => ErrorKind::Other,
        }
    }

    /// Provider failures are transient from the core's point of view; everything else needs a fix
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Provider
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;
