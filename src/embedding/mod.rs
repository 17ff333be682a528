mod batch;
/// Embedding & Indexing
///
/// - EmbeddingProvider trait for abstraction over remote and local backends
/// - FastEmbedProvider for local embedding (all-MiniLM-L6-v2, 384-dim)
/// - VectorIndex: exact cosine-similarity search over normalized vectors
/// - BatchEmbedder: bounded-concurrency, order-preserving embedding
mod provider;
mod vector_index;

pub use batch::{BatchEmbedder, BatchFailure, BatchItem};
pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use vector_index::{SearchResult, VectorIndex, VectorIndexError};

use serde::{Deserialize, Serialize};

/// Configuration for embedding generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Operating mode: "online" (Azure deployment) or "offline" (local model)
    pub mode: String,
    /// Local model name used in offline mode (e.g., "all-MiniLM-L6-v2")
    pub model: String,
    /// Maximum concurrent embedding calls when indexing concurrently
    pub max_concurrent: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: "online".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            max_concurrent: 4,
        }
    }
}

impl EmbeddingConfig {
    pub fn is_offline(&self) -> bool {
        self.mode == "offline"
    }
}

/// Configuration for retrieval and the vector index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Passages retrieved per question
    pub top_k: usize,
    /// Explicit index dimension; inferred from the first embedding when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            dimension: None,
        }
    }
}
