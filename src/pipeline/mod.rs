//! Retrieval-Augmented Generation pipeline
//!
//! `RagPipeline` splits documents into passages, embeds each passage, stores
//! the vectors in a [`VectorIndex`] and answers questions from the passages
//! closest to the question.
//!
//! The pipeline starts without an index. The first `index_documents` call that
//! produces at least one passage creates it (with the configured dimension, or
//! the dimension of the first embedding) and moves the pipeline to the ready
//! stage. Queries before that fail with [`RagError::NotReady`].

mod prompt;

pub use prompt::{ANSWER_INSTRUCTION, SUMMARY_INSTRUCTION};

use crate::azure::AzureOpenAiClient;
use crate::chunking::{ChunkingConfig, PassageSplitter};
use crate::config::Config;
use crate::embedding::{
    BatchEmbedder, BatchItem, EmbeddingProvider, FastEmbedProvider, SearchResult, VectorIndex,
};
use crate::error::{GenerationStage, RagError, Result};
use crate::generation::{GenerationConfig, GenerationProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Settings the pipeline needs beyond its providers
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub chunking: ChunkingConfig,
    /// Explicit index dimension; inferred from the first embedding when unset
    pub dimension: Option<usize>,
    /// Passages retrieved per question by default
    pub top_k: usize,
    /// Concurrency limit for `index_documents_concurrent`
    pub max_concurrent: usize,
    pub generation: GenerationConfig,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            dimension: None,
            top_k: 5,
            max_concurrent: 4,
            generation: GenerationConfig::default(),
        }
    }
}

impl From<&Config> for PipelineOptions {
    fn from(config: &Config) -> Self {
        Self {
            chunking: config.chunking,
            dimension: config.retrieval.dimension,
            top_k: config.retrieval.top_k,
            max_concurrent: config.embedding.max_concurrent,
            generation: config.generation.clone(),
        }
    }
}

/// Lifecycle stage of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// No index yet; only `summarize` is available
    Uninitialized,
    /// Index exists and its dimension is fixed
    Ready,
}

/// Outcome of one indexing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    /// Documents supplied by the caller
    pub documents: usize,
    /// Documents that produced no passages
    pub skipped_documents: usize,
    /// Passages added by this call
    pub passages: usize,
    /// Passages in the index after this call
    pub total_passages: usize,
    pub duration_ms: u64,
}

/// RAG orchestrator owning one vector index
pub struct RagPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    splitter: PassageSplitter,
    options: PipelineOptions,
    index: Option<VectorIndex>,
}

impl RagPipeline {
    /// Create a pipeline from explicit providers
    ///
    /// Chunking parameters and the explicit dimension are checked here, before
    /// any provider is called.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        options: PipelineOptions,
    ) -> Result<Self> {
        let splitter = PassageSplitter::from_config(&options.chunking)?;

        if options.dimension == Some(0) {
            return Err(RagError::InvalidConfiguration {
                parameter: "retrieval.dimension",
                message: "dimension must be greater than 0".to_string(),
            });
        }

        Ok(Self {
            embedder,
            generator,
            splitter,
            options,
            index: None,
        })
    }

    /// Create a pipeline backed by the providers named in `config`
    ///
    /// Online mode uses the Azure deployment for both embeddings and
    /// completions; offline mode embeds locally with fastembed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let azure = Arc::new(AzureOpenAiClient::from_env(&config.azure)?);

        let embedder: Arc<dyn EmbeddingProvider> = if config.embedding.is_offline() {
            Arc::new(FastEmbedProvider::new(&config.embedding.model).map_err(|e| {
                RagError::InvalidConfigValue {
                    path: "embedding.model".to_string(),
                    message: e.to_string(),
                }
            })?)
        } else {
            azure.clone()
        };

        info!(
            "Pipeline configured: embeddings via {}, completions via {}",
            embedder.model_name(),
            config.azure.completion_deployment
        );

        Self::new(embedder, azure, PipelineOptions::from(config))
    }

    pub fn stage(&self) -> PipelineStage {
        if self.index.is_some() {
            PipelineStage::Ready
        } else {
            PipelineStage::Uninitialized
        }
    }

    pub fn is_ready(&self) -> bool {
        self.stage() == PipelineStage::Ready
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn index(&self) -> Option<&VectorIndex> {
        self.index.as_ref()
    }

    /// Number of indexed passages
    pub fn len(&self) -> usize {
        self.index.as_ref().map_or(0, VectorIndex::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split, embed and index `documents`, one embedding call at a time
    ///
    /// Passages are inserted only after every embedding succeeded; a provider
    /// failure leaves the index as it was and names the failing passage.
    pub fn index_documents<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<IndexReport> {
        let start = Instant::now();
        let items = self.collect_passages(documents);

        let mut embeddings = Vec::with_capacity(items.len());
        for item in &items {
            let embedding = self
                .embedder
                .embed(&item.text)
                .map_err(|source| RagError::Embedding {
                    document: item.document,
                    passage: item.passage,
                    embedded: embeddings.len(),
                    source,
                })?;
            debug!(
                "Embedded document {} passage {}",
                item.document, item.passage
            );
            embeddings.push(embedding);
        }

        self.insert(documents.len(), items, embeddings, start)
    }

    /// Same contract as [`index_documents`](Self::index_documents), with up to
    /// `max_concurrent` embedding calls in flight
    pub async fn index_documents_concurrent<S: AsRef<str>>(
        &mut self,
        documents: &[S],
        max_concurrent: usize,
    ) -> Result<IndexReport> {
        let start = Instant::now();
        let items = self.collect_passages(documents);

        let embedder = BatchEmbedder::new(Arc::clone(&self.embedder), max_concurrent);
        let embeddings = embedder
            .embed_all(&items)
            .await
            .map_err(|failure| RagError::Embedding {
                document: failure.document,
                passage: failure.passage,
                embedded: failure.embedded,
                source: failure.error,
            })?;

        self.insert(documents.len(), items, embeddings, start)
    }

    fn collect_passages<S: AsRef<str>>(&self, documents: &[S]) -> Vec<BatchItem> {
        documents
            .iter()
            .enumerate()
            .flat_map(|(document, text)| {
                self.splitter
                    .split(text.as_ref())
                    .into_iter()
                    .enumerate()
                    .map(move |(passage, text)| BatchItem {
                        document,
                        passage,
                        text,
                    })
            })
            .collect()
    }

    fn insert(
        &mut self,
        documents: usize,
        items: Vec<BatchItem>,
        embeddings: Vec<Vec<f32>>,
        start: Instant,
    ) -> Result<IndexReport> {
        let mut contributing: Vec<usize> = items.iter().map(|item| item.document).collect();
        contributing.dedup();
        let passages: Vec<String> = items.into_iter().map(|item| item.text).collect();

        if !passages.is_empty() {
            // A new index is only kept once the first insertion succeeded
            let mut created = None;
            let index = match self.index.as_mut() {
                Some(index) => index,
                None => created.insert(match self.options.dimension {
                    Some(dimension) => VectorIndex::with_dimension(dimension)?,
                    None => VectorIndex::new(),
                }),
            };
            index.add(&embeddings, &passages)?;

            if let Some(index) = created {
                info!(
                    "Vector index created ({}D)",
                    index.dimension().unwrap_or_default()
                );
                self.index = Some(index);
            }
        }

        let report = IndexReport {
            documents,
            skipped_documents: documents - contributing.len(),
            passages: passages.len(),
            total_passages: self.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Indexed {} passages from {} documents ({} skipped, {} total, {}ms)",
            report.passages,
            report.documents,
            report.skipped_documents,
            report.total_passages,
            report.duration_ms
        );

        Ok(report)
    }

    /// Retrieve the `top_k` passages most similar to `question`, with scores
    pub fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(RagError::InvalidArgument(
                "top_k must be at least 1".to_string(),
            ));
        }

        let index = self.index.as_ref().ok_or(RagError::NotReady)?;

        let query_embedding = self
            .embedder
            .embed(question)
            .map_err(RagError::QueryEmbedding)?;

        let results = index.search_scored(&query_embedding, top_k)?;
        debug!(
            "Retrieved {} passages (best score {:.3})",
            results.len(),
            results.first().map_or(0.0, |r| r.score)
        );

        Ok(results)
    }

    /// Answer `question` from the `top_k` most relevant indexed passages
    pub fn query(&self, question: &str, top_k: usize) -> Result<String> {
        let results = self.retrieve(question, top_k)?;
        let passages: Vec<&str> = results.iter().map(|r| r.passage.as_str()).collect();

        let request = prompt::answer_request(
            &passages,
            question,
            self.options.generation.answer_max_tokens,
            self.options.generation.answer_temperature,
        );

        self.generator
            .complete(&request)
            .map_err(|source| RagError::Generation {
                stage: GenerationStage::Answer,
                source,
            })
    }

    /// Summarize `text` in at most `max_length` words
    ///
    /// Does not touch the index, so it works before anything is indexed.
    pub fn summarize(&self, text: &str, max_length: usize) -> Result<String> {
        if max_length == 0 {
            return Err(RagError::InvalidArgument(
                "max_length must be at least 1".to_string(),
            ));
        }

        let request =
            prompt::summary_request(text, max_length, self.options.generation.summary_temperature);

        let summary = self
            .generator
            .complete(&request)
            .map_err(|source| RagError::Generation {
                stage: GenerationStage::Summary,
                source,
            })?;

        Ok(summary.trim().to_string())
    }
}
