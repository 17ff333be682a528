//! rag-pipeline - Retrieval-Augmented Generation
//!
//! Splits documents into overlapping word-window passages, embeds them, keeps
//! them in an exact cosine-similarity index and answers questions from the
//! most relevant passages through an Azure OpenAI chat deployment.

pub mod azure;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod pipeline;

pub use chunking::{split_into_passages, PassageSplitter};
pub use embedding::{SearchResult, VectorIndex};
pub use error::{ErrorKind, RagError, Result};
pub use pipeline::{IndexReport, PipelineOptions, PipelineStage, RagPipeline};
