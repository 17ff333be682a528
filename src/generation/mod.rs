//! Answer generation
//!
//! The generation backend is reached through [`GenerationProvider`], which
//! takes a system message, a user message and sampling limits and returns the
//! completion text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Completion request failed: {0}")]
    Request(String),

    #[error("Completion API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid completion response: {0}")]
    InvalidResponse(String),

    #[error("Completion contained no text")]
    EmptyCompletion,
}

/// A two-message chat exchange with sampling limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System context (instructions, retrieved passages)
    pub system: String,
    /// User message (the question or the text to summarize)
    pub user: String,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

/// Trait for generation providers
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for the request
    fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError>;

    /// Get the model or deployment name
    fn model_name(&self) -> &str;
}

/// Sampling settings for answers and summaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Token limit for answers to questions
    pub answer_max_tokens: u32,
    /// Temperature for answers to questions
    pub answer_temperature: f32,
    /// Temperature for summaries (near-deterministic)
    pub summary_temperature: f32,
    /// Default word ceiling for summaries
    pub summary_max_length: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            answer_max_tokens: 150,
            answer_temperature: 0.7,
            summary_temperature: 0.3,
            summary_max_length: 100,
        }
    }
}
