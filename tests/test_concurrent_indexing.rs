//! Concurrent indexing must produce the same index as sequential indexing

use std::sync::Arc;
use std::time::Duration;
use rag_pipeline::chunking::ChunkingConfig;
use rag_pipeline::embedding::{EmbeddingError, EmbeddingProvider};
use rag_pipeline::generation::{CompletionRequest, GenerationError, GenerationProvider};
use rag_pipeline::{PipelineOptions, RagError, RagPipeline};

/// Embeds a passage from its letters; passages containing "slow" take longer
struct LetterEmbedder;

impl EmbeddingProvider for LetterEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.contains("broken") {
            return Err(EmbeddingError::Request("connection reset".to_string()));
        }
        if text.contains("slow") {
            std::thread::sleep(Duration::from_millis(30));
        }

        let mut v = vec![0.0f32; 4];
        for (i, byte) in text.bytes().enumerate() {
            v[i % 4] += byte as f32;
        }
        Ok(v)
    }

    fn model_name(&self) -> &str {
        "letters"
    }
}

struct EchoGenerator;

impl GenerationProvider for EchoGenerator {
    fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        Ok(request.user.clone())
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

fn pipeline() -> RagPipeline {
    let options = PipelineOptions {
        chunking: ChunkingConfig {
            chunk_size: 4,
            overlap: 1,
        },
        ..PipelineOptions::default()
    };
    RagPipeline::new(Arc::new(LetterEmbedder), Arc::new(EchoGenerator), options).unwrap()
}

fn documents() -> Vec<String> {
    vec![
        "slow start of the first document with a few more words".to_string(),
        String::new(),
        "second document is quick and short".to_string(),
        "third one is slow slow slow and then it ends here".to_string(),
    ]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_matches_sequential() {
    let docs = documents();

    let mut sequential = pipeline();
    let sequential_report = sequential.index_documents(&docs).unwrap();

    let mut concurrent = pipeline();
    let concurrent_report = concurrent
        .index_documents_concurrent(&docs, 3)
        .await
        .unwrap();

    assert_eq!(sequential_report.passages, concurrent_report.passages);
    assert_eq!(concurrent_report.skipped_documents, 1);

    let seq_index = sequential.index().unwrap();
    let con_index = concurrent.index().unwrap();
    assert_eq!(seq_index.len(), con_index.len());
    for position in 0..seq_index.len() {
        assert_eq!(seq_index.passage(position), con_index.passage(position));
        assert_eq!(seq_index.embedding(position), con_index.embedding(position));
    }
}

#[tokio::test]
async fn test_concurrent_failure_reports_first_passage_in_order() {
    let docs = vec![
        "alpha beta gamma delta epsilon".to_string(),
        "slow broken passage here".to_string(),
        "broken too".to_string(),
    ];

    let mut pipeline = pipeline();
    let err = pipeline
        .index_documents_concurrent(&docs, 4)
        .await
        .unwrap_err();

    match err {
        RagError::Embedding {
            document,
            passage,
            embedded,
            ..
        } => {
            assert_eq!(document, 1);
            assert_eq!(passage, 0);
            assert_eq!(embedded, 2);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!pipeline.is_ready());
}

#[tokio::test]
async fn test_concurrent_empty_input_is_noop() {
    let mut pipeline = pipeline();
    let docs: Vec<String> = Vec::new();
    let report = pipeline.index_documents_concurrent(&docs, 2).await.unwrap();
    assert_eq!(report.passages, 0);
    assert!(!pipeline.is_ready());
}
