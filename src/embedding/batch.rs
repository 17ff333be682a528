/// Bounded-concurrency embedding of passages
use super::{EmbeddingError, EmbeddingProvider};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Passage queued for embedding, tagged with where it came from
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Index of the source document in the caller's batch
    pub document: usize,
    /// Index of the passage within its document
    pub passage: usize,
    pub text: String,
}

/// First failure of a batch, in submission order
#[derive(Debug)]
pub struct BatchFailure {
    pub document: usize,
    pub passage: usize,
    /// Number of items before the failing one that embedded successfully
    pub embedded: usize,
    pub error: EmbeddingError,
}

/// Fans embedding calls out over tokio's blocking pool
///
/// At most `max_concurrent` provider calls are in flight. Results come back in
/// the order the items were submitted, regardless of completion order.
pub struct BatchEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    max_concurrent: usize,
}

impl BatchEmbedder {
    /// Create a new batch embedder
    ///
    /// # Arguments
    /// * `provider` - Embedding provider
    /// * `max_concurrent` - Maximum concurrent provider calls (at least 1)
    pub fn new(provider: Arc<dyn EmbeddingProvider>, max_concurrent: usize) -> Self {
        Self {
            provider,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Embed every item, returning one vector per item in submission order
    ///
    /// Once any call fails no further items are started. Calls already in
    /// flight are awaited before returning, so nothing keeps running in the
    /// background after an error.
    pub async fn embed_all(&self, items: &[BatchItem]) -> Result<Vec<Vec<f32>>, BatchFailure> {
        let start = std::time::Instant::now();
        info!(
            "Embedding {} passages ({} concurrent)",
            items.len(),
            self.max_concurrent
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let failed = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(items.len());

        for item in items {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!("Embedding semaphore closed: {}", e);
                    break;
                }
            };
            // The failing task sets the flag before releasing its permit
            if failed.load(Ordering::Acquire) {
                debug!(
                    "Stopping submission at document {} passage {} after a failure",
                    item.document, item.passage
                );
                break;
            }

            let provider = Arc::clone(&self.provider);
            let failed = Arc::clone(&failed);
            let text = item.text.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let result = provider.embed(&text);
                if result.is_err() {
                    failed.store(true, Ordering::Release);
                }
                drop(permit);
                result
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(match handle.await {
                Ok(result) => result,
                Err(e) => Err(EmbeddingError::GenerationError(format!(
                    "embedding task failed: {}",
                    e
                ))),
            });
        }

        let mut embeddings = Vec::with_capacity(items.len());
        for (item, result) in items.iter().zip(results) {
            match result {
                Ok(embedding) => {
                    debug!(
                        "Embedded document {} passage {}",
                        item.document, item.passage
                    );
                    embeddings.push(embedding);
                }
                Err(error) => {
                    return Err(BatchFailure {
                        document: item.document,
                        passage: item.passage,
                        embedded: embeddings.len(),
                        error,
                    });
                }
            }
        }

        if embeddings.len() < items.len() {
            // Submission stopped without any task reporting an error
            let item = &items[embeddings.len()];
            return Err(BatchFailure {
                document: item.document,
                passage: item.passage,
                embedded: embeddings.len(),
                error: EmbeddingError::GenerationError(
                    "embedding submission was interrupted".to_string(),
                ),
            });
        }

        info!(
            "Embedded {} passages in {}ms",
            embeddings.len(),
            start.elapsed().as_millis()
        );

        Ok(embeddings)
    }
}
