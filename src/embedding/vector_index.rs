/// Exact cosine-similarity vector index
use ndarray::{Array1, Array2, ArrayView1};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Cannot normalize vector at position {position}: L2 norm is zero or not finite")]
    ZeroVector { position: usize },

    #[error("Got {embeddings} embeddings for {passages} passages")]
    LengthMismatch { embeddings: usize, passages: usize },

    #[error("Index is empty: add vectors before searching")]
    EmptyIndex,

    #[error("k must be at least 1")]
    InvalidK,

    #[error("Index dimension must be greater than 0")]
    InvalidDimension,

    #[error("Matrix shape error: {0}")]
    Shape(String),
}

/// Search result with position, similarity score and passage text
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Insertion position of the entry in the index
    pub position: usize,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub score: f32,
    /// Passage text stored with the embedding
    pub passage: String,
}

/// Flat vector index
///
/// Stores unit-normalized embeddings as rows of a matrix, with the passage
/// text for row `i` at `passages[i]`. Cosine similarity is the inner product
/// of normalized vectors; search is an exact scan over all rows.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    /// Normalized embeddings, one row per passage
    embeddings: Array2<f32>,
    /// Passage texts, parallel to `embeddings` rows
    passages: Vec<String>,
    /// Fixed once set, either at construction or on first add
    dimension: Option<usize>,
}

impl VectorIndex {
    /// Create an index whose dimension is fixed by the first `add`
    pub fn new() -> Self {
        Self {
            embeddings: Array2::zeros((0, 0)),
            passages: Vec::new(),
            dimension: None,
        }
    }

    /// Create an index with an explicit dimension
    pub fn with_dimension(dimension: usize) -> Result<Self, VectorIndexError> {
        if dimension == 0 {
            return Err(VectorIndexError::InvalidDimension);
        }

        Ok(Self {
            embeddings: Array2::zeros((0, dimension)),
            passages: Vec::new(),
            dimension: Some(dimension),
        })
    }

    /// Add embeddings and their passages
    ///
    /// Every vector is validated before anything is stored, so a failed call
    /// leaves the index untouched.
    pub fn add(&mut self, embeddings: &[Vec<f32>], passages: &[String]) -> Result<(), VectorIndexError> {
        if embeddings.len() != passages.len() {
            return Err(VectorIndexError::LengthMismatch {
                embeddings: embeddings.len(),
                passages: passages.len(),
            });
        }

        if embeddings.is_empty() {
            return Ok(());
        }

        let dimension = match self.dimension {
            Some(dimension) => dimension,
            None if embeddings[0].is_empty() => return Err(VectorIndexError::InvalidDimension),
            None => embeddings[0].len(),
        };

        let mut normalized = Vec::with_capacity(embeddings.len());
        for (position, vector) in embeddings.iter().enumerate() {
            if vector.len() != dimension {
                return Err(VectorIndexError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            let unit = normalize(vector).ok_or(VectorIndexError::ZeroVector {
                position: self.passages.len() + position,
            })?;
            normalized.push(unit);
        }

        if self.dimension.is_none() {
            self.embeddings = Array2::zeros((0, dimension));
            self.dimension = Some(dimension);
        }

        // Row lengths were checked above, so push_row cannot fail part-way
        for unit in &normalized {
            self.embeddings
                .push_row(unit.view())
                .map_err(|e| VectorIndexError::Shape(e.to_string()))?;
        }
        self.passages.extend(passages.iter().cloned());

        tracing::debug!(
            "Added {} vectors to index ({} total, {}D)",
            normalized.len(),
            self.passages.len(),
            dimension
        );

        Ok(())
    }

    /// Search for the `k` passages most similar to `query`
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<String>, VectorIndexError> {
        Ok(self
            .search_scored(query, k)?
            .into_iter()
            .map(|result| result.passage)
            .collect())
    }

    /// Search for the `k` nearest entries, with scores
    ///
    /// Results are sorted by descending similarity; equal scores keep
    /// insertion order.
    pub fn search_scored(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>, VectorIndexError> {
        if k == 0 {
            return Err(VectorIndexError::InvalidK);
        }

        let dimension = match self.dimension {
            Some(dimension) if !self.passages.is_empty() => dimension,
            _ => return Err(VectorIndexError::EmptyIndex),
        };

        if query.len() != dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: dimension,
                actual: query.len(),
            });
        }

        let query = normalize(query).ok_or(VectorIndexError::ZeroVector { position: 0 })?;
        let scores = self.embeddings.dot(&query);

        let mut order: Vec<usize> = (0..scores.len()).collect();
        // sort_by is stable, so ties keep ascending position
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(k);

        Ok(order
            .into_iter()
            .map(|position| SearchResult {
                position,
                score: scores[position],
                passage: self.passages[position].clone(),
            })
            .collect())
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Check if index is empty
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Get vector dimension, if fixed yet
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Passage stored at `position`
    pub fn passage(&self, position: usize) -> Option<&str> {
        self.passages.get(position).map(String::as_str)
    }

    /// Normalized embedding stored at `position`
    pub fn embedding(&self, position: usize) -> Option<ArrayView1<'_, f32>> {
        (position < self.passages.len()).then(|| self.embeddings.row(position))
    }
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale `vector` to unit L2 norm; `None` when the norm is zero or not finite
/// Unit-normalize in f64 so very large or very small f32 components neither
/// overflow nor underflow the sum of squares
fn normalize(vector: &[f32]) -> Option<Array1<f32>> {
    let norm = vector
        .iter()
        .map(|&x| f64::from(x).powi(2))
        .sum::<f64>()
        .sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    Some(
        vector
            .iter()
            .map(|&x| (f64::from(x) / norm) as f32)
            .collect(),
    )
}
