//! Exact inner-product index over L2-normalized vectors
//!
//! Vectors are normalized once at build time and the query is normalized
//! before every search, so inner product equals cosine similarity. The index
//! is immutable: a changed document means a full rebuild.

use crate::error::{Error, Result};
use crate::retrieval::EmbeddingMatrix;

/// One search result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Cosine similarity in `[-1, 1]`
    pub score: f32,
    /// Row of the matched vector, equal to its chunk position
    pub position: usize,
}

/// Return `v / |v|`, or `None` when the norm is zero or not finite
pub fn l2_normalize(v: &[f32]) -> Option<Vec<f32>> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    Some(v.iter().map(|x| x / norm).collect())
}

/// Flat (brute force) inner-product index
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIpIndex {
    dimensions: usize,
    vectors: Vec<f32>,
}

impl FlatIpIndex {
    /// Normalize every row of `matrix` into a new index
    ///
    /// `expected_count` is the number of chunks the matrix must describe; any
    /// difference is fatal rather than truncated.
    pub fn build(matrix: &EmbeddingMatrix, expected_count: usize) -> Result<Self> {
        if matrix.rows() != expected_count {
            return Err(Error::CountMismatch {
                chunks: expected_count,
                vectors: matrix.rows(),
            });
        }

        let dimensions = matrix.dimensions();
        let mut vectors = Vec::with_capacity(matrix.as_slice().len());
        for (position, row) in matrix.iter_rows().enumerate() {
            let normalized = l2_normalize(row).ok_or(Error::DegenerateVector(position))?;
            vectors.extend(normalized);
        }

        tracing::debug!("Built flat index: {} vectors of dimension {}", expected_count, dimensions);
        Ok(Self { dimensions, vectors })
    }

    /// Wrap vectors that are already normalized, such as a loaded index file
    pub fn from_normalized(dimensions: usize, vectors: Vec<f32>) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::config("index dimension must be greater than 0"));
        }
        if vectors.len() % dimensions != 0 {
            return Err(Error::config(format!(
                "index buffer of {} values is not a whole number of {}-dimensional vectors",
                vectors.len(),
                dimensions
            )));
        }
        Ok(Self { dimensions, vectors })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.vectors.len() / self.dimensions
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Stored (normalized) vectors, row-major
    pub fn vectors(&self) -> &[f32] {
        &self.vectors
    }

    /// Exact top-k search
    ///
    /// Hits are ordered by descending score, ties by ascending position. `k`
    /// is clamped to `[1, len]`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }
        let query = l2_normalize(query).ok_or(Error::DegenerateQuery)?;

        if self.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = self
            .vectors
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(position, v)| SearchHit {
                score: v.iter().zip(&query).map(|(a, b)| a * b).sum(),
                position,
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.position.cmp(&b.position))
        });
        hits.truncate(k.clamp(1, self.len()));

        Ok(hits)
    }
}
