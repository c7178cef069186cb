//! Dense row-major embedding matrix

use crate::error::{Error, Result};

/// `rows x dimensions` matrix of `f32`, row `i` belonging to chunk `i`
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    data: Vec<f32>,
    dimensions: usize,
}

impl EmbeddingMatrix {
    /// Create an empty matrix whose rows will have `dimensions` columns
    pub fn with_dimensions(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::config("embedding dimension must be greater than 0"));
        }
        Ok(Self {
            data: Vec::new(),
            dimensions,
        })
    }

    /// Build from row vectors that must all have `dimensions` columns
    pub fn from_rows(rows: &[Vec<f32>], dimensions: usize) -> Result<Self> {
        let mut matrix = Self::with_dimensions(dimensions)?;
        matrix.data.reserve(rows.len() * dimensions);
        for row in rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    /// Build from a row-major buffer
    pub fn from_flat(data: Vec<f32>, dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::config("embedding dimension must be greater than 0"));
        }
        if data.len() % dimensions != 0 {
            return Err(Error::config(format!(
                "buffer of {} values is not a whole number of {}-dimensional rows",
                data.len(),
                dimensions
            )));
        }
        Ok(Self { data, dimensions })
    }

    /// Append one row
    pub fn push_row(&mut self, row: &[f32]) -> Result<()> {
        if row.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                got: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.data.len() / self.dimensions
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, i: usize) -> Option<&[f32]> {
        let start = i.checked_mul(self.dimensions)?;
        self.data.get(start..start + self.dimensions)
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimensions)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let matrix = EmbeddingMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]], 2).unwrap();
        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(matrix.row(2), None);
        assert_eq!(matrix.iter_rows().count(), 2);
    }

    #[test]
    fn test_row_width_checked() {
        let err = EmbeddingMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]], 2).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, got: 1 }));
    }

    #[test]
    fn test_ragged_flat_buffer_rejected() {
        assert!(EmbeddingMatrix::from_flat(vec![0.0; 5], 2).is_err());
        assert!(EmbeddingMatrix::with_dimensions(0).is_err());
    }
}
