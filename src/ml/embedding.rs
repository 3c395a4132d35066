use crate::error::{AppError, Result};
use ndarray::Array1;

/// A unit-length embedding vector.
///
/// The only way to build one is through normalization, so every `Embedding`
/// has Euclidean norm 1 and no NaN components.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Array1<f32>);

impl Embedding {
    pub fn from_raw(raw: Vec<f32>) -> Result<Self> {
        Self::normalize(Array1::from(raw))
    }

    /// Scales `vector` to unit length. Zero or non-finite norms are rejected.
    pub fn normalize(vector: Array1<f32>) -> Result<Self> {
        let norm = vector.dot(&vector).sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return Err(AppError::DegenerateVector);
        }
        Ok(Self(vector / norm))
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_array(&self) -> &Array1<f32> {
        &self.0
    }

    /// Dot product; `None` when the dimensions differ.
    pub fn dot(&self, other: &Embedding) -> Option<f32> {
        (self.dim() == other.dim()).then(|| self.0.dot(&other.0))
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }
}
