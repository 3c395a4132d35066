use crate::error::{AppError, Result};
use crate::ml::Embedding;
use crate::models::BookRecord;
use ndarray::Array1;

/// Builds a genre's taste profile: the unit-normalized mean of the embeddings
/// carried by `books`.
///
/// Returns `Ok(None)` when no book has an embedding. Fails with
/// [`AppError::DegenerateVector`] if the mean cancels out to zero and with
/// [`AppError::DimensionMismatch`] if the embeddings disagree on dimension.
pub fn build_profile(books: &[BookRecord]) -> Result<Option<Embedding>> {
    let mut embeddings = books.iter().filter_map(|book| book.embedding.as_ref());

    let Some(first) = embeddings.next() else {
        return Ok(None);
    };

    let dim = first.dim();
    let mut sum: Array1<f32> = first.as_array().clone();
    let mut count = 1usize;

    for embedding in embeddings {
        if embedding.dim() != dim {
            return Err(AppError::DimensionMismatch {
                expected: dim,
                got: embedding.dim(),
            });
        }
        sum += embedding.as_array();
        count += 1;
    }

    let mean = sum / count as f32;
    Embedding::normalize(mean).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_embedding(raw: &[f32]) -> BookRecord {
        BookRecord {
            embedding: Some(Embedding::from_raw(raw.to_vec()).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_input_is_absent() {
        assert!(build_profile(&[]).unwrap().is_none());
    }

    #[test]
    fn test_books_without_embeddings_are_absent() {
        let books = vec![BookRecord::default(), BookRecord::default()];
        assert!(build_profile(&books).unwrap().is_none());
    }

    #[test]
    fn test_duplicates_return_same_embedding() {
        let book = with_embedding(&[0.2, -0.4, 0.9, 0.1]);
        let books = vec![book.clone(), book.clone(), book.clone()];
        let profile = build_profile(&books).unwrap().unwrap();
        let original = book.embedding.unwrap();
        for (a, b) in profile.to_vec().iter().zip(original.to_vec()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_mean_is_normalized() {
        let books = vec![with_embedding(&[1.0, 0.0]), with_embedding(&[0.0, 1.0])];
        let profile = build_profile(&books).unwrap().unwrap();
        let expected = std::f32::consts::FRAC_1_SQRT_2;
        assert!((profile.to_vec()[0] - expected).abs() < 1e-6);
        assert!((profile.to_vec()[1] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_books_without_embedding_are_ignored() {
        let books = vec![
            with_embedding(&[1.0, 0.0]),
            BookRecord::default(),
            with_embedding(&[1.0, 0.0]),
        ];
        let profile = build_profile(&books).unwrap().unwrap();
        assert_eq!(profile.to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_canceling_embeddings_are_degenerate() {
        let books = vec![with_embedding(&[1.0, 0.0]), with_embedding(&[-1.0, 0.0])];
        assert!(matches!(
            build_profile(&books),
            Err(AppError::DegenerateVector)
        ));
    }

    #[test]
    fn test_mixed_dimensions_are_rejected() {
        let books = vec![with_embedding(&[1.0, 0.0]), with_embedding(&[1.0, 0.0, 0.0])];
        assert!(matches!(
            build_profile(&books),
            Err(AppError::DimensionMismatch { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let books = vec![with_embedding(&[3.0, 4.0]), BookRecord::default()];
        let before = books.clone();
        let _ = build_profile(&books).unwrap();
        assert_eq!(books, before);
        assert!(books[1].embedding.is_none());
    }
}
