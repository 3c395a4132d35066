use super::{embedding::Embedding, encoder::TextEncoder};
use crate::error::{AppError, Result};
use crate::models::BookRecord;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Text used to embed a book: title, authors, description, categories,
/// publisher and page count, blank parts skipped.
pub fn book_text(book: &BookRecord) -> String {
    let page_count = book.page_count.map(|n| n.to_string()).unwrap_or_default();
    let parts = [
        book.title.trim().to_string(),
        book.authors.join(", "),
        book.description.trim().to_string(),
        book.categories.join(" "),
        book.publisher.trim().to_string(),
        page_count,
    ];

    parts
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wraps a [`TextEncoder`] and produces unit-length book embeddings.
#[derive(Clone)]
pub struct EmbeddingAdapter {
    encoder: Arc<dyn TextEncoder>,
    timeout: Duration,
}

impl EmbeddingAdapter {
    pub fn new(encoder: Arc<dyn TextEncoder>, timeout: Duration) -> Self {
        Self { encoder, timeout }
    }

    pub fn dimension(&self) -> usize {
        self.encoder.dimension()
    }

    pub async fn embed(&self, book: &BookRecord) -> Result<Embedding> {
        let text = book_text(book);
        debug!("Embedding '{}' ({} chars)", book.title, text.len());

        let raw = tokio::time::timeout(self.timeout, self.encoder.encode(&text))
            .await
            .map_err(|_| {
                AppError::UpstreamTimeout(format!(
                    "encoder did not answer within {}s",
                    self.timeout.as_secs()
                ))
            })??;

        Embedding::from_raw(raw)
    }
}
