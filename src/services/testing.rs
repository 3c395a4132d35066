use super::book_api::MetadataLookup;
use super::favorites_store::JsonFavoritesStore;
use super::matcher::MatchOrchestrator;
use crate::error::Result;
use crate::ml::{EmbeddingAdapter, HashingEncoder};
use crate::models::{BookRecord, Isbn};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// In-memory metadata lookup keyed by canonical ISBN.
pub struct StaticLookup {
    books: HashMap<Isbn, BookRecord>,
}

impl StaticLookup {
    pub fn new(books: impl IntoIterator<Item = BookRecord>) -> Self {
        Self {
            books: books
                .into_iter()
                .map(|book| (book.isbn.clone(), book))
                .collect(),
        }
    }
}

#[async_trait]
impl MetadataLookup for StaticLookup {
    async fn lookup(&self, isbn: &Isbn) -> Result<Option<BookRecord>> {
        Ok(self.books.get(isbn).cloned())
    }
}

/// Orchestrator over a static catalog, the hashing encoder and a JSON store in `dir`.
pub fn orchestrator(dir: &Path, books: impl IntoIterator<Item = BookRecord>) -> MatchOrchestrator {
    let adapter = EmbeddingAdapter::new(Arc::new(HashingEncoder::new(384)), Duration::from_secs(5));
    MatchOrchestrator::new(
        Arc::new(StaticLookup::new(books)),
        adapter,
        Arc::new(JsonFavoritesStore::new(dir.join("favorites.json"))),
    )
}
