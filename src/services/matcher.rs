use super::book_api::MetadataLookup;
use super::favorites_store::FavoritesRepository;
use super::genre_classifier::GenreClassifier;
use super::profile::build_profile;
use super::similarity::{rank_similar, similarity, Verdict, STRONG_MATCH_THRESHOLD};
use crate::error::{AppError, Result};
use crate::ml::{book_text, Embedding, EmbeddingAdapter};
use crate::models::{
    AddedFavorite, BookPreview, BookRecord, FavoritesOverview, Isbn, MatchResult,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Number of favorites suggested when a book is not a strong match.
pub const ALTERNATIVES_TOP_K: usize = 3;

/// Encoder calls in flight at once while backfilling a genre.
const BACKFILL_CONCURRENCY: usize = 4;

/// Session-scoped embedding cache.
///
/// Entries are keyed by canonical ISBN together with the exact text that was
/// embedded, so a record that changes under the same ISBN misses the cache.
/// Favorites are re-read and profiles rebuilt on every evaluation.
#[derive(Default)]
pub struct EmbeddingCache {
    entries: RwLock<HashMap<(Isbn, String), Embedding>>,
}

impl EmbeddingCache {
    pub fn get(&self, book: &BookRecord) -> Option<Embedding> {
        let key = (book.isbn.clone(), book_text(book));
        self.entries.read().ok()?.get(&key).cloned()
    }

    pub fn insert(&self, book: &BookRecord, embedding: Embedding) {
        if book.isbn.is_empty() {
            return;
        }
        if let Ok(mut entries) = self.entries.write() {
            entries.insert((book.isbn.clone(), book_text(book)), embedding);
        }
    }

    /// Drops every entry for `isbn`, whatever text it was embedded from.
    pub fn evict(&self, isbn: &Isbn) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|(cached, _), _| cached != isbn);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
            info!("Embedding cache cleared");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Matches books against the user's per-genre taste profiles.
pub struct MatchOrchestrator {
    lookup: Arc<dyn MetadataLookup>,
    adapter: EmbeddingAdapter,
    store: Arc<dyn FavoritesRepository>,
    classifier: GenreClassifier,
    cache: EmbeddingCache,
}

impl MatchOrchestrator {
    pub fn new(
        lookup: Arc<dyn MetadataLookup>,
        adapter: EmbeddingAdapter,
        store: Arc<dyn FavoritesRepository>,
    ) -> Self {
        Self {
            lookup,
            adapter,
            store,
            classifier: GenreClassifier::new(),
            cache: EmbeddingCache::default(),
        }
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    async fn fetch(&self, raw_isbn: &str) -> Result<BookRecord> {
        let isbn = Isbn::new(raw_isbn);
        if isbn.is_empty() {
            return Err(AppError::NotFound(format!("no book for ISBN '{}'", raw_isbn)));
        }

        self.lookup
            .lookup(&isbn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no book for ISBN {}", isbn)))
    }

    /// Looks a book up and reports the genre it would be filed under.
    pub async fn inspect(&self, raw_isbn: &str) -> Result<BookPreview> {
        let book = self.fetch(raw_isbn).await?;
        let genre = self.classifier.detect_genre(&book.categories).to_string();
        Ok(BookPreview { book, genre })
    }

    /// Adds a looked-up book to favorites under `genre`, or its detected genre.
    pub async fn add_favorite(&self, raw_isbn: &str, genre: Option<&str>) -> Result<AddedFavorite> {
        let book = self.fetch(raw_isbn).await?;
        let genre = match genre.map(str::trim).filter(|g| !g.is_empty()) {
            Some(genre) => genre.to_string(),
            None => self.classifier.detect_genre(&book.categories).to_string(),
        };

        if !self.store.add_book(&genre, book.clone())? {
            return Err(AppError::AlreadyExists(format!(
                "ISBN {} is already in your {} favorites",
                book.isbn, genre
            )));
        }
        self.cache.evict(&book.isbn);

        let books_in_genre = self
            .store
            .load()
            .genre(&genre)
            .map_or(0, |books| books.len());
        info!(
            "Added '{}' to {} favorites ({} books)",
            book.title, genre, books_in_genre
        );

        Ok(AddedFavorite {
            book,
            genre,
            books_in_genre,
        })
    }

    pub fn remove_favorite(&self, genre: &str, raw_isbn: &str) -> Result<()> {
        let isbn = Isbn::new(raw_isbn);
        if !self.store.remove_book(genre, &isbn)? {
            return Err(AppError::NotFound(format!(
                "ISBN {} is not in your {} favorites",
                isbn, genre
            )));
        }
        self.cache.evict(&isbn);
        info!("Removed ISBN {} from {} favorites", isbn, genre);
        Ok(())
    }

    pub fn overview(&self) -> FavoritesOverview {
        self.store.load().into()
    }

    pub fn clear_favorites(&self) -> Result<()> {
        self.store.clear()?;
        self.cache.clear();
        info!("All favorites cleared");
        Ok(())
    }

    /// Computes embeddings for every book that lacks one. Idempotent.
    pub async fn backfill(&self, books: &mut [BookRecord]) -> Result<()> {
        for book in books.iter_mut().filter(|book| !book.has_embedding()) {
            book.embedding = self.cache.get(book);
        }

        let missing: Vec<usize> = books
            .iter()
            .enumerate()
            .filter(|(_, book)| !book.has_embedding())
            .map(|(index, _)| index)
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        debug!("Backfilling {} embeddings", missing.len());
        let embeddings: Vec<Embedding> = {
            let snapshot = &*books;
            stream::iter(missing.iter().map(|&index| self.adapter.embed(&snapshot[index])))
                .buffered(BACKFILL_CONCURRENCY)
                .try_collect()
                .await?
        };

        for (index, embedding) in missing.into_iter().zip(embeddings) {
            self.cache.insert(&books[index], embedding.clone());
            books[index].embedding = Some(embedding);
        }
        Ok(())
    }

    /// Scores a book against the taste profile of its detected genre.
    ///
    /// Fails with `NotFound` when no provider knows the ISBN and with
    /// `NoProfile` when the genre has no favorites yet. Alternatives are only
    /// ranked when the score falls short of a strong match.
    pub async fn evaluate(&self, raw_isbn: &str) -> Result<MatchResult> {
        let mut book = self.fetch(raw_isbn).await?;
        let genre = self.classifier.detect_genre(&book.categories).to_string();

        let embedding = self.adapter.embed(&book).await?;
        book.embedding = Some(embedding.clone());

        let mut favorites = self
            .store
            .load()
            .take_genre(&genre)
            .filter(|books| !books.is_empty())
            .ok_or_else(|| AppError::NoProfile {
                genre: genre.clone(),
            })?;

        self.backfill(&mut favorites).await?;

        let profile = build_profile(&favorites)?.ok_or_else(|| AppError::NoProfile {
            genre: genre.clone(),
        })?;

        let score = similarity(&embedding, &profile);
        let verdict = Verdict::from_score(score);
        info!(
            "'{}' vs {} profile ({} books): {:.3} ({})",
            book.title,
            genre,
            favorites.len(),
            score,
            verdict.label()
        );

        let alternatives = if score < STRONG_MATCH_THRESHOLD {
            rank_similar(&embedding, &favorites, ALTERNATIVES_TOP_K)
        } else {
            Vec::new()
        };

        Ok(MatchResult {
            book,
            genre,
            score,
            verdict,
            alternatives,
        })
    }
}
