pub mod book_api;
pub mod favorites_store;
pub mod genre_classifier;
pub mod matcher;
pub mod profile;
pub mod similarity;

#[cfg(test)]
pub(crate) mod testing;

// Re-export public types
pub use book_api::{
    BookProvider, FallbackLookup, GoogleBooksClient, MetadataLookup, OpenLibraryClient,
};
pub use favorites_store::{FavoritesRepository, JsonFavoritesStore};
pub use genre_classifier::{GenreClassifier, DEFAULT_GENRE};
pub use matcher::{EmbeddingCache, MatchOrchestrator};
pub use profile::build_profile;
pub use similarity::{rank_similar, similarity, verdict, Verdict};
