use serde::{Deserialize, Serialize};

pub use book::{BookRecord, Isbn};
pub use favorites::Favorites;

pub(crate) mod book;
mod favorites;

use crate::services::similarity::Verdict;

/// A looked-up book together with the genre it classifies into.
#[derive(Debug, Clone, Serialize)]
pub struct BookPreview {
    pub book: BookRecord,
    pub genre: String,
}

/// A favorite ranked against the evaluated book.
#[derive(Debug, Clone, Serialize)]
pub struct Alternative {
    pub book: BookRecord,
    pub score: f32,
}

/// Outcome of matching a book against the user's taste profile for its genre.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub book: BookRecord,
    pub genre: String,
    pub score: f32,
    pub verdict: Verdict,
    /// Closest favorites in the same genre; empty on a strong match.
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddFavoriteRequest {
    pub isbn: String,
    /// Overrides the detected genre when present.
    #[serde(default)]
    pub genre: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddedFavorite {
    pub book: BookRecord,
    pub genre: String,
    pub books_in_genre: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoritesOverview {
    pub total_books: usize,
    pub total_genres: usize,
    pub favorites: Favorites,
}

impl From<Favorites> for FavoritesOverview {
    fn from(favorites: Favorites) -> Self {
        Self {
            total_books: favorites.total_books(),
            total_genres: favorites.genre_count(),
            favorites,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
