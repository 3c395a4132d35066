use super::book::{BookRecord, Isbn};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Favorite books grouped by genre, in insertion order.
///
/// A genre key exists only while it holds at least one book: removing the last
/// book of a genre deletes the genre.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites(IndexMap<String, Vec<BookRecord>>);

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn genre(&self, genre: &str) -> Option<&[BookRecord]> {
        self.0.get(genre).map(Vec::as_slice)
    }

    /// Takes a genre's books out of this snapshot.
    pub fn take_genre(&mut self, genre: &str) -> Option<Vec<BookRecord>> {
        self.0.shift_remove(genre)
    }

    pub fn contains(&self, genre: &str, isbn: &Isbn) -> bool {
        self.0
            .get(genre)
            .map_or(false, |books| books.iter().any(|book| &book.isbn == isbn))
    }

    /// Appends `book` to `genre`. Returns `false` if the genre already holds the ISBN.
    pub fn insert(&mut self, genre: &str, book: BookRecord) -> bool {
        if !book.isbn.is_empty() && self.contains(genre, &book.isbn) {
            return false;
        }
        self.0.entry(genre.to_string()).or_default().push(book);
        true
    }

    /// Removes the book with `isbn` from `genre`, dropping the genre once empty.
    pub fn remove(&mut self, genre: &str, isbn: &Isbn) -> bool {
        let Some(books) = self.0.get_mut(genre) else {
            return false;
        };

        let before = books.len();
        books.retain(|book| &book.isbn != isbn);
        let removed = books.len() != before;

        if books.is_empty() {
            self.0.shift_remove(genre);
        }
        removed
    }

    pub fn total_books(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn genre_count(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<BookRecord>)> {
        self.0.iter()
    }
}
