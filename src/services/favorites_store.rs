use crate::error::{AppError, Result};
use crate::models::{BookRecord, Favorites, Isbn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Keyed collection of favorite books, grouped by genre.
pub trait FavoritesRepository: Send + Sync {
    /// Current favorites; an unreadable store reads as empty.
    fn load(&self) -> Favorites {
        self.try_load().unwrap_or_else(|e| {
            warn!("Error loading favorites, treating store as empty: {}", e);
            Favorites::new()
        })
    }

    fn try_load(&self) -> Result<Favorites>;

    fn save(&self, favorites: &Favorites) -> Result<()>;

    /// Returns `false` if the genre already holds a book with the same ISBN.
    fn add_book(&self, genre: &str, book: BookRecord) -> Result<bool>;

    /// Returns `false` if nothing matched. A genre left empty is deleted.
    fn remove_book(&self, genre: &str, isbn: &Isbn) -> Result<bool>;

    fn clear(&self) -> Result<()>;
}

/// Favorites persisted as one pretty-printed JSON document.
///
/// Mutations run load-modify-save under a mutex so concurrent requests in the
/// same process never interleave their writes.
pub struct JsonFavoritesStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Favorites stored at {}", path.display());
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| AppError::StoreIo("favorites lock poisoned".to_string()))
    }

    fn io_error(&self, err: std::io::Error) -> AppError {
        AppError::StoreIo(format!("{}: {}", self.path.display(), err))
    }

    fn read(&self) -> Result<Favorites> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Favorites::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                AppError::StoreIo(format!("corrupt favorites file {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Favorites::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write(&self, favorites: &Favorites) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(favorites)?;
        fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        debug!(
            "Saved {} favorites in {} genres",
            favorites.total_books(),
            favorites.genre_count()
        );
        Ok(())
    }
}

impl FavoritesRepository for JsonFavoritesStore {
    fn try_load(&self) -> Result<Favorites> {
        self.read()
    }

    fn save(&self, favorites: &Favorites) -> Result<()> {
        let _guard = self.lock()?;
        self.write(favorites)
    }

    fn add_book(&self, genre: &str, book: BookRecord) -> Result<bool> {
        let _guard = self.lock()?;
        let mut favorites = self.read()?;

        let isbn = book.isbn.clone();
        if !favorites.insert(genre, book) {
            info!("Book with ISBN {} already in favorites for {}", isbn, genre);
            return Ok(false);
        }

        self.write(&favorites)?;
        Ok(true)
    }

    fn remove_book(&self, genre: &str, isbn: &Isbn) -> Result<bool> {
        let _guard = self.lock()?;
        let mut favorites = self.read()?;

        if !favorites.remove(genre, isbn) {
            return Ok(false);
        }

        self.write(&favorites)?;
        Ok(true)
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock()?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
