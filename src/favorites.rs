//! Saved favorite recipes
//!
//! Favorites are a plain ordered list of recipe records in a JSON array file.
//! They never expire and are read directly, without going through the cache.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cache::{write_json_atomic, StorageError};
use crate::data::Recipe;

/// File-backed list of favorite recipes, keyed by recipe id
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    path: PathBuf,
}

impl FavoritesStore {
    /// Creates a store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the backing file as an empty list if it does not exist yet
    pub fn ensure_exists(&self) -> Result<(), StorageError> {
        if self.path.exists() {
            return Ok(());
        }
        self.save(&[])
    }

    /// All favorites in the order they were added
    pub fn list(&self) -> Result<Vec<Recipe>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.ensure_exists()?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        serde_json::from_str(&content).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Appends `recipe` unless a favorite with the same id exists
    ///
    /// Returns `false` when the recipe was already a favorite.
    pub fn add(&self, recipe: &Recipe) -> Result<bool, StorageError> {
        let mut favorites = self.list()?;
        if favorites.iter().any(|fav| fav.id == recipe.id) {
            return Ok(false);
        }
        favorites.push(recipe.clone());
        self.save(&favorites)?;
        debug!(id = %recipe.id, "added favorite");
        Ok(true)
    }

    /// Removes the favorite with `id`
    ///
    /// Returns `false` when no such favorite existed.
    pub fn remove(&self, id: &str) -> Result<bool, StorageError> {
        let mut favorites = self.list()?;
        let before = favorites.len();
        favorites.retain(|fav| fav.id != id);
        if favorites.len() == before {
            return Ok(false);
        }
        self.save(&favorites)?;
        debug!(id, "removed favorite");
        Ok(true)
    }

    /// Whether a recipe with `id` is a favorite
    pub fn contains(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.list()?.iter().any(|fav| fav.id == id))
    }

    /// The saved record for `id`, if any
    pub fn get(&self, id: &str) -> Result<Option<Recipe>, StorageError> {
        Ok(self.list()?.into_iter().find(|fav| fav.id == id))
    }

    fn save(&self, favorites: &[Recipe]) -> Result<(), StorageError> {
        write_json_atomic(&self.path, &serde_json::to_string_pretty(favorites)?)
    }
}
