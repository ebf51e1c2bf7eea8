// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-local "My List", persisted to durable local storage.
//!
//! This is distinct from the durable `Profile.my_list` mirror in Firestore:
//! it survives restarts on this device whether or not anyone is signed in.
//! Membership is by catalog item ID, toggle is the only mutator, and every
//! toggle writes through to storage.

use crate::error::AppError;
use crate::models::Movie;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Storage key for the persisted list.
pub const WATCHLIST_KEY: &str = "my-list";

/// Single-key-value durable storage. No transactions.
pub trait StorageBackend {
    /// Read the value at `key`; `Ok(None)` if it was never written.
    fn read_text(&self, key: &str) -> Result<Option<String>, AppError>;
    /// Write the value at `key`, replacing any prior value.
    fn write_text(&self, key: &str, value: &str) -> Result<(), AppError>;
}

/// The client-local watchlist.
pub struct Watchlist<S> {
    storage: S,
    items: Vec<Movie>,
}

impl<S: StorageBackend> Watchlist<S> {
    /// Load the persisted list, or start empty.
    ///
    /// Absent and malformed persisted data are both treated as an empty
    /// list; a corrupt file must never take the app down.
    pub fn load(storage: S) -> Self {
        let items = match storage.read_text(WATCHLIST_KEY) {
            Ok(Some(text)) => match serde_json::from_str(&text) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed watchlist data, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read watchlist, starting empty");
                Vec::new()
            }
        };

        tracing::debug!(count = items.len(), "Watchlist loaded");
        Self { storage, items }
    }

    /// Current items, in list order.
    pub fn items(&self) -> &[Movie] {
        &self.items
    }

    /// Whether an item with this ID is on the list.
    pub fn contains(&self, item_id: u64) -> bool {
        self.items.iter().any(|m| m.id == item_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add the item if absent, remove it if present (by ID), then persist.
    ///
    /// Note that removing and re-adding an item appends it at the end; the
    /// original position is not preserved across a remove/re-add cycle.
    pub fn toggle(&mut self, item: Movie) -> Result<&[Movie], AppError> {
        if self.contains(item.id) {
            self.items.retain(|m| m.id != item.id);
        } else {
            self.items.push(item);
        }
        self.persist()?;
        Ok(&self.items)
    }

    /// Write the full list through to storage.
    fn persist(&self) -> Result<(), AppError> {
        let text = serde_json::to_string(&self.items)
            .map_err(|e| AppError::Storage(format!("Failed to serialize watchlist: {}", e)))?;
        self.storage.write_text(WATCHLIST_KEY, &text)
    }
}

/// File-backed storage: one JSON file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileStorage {
    fn read_text(&self, key: &str) -> Result<Option<String>, AppError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!("Failed to read {}: {}", key, e))),
        }
    }

    fn write_text(&self, key: &str, value: &str) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| AppError::Storage(format!("Failed to create data dir: {}", e)))?;
        std::fs::write(self.path_for(key), value)
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", key, e)))
    }
}

/// In-memory storage for tests and ephemeral embeddings.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    cells: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key directly (for tests simulating pre-existing data).
    pub fn seed(&self, key: &str, value: &str) {
        self.cells
            .lock()
            .expect("storage lock poisoned")
            .insert(key.to_string(), value.to_string());
    }
}

impl StorageBackend for MemoryStorage {
    fn read_text(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .cells
            .lock()
            .expect("storage lock poisoned")
            .get(key)
            .cloned())
    }

    fn write_text(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.cells
            .lock()
            .expect("storage lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: StorageBackend> StorageBackend for &S {
    fn read_text(&self, key: &str) -> Result<Option<String>, AppError> {
        (**self).read_text(key)
    }

    fn write_text(&self, key: &str, value: &str) -> Result<(), AppError> {
        (**self).write_text(key, value)
    }
}
