//! Persisted watchlist, watch history and continue-watching lists
//!
//! Lists are stored as JSON arrays under fixed keys in a [`KeyValueStore`].
//! Unreadable or malformed data reads back as an empty list.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{CatalogItem, ListEntry};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode list: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Minimal string key/value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per key inside a directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Watchlist,
    History,
    ContinueWatching,
}

impl ListKind {
    pub fn key(&self) -> &'static str {
        match self {
            ListKind::Watchlist => "watchlist",
            ListKind::History => "watch-history",
            ListKind::ContinueWatching => "continue-watching",
        }
    }

    /// Maximum length, `None` for unbounded
    pub fn cap(&self) -> Option<usize> {
        match self {
            ListKind::Watchlist => None,
            ListKind::History => Some(50),
            ListKind::ContinueWatching => Some(10),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ListKind::Watchlist => "Watchlist",
            ListKind::History => "History",
            ListKind::ContinueWatching => "Continue Watching",
        }
    }

    /// Whether two entries occupy the same slot. Every list keeps one entry
    /// per title; a repeated play replaces the season and episode.
    fn same_slot(&self, a: &ListEntry, b: &ListEntry) -> bool {
        a.item.id == b.item.id
    }
}

/// Resume banner shows entries strictly inside this progress window
const RESUME_MIN_PROGRESS: f32 = 5.0;
const RESUME_MAX_PROGRESS: f32 = 95.0;

/// Current time in Unix milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// List operations over an injected store
pub struct PersistedLists<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> PersistedLists<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get(&self, kind: ListKind) -> Vec<ListEntry> {
        let Some(raw) = self.store.get(kind.key()) else {
            return Vec::new();
        };
        if raw.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Ignoring malformed {} data: {}", kind.key(), e);
                Vec::new()
            }
        }
    }

    pub fn set(&mut self, kind: ListKind, mut entries: Vec<ListEntry>) -> Result<()> {
        if let Some(cap) = kind.cap() {
            entries.truncate(cap);
        }
        let json = serde_json::to_string(&entries)?;
        self.store.set(kind.key(), json)
    }

    /// Insert at the front, replacing any entry in the same slot. Returns
    /// entries pushed out by the cap.
    pub fn append(&mut self, kind: ListKind, entry: ListEntry) -> Result<Vec<ListEntry>> {
        let mut entries = self.get(kind);
        entries.retain(|e| !kind.same_slot(e, &entry));
        entries.insert(0, entry);

        let evicted = match kind.cap() {
            Some(cap) if entries.len() > cap => entries.split_off(cap),
            _ => Vec::new(),
        };

        self.set(kind, entries)?;
        Ok(evicted)
    }

    /// Remove every entry for a title
    pub fn evict(&mut self, kind: ListKind, id: u64) -> Result<()> {
        let mut entries = self.get(kind);
        let before = entries.len();
        entries.retain(|e| e.item.id != id);
        if entries.len() != before {
            self.set(kind, entries)?;
        }
        Ok(())
    }

    pub fn clear(&mut self, kind: ListKind) -> Result<()> {
        self.store.remove(kind.key())
    }

    pub fn contains(&self, kind: ListKind, id: u64) -> bool {
        self.get(kind).iter().any(|e| e.item.id == id)
    }

    /// Add or remove from the watchlist; returns whether the item is now listed
    pub fn toggle_watchlist(&mut self, item: &CatalogItem) -> Result<bool> {
        if self.contains(ListKind::Watchlist, item.id) {
            self.evict(ListKind::Watchlist, item.id)?;
            Ok(false)
        } else {
            self.append(ListKind::Watchlist, ListEntry::new(item.clone(), now_millis()))?;
            Ok(true)
        }
    }

    /// Record a play in history and continue-watching
    pub fn record_play(
        &mut self,
        item: &CatalogItem,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Result<()> {
        let entry = ListEntry::new(item.clone(), now_millis()).with_episode(season, episode);
        self.append(ListKind::History, entry.clone())?;
        self.append(ListKind::ContinueWatching, entry)?;
        Ok(())
    }

    /// Update the watched percentage of a continue-watching entry
    pub fn set_progress(&mut self, id: u64, percent: f32) -> Result<bool> {
        let mut entries = self.get(ListKind::ContinueWatching);
        let Some(entry) = entries.iter_mut().find(|e| e.item.id == id) else {
            return Ok(false);
        };
        entry.progress = percent.clamp(0.0, 100.0);
        entry.added_at = now_millis();
        self.set(ListKind::ContinueWatching, entries)?;
        Ok(true)
    }

    /// Most recent partially watched entry
    pub fn resume_candidate(&self) -> Option<ListEntry> {
        self.get(ListKind::ContinueWatching)
            .into_iter()
            .max_by_key(|e| e.added_at)
            .filter(|e| e.progress > RESUME_MIN_PROGRESS && e.progress < RESUME_MAX_PROGRESS)
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
