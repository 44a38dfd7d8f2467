//! Shared database service wrapper used by the web server and CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::db::{Database, EntryRepository, SqliteEntryRepository};
use crate::models::{DiaryEntry, EntryId, EntryPatch, NewEntry};
use crate::Result;

/// Thread-safe service for DB and repository operations.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path)?;
        tracing::info!("Using diary database at {}", db_path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Path of the backing file, if any
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// List one owner's entries newest-first.
    pub async fn list_entries_by_owner(
        &self,
        owner_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DiaryEntry>> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.list_by_owner(owner_id, limit, offset)
    }

    /// Count one owner's entries.
    pub async fn count_entries_by_owner(&self, owner_id: &str) -> Result<usize> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.count_by_owner(owner_id)
    }

    /// Fetch an entry by id.
    pub async fn get_entry(&self, id: &EntryId) -> Result<DiaryEntry> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.get(id)
    }

    /// Create a new entry.
    pub async fn create_entry(&self, entry: &NewEntry) -> Result<DiaryEntry> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.create(entry)
    }

    /// Apply a partial update to an entry.
    pub async fn update_entry(&self, id: &EntryId, patch: &EntryPatch) -> Result<DiaryEntry> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.update(id, patch)
    }

    /// Permanently delete an entry.
    pub async fn delete_entry(&self, id: &EntryId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.delete(id)
    }

    /// Every entry, oldest first.
    pub async fn list_all_entries(&self) -> Result<Vec<DiaryEntry>> {
        let db = self.db.lock().await;
        crate::backup::load_all_entries(&db)
    }

    /// Write the dated CSV backup into `output_dir`.
    pub async fn write_backup(&self, output_dir: &Path, date: NaiveDate) -> Result<PathBuf> {
        let db = self.db.lock().await;
        crate::backup::write_backup(&db, output_dir, date)
    }
}
