//! Diary entry repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use crate::error::{Error, Result};
use crate::models::{DiaryEntry, EntryId, EntryPatch, NewEntry};
use crate::util::unix_millis_now;
use rusqlite::{params, Connection};

const ENTRY_COLUMNS: &str =
    "id, owner_id, title, content, photo1, photo2, photo3, created_at, updated_at";

/// Trait for diary entry storage operations
pub trait EntryRepository {
    /// Store a new entry, assigning its id and timestamps
    fn create(&self, entry: &NewEntry) -> Result<DiaryEntry>;

    /// Get an entry by ID, regardless of owner
    fn get(&self, id: &EntryId) -> Result<DiaryEntry>;

    /// List one owner's entries, newest first
    fn list_by_owner(&self, owner_id: &str, limit: usize, offset: usize)
        -> Result<Vec<DiaryEntry>>;

    /// Count one owner's entries
    fn count_by_owner(&self, owner_id: &str) -> Result<usize>;

    /// List every entry, oldest first
    fn list_all(&self, limit: usize, offset: usize) -> Result<Vec<DiaryEntry>>;

    /// Apply a partial update and refresh `updated_at`
    fn update(&self, id: &EntryId, patch: &EntryPatch) -> Result<DiaryEntry>;

    /// Permanently remove an entry
    fn delete(&self, id: &EntryId) -> Result<()>;
}

/// `SQLite` implementation of `EntryRepository`
pub struct SqliteEntryRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteEntryRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse an entry from a database row
    fn parse_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<DiaryEntry> {
        let id: String = row.get(0)?;
        let id = id.parse().map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(error))
        })?;
        Ok(DiaryEntry {
            id,
            owner_id: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            photos: [row.get(4)?, row.get(5)?, row.get(6)?],
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn query_entries(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<DiaryEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let entries = stmt
            .query_map(params, Self::parse_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn create(&self, entry: &NewEntry) -> Result<DiaryEntry> {
        let now = unix_millis_now();
        let stored = DiaryEntry {
            id: EntryId::new(),
            owner_id: entry.owner_id.clone(),
            title: entry.title.clone(),
            content: entry.content.clone(),
            photos: entry.photos.clone(),
            created_at: now,
            updated_at: now,
        };

        let [photo1, photo2, photo3] = &stored.photos;
        self.conn.execute(
            "INSERT INTO diary_entries (id, owner_id, title, content, photo1, photo2, photo3, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                stored.id.as_str(),
                stored.owner_id,
                stored.title,
                stored.content,
                photo1,
                photo2,
                photo3,
                stored.created_at,
                stored.updated_at,
            ],
        )?;

        Ok(stored)
    }

    fn get(&self, id: &EntryId) -> Result<DiaryEntry> {
        let result = self.conn.query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM diary_entries WHERE id = ?"),
            params![id.as_str()],
            Self::parse_entry,
        );

        match result {
            Ok(entry) => Ok(entry),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn list_by_owner(
        &self,
        owner_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DiaryEntry>> {
        self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS}
                 FROM diary_entries
                 WHERE owner_id = ?
                 ORDER BY created_at DESC, id DESC
                 LIMIT ? OFFSET ?"
            ),
            params![owner_id, limit as i64, offset as i64],
        )
    }

    fn count_by_owner(&self, owner_id: &str) -> Result<usize> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM diary_entries WHERE owner_id = ?",
            params![owner_id],
            |row| row.get::<_, usize>(0),
        )?;
        Ok(count)
    }

    fn list_all(&self, limit: usize, offset: usize) -> Result<Vec<DiaryEntry>> {
        self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS}
                 FROM diary_entries
                 ORDER BY created_at ASC, id ASC
                 LIMIT ? OFFSET ?"
            ),
            params![limit as i64, offset as i64],
        )
    }

    fn update(&self, id: &EntryId, patch: &EntryPatch) -> Result<DiaryEntry> {
        let current = self.get(id)?;
        let now = unix_millis_now();

        let title = patch.title.as_ref().unwrap_or(&current.title);
        let content = patch.content.as_ref().unwrap_or(&current.content);
        let [photo1, photo2, photo3] = [0, 1, 2].map(|slot| {
            patch.photos[slot]
                .as_ref()
                .unwrap_or(&current.photos[slot])
        });

        // MAX keeps created_at <= updated_at even if the clock steps back
        let rows = self.conn.execute(
            "UPDATE diary_entries
             SET title = ?, content = ?, photo1 = ?, photo2 = ?, photo3 = ?,
                 updated_at = MAX(?, updated_at)
             WHERE id = ?",
            params![title, content, photo1, photo2, photo3, now, id.as_str()],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        self.get(id)
    }

    fn delete(&self, id: &EntryId) -> Result<()> {
        let rows = self.conn.execute(
            "DELETE FROM diary_entries WHERE id = ?",
            params![id.as_str()],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        Ok(())
    }
}
