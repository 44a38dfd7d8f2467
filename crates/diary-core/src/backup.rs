//! Backup file naming and writing.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::db::{Database, EntryRepository, SqliteEntryRepository};
use crate::error::Result;
use crate::export::render_csv_export;
use crate::DiaryEntry;

const BATCH_SIZE: usize = 500;

/// Environment variable naming the database file, read by the server and the CLI
pub const DATABASE_PATH_ENV: &str = "DIARY_DATABASE_PATH";

/// Deterministic backup file name for a given day: `backupdiary<YYYYMMDD>.csv`
#[must_use]
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("backupdiary{}.csv", date.format("%Y%m%d"))
}

/// Backup file name for the current local date
#[must_use]
pub fn todays_backup_file_name() -> String {
    backup_file_name(chrono::Local::now().date_naive())
}

/// Read every entry from the database, oldest first
pub fn load_all_entries(db: &Database) -> Result<Vec<DiaryEntry>> {
    let repo = SqliteEntryRepository::new(db.connection());

    let mut entries = Vec::new();
    let mut offset = 0usize;

    loop {
        let batch = repo.list_all(BATCH_SIZE, offset)?;
        let count = batch.len();
        entries.extend(batch);

        if count < BATCH_SIZE {
            break;
        }
        offset += count;
    }

    Ok(entries)
}

/// Write a CSV backup of the whole diary into `output_dir` and return its path
pub fn write_backup(db: &Database, output_dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let entries = load_all_entries(db)?;
    let path = output_dir.join(backup_file_name(date));
    std::fs::write(&path, render_csv_export(&entries))?;
    tracing::info!(
        entries = entries.len(),
        path = %path.display(),
        "Wrote diary backup"
    );
    Ok(path)
}
