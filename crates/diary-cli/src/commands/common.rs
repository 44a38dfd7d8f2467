use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use diary_core::backup::DATABASE_PATH_ENV;
use diary_core::services::DatabaseService;
use diary_core::DiaryEntry;
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct EntryListItem {
    pub id: String,
    pub title: String,
    pub content: Option<String>,
    pub photos: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

pub fn entry_to_list_item(entry: &DiaryEntry) -> EntryListItem {
    EntryListItem {
        id: entry.id.to_string(),
        title: entry.title.clone(),
        content: entry.content.clone(),
        photos: entry.attached_photos().map(str::to_string).collect(),
        created_at: entry.created_at,
        updated_at: entry.updated_at,
    }
}

pub fn format_entry_lines(entries: &[DiaryEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            format!(
                "{}  {}  {}",
                short_id(&entry.id.to_string()),
                format_timestamp(entry.created_at),
                entry.title
            )
        })
        .collect()
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}

pub fn normalize_owner(owner: &str) -> Result<String, CliError> {
    let trimmed = owner.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyOwner);
    }
    Ok(trimmed.to_string())
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    resolve_db_path_from(cli_db_path, env::var_os(DATABASE_PATH_ENV))
}

pub fn resolve_db_path_from(cli_db_path: Option<PathBuf>, env_db_path: Option<OsString>) -> PathBuf {
    cli_db_path
        .or_else(|| env_db_path.filter(|value| !value.is_empty()).map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("diary")
        .join("diary.db")
}

pub fn open_database(path: &Path) -> Result<DatabaseService, CliError> {
    Ok(DatabaseService::open_path(path)?)
}
