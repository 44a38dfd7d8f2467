//! Diary export helpers shared by the backup process and the CLI.

use serde::{Deserialize, Serialize};

use crate::DiaryEntry;

/// Export output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Csv,
}

/// Column order of CSV exports
pub const CSV_HEADER: [&str; 9] = [
    "id",
    "owner_id",
    "title",
    "content",
    "photo1",
    "photo2",
    "photo3",
    "created_at",
    "updated_at",
];

/// Serializable entry representation used in JSON exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub content: Option<String>,
    pub photos: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Convert an entry into an export record.
#[must_use]
pub fn entry_to_export_item(entry: &DiaryEntry) -> ExportEntry {
    ExportEntry {
        id: entry.id.to_string(),
        owner_id: entry.owner_id.clone(),
        title: entry.title.clone(),
        content: entry.content.clone(),
        photos: entry.attached_photos().map(str::to_string).collect(),
        created_at: entry.created_at,
        updated_at: entry.updated_at,
    }
}

/// Render entries as pretty-printed JSON.
pub fn render_json_export(entries: &[DiaryEntry]) -> serde_json::Result<String> {
    let items = entries
        .iter()
        .map(entry_to_export_item)
        .collect::<Vec<ExportEntry>>();
    serde_json::to_string_pretty(&items)
}

/// Render entries as CSV with a header row, CRLF line endings and
/// RFC 4180 quoting.
#[must_use]
pub fn render_csv_export(entries: &[DiaryEntry]) -> String {
    let mut output = String::new();
    push_csv_row(&mut output, CSV_HEADER.iter().copied());

    for entry in entries {
        let id = entry.id.to_string();
        let created_at = entry.created_at.to_string();
        let updated_at = entry.updated_at.to_string();
        let [photo1, photo2, photo3] = &entry.photos;
        push_csv_row(
            &mut output,
            [
                id.as_str(),
                entry.owner_id.as_str(),
                entry.title.as_str(),
                entry.content.as_deref().unwrap_or(""),
                photo1.as_deref().unwrap_or(""),
                photo2.as_deref().unwrap_or(""),
                photo3.as_deref().unwrap_or(""),
                created_at.as_str(),
                updated_at.as_str(),
            ]
            .into_iter(),
        );
    }

    output
}

/// Render entries based on selected export format.
pub fn render_entries_export(
    entries: &[DiaryEntry],
    format: ExportFormat,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(entries),
        ExportFormat::Csv => Ok(render_csv_export(entries)),
    }
}

fn push_csv_row<'a>(output: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (index, field) in fields.enumerate() {
        if index > 0 {
            output.push(',');
        }
        push_csv_field(output, field);
    }
    output.push_str("\r\n");
}

fn push_csv_field(output: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        output.push('"');
        output.push_str(&field.replace('"', "\"\""));
        output.push('"');
    } else {
        output.push_str(field);
    }
}
