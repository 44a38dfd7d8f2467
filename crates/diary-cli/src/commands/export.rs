use std::path::Path;

use diary_core::export::render_entries_export;

use crate::cli::ExportFormat;
use crate::commands::common::open_database;
use crate::error::CliError;

pub async fn run_export(
    format: ExportFormat,
    output_path: Option<&Path>,
    db_path: &Path,
) -> Result<(), CliError> {
    let entries = open_database(db_path)?.list_all_entries().await?;
    let rendered = render_entries_export(&entries, format.into())?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}
