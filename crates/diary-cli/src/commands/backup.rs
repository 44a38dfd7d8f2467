use std::path::Path;

use crate::commands::common::open_database;
use crate::error::CliError;

/// Write `backupdiary<YYYYMMDD>.csv` for the current local date.
///
/// Exits nonzero on any failure; the web server reports the outcome from the
/// exit status alone.
pub async fn run_backup(output_dir: &Path, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let today = chrono::Local::now().date_naive();
    let path = db.write_backup(output_dir, today).await?;
    println!("{}", path.display());
    Ok(())
}
