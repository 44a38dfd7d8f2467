use std::path::Path;

use diary_core::services::DiaryService;
use diary_core::{DiaryEntry, Page, PageRequest};
use serde::Serialize;

use crate::commands::common::{
    entry_to_list_item, format_entry_lines, normalize_owner, open_database, EntryListItem,
};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ListOutput {
    page: usize,
    num_pages: usize,
    entries: Vec<EntryListItem>,
}

pub async fn run_list(
    owner: &str,
    page: Option<&str>,
    page_size: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let diary = DiaryService::new(open_database(db_path)?).with_page_size(page_size);
    let page = list_page(&diary, owner, page).await?;

    if as_json {
        let output = ListOutput {
            page: page.number(),
            num_pages: page.num_pages(),
            entries: page.items.iter().map(entry_to_list_item).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in format_entry_lines(&page.items) {
            println!("{line}");
        }
        println!("Page {} of {}", page.number(), page.num_pages());
    }

    Ok(())
}

pub async fn list_page(
    diary: &DiaryService,
    owner: &str,
    page: Option<&str>,
) -> Result<Page<DiaryEntry>, CliError> {
    let owner = normalize_owner(owner)?;
    let request = PageRequest::parse(page)?;
    Ok(diary.list_for_user(&owner, request).await?)
}
