//! Diary operations on behalf of an authenticated user.

use crate::error::{Error, Result};
use crate::forms::EntryForm;
use crate::models::{DiaryEntry, EntryId};
use crate::pagination::{Page, PageRequest, PageWindow, DEFAULT_PAGE_SIZE};

use super::DatabaseService;

/// Access rules for entries the user did not write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnerScope {
    /// Only the list is filtered by owner; any signed-in user may open,
    /// edit or delete an entry by id.
    #[default]
    ListOnly,
    /// Entries of other users behave as if they did not exist.
    AllOperations,
}

#[derive(Clone)]
pub struct DiaryService {
    db: DatabaseService,
    page_size: usize,
    owner_scope: OwnerScope,
}

impl DiaryService {
    pub const fn new(db: DatabaseService) -> Self {
        Self {
            db,
            page_size: DEFAULT_PAGE_SIZE,
            owner_scope: OwnerScope::ListOnly,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub const fn with_owner_scope(mut self, owner_scope: OwnerScope) -> Self {
        self.owner_scope = owner_scope;
        self
    }

    pub const fn database(&self) -> &DatabaseService {
        &self.db
    }

    /// The user's own entries, newest first, one page at a time
    pub async fn list_for_user(&self, user_id: &str, page: PageRequest) -> Result<Page<DiaryEntry>> {
        let total = self.db.count_entries_by_owner(user_id).await?;
        let window = PageWindow::resolve(page, self.page_size, total)?;
        let items = self
            .db
            .list_entries_by_owner(user_id, window.page_size, window.offset())
            .await?;
        Ok(Page { items, window })
    }

    /// Validate and store a new entry owned by `user_id`
    pub async fn create(&self, user_id: &str, form: &EntryForm) -> Result<DiaryEntry> {
        let valid = form.validate().map_err(Error::Validation)?;
        let entry = self
            .db
            .create_entry(&valid.into_new_entry(user_id))
            .await?;
        tracing::info!(entry = %entry.id, "Created diary entry");
        Ok(entry)
    }

    pub async fn get_detail(&self, id: &EntryId, user_id: &str) -> Result<DiaryEntry> {
        let entry = self.db.get_entry(id).await?;
        self.check_access(entry, user_id)
    }

    /// Existence is checked before the form is validated
    pub async fn update(&self, id: &EntryId, user_id: &str, form: &EntryForm) -> Result<DiaryEntry> {
        self.get_detail(id, user_id).await?;
        let valid = form.validate().map_err(Error::Validation)?;
        let entry = self.db.update_entry(id, &valid.into_patch()).await?;
        tracing::info!(entry = %entry.id, "Updated diary entry");
        Ok(entry)
    }

    pub async fn delete(&self, id: &EntryId, user_id: &str) -> Result<()> {
        self.get_detail(id, user_id).await?;
        self.db.delete_entry(id).await?;
        tracing::info!(entry = %id, "Deleted diary entry");
        Ok(())
    }

    fn check_access(&self, entry: DiaryEntry, user_id: &str) -> Result<DiaryEntry> {
        match self.owner_scope {
            OwnerScope::AllOperations if !entry.is_owned_by(user_id) => {
                Err(Error::NotFound(entry.id.to_string()))
            }
            _ => Ok(entry),
        }
    }
}
