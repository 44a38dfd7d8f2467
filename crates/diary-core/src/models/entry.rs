//! Diary entry model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum title length, in characters
pub const TITLE_MAX_CHARS: usize = 40;

/// Maximum length of a stored photo reference, in characters
pub const PHOTO_REF_MAX_CHARS: usize = 100;

/// Number of photo slots on an entry
pub const PHOTO_SLOTS: usize = 3;

/// A unique identifier for a diary entry, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Create a new unique entry ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A diary entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntry {
    /// Unique identifier
    pub id: EntryId,
    /// Identity of the user who wrote the entry
    pub owner_id: String,
    /// Title, 1 to 40 characters
    pub title: String,
    /// Free text body
    pub content: Option<String>,
    /// Photo references (path or URL), one per slot
    pub photos: [Option<String>; PHOTO_SLOTS],
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl DiaryEntry {
    /// Photo references that are set, in slot order
    pub fn attached_photos(&self) -> impl Iterator<Item = &str> {
        self.photos.iter().filter_map(Option::as_deref)
    }

    /// Whether `user_id` wrote this entry
    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

impl fmt::Display for DiaryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Validated fields for a new entry; ownership is attached by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub owner_id: String,
    pub title: String,
    pub content: Option<String>,
    pub photos: [Option<String>; PHOTO_SLOTS],
}

/// Partial update of an entry's mutable fields
///
/// `None` leaves a field untouched. For the optional columns, `Some(None)`
/// clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub content: Option<Option<String>>,
    pub photos: [Option<Option<String>>; PHOTO_SLOTS],
}
