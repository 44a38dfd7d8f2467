//! Data models for Diary

mod entry;

pub use entry::{
    DiaryEntry, EntryId, EntryPatch, NewEntry, PHOTO_REF_MAX_CHARS, PHOTO_SLOTS, TITLE_MAX_CHARS,
};
