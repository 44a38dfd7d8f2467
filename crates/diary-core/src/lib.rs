//! diary-core - Core library for Diary
//!
//! This crate contains the shared models, database layer, form validation and
//! business logic used by the Diary web server and CLI.

pub mod backup;
pub mod db;
pub mod error;
pub mod export;
pub mod forms;
pub mod models;
pub mod notice;
pub mod pagination;
pub mod services;
pub mod session;
pub mod util;

pub use error::{Error, Result};
pub use models::{DiaryEntry, EntryId, EntryPatch, NewEntry};
pub use notice::{Notice, NoticeLevel};
pub use pagination::{Page, PageRequest};
