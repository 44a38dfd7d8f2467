//! Database layer for Diary

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::{EntryRepository, SqliteEntryRepository};
