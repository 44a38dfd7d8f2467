//! Async services shared by the web server and CLI.

mod database;
mod diary;

pub use database::DatabaseService;
pub use diary::{DiaryService, OwnerScope};
