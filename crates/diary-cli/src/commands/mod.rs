pub mod backup;
pub mod common;
pub mod completions;
pub mod export;
pub mod list;
pub mod token;
