//! Transient user-facing notices ("flash messages").

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

impl NoticeLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl FromStr for NoticeLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            _ => Err(()),
        }
    }
}

/// A message shown once to the user after an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn entry_created() -> Self {
        Self::success("Diary entry created.")
    }

    #[must_use]
    pub fn entry_create_failed() -> Self {
        Self::error("Failed to create the diary entry.")
    }

    #[must_use]
    pub fn entry_updated() -> Self {
        Self::success("Diary entry updated.")
    }

    #[must_use]
    pub fn entry_update_failed() -> Self {
        Self::error("Failed to update the diary entry.")
    }

    #[must_use]
    pub fn entry_deleted() -> Self {
        Self::success("Diary entry deleted.")
    }

    #[must_use]
    pub fn inquiry_sent() -> Self {
        Self::success("Your message has been sent.")
    }

    #[must_use]
    pub fn inquiry_failed() -> Self {
        Self::error("Your message could not be sent. Please try again later.")
    }

    #[must_use]
    pub fn backup_succeeded() -> Self {
        Self::success("Backup completed successfully.")
    }

    #[must_use]
    pub fn backup_failed() -> Self {
        Self::error("Backup failed.")
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
