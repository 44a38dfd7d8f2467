//! Typed form inputs and their validation.
//!
//! Forms arrive as loosely-typed submissions (every field optional) and are
//! turned into validated values by pure functions. Failures are collected per
//! field so the caller can re-render the form with messages next to each input.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{EntryPatch, NewEntry, PHOTO_SLOTS};
use crate::util::normalize_text_option;

/// Maximum inquiry sender name length
pub const INQUIRY_NAME_MAX_CHARS: usize = 30;
/// Maximum inquiry subject length
pub const INQUIRY_TITLE_MAX_CHARS: usize = 30;

const REQUIRED: &str = "This field is required.";

/// Field-level validation messages, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Messages recorded for `field`
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = Self::default();
        for (field, failures) in errors.field_errors() {
            for failure in failures {
                fields.add(field.to_string(), failure_message(failure));
            }
        }
        fields
    }
}

fn failure_message(failure: &ValidationError) -> String {
    failure.message.as_ref().map_or_else(
        || match &*failure.code {
            "required" => REQUIRED.to_string(),
            "email" => "Enter a valid email address.".to_string(),
            code => format!("Invalid value ({code})."),
        },
        ToString::to_string,
    )
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Trimmed entry values checked by the validation rules
#[derive(Debug, Validate)]
struct EntryInput {
    #[validate(
        required(message = "This field is required."),
        length(max = 40, message = "Ensure this value has at most 40 characters.")
    )]
    title: Option<String>,
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    photo1: Option<String>,
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    photo2: Option<String>,
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    photo3: Option<String>,
}

/// Trimmed inquiry values checked by the validation rules
#[derive(Debug, Validate)]
struct InquiryInput {
    #[validate(
        required(message = "This field is required."),
        length(max = 30, message = "Ensure this value has at most 30 characters.")
    )]
    name: Option<String>,
    #[validate(
        required(message = "This field is required."),
        email(message = "Enter a valid email address.")
    )]
    email: Option<String>,
    #[validate(
        required(message = "This field is required."),
        length(max = 30, message = "Ensure this value has at most 30 characters.")
    )]
    title: Option<String>,
    #[validate(required(message = "This field is required."))]
    message: Option<String>,
}

/// Submitted diary entry form; used for both create and update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub photo1: Option<String>,
    #[serde(default)]
    pub photo2: Option<String>,
    #[serde(default)]
    pub photo3: Option<String>,
}

/// Validated values of an [`EntryForm`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEntry {
    pub title: String,
    pub content: Option<String>,
    /// Outer `None`: field not submitted. Inner `None`: submitted empty.
    pub photos: [Option<Option<String>>; PHOTO_SLOTS],
}

impl ValidEntry {
    /// Attach ownership, producing a row to insert
    #[must_use]
    pub fn into_new_entry(self, owner_id: impl Into<String>) -> NewEntry {
        NewEntry {
            owner_id: owner_id.into(),
            title: self.title,
            content: self.content,
            photos: self.photos.map(Option::flatten),
        }
    }

    /// Title and content are replaced; photos only when submitted
    #[must_use]
    pub fn into_patch(self) -> EntryPatch {
        EntryPatch {
            title: Some(self.title),
            content: Some(self.content),
            photos: self.photos,
        }
    }
}

impl EntryForm {
    /// Pre-fill the form from a stored entry
    #[must_use]
    pub fn from_entry(entry: &crate::DiaryEntry) -> Self {
        let [photo1, photo2, photo3] = entry.photos.clone();
        Self {
            title: Some(entry.title.clone()),
            content: entry.content.clone(),
            photo1,
            photo2,
            photo3,
        }
    }

    pub fn validate(&self) -> Result<ValidEntry, FieldErrors> {
        let submitted = [&self.photo1, &self.photo2, &self.photo3];
        let photos: [Option<Option<String>>; PHOTO_SLOTS] = submitted
            .map(|value| value.as_ref().map(|value| normalize_text_option(Some(value.clone()))));
        let [photo1, photo2, photo3] = photos.clone().map(Option::flatten);

        let input = EntryInput {
            title: normalize_text_option(self.title.clone()),
            photo1,
            photo2,
            photo3,
        };
        input.validate()?;

        let content = self
            .content
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string);

        Ok(ValidEntry {
            title: input.title.unwrap_or_default(),
            content,
            photos,
        })
    }
}

/// Submitted contact form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Validated contact request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inquiry {
    pub name: String,
    pub email: String,
    pub title: String,
    pub message: String,
}

impl Inquiry {
    /// Plain-text email body sent to the site owners
    #[must_use]
    pub fn email_body(&self) -> String {
        format!(
            "Sender name: {}\nEmail address: {}\nTitle: {}\n\nMessage:\n{}\n",
            self.name, self.email, self.title, self.message
        )
    }
}

impl InquiryForm {
    pub fn validate(&self) -> Result<Inquiry, FieldErrors> {
        let input = InquiryInput {
            name: normalize_text_option(self.name.clone()),
            email: normalize_text_option(self.email.clone()),
            title: normalize_text_option(self.title.clone()),
            message: normalize_text_option(self.message.clone()),
        };
        input.validate()?;

        Ok(Inquiry {
            name: input.name.unwrap_or_default(),
            email: input.email.unwrap_or_default(),
            title: input.title.unwrap_or_default(),
            message: input.message.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PHOTO_REF_MAX_CHARS, TITLE_MAX_CHARS};
    use pretty_assertions::assert_eq;

    fn titled(title: &str) -> EntryForm {
        EntryForm {
            title: Some(title.to_string()),
            ..EntryForm::default()
        }
    }

    #[test]
    fn entry_form_requires_title() {
        let errors = EntryForm::default().validate().unwrap_err();
        assert_eq!(errors.get("title"), [REQUIRED.to_string()]);

        let blank = titled("   ").validate().unwrap_err();
        assert_eq!(blank.fields().collect::<Vec<_>>(), vec!["title"]);
    }

    #[test]
    fn entry_form_title_limit_counts_characters() {
        assert!(titled(&"x".repeat(TITLE_MAX_CHARS)).validate().is_ok());
        let errors = titled(&"x".repeat(TITLE_MAX_CHARS + 1)).validate().unwrap_err();
        assert_eq!(
            errors.get("title"),
            ["Ensure this value has at most 40 characters.".to_string()]
        );
        // multi-byte characters count once each
        assert!(titled(&"日".repeat(TITLE_MAX_CHARS)).validate().is_ok());
    }

    #[test]
    fn entry_form_normalizes_optional_fields() {
        let form = EntryForm {
            title: Some(" testTitle ".to_string()),
            content: Some("   ".to_string()),
            photo1: Some(String::new()),
            photo2: Some(" photos/b.jpg ".to_string()),
            photo3: None,
        };

        let valid = form.validate().unwrap();
        assert_eq!(valid.title, "testTitle");
        assert_eq!(valid.content, None);
        assert_eq!(
            valid.photos,
            [Some(None), Some(Some("photos/b.jpg".to_string())), None]
        );

        let new_entry = valid.clone().into_new_entry("alice");
        assert_eq!(new_entry.owner_id, "alice");
        assert_eq!(new_entry.photos, [None, Some("photos/b.jpg".to_string()), None]);

        let patch = valid.into_patch();
        assert_eq!(patch.title.as_deref(), Some("testTitle"));
        assert_eq!(patch.content, Some(None));
        assert_eq!(patch.photos[2], None);
    }

    #[test]
    fn entry_form_rejects_long_photo_reference() {
        let mut form = titled("ok");
        form.photo1 = Some("p".repeat(PHOTO_REF_MAX_CHARS));
        form.photo3 = Some("p".repeat(PHOTO_REF_MAX_CHARS + 1));
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["photo3"]);
    }

    #[test]
    fn inquiry_form_reports_every_missing_field() {
        let errors = InquiryForm::default().validate().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["email", "message", "name", "title"]
        );
        assert!(errors.to_string().contains("name: This field is required."));
    }

    #[test]
    fn inquiry_form_validates_email_and_lengths() {
        let form = InquiryForm {
            name: Some("n".repeat(INQUIRY_NAME_MAX_CHARS + 1)),
            email: Some("not-an-email".to_string()),
            title: Some("Hello".to_string()),
            message: Some("Hi".to_string()),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["email", "name"]);
        assert_eq!(errors.get("email"), ["Enter a valid email address.".to_string()]);

        let long_title = InquiryForm {
            name: Some("Taro".to_string()),
            email: Some(" taro@example.com ".to_string()),
            title: Some("t".repeat(INQUIRY_TITLE_MAX_CHARS + 1)),
            message: Some("Hi".to_string()),
        };
        let errors = long_title.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["title"]);
    }

    #[test]
    fn inquiry_form_accepts_valid_submission() {
        let form = InquiryForm {
            name: Some("Taro".to_string()),
            email: Some("taro@example.com".to_string()),
            title: Some("Question".to_string()),
            message: Some("Is this thing on?".to_string()),
        };
        let inquiry = form.validate().unwrap();
        assert_eq!(inquiry.name, "Taro");
        assert_eq!(inquiry.email, "taro@example.com");
        let body = inquiry.email_body();
        assert!(body.contains("taro@example.com"));
        assert!(body.contains("Is this thing on?"));
    }
}
