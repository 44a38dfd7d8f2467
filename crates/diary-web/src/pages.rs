//! Server-rendered HTML pages.

use std::fmt::Write as _;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use diary_core::forms::{EntryForm, FieldErrors, InquiryForm};
use diary_core::{DiaryEntry, EntryId, Notice, Page};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, notices: &[Notice], body: &str) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{} | Diary</title>\n</head>\n<body>\n",
        escape(title)
    );
    html.push_str(
        "<nav><a href=\"/\">Home</a> | <a href=\"/diary/\">Diary</a> | <a href=\"/inquiry/\">Inquiry</a></nav>\n",
    );
    if !notices.is_empty() {
        html.push_str("<ul class=\"messages\">\n");
        for notice in notices {
            let _ = writeln!(
                html,
                "<li class=\"{}\">{}</li>",
                notice.level.as_str(),
                escape(&notice.text)
            );
        }
        html.push_str("</ul>\n");
    }
    let _ = write!(html, "<main>\n<h1>{}</h1>\n{body}</main>\n</body>\n</html>\n", escape(title));
    html
}

fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map_or_else(String::new, |at| at.format("%Y-%m-%d %H:%M").to_string())
}

fn field_errors(errors: &FieldErrors, field: &str) -> String {
    let messages = errors.get(field);
    if messages.is_empty() {
        return String::new();
    }
    let mut html = String::from("<ul class=\"errorlist\">");
    for message in messages {
        let _ = write!(html, "<li>{}</li>", escape(message));
    }
    html.push_str("</ul>");
    html
}

fn text_input(name: &str, label: &str, value: Option<&str>, errors: &FieldErrors) -> String {
    format!(
        "<p><label for=\"id_{name}\">{label}</label>{}<input type=\"text\" name=\"{name}\" id=\"id_{name}\" value=\"{}\"></p>\n",
        field_errors(errors, name),
        escape(value.unwrap_or(""))
    )
}

fn textarea(name: &str, label: &str, value: Option<&str>, errors: &FieldErrors) -> String {
    format!(
        "<p><label for=\"id_{name}\">{label}</label>{}<textarea name=\"{name}\" id=\"id_{name}\">{}</textarea></p>\n",
        field_errors(errors, name),
        escape(value.unwrap_or(""))
    )
}

pub fn index_page(notices: &[Notice]) -> String {
    layout(
        "Welcome",
        notices,
        "<p>Keep a private diary with photos.</p>\n<p><a href=\"/diary/\">Open your diary</a> or <a href=\"/inquiry/\">send us a message</a>.</p>\n",
    )
}

pub fn entry_list_page(page: &Page<DiaryEntry>, notices: &[Notice]) -> String {
    let mut body = String::from("<p><a href=\"/diary/create/\">New entry</a> | <a href=\"/diary/backup/\">Back up</a></p>\n");
    if page.items.is_empty() {
        body.push_str("<p>No diary entries yet.</p>\n");
    } else {
        body.push_str("<ul class=\"entries\">\n");
        for entry in &page.items {
            let _ = writeln!(
                body,
                "<li><a href=\"/diary/{}/\">{}</a> <time>{}</time></li>",
                entry.id,
                escape(&entry.title),
                format_timestamp(entry.created_at)
            );
        }
        body.push_str("</ul>\n");
    }

    body.push_str("<nav class=\"pagination\">");
    if let Some(previous) = page.previous_page_number() {
        let _ = write!(body, "<a href=\"?page={previous}\">Previous</a> ");
    }
    let _ = write!(body, "Page {} of {}", page.number(), page.num_pages());
    if let Some(next) = page.next_page_number() {
        let _ = write!(body, " <a href=\"?page={next}\">Next</a>");
    }
    body.push_str("</nav>\n");

    layout("Diary", notices, &body)
}

pub fn entry_detail_page(entry: &DiaryEntry, notices: &[Notice]) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "<p class=\"timestamps\">Created {} | Updated {}</p>",
        format_timestamp(entry.created_at),
        format_timestamp(entry.updated_at)
    );
    if let Some(content) = &entry.content {
        let _ = writeln!(body, "<div class=\"content\">{}</div>", escape(content));
    }
    for photo in entry.attached_photos() {
        let _ = writeln!(
            body,
            "<img src=\"{}\" alt=\"\">",
            escape(photo)
        );
    }
    let _ = writeln!(
        body,
        "<p><a href=\"/diary/{id}/update/\">Edit</a> | <a href=\"/diary/{id}/delete/\">Delete</a> | <a href=\"/diary/\">Back</a></p>",
        id = entry.id
    );
    layout(&entry.title, notices, &body)
}

/// Which entry form is being shown
#[derive(Debug, Clone, Copy)]
pub enum EntryFormKind {
    Create,
    Update(EntryId),
}

pub fn entry_form_page(
    kind: EntryFormKind,
    form: &EntryForm,
    errors: &FieldErrors,
    notices: &[Notice],
) -> String {
    let (title, action) = match kind {
        EntryFormKind::Create => ("New entry".to_string(), "/diary/create/".to_string()),
        EntryFormKind::Update(id) => ("Edit entry".to_string(), format!("/diary/{id}/update/")),
    };

    let mut body = String::new();
    let _ = writeln!(body, "<form method=\"post\" action=\"{action}\">");
    body.push_str(&text_input("title", "Title", form.title.as_deref(), errors));
    body.push_str(&textarea("content", "Content", form.content.as_deref(), errors));
    body.push_str(&text_input("photo1", "Photo 1", form.photo1.as_deref(), errors));
    body.push_str(&text_input("photo2", "Photo 2", form.photo2.as_deref(), errors));
    body.push_str(&text_input("photo3", "Photo 3", form.photo3.as_deref(), errors));
    body.push_str("<button type=\"submit\">Save</button>\n</form>\n");

    layout(&title, notices, &body)
}

pub fn delete_confirm_page(entry: &DiaryEntry, notices: &[Notice]) -> String {
    let body = format!(
        "<p>Delete \"{title}\"?</p>\n<form method=\"post\" action=\"/diary/{id}/delete/\"><button type=\"submit\">Delete</button></form>\n<p><a href=\"/diary/{id}/\">Cancel</a></p>\n",
        title = escape(&entry.title),
        id = entry.id
    );
    layout("Delete entry", notices, &body)
}

pub fn inquiry_page(form: &InquiryForm, errors: &FieldErrors, notices: &[Notice]) -> String {
    let mut body = String::from("<form method=\"post\" action=\"/inquiry/\">\n");
    body.push_str(&text_input("name", "Name", form.name.as_deref(), errors));
    body.push_str(&text_input("email", "Email", form.email.as_deref(), errors));
    body.push_str(&text_input("title", "Title", form.title.as_deref(), errors));
    body.push_str(&textarea("message", "Message", form.message.as_deref(), errors));
    body.push_str("<button type=\"submit\">Send</button>\n</form>\n");
    layout("Inquiry", notices, &body)
}

pub fn backup_result_page(result: &Notice, file_name: Option<&str>, notices: &[Notice]) -> String {
    let mut body = format!(
        "<p class=\"{}\">{}</p>\n",
        result.level.as_str(),
        escape(&result.text)
    );
    if let Some(file_name) = file_name {
        let _ = writeln!(body, "<p>Backup file: <code>{}</code></p>", escape(file_name));
    }
    body.push_str("<p><a href=\"/diary/\">Back to the diary</a></p>\n");
    layout("Backup", notices, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    layout(title, &[], &format!("<p>{}</p>\n", escape(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape("<script>alert(\"x\") & 'y'</script>"),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
    }

    #[test]
    fn form_page_shows_field_errors_and_values() {
        let mut errors = FieldErrors::default();
        errors.add("title", "This field is required.");
        let form = EntryForm {
            content: Some("<b>draft</b>".to_string()),
            ..EntryForm::default()
        };

        let html = entry_form_page(EntryFormKind::Create, &form, &errors, &[]);
        assert!(html.contains("This field is required."));
        assert!(html.contains("&lt;b&gt;draft&lt;/b&gt;"));
        assert!(html.contains("action=\"/diary/create/\""));
    }

    #[test]
    fn layout_lists_notices() {
        let html = index_page(&[Notice::entry_deleted()]);
        assert!(html.contains("<li class=\"success\">Diary entry deleted.</li>"));
    }

    #[test]
    fn format_timestamp_is_minute_precision() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00");
    }
}
