//! Display helpers for notification records.

use chrono::{Local, NaiveDateTime};
use chrono_humanize::HumanTime;

use super::notification::frappe_datetime;
use super::NotificationRecord;

const SUBJECT_TITLE_OPEN: &str = r#"<b class="subject-title">"#;

impl NotificationRecord {
    /// Route to open when the notification is clicked
    pub fn link(&self) -> String {
        if let Some(link) = self.link.as_deref().filter(|l| !l.is_empty()) {
            return link.to_string();
        }

        if let (Some(doctype), Some(docname)) = (
            self.document_type.as_deref().filter(|d| !d.is_empty()),
            self.document_name.as_deref().filter(|d| !d.is_empty()),
        ) {
            return match doctype {
                "Task" => format!("/task-manager/edit/{}", docname),
                "Project" => format!("/projects/{}", docname),
                "ToDo" => format!("/todo/{}", docname),
                _ => format!("/app/{}/{}", doctype, docname),
            };
        }

        format!("/app/notification-log/{}", self.id)
    }

    /// Plain-text title: the `subject-title` span if present, else the whole subject
    pub fn title(&self) -> String {
        if let Some(start) = self.subject.find(SUBJECT_TITLE_OPEN) {
            let rest = &self.subject[start + SUBJECT_TITLE_OPEN.len()..];
            if let Some(end) = rest.find("</b>") {
                let inner = &rest[..end];
                if !inner.is_empty() {
                    return strip_html(inner);
                }
            }
        }
        strip_html(&self.subject)
    }
}

/// Remove markup and decode the handful of entities the framework emits
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Cut `text` to `max_len` characters, appending `...` when truncated
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_len).collect();
    truncated.push_str("...");
    truncated
}

/// Two-letter avatar initials from an email address or a full name
pub fn user_initials(identifier: &str) -> String {
    if identifier.is_empty() {
        return "?".to_string();
    }

    let first_two = |s: &str| s.chars().take(2).collect::<String>().to_uppercase();
    let pair = |a: &str, b: &str| {
        a.chars()
            .next()
            .into_iter()
            .chain(b.chars().next())
            .collect::<String>()
            .to_uppercase()
    };

    if let Some((local, _)) = identifier.split_once('@') {
        let parts: Vec<&str> = local.split('.').collect();
        if parts.len() >= 2 {
            return pair(parts[0], parts[1]);
        }
        return first_two(local);
    }

    let parts: Vec<&str> = identifier.split(' ').collect();
    if parts.len() >= 2 {
        return pair(parts[0], parts[1]);
    }

    first_two(identifier)
}

/// "2 hours ago" relative to `now`
pub fn humanize_since(timestamp: NaiveDateTime, now: NaiveDateTime) -> String {
    HumanTime::from(timestamp - now).to_string()
}

/// Relative time for a naive timestamp in the site's local time
pub fn humanize_local(timestamp: NaiveDateTime) -> String {
    humanize_since(timestamp, Local::now().naive_local())
}

/// Relative time for a wire timestamp.
/// Returns the input unchanged if it cannot be parsed.
pub fn relative_time(timestamp: &str) -> String {
    match frappe_datetime::parse(timestamp) {
        Some(parsed) => humanize_local(parsed),
        None => timestamp.to_string(),
    }
}
