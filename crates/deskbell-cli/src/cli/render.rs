use std::fmt::Write as _;

use anyhow::{Context, Result};
use deskbell_core::models::{humanize_local, truncate_text, user_initials, UserInfoMap};
use deskbell_core::{NotificationRecord, NotificationSnapshot};
use serde::Serialize;

const TITLE_WIDTH: usize = 60;

/// How command results are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    PrettyJson,
}

impl OutputFormat {
    pub fn from_flags(json: bool, pretty: bool) -> Self {
        match (json, pretty) {
            (_, true) => OutputFormat::PrettyJson,
            (true, false) => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }

    pub fn is_json(&self) -> bool {
        !matches!(self, OutputFormat::Text)
    }
}

pub fn to_json<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    let json = match format {
        OutputFormat::PrettyJson => serde_json::to_string_pretty(value),
        _ => serde_json::to_string(value),
    };
    json.context("Failed to serialize output")
}

fn sender_name(record: &NotificationRecord, user_info: &UserInfoMap) -> String {
    user_info
        .get(&record.from_user)
        .map(|info| info.fullname.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| record.from_user.clone())
}

/// One line per notification: unread marker, initials, type, title, age
pub fn render_record(record: &NotificationRecord, user_info: &UserInfoMap) -> String {
    let marker = if record.read { ' ' } else { '*' };
    let sender = sender_name(record, user_info);
    let age = humanize_local(record.modified_at);

    format!(
        "{} {:<2} [{}] {} | {} | {} | {}",
        marker,
        user_initials(&sender),
        record.notification_type.label(),
        truncate_text(&record.title(), TITLE_WIDTH),
        sender,
        age,
        record.id,
    )
}

pub fn render_snapshot(snapshot: &NotificationSnapshot) -> String {
    let mut out = String::new();

    if let Some(error) = &snapshot.error {
        let _ = writeln!(out, "error: {}", error);
    }

    if snapshot.notifications.is_empty() {
        let _ = writeln!(out, "No notifications");
    }

    for record in &snapshot.notifications {
        let _ = writeln!(out, "{}", render_record(record, &snapshot.user_info));
    }

    let _ = write!(out, "{} unread", snapshot.unread_count);
    if snapshot.has_more {
        out.push_str(" (more available)");
    }
    out
}
