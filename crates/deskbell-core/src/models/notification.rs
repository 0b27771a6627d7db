use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Category of a notification record, as tagged by the framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NotificationType {
    Mention,
    EnergyPoint,
    Assignment,
    Share,
    Alert,
    /// Empty or unrecognised tag
    #[default]
    Unspecified,
}

impl NotificationType {
    pub const ALL: [NotificationType; 6] = [
        NotificationType::Mention,
        NotificationType::EnergyPoint,
        NotificationType::Assignment,
        NotificationType::Share,
        NotificationType::Alert,
        NotificationType::Unspecified,
    ];

    /// Tag string used on the wire and in filters
    pub fn wire_name(&self) -> &'static str {
        match self {
            NotificationType::Mention => "Mention",
            NotificationType::EnergyPoint => "Energy Point",
            NotificationType::Assignment => "Assignment",
            NotificationType::Share => "Share",
            NotificationType::Alert => "Alert",
            NotificationType::Unspecified => "",
        }
    }

    pub fn from_wire(tag: &str) -> Self {
        match tag {
            "Mention" => NotificationType::Mention,
            "Energy Point" => NotificationType::EnergyPoint,
            "Assignment" => NotificationType::Assignment,
            "Share" => NotificationType::Share,
            "Alert" => NotificationType::Alert,
            _ => NotificationType::Unspecified,
        }
    }

    /// Human-readable label for display
    pub fn label(&self) -> &'static str {
        match self {
            NotificationType::Unspecified => "General",
            other => other.wire_name(),
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for NotificationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for NotificationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(tag
            .as_deref()
            .map(NotificationType::from_wire)
            .unwrap_or_default())
    }
}

/// A `Notification Log` document.
///
/// Only `id`, `notification_type`, `read` and `modified_at` drive the sync
/// logic; the rest is carried through for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    #[serde(rename = "name")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub notification_type: NotificationType,
    #[serde(with = "read_flag", default)]
    pub read: bool,
    #[serde(rename = "modified", with = "frappe_datetime")]
    pub modified_at: NaiveDateTime,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub for_user: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub from_user: String,
    #[serde(default)]
    pub email_content: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub document_name: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub attached_file: Option<String>,
    #[serde(default)]
    pub creation: Option<String>,
}

/// Display metadata for a user, keyed by user id in the simple list response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fullname: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

pub type UserInfoMap = HashMap<String, UserInfo>;

/// Sort records by `modified_at`, most recent first. Stable for equal timestamps.
pub fn sort_by_modified_desc(records: &mut [NotificationRecord]) {
    records.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
}

/// True if `records` is ordered by `modified_at` descending
pub fn is_sorted_by_modified_desc(records: &[NotificationRecord]) -> bool {
    records
        .windows(2)
        .all(|pair| pair[0].modified_at >= pair[1].modified_at)
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// `read` is 0/1 on the wire; booleans are accepted too.
mod read_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Int(i64),
        Bool(bool),
    }

    pub fn serialize<S: Serializer>(read: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*read))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Option::<Flag>::deserialize(deserializer)? {
            Some(Flag::Int(value)) => value != 0,
            Some(Flag::Bool(value)) => value,
            None => false,
        })
    }
}

/// Naive `YYYY-MM-DD HH:MM:SS[.ffffff]` timestamps, with RFC 3339 as a fallback.
pub(crate) mod frappe_datetime {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

    pub fn parse(value: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(value, FORMAT)
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|dt| dt.naive_local())
            })
    }

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}
