use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::NotificationType;
use crate::constants::DEFAULT_LIMIT;

/// Which data-retrieval shape backs a sync instance. Fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Most recent `limit` records, unfiltered, plus user display metadata
    #[default]
    Simple,
    /// Filtered, offset-based page ordered by `modified` descending
    Paginated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Only(NotificationType),
}

impl TypeFilter {
    pub fn matches(&self, notification_type: NotificationType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(wanted) => *wanted == notification_type,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    /// Accepts `all`, wire tags (`Energy Point`) and kebab-case (`energy-point`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        if normalized == "all" {
            return Ok(TypeFilter::All);
        }
        NotificationType::ALL
            .iter()
            .find(|t| t.wire_name().to_lowercase() == normalized || t.label().to_lowercase() == normalized)
            .map(|t| TypeFilter::Only(*t))
            .ok_or_else(|| format!("unknown notification type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadFilter {
    #[default]
    All,
    Read,
    Unread,
}

impl ReadFilter {
    pub fn matches(&self, read: bool) -> bool {
        match self {
            ReadFilter::All => true,
            ReadFilter::Read => read,
            ReadFilter::Unread => !read,
        }
    }
}

impl FromStr for ReadFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(ReadFilter::All),
            "read" => Ok(ReadFilter::Read),
            "unread" => Ok(ReadFilter::Unread),
            other => Err(format!("unknown read filter: {}", other)),
        }
    }
}

/// Construction parameters for a `NotificationSync`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    pub limit: usize,
    pub type_filter: TypeFilter,
    pub read_filter: ReadFilter,
    pub enable_sound: bool,
    pub start: usize,
    pub mode: FetchMode,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            type_filter: TypeFilter::All,
            read_filter: ReadFilter::All,
            enable_sound: false,
            start: 0,
            mode: FetchMode::Simple,
        }
    }
}

impl SyncOptions {
    pub fn simple(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn paginated(limit: usize, start: usize) -> Self {
        Self {
            limit,
            start,
            mode: FetchMode::Paginated,
            ..Self::default()
        }
    }

    pub fn with_type_filter(mut self, type_filter: TypeFilter) -> Self {
        self.type_filter = type_filter;
        self
    }

    pub fn with_read_filter(mut self, read_filter: ReadFilter) -> Self {
        self.read_filter = read_filter;
        self
    }

    pub fn with_sound(mut self, enable_sound: bool) -> Self {
        self.enable_sound = enable_sound;
        self
    }

    /// Page size, never zero
    pub fn effective_limit(&self) -> usize {
        self.limit.max(1)
    }
}
