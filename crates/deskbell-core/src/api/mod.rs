//! Remote endpoints the sync talks to.

pub mod frappe;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::NOTIFICATION_DOCTYPE;
use crate::error::SyncError;
use crate::models::{NotificationRecord, ReadFilter, SyncOptions, TypeFilter, UserInfoMap};

pub use frappe::FrappeClient;

/// Result of the simple "recent notifications" call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationLogs {
    #[serde(default)]
    pub notification_logs: Vec<NotificationRecord>,
    #[serde(default)]
    pub user_info: UserInfoMap,
}

/// One `[field, operator, value]` predicate of a document-list query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter(pub &'static str, pub &'static str, pub Value);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Filtered, offset-paged document-list request
#[derive(Debug, Clone, PartialEq)]
pub struct DocListQuery {
    pub doctype: &'static str,
    pub fields: Vec<&'static str>,
    pub filters: Vec<Filter>,
    pub limit: usize,
    pub start: usize,
    pub order_by: (&'static str, SortOrder),
}

impl DocListQuery {
    /// Translate sync options into the notification-log page query
    pub fn for_notifications(options: &SyncOptions) -> Self {
        let mut filters = Vec::new();

        if let TypeFilter::Only(notification_type) = options.type_filter {
            filters.push(Filter(
                "type",
                "=",
                Value::from(notification_type.wire_name()),
            ));
        }

        match options.read_filter {
            ReadFilter::Read => filters.push(Filter("read", "=", Value::from(1))),
            ReadFilter::Unread => filters.push(Filter("read", "=", Value::from(0))),
            ReadFilter::All => {}
        }

        Self {
            doctype: NOTIFICATION_DOCTYPE,
            fields: vec!["*"],
            filters,
            limit: options.effective_limit(),
            start: options.start,
            order_by: ("modified", SortOrder::Desc),
        }
    }

    pub fn order_by_clause(&self) -> String {
        format!("{} {}", self.order_by.0, self.order_by.1.as_str())
    }
}

/// Notification endpoints of the framework.
///
/// Implementations must not retry; the sync decides what a failure means.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Most recent `limit` records, unfiltered, with user display metadata
    async fn get_notification_logs(&self, limit: usize) -> Result<NotificationLogs, SyncError>;

    /// One page of records matching `query`
    async fn get_doc_list(&self, query: &DocListQuery) -> Result<Vec<NotificationRecord>, SyncError>;

    async fn mark_as_read(&self, id: &str) -> Result<(), SyncError>;

    async fn mark_all_as_read(&self) -> Result<(), SyncError>;
}
