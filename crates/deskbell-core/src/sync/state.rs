use serde::Serialize;

use super::strategy::FetchOutcome;
use crate::models::{sort_by_modified_desc, NotificationRecord, UserInfoMap};

/// Everything a consumer renders from
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationSnapshot {
    /// Ordered by `modified_at`, most recent first
    pub notifications: Vec<NotificationRecord>,
    pub user_info: UserInfoMap,
    pub unread_count: usize,
    pub is_loading: bool,
    /// Last fetch failure, cleared by the next successful fetch
    pub error: Option<String>,
    pub has_more: bool,
    /// Bumped by every fetched replacement of the list
    #[serde(skip)]
    pub generation: u64,
}

impl NotificationSnapshot {
    pub fn contains(&self, id: &str) -> bool {
        self.notifications.iter().any(|n| n.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.notifications.iter().find(|n| n.id == id)
    }

    fn recount(&mut self) {
        self.unread_count = self.notifications.iter().filter(|n| !n.read).count();
    }

    // ===== Mutations =====

    pub(crate) fn begin_fetch(&mut self) {
        self.is_loading = true;
    }

    /// Wholesale replacement with a fetched snapshot; no merge
    pub(crate) fn replace(&mut self, outcome: FetchOutcome) {
        let mut records = outcome.records;
        sort_by_modified_desc(&mut records);

        self.notifications = records;
        self.generation += 1;
        if let Some(user_info) = outcome.user_info {
            self.user_info = user_info;
        }
        self.has_more = outcome.has_more;
        self.is_loading = false;
        self.error = None;
        self.recount();
    }

    /// Record a fetch failure, keeping the last-known-good list
    pub(crate) fn fail_fetch(&mut self, message: String) {
        self.is_loading = false;
        self.error = Some(message);
    }

    /// Optimistically mark one record read. Returns its prior `read` value,
    /// or None if the record is not in the local list.
    pub(crate) fn mark_read(&mut self, id: &str) -> Option<bool> {
        let record = self.notifications.iter_mut().find(|n| n.id == id)?;
        let prior = record.read;
        record.read = true;
        self.recount();
        Some(prior)
    }

    /// Optimistically mark everything read. Returns the ids that were unread.
    pub(crate) fn mark_all_read(&mut self) -> Vec<String> {
        let flipped: Vec<String> = self
            .notifications
            .iter_mut()
            .filter(|n| !n.read)
            .map(|n| {
                n.read = true;
                n.id.clone()
            })
            .collect();
        self.recount();
        flipped
    }

    /// Undo optimistic flips for `ids` made at `generation`.
    /// A no-op once a fetch has replaced the list since. Returns true if anything changed.
    pub(crate) fn rollback(&mut self, ids: &[String], generation: u64) -> bool {
        if self.generation != generation {
            return false;
        }

        let mut changed = false;
        for record in self.notifications.iter_mut() {
            if record.read && ids.iter().any(|id| *id == record.id) {
                record.read = false;
                changed = true;
            }
        }
        if changed {
            self.recount();
        }
        changed
    }
}
