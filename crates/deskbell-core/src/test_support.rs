//! Scripted collaborators shared by unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::api::{DocListQuery, NotificationApi, NotificationLogs};
use crate::error::{PlaybackError, SyncError};
use crate::models::{sort_by_modified_desc, NotificationRecord, NotificationType, UserInfo, UserInfoMap};

pub fn record(id: &str, modified: &str, read: bool) -> NotificationRecord {
    serde_json::from_value(serde_json::json!({
        "name": id,
        "type": "Mention",
        "read": if read { 1 } else { 0 },
        "modified": modified,
        "subject": format!("Notification {}", id),
        "for_user": "jane@example.com",
        "from_user": "admin@example.com",
    }))
    .expect("valid test record")
}

/// Poll `condition` until it holds or two seconds pass
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// In-memory stand-in for the remote notification log.
///
/// Serves records in insertion order (callers sort), counts calls per
/// endpoint, and can fail or hold writes on demand.
#[derive(Default)]
pub struct MockApi {
    records: Mutex<Vec<NotificationRecord>>,
    simple_calls: AtomicUsize,
    doc_list_calls: AtomicUsize,
    mark_read_calls: AtomicUsize,
    mark_all_calls: AtomicUsize,
    completed_writes: AtomicUsize,
    fail_fetch: AtomicBool,
    fail_writes: AtomicBool,
    hold_writes: AtomicBool,
    release: Notify,
}

impl MockApi {
    pub fn with_records(records: Vec<NotificationRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn set_records(&self, records: Vec<NotificationRecord>) {
        *self.records.lock() = records;
    }

    pub fn server_record(&self, id: &str) -> Option<NotificationRecord> {
        self.records.lock().iter().find(|r| r.id == id).cloned()
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Writes block until `release_writes` is called
    pub fn hold_writes(&self) {
        self.hold_writes.store(true, Ordering::SeqCst);
    }

    pub fn release_writes(&self) {
        self.hold_writes.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
        self.release.notify_one();
    }

    pub fn simple_calls(&self) -> usize {
        self.simple_calls.load(Ordering::SeqCst)
    }

    pub fn doc_list_calls(&self) -> usize {
        self.doc_list_calls.load(Ordering::SeqCst)
    }

    pub fn mark_read_calls(&self) -> usize {
        self.mark_read_calls.load(Ordering::SeqCst)
    }

    pub fn mark_all_calls(&self) -> usize {
        self.mark_all_calls.load(Ordering::SeqCst)
    }

    pub fn completed_writes(&self) -> usize {
        self.completed_writes.load(Ordering::SeqCst)
    }

    fn fetch_result(&self) -> Result<(), SyncError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(SyncError::Api {
                status: 502,
                message: "Bad Gateway".to_string(),
            });
        }
        Ok(())
    }

    async fn write(&self) -> Result<(), SyncError> {
        if self.hold_writes.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::Api {
                status: 417,
                message: "Not permitted".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationApi for MockApi {
    async fn get_notification_logs(&self, limit: usize) -> Result<NotificationLogs, SyncError> {
        self.simple_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_result()?;

        let notification_logs: Vec<NotificationRecord> = self.records.lock().iter().take(limit).cloned().collect();
        let mut user_info = UserInfoMap::new();
        user_info.insert(
            "admin@example.com".to_string(),
            UserInfo {
                fullname: "Administrator".to_string(),
                image: None,
                name: "admin@example.com".to_string(),
            },
        );
        Ok(NotificationLogs {
            notification_logs,
            user_info,
        })
    }

    async fn get_doc_list(&self, query: &DocListQuery) -> Result<Vec<NotificationRecord>, SyncError> {
        self.doc_list_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_result()?;

        let mut matching: Vec<NotificationRecord> = self
            .records
            .lock()
            .iter()
            .filter(|r| {
                query.filters.iter().all(|f| match f.0 {
                    "type" => f.2.as_str().map(NotificationType::from_wire) == Some(r.notification_type),
                    "read" => f.2.as_i64() == Some(i64::from(r.read)),
                    _ => true,
                })
            })
            .cloned()
            .collect();
        sort_by_modified_desc(&mut matching);

        Ok(matching.into_iter().skip(query.start).take(query.limit).collect())
    }

    async fn mark_as_read(&self, id: &str) -> Result<(), SyncError> {
        self.mark_read_calls.fetch_add(1, Ordering::SeqCst);
        self.write().await?;
        if let Some(record) = self.records.lock().iter_mut().find(|r| r.id == id) {
            record.read = true;
        }
        self.completed_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn mark_all_as_read(&self) -> Result<(), SyncError> {
        self.mark_all_calls.fetch_add(1, Ordering::SeqCst);
        self.write().await?;
        for record in self.records.lock().iter_mut() {
            record.read = true;
        }
        self.completed_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Player that counts calls instead of making noise
#[derive(Default)]
pub struct RecordingPlayer {
    plays: AtomicUsize,
    last_volume: Mutex<Option<f32>>,
    fail: bool,
}

impl RecordingPlayer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn last_volume(&self) -> Option<f32> {
        *self.last_volume.lock()
    }
}

impl crate::sound::SoundPlayer for RecordingPlayer {
    fn play(&self, volume: f32) -> Result<(), PlaybackError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        *self.last_volume.lock() = Some(volume);
        if self.fail {
            return Err(PlaybackError::Unavailable("autoplay blocked".to_string()));
        }
        Ok(())
    }
}
