//! Application-wide constants
//!
//! Centralized location for RPC paths, channel names and storage keys
//! that are shared across modules.

/// Collection (doctype) holding notification records
pub const NOTIFICATION_DOCTYPE: &str = "Notification Log";

/// RPC methods exposed by the framework for the notification log
pub mod methods {
    pub const GET_NOTIFICATION_LOGS: &str =
        "frappe.desk.doctype.notification_log.notification_log.get_notification_logs";
    pub const MARK_AS_READ: &str = "frappe.desk.doctype.notification_log.notification_log.mark_as_read";
    pub const MARK_ALL_AS_READ: &str =
        "frappe.desk.doctype.notification_log.notification_log.mark_all_as_read";
}

/// Realtime channels consumed by the sync
pub mod channels {
    /// A new notification was created for the session user
    pub const NOTIFICATION: &str = "notification";
    /// Notifications were marked as seen elsewhere
    pub const INDICATOR_HIDE: &str = "indicator_hide";
}

/// Durable storage key for the mute flag. Global, not namespaced per user.
pub const MUTE_STORAGE_KEY: &str = "notifications-muted";

/// Playback volume for the notification cue (0.0 - 1.0)
pub const SOUND_VOLUME: f32 = 0.6;

/// Default page size for both fetch strategies
pub const DEFAULT_LIMIT: usize = 20;

/// Capacity of the in-process realtime broadcast
pub const EVENT_BUS_CAPACITY: usize = 64;

/// Seconds to wait before reconnecting the realtime feed
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 2;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
