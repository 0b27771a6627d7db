pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod realtime;
pub mod sound;
pub mod sync;
pub mod tracing_setup;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{FrappeClient, NotificationApi};
pub use config::CoreConfig;
pub use error::{PlaybackError, StorageError, SyncError};
pub use models::{FetchMode, NotificationRecord, NotificationType, ReadFilter, SyncOptions, TypeFilter};
pub use realtime::{EventBus, EventFeedClient, RealtimeEvent, Subscription};
pub use sound::{FileStorage, LocalStorage, MemoryStorage, RodioPlayer, SilentPlayer, SoundControl, SoundPlayer};
pub use sync::{NotificationSnapshot, NotificationSync};
