pub mod format;
pub mod notification;
pub mod options;

pub use format::{humanize_local, humanize_since, relative_time, strip_html, truncate_text, user_initials};
pub use notification::{
    is_sorted_by_modified_desc, sort_by_modified_desc, NotificationRecord, NotificationType,
    UserInfo, UserInfoMap,
};
pub use options::{FetchMode, ReadFilter, SyncOptions, TypeFilter};
