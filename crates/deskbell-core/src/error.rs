/// Failure talking to the remote notification endpoints.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid site URL: {0}")]
    InvalidUrl(String),

    #[error("Notification sync was torn down")]
    Unmounted,
}

/// Failure persisting a value to client-local storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize storage: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure playing the notification cue.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Audio output not available: {0}")]
    Unavailable(String),

    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("Audio I/O error: {0}")]
    Io(#[from] std::io::Error),
}
