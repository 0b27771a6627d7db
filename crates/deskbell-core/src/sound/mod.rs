//! Muteable audio cue for incoming notifications.

pub mod player;
pub mod storage;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::constants::{MUTE_STORAGE_KEY, SOUND_VOLUME};

pub use player::{RodioPlayer, SilentPlayer, SoundPlayer};
pub use storage::{FileStorage, LocalStorage, MemoryStorage};

/// Owns MuteState and plays the cue when unmuted.
///
/// Clones share the same mute cell, so a listener holding a clone always
/// observes the current value.
#[derive(Clone)]
pub struct SoundControl {
    muted: Arc<AtomicBool>,
    storage: Arc<dyn LocalStorage>,
    player: Arc<dyn SoundPlayer>,
}

impl SoundControl {
    /// Reads the persisted mute flag; anything but `"true"` means unmuted
    pub fn new(storage: Arc<dyn LocalStorage>, player: Arc<dyn SoundPlayer>) -> Self {
        let stored = storage.get_item(MUTE_STORAGE_KEY);
        let muted = stored.as_deref() == Some("true");
        tracing::debug!(?stored, muted, "Initial mute state");

        Self {
            muted: Arc::new(AtomicBool::new(muted)),
            storage,
            player,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Flip and persist MuteState; returns the new value
    pub fn toggle_mute(&self) -> bool {
        let muted = !self.muted.fetch_xor(true, Ordering::SeqCst);
        tracing::info!(muted, "Toggled notification sound");
        self.persist(muted);
        muted
    }

    pub fn set_mute(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
        tracing::info!(muted, "Set notification sound mute");
        self.persist(muted);
    }

    /// Play the cue unless muted. Failures are logged, never returned.
    pub fn play(&self) {
        if self.is_muted() {
            tracing::debug!("Notification sound muted, not playing");
            return;
        }
        if let Err(e) = self.player.play(SOUND_VOLUME) {
            tracing::warn!(error = %e, "Failed to play notification sound");
        }
    }

    /// Preview the cue from a settings surface. Still respects mute.
    pub fn test_sound(&self) {
        tracing::debug!("Playing test sound");
        self.play();
    }

    /// In-memory value stays authoritative when the write fails
    fn persist(&self, muted: bool) {
        if let Err(e) = self.storage.set_item(MUTE_STORAGE_KEY, if muted { "true" } else { "false" }) {
            tracing::warn!(error = %e, "Failed to persist mute state");
        }
    }
}
