//! Locally cached notification list, reconciled with the remote source.
//!
//! A [`NotificationSync`] is mounted once per consuming surface. It picks one
//! fetch strategy from its options, keeps the list fresh from realtime events,
//! and applies read-state changes optimistically before the server confirms.
//!
//! Every successful fetch replaces the whole list. A refresh that lands
//! between an optimistic flip and its confirmation can overwrite the flip;
//! the refresh that follows every confirmed write restores it.

mod state;
mod strategy;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::api::NotificationApi;
use crate::constants::channels;
use crate::error::SyncError;
use crate::models::{FetchMode, SyncOptions};
use crate::realtime::{EventBus, Subscription};
use crate::sound::SoundControl;

pub use state::NotificationSnapshot;
use strategy::FetchStrategy;

struct SyncInner {
    api: Arc<dyn NotificationApi>,
    strategy: FetchStrategy,
    options: SyncOptions,
    sound: SoundControl,
    /// Read by the realtime listener at event time, so changes apply without resubscribing
    enable_sound: AtomicBool,
    state: watch::Sender<NotificationSnapshot>,
    /// Serializes fetches so responses are applied in issue order
    fetch_gate: tokio::sync::Mutex<()>,
    mounted: AtomicBool,
}

impl SyncInner {
    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    async fn refresh(&self) -> Result<(), SyncError> {
        if !self.is_mounted() {
            return Err(SyncError::Unmounted);
        }

        let _gate = self.fetch_gate.lock().await;
        if !self.is_mounted() {
            return Err(SyncError::Unmounted);
        }

        self.state.send_modify(|s| s.begin_fetch());
        let result = self.strategy.fetch(self.api.as_ref()).await;

        if !self.is_mounted() {
            tracing::debug!("Ignoring fetch response after teardown");
            return Err(SyncError::Unmounted);
        }

        match result {
            Ok(outcome) => {
                tracing::debug!(
                    count = outcome.records.len(),
                    has_more = outcome.has_more,
                    "Replaced notification list"
                );
                self.state.send_modify(|s| s.replace(outcome));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch notifications");
                let message = e.to_string();
                self.state.send_modify(|s| s.fail_fetch(message));
                Err(e)
            }
        }
    }

    /// Refresh after a confirmed write; failures are already in the snapshot
    async fn reconcile(&self) {
        if let Err(e) = self.refresh().await {
            tracing::debug!(error = %e, "Reconciling refresh did not complete");
        }
    }

    async fn mark_as_read(&self, id: &str) -> Result<(), SyncError> {
        if !self.is_mounted() {
            return Err(SyncError::Unmounted);
        }

        let mut prior = None;
        let mut generation = 0;
        self.state.send_if_modified(|s| {
            generation = s.generation;
            prior = s.mark_read(id);
            prior == Some(false)
        });

        match self.api.mark_as_read(id).await {
            Ok(()) => {
                self.reconcile().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(id, error = %e, "Failed to mark notification as read");
                if prior == Some(false) {
                    let ids = [id.to_string()];
                    self.state.send_if_modified(|s| s.rollback(&ids, generation));
                }
                Err(e)
            }
        }
    }

    async fn mark_all_as_read(&self) -> Result<(), SyncError> {
        if !self.is_mounted() {
            return Err(SyncError::Unmounted);
        }

        let mut flipped = Vec::new();
        let mut generation = 0;
        self.state.send_if_modified(|s| {
            generation = s.generation;
            flipped = s.mark_all_read();
            !flipped.is_empty()
        });

        match self.api.mark_all_as_read().await {
            Ok(()) => {
                self.reconcile().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to mark all notifications as read");
                if !flipped.is_empty() {
                    self.state.send_if_modified(|s| s.rollback(&flipped, generation));
                }
                Err(e)
            }
        }
    }

    async fn on_notification(&self) {
        let enable_sound = self.enable_sound.load(Ordering::SeqCst);
        let muted = self.sound.is_muted();
        if enable_sound && !muted {
            self.sound.play();
        } else {
            tracing::debug!(enable_sound, muted, "Skipping notification sound");
        }

        if let Err(e) = self.refresh().await {
            tracing::debug!(error = %e, "Refresh after notification event failed");
        }
    }

    async fn on_indicator_hide(&self) {
        if let Err(e) = self.refresh().await {
            tracing::debug!(error = %e, "Refresh after indicator_hide failed");
        }
    }
}

/// One mounted notification surface
pub struct NotificationSync {
    inner: Arc<SyncInner>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl NotificationSync {
    /// Subscribe to the realtime channels and run the initial fetch.
    ///
    /// A failed initial fetch does not fail the mount; it shows up in
    /// `snapshot().error` and the consumer can `refresh()`.
    pub async fn mount(
        options: SyncOptions,
        api: Arc<dyn NotificationApi>,
        sound: SoundControl,
        events: &EventBus,
    ) -> Self {
        let (state, _) = watch::channel(NotificationSnapshot::default());
        let inner = Arc::new(SyncInner {
            api,
            strategy: FetchStrategy::from_options(&options),
            enable_sound: AtomicBool::new(options.enable_sound),
            options,
            sound,
            state,
            fetch_gate: tokio::sync::Mutex::new(()),
            mounted: AtomicBool::new(true),
        });

        let notification_inner = inner.clone();
        let notification_sub = events.subscribe(channels::NOTIFICATION, move |_| {
            let inner = notification_inner.clone();
            async move { inner.on_notification().await }
        });

        let indicator_inner = inner.clone();
        let indicator_sub = events.subscribe(channels::INDICATOR_HIDE, move |_| {
            let inner = indicator_inner.clone();
            async move { inner.on_indicator_hide().await }
        });

        tracing::info!(mode = ?inner.strategy.mode(), limit = inner.options.limit, "Mounted notification sync");

        let sync = Self {
            inner,
            subscriptions: Mutex::new(vec![notification_sub, indicator_sub]),
        };

        if let Err(e) = sync.refresh().await {
            tracing::warn!(error = %e, "Initial notification fetch failed");
        }

        sync
    }

    pub fn mode(&self) -> FetchMode {
        self.inner.strategy.mode()
    }

    pub fn options(&self) -> &SyncOptions {
        &self.inner.options
    }

    pub fn sound(&self) -> &SoundControl {
        &self.inner.sound
    }

    pub fn enable_sound(&self) -> bool {
        self.inner.enable_sound.load(Ordering::SeqCst)
    }

    /// Takes effect for the next realtime event
    pub fn set_enable_sound(&self, enabled: bool) {
        self.inner.enable_sound.store(enabled, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> NotificationSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receiver that is marked changed on every state update
    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn unread_count(&self) -> usize {
        self.inner.state.borrow().unread_count
    }

    pub fn has_more(&self) -> bool {
        self.inner.state.borrow().has_more
    }

    /// Re-run the active fetch strategy. Concurrent calls queue.
    pub async fn refresh(&self) -> Result<(), SyncError> {
        self.inner.refresh().await
    }

    /// Optimistically mark `id` read, confirm remotely, then refresh.
    ///
    /// A failed write is logged and the flip rolled back, unless a fetch has
    /// replaced the list in the meantime. The write error is returned; a
    /// failed follow-up refresh is not, it lands in `snapshot().error`.
    pub async fn mark_as_read(&self, id: &str) -> Result<(), SyncError> {
        self.inner.mark_as_read(id).await
    }

    /// Optimistically mark everything read, confirm remotely, then refresh.
    /// Same failure handling as [`Self::mark_as_read`].
    pub async fn mark_all_as_read(&self) -> Result<(), SyncError> {
        self.inner.mark_all_as_read().await
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.is_mounted()
    }

    /// Unsubscribe and stop applying responses. In-flight requests are not aborted.
    pub fn teardown(&self) {
        if self.inner.mounted.swap(false, Ordering::SeqCst) {
            self.subscriptions.lock().clear();
            tracing::info!("Tore down notification sync");
        }
    }
}

impl Drop for NotificationSync {
    fn drop(&mut self) {
        self.teardown();
    }
}
