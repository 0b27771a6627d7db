//! In-process realtime channel.
//!
//! Server-pushed events arrive on an [`EventBus`] (fed by [`EventFeedClient`]
//! or by the host directly) and are dispatched to per-channel handlers. Each
//! handler runs on its own task for as long as its [`Subscription`] is alive.

pub mod feed;

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::constants::EVENT_BUS_CAPACITY;

pub use feed::EventFeedClient;

/// A named event pushed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl RealtimeEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Fan-out of realtime events to any number of subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RealtimeEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_BUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event; returns how many subscribers saw it
    pub fn publish(&self, event: RealtimeEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Run `handler` for every event named `channel` until the returned guard drops.
    ///
    /// Events are handled one at a time in arrival order. If the subscriber
    /// falls behind and events are dropped, the handler runs once in their place.
    /// Must be called inside a tokio runtime.
    pub fn subscribe<F, Fut>(&self, channel: &str, handler: F) -> Subscription
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut rx = self.tx.subscribe();
        let channel = channel.to_string();
        let task_channel = channel.clone();

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.event == task_channel => {
                        tracing::debug!(channel = %task_channel, "Realtime event received");
                        handler(event.data).await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(channel = %task_channel, skipped, "Realtime subscriber lagged");
                        handler(serde_json::Value::Null).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Subscription { channel, task }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Live handler registration; dropping it unsubscribes
pub struct Subscription {
    channel: String,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_handler_only_sees_its_channel() {
        let bus = EventBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _sub = bus.subscribe("notification", move |data| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(data);
            }
        });

        bus.publish(RealtimeEvent::new("indicator_hide"));
        bus.publish(RealtimeEvent::new("notification").with_data(serde_json::json!({"n": 1})));

        let received = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, serde_json::json!({"n": 1}));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropping_subscription_unsubscribes() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let sub = bus.subscribe("notification", move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert_eq!(sub.channel(), "notification");
        assert_eq!(bus.subscriber_count(), 1);

        drop(sub);
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(RealtimeEvent::new("notification")), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_event_frame_decoding() {
        let event: RealtimeEvent = serde_json::from_str(r#"{"event": "indicator_hide"}"#).unwrap();
        assert_eq!(event.event, "indicator_hide");
        assert!(event.data.is_null());
    }
}
