use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use super::{EventBus, RealtimeEvent};

/// Client for a realtime bridge that emits one JSON `RealtimeEvent` per line
pub struct EventFeedClient {
    addr: String,
    reconnect_delay: Duration,
}

impl EventFeedClient {
    pub fn new(addr: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            addr: addr.into(),
            reconnect_delay,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Try to connect to the bridge, returns None if it is unreachable
    pub async fn connect(&self) -> Option<TcpStream> {
        match TcpStream::connect(&self.addr).await {
            Ok(stream) => {
                tracing::info!(addr = %self.addr, "Connected to realtime feed");
                Some(stream)
            }
            Err(e) => {
                tracing::debug!(addr = %self.addr, error = %e, "Failed to connect to realtime feed");
                None
            }
        }
    }

    /// Run the client, publishing events onto `bus`.
    /// Reconnects after `reconnect_delay` whenever the connection is lost.
    pub async fn run(self, bus: EventBus) {
        loop {
            if let Some(stream) = self.connect().await {
                if let Err(e) = read_events(stream, &bus).await {
                    tracing::warn!(addr = %self.addr, error = %e, "Realtime feed read error");
                }
                tracing::info!(addr = %self.addr, "Realtime feed disconnected");
            }

            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    pub fn spawn(self, bus: EventBus) -> JoinHandle<()> {
        tokio::spawn(self.run(bus))
    }
}

async fn read_events<R>(stream: R, bus: &EventBus) -> Result<(), std::io::Error>
where
    R: AsyncRead + Unpin,
{
    let reader = BufReader::new(stream);
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<RealtimeEvent>(&line) {
            Ok(event) => {
                bus.publish(event);
            }
            Err(e) => {
                tracing::debug!(error = %e, line = %line, "Skipping unparsable feed line");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_read_events_skips_garbage() {
        let bus = EventBus::new();
        let mut rx = bus.tx.subscribe();

        let input: &[u8] = b"{\"event\":\"notification\"}\nnot json\n\n{\"event\":\"indicator_hide\",\"data\":{}}\n";
        read_events(input, &bus).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().event, "notification");
        assert_eq!(rx.recv().await.unwrap().event, "indicator_hide");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_feed_publishes_from_tcp_bridge() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let bus = EventBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = bus.subscribe("notification", move |_| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(());
            }
        });

        let feed = EventFeedClient::new(addr, Duration::from_millis(10)).spawn(bus.clone());

        let (mut socket, _) = listener.accept().await.unwrap();
        socket
            .write_all(b"{\"event\":\"notification\",\"data\":{\"name\":\"NL-1\"}}\n")
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();

        feed.abort();
    }
}
