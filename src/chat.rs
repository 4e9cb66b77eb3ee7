use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Inbound chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub from: String,
    pub text: String,
}

/// Outbound message fanned out to every stream subscriber.
/// `time` is the wall-clock time of receipt, formatted `HH:MM`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputMessage {
    pub from: String,
    pub text: String,
    pub time: String,
}

/// Broadcasts chat messages to all connected stream subscribers.
/// Nothing is persisted; lagging subscribers are dropped by the channel.
#[derive(Clone)]
pub struct ChatBroadcaster {
    tx: broadcast::Sender<String>,
}

impl Default for ChatBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self { tx }
    }

    /// Stamp the message with the current time-of-day and publish it.
    /// Returns the published message so the HTTP caller gets the same echo.
    pub fn publish(&self, message: ChatMessage) -> OutputMessage {
        let out = OutputMessage {
            from: message.from,
            text: message.text,
            time: chrono::Local::now().format("%H:%M").to_string(),
        };
        // Ignore errors — no subscribers is fine
        let _ = self
            .tx
            .send(serde_json::to_string(&out).unwrap_or_default());
        out
    }

    /// Subscribe to all published messages.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}
