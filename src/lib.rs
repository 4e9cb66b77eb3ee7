pub mod chat;
pub mod config;
pub mod storage;
pub mod view;
pub mod web;

use std::sync::Arc;

use chat::ChatBroadcaster;
use config::ServerConfig;
use storage::Storage;
use view::Templates;

/// Shared application state passed to every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub storage: Arc<Storage>,
    /// View templates, compiled once at startup.
    pub templates: Arc<Templates>,
    /// Chat fan-out channel.
    pub chat: Arc<ChatBroadcaster>,
    pub started_at: std::time::Instant,
}
