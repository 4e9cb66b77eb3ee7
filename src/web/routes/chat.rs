// web/routes/chat.rs — Chat echo endpoint.
//
// Republishes each message, tagged with the time of receipt, to all
// /api/chat/stream subscribers. Nothing is persisted.

use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::debug;

use crate::chat::{ChatMessage, OutputMessage};
use crate::AppContext;

pub async fn send(
    State(ctx): State<Arc<AppContext>>,
    Json(message): Json<ChatMessage>,
) -> Json<OutputMessage> {
    debug!(from = %message.from, "chat message received");
    Json(ctx.chat.publish(message))
}
