// web/sse.rs — SSE bridge for the chat broadcast topic.
//
// GET /api/chat/stream
//
// Each message published on the chat broadcaster is forwarded to every
// subscriber as one `message` event.

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures_util::stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::AppContext;

pub async fn chat_stream(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    let rx = ctx.chat.subscribe();

    let s = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(payload) => {
                    let event = Event::default().event("message").data(payload);
                    return Some((Ok::<Event, Infallible>(event), rx));
                }
                // Slow consumer skipped some messages — keep streaming.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(s).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
