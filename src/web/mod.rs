// web/mod.rs — HTML task views + chat API server.
//
// Endpoints:
//   GET  /                   task list (first page)
//   GET  /views/tasks        paginated task list
//   GET  /views/tasks/{key}  task list with selection + rendered form
//   POST /api/chat           chat echo
//   GET  /api/chat/stream    chat fan-out (SSE)
//   GET  /api/health         health probe

pub mod routes;
pub mod sse;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_web_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("taskboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        // Task list views
        .route("/", get(routes::tasks::index))
        .route("/views/tasks", get(routes::tasks::task_list))
        .route(
            "/views/tasks/{key}",
            get(routes::tasks::task_list_with_selection),
        )
        // Chat echo
        .route("/api/chat", post(routes::chat::send))
        .route("/api/chat/stream", get(sse::chat_stream))
        // Health (no auth)
        .route("/api/health", get(routes::health::health))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
