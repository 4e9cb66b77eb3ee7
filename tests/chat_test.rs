//! Integration tests for the chat echo endpoint.

use std::net::SocketAddr;
use std::sync::Arc;
use taskboard::{
    chat::{ChatBroadcaster, OutputMessage},
    config::ServerConfig,
    storage::Storage,
    view::Templates,
    web, AppContext,
};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn make_test_ctx(dir: &TempDir) -> Arc<AppContext> {
    let data_dir = dir.path().to_path_buf();
    let config = Arc::new(ServerConfig::new(
        Some(0),
        Some(data_dir.clone()),
        None,
        None,
        None,
        Some("error".to_string()),
        None,
    ));
    let storage = Arc::new(Storage::new(&data_dir).await.unwrap());
    let templates = Arc::new(Templates::load(None).unwrap());
    Arc::new(AppContext {
        config,
        storage,
        templates,
        chat: Arc::new(ChatBroadcaster::new()),
        started_at: std::time::Instant::now(),
    })
}

async fn start_server(ctx: Arc<AppContext>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, web::build_router(ctx)).await.unwrap();
    });
    addr
}

async fn http_post_json(addr: SocketAddr, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "POST {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn chat_post_echoes_and_fans_out() {
    let dir = TempDir::new().unwrap();
    let ctx = make_test_ctx(&dir).await;
    let mut rx = ctx.chat.subscribe();
    let addr = start_server(ctx).await;

    let response =
        http_post_json(addr, "/api/chat", r#"{"from":"ana","text":"build it"}"#).await;
    assert!(response.starts_with("HTTP/1.1 200"));

    // The HTTP echo carries the stamped time.
    let body = response.split("\r\n\r\n").nth(1).unwrap();
    let echoed: OutputMessage = serde_json::from_str(body.trim()).unwrap();
    assert_eq!(echoed.from, "ana");
    assert_eq!(echoed.text, "build it");
    assert_eq!(echoed.time.len(), 5);

    // Every subscriber sees the same message.
    let raw = rx.recv().await.unwrap();
    let fanned: OutputMessage = serde_json::from_str(&raw).unwrap();
    assert_eq!(fanned.text, "build it");
    assert_eq!(fanned.time, echoed.time);
}

#[tokio::test]
async fn chat_rejects_invalid_body() {
    let dir = TempDir::new().unwrap();
    let ctx = make_test_ctx(&dir).await;
    let addr = start_server(ctx).await;

    let response = http_post_json(addr, "/api/chat", r#"{"from":"ana"}"#).await;
    // Missing `text` — axum's Json extractor rejects it before the handler.
    assert!(response.starts_with("HTTP/1.1 422"));
}
