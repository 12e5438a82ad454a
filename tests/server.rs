use std::net::SocketAddr;
use std::time::Duration;

use apier::{App, Config, Context, Method, Router, Server, Status};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

async fn create(ctx: Context) {
    let name = ctx.req().data().get("name").cloned().unwrap_or(Value::Null);
    ctx.set_status_code(Status::Created);
    ctx.send(json!({ "name": name }));
}

async fn start(config: Config) -> (SocketAddr, oneshot::Sender<()>, JoinHandle<Result<(), apier::Error>>) {
    let router = Router::new().endpoint([Method::Post], "/users", create).unwrap();
    let app = App::builder(config.clone()).router(router).build().await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let server = tokio::spawn(Server::from_config(&config).serve_listener(listener, app, async {
        let _ = rx.await;
    }));
    (addr, tx, server)
}

/// Sends one HTTP/1.1 request and returns the status code and body.
async fn post(addr: SocketAddr, body: &str) -> (u16, Value) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let raw = format!(
        "POST /users HTTP/1.1\r\nhost: localhost\r\ncontent-type: application/json\r\n\
         content-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    let text = String::from_utf8(buf).unwrap();

    let status = text.split(' ').nth(1).unwrap().parse().unwrap();
    let (_, payload) = text.split_once("\r\n\r\n").unwrap();
    (status, serde_json::from_str(payload).unwrap_or(Value::Null))
}

#[tokio::test]
async fn serves_requests_and_shuts_down() {
    let (addr, shutdown, server) = start(Config::default()).await;

    let (status, body) = post(addr, r#"{"name":"alice"}"#).await;
    assert_eq!(status, 201);
    assert_eq!(body, json!({ "success": true, "data": { "name": "alice" } }));

    shutdown.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let config = Config { body_limit: 16, ..Config::default() };
    let (addr, shutdown, server) = start(config).await;

    let (status, body) = post(addr, r#"{"name":"a name well past sixteen bytes"}"#).await;
    assert_eq!(status, 413);
    assert_eq!(body["error"]["kind"], json!("PAYLOAD_TOO_LARGE"));

    let (status, _) = post(addr, r#"{"name":"bo"}"#).await;
    assert_eq!(status, 201);

    shutdown.send(()).unwrap();
    server.await.unwrap().unwrap();
}

/// Reads exactly one response off a connection that stays open.
async fn read_one_response(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before a full response");
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some((head, body)) = text.split_once("\r\n\r\n") {
            let length = head
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .map(|(_, value)| value.trim().parse::<usize>().unwrap())
                .unwrap_or(0);
            if body.len() >= length {
                return text.into_owned();
            }
        }
    }
}

#[tokio::test]
async fn idle_keep_alive_connection_does_not_block_shutdown() {
    let (addr, shutdown, server) = start(Config::default()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let body = r#"{"name":"carol"}"#;
    let raw = format!(
        "POST /users HTTP/1.1\r\nhost: localhost\r\ncontent-type: application/json\r\n\
         content-length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(raw.as_bytes()).await.unwrap();
    let response = read_one_response(&mut stream).await;
    assert!(response.starts_with("HTTP/1.1 201"));

    // The connection is still open and idle.
    shutdown.send(()).unwrap();
    timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop with an idle connection open")
        .unwrap()
        .unwrap();

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn drain_timeout_aborts_stuck_connections() {
    let router = Router::new()
        .endpoint([Method::Get], "/slow", |ctx: Context| async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            ctx.send(json!("late"));
        })
        .unwrap();
    let app = App::builder(Config::default()).router(router).build().await.unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let server = tokio::spawn(
        Server::from_config(&Config::default())
            .drain_timeout(Duration::from_millis(200))
            .serve_listener(listener, app, async {
                let _ = rx.await;
            }),
    );

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET /slow HTTP/1.1\r\nhost: localhost\r\n\r\n").await.unwrap();
    // Let the request reach the callback before shutting down.
    tokio::time::sleep(Duration::from_millis(100)).await;

    tx.send(()).unwrap();
    timeout(Duration::from_secs(5), server)
        .await
        .expect("server ignored the drain timeout")
        .unwrap()
        .unwrap();
}
