#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use apier::{AccessConfig, Config, Request, Response, TokenGrant};
use bytes::Bytes;
use serde_json::Value;
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::Layer;

pub fn request(method: &str, uri: &str) -> Request {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
        .into()
}

pub fn authed(method: &str, uri: &str, token: &str) -> Request {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Bytes::new())
        .unwrap()
        .into()
}

pub fn json_request(method: &str, uri: &str, body: &str) -> Request {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Bytes::from(body.to_owned()))
        .unwrap()
        .into()
}

pub fn body_json(res: &Response) -> Value {
    serde_json::from_slice(res.body()).expect("response body is not JSON")
}

pub fn error_kind(res: &Response) -> String {
    body_json(res)["error"]["kind"].as_str().unwrap_or_default().to_owned()
}

/// alice holds `admin`, bob only `read`.
pub fn config_with_tokens() -> Config {
    Config {
        access: AccessConfig {
            require_token: false,
            tokens: vec![
                TokenGrant { token: "alice-token".into(), subject: "alice".into(), permissions: vec!["admin".into()] },
                TokenGrant { token: "bob-token".into(), subject: "bob".into(), permissions: vec!["read".into()] },
            ],
        },
        ..Config::default()
    }
}

pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

pub fn hits(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Counts `ERROR`-level events on the current thread.
struct ErrorCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: LayerContext<'_, S>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Installs an error-counting subscriber for the current thread. Use with a
/// current-thread runtime (the `#[tokio::test]` default).
pub fn count_errors() -> (Arc<AtomicUsize>, tracing::subscriber::DefaultGuard) {
    let count = counter();
    let subscriber = tracing_subscriber::registry().with(ErrorCounter(Arc::clone(&count)));
    (count, tracing::subscriber::set_default(subscriber))
}
