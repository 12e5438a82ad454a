//! CORS preflight short-circuit.

use async_trait::async_trait;

use super::{Flow, Middleware};
use crate::request::Request;
use crate::status::Status;

/// Answers every `OPTIONS` request with `200 OK` and an empty body.
///
/// Runs before access verification so that preflight checks never need
/// credentials, and before routing so that no endpoint callback is invoked.
#[derive(Clone, Copy, Debug, Default)]
pub struct Preflight;

#[async_trait]
impl Middleware for Preflight {
    fn name(&self) -> &'static str {
        "preflight"
    }

    async fn handle(&self, req: &mut Request) -> Flow {
        if req.method() == http::Method::OPTIONS {
            Flow::respond(Status::Ok)
        } else {
            Flow::Next
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn request(method: &str) -> Request {
        http::Request::builder().method(method).uri("/anything").body(Bytes::new()).unwrap().into()
    }

    #[tokio::test]
    async fn answers_options_with_empty_ok() {
        match Preflight.handle(&mut request("OPTIONS")).await {
            Flow::Respond(res) => {
                assert_eq!(res.status_code(), http::StatusCode::OK);
                assert!(res.body().is_empty());
            }
            other => panic!("expected a response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn passes_other_methods() {
        assert!(Preflight.handle(&mut request("GET")).await.is_next());
    }
}
