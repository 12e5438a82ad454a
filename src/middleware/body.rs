//! JSON body parsing stage.

use async_trait::async_trait;

use super::{Flow, Middleware};
use crate::error::RequestError;
use crate::request::Request;

/// Parses `application/json` (and `*+json`) bodies into
/// [`Request::json`]. Other content types and empty bodies pass untouched.
/// A malformed JSON body aborts the chain with `BAD_REQUEST`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonBody;

fn is_json(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or("").trim();
    mime.eq_ignore_ascii_case("application/json")
        || mime.rsplit_once('+').is_some_and(|(_, suffix)| suffix.eq_ignore_ascii_case("json"))
}

#[async_trait]
impl Middleware for JsonBody {
    fn name(&self) -> &'static str {
        "json_body"
    }

    async fn handle(&self, req: &mut Request) -> Flow {
        if req.body().is_empty() || !req.header("content-type").is_some_and(is_json) {
            return Flow::Next;
        }
        match serde_json::from_slice(req.body()) {
            Ok(value) => {
                req.set_json(value);
                Flow::Next
            }
            Err(e) => Flow::Abort(RequestError::bad_request("malformed JSON body").with_source(e)),
        }
    }
}
