//! Incoming HTTP request type.
//!
//! A [`Request`] starts as the raw head and body collected by the server.
//! The global middleware chain then fills in the parsed JSON body, the
//! normalized data map, the verified identity and the responder. Route
//! parameters are set once an endpoint matches.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::request::Parts;
use serde_json::{Map, Value};

use crate::access::Identity;
use crate::responder::Responder;

/// An incoming HTTP request.
pub struct Request {
    head: Parts,
    body: Bytes,
    params: HashMap<String, String>,
    json: Option<Value>,
    data: Map<String, Value>,
    identity: Option<Identity>,
    responder: Option<Arc<dyn Responder>>,
}

impl Request {
    pub fn method(&self) -> &http::Method { &self.head.method }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn query(&self) -> Option<&str> { self.head.uri.query() }
    pub fn uri(&self) -> &http::Uri { &self.head.uri }
    pub fn headers(&self) -> &http::HeaderMap { &self.head.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Header lookup. Returns `None` for missing or non-UTF-8 values.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The JSON body, once [`JsonBody`](crate::middleware::JsonBody) has run.
    pub fn json(&self) -> Option<&Value> { self.json.as_ref() }

    pub fn set_json(&mut self, value: Value) {
        self.json = Some(value);
    }

    /// Normalized request data: query pairs overlaid with the fields of a
    /// JSON object body. Filled by [`DataParser`](crate::middleware::DataParser).
    pub fn data(&self) -> &Map<String, Value> { &self.data }
    pub fn data_mut(&mut self) -> &mut Map<String, Value> { &mut self.data }

    /// The caller identity established by access verification, if any.
    pub fn identity(&self) -> Option<&Identity> { self.identity.as_ref() }

    pub fn set_identity(&mut self, identity: Option<Identity>) {
        self.identity = identity;
    }

    /// The response builder attached by
    /// [`ResponderInit`](crate::middleware::ResponderInit).
    pub fn responder(&self) -> Option<&Arc<dyn Responder>> { self.responder.as_ref() }

    pub fn attach_responder(&mut self, responder: Arc<dyn Responder>) {
        self.responder = Some(responder);
    }

    /// Free-form typed storage for custom middleware.
    pub fn extensions(&self) -> &http::Extensions { &self.head.extensions }
    pub fn extensions_mut(&mut self) -> &mut http::Extensions { &mut self.head.extensions }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (head, body) = req.into_parts();
        Self {
            head,
            body,
            params: HashMap::new(),
            json: None,
            data: Map::new(),
            identity: None,
            responder: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> Request {
        http::Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Bytes::from_static(br#"{"a":1}"#))
            .unwrap()
            .into()
    }

    #[test]
    fn exposes_the_head() {
        let req = request("/users/42?verbose=1");
        assert_eq!(req.method(), http::Method::POST);
        assert_eq!(req.path(), "/users/42");
        assert_eq!(req.query(), Some("verbose=1"));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.body(), br#"{"a":1}"#);
    }

    #[test]
    fn starts_unparsed() {
        let req = request("/");
        assert!(req.json().is_none());
        assert!(req.data().is_empty());
        assert!(req.identity().is_none());
        assert!(req.responder().is_none());
        assert_eq!(req.param("id"), None);
    }
}
