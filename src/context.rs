//! Per-request callback context.
//!
//! Every matched request gets its own [`Context`], allocated right after the
//! endpoint middleware succeeds and dropped once the response is handed to
//! the server. The context owns the request and a small state slot holding
//! the status and the pending response, so two requests in flight at the
//! same time can never observe each other's `send` or status.
//!
//! The callback receives the context by value. `Context` is a cheap handle
//! (`Arc` inside): clone it into spawned work if needed; the dispatcher keeps
//! its own handle to collect the response when the callback returns.
//!
//! ```rust,no_run
//! use apier::{Context, Status};
//! use serde_json::json;
//!
//! async fn create_user(ctx: Context) {
//!     ctx.set_status_code(Status::Created);
//!     ctx.send(json!({ "id": 1 }));
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::error::ErrorKind;
use crate::request::Request;
use crate::responder::Responder;
use crate::response::Response;
use crate::status::Status;

/// Handle passed to endpoint callbacks.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    req: Request,
    responder: Arc<dyn Responder>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    status: Status,
    response: Option<Response>,
}

impl Context {
    /// Binds a fresh context to `req`. `send` delegates to `responder`.
    pub fn new(req: Request, responder: Arc<dyn Responder>) -> Self {
        Self {
            inner: Arc::new(Inner { req, responder, state: Mutex::new(State::default()) }),
        }
    }

    /// The request this context is bound to.
    pub fn req(&self) -> &Request {
        &self.inner.req
    }

    /// Shortcut for `ctx.req().param(key)`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.inner.req.param(key)
    }

    /// Sets the status used by the next [`send`](Self::send).
    ///
    /// Has no effect on a response that was already sent.
    pub fn set_status_code(&self, status: Status) {
        let mut state = self.state();
        if state.response.is_some() {
            warn!(%status, "status set after send, ignoring");
            return;
        }
        state.status = status;
    }

    pub fn status(&self) -> Status {
        self.state().status
    }

    /// Builds the response for `data` with the current status.
    ///
    /// Only the first call counts; later calls are logged and ignored.
    pub fn send(&self, data: impl Serialize) {
        let mut state = self.state();
        if state.response.is_some() {
            warn!(path = self.inner.req.path(), "send called twice, ignoring");
            return;
        }
        let response = match serde_json::to_value(data) {
            Ok(value) => self.inner.responder.send(&self.inner.req, state.status, value),
            Err(e) => {
                error!(path = self.inner.req.path(), "failed to serialize response data: {e}");
                self.inner.responder.error(&self.inner.req, ErrorKind::InternalServerError)
            }
        };
        state.response = Some(response);
    }

    pub fn is_sent(&self) -> bool {
        self.state().response.is_some()
    }

    /// Takes the response built by `send`, or sends `null` with the current
    /// status if the callback never did.
    pub(crate) fn finish(&self) -> Response {
        if let Some(res) = self.state().response.take() {
            return res;
        }
        let status = self.status();
        self.inner.responder.send(&self.inner.req, status, Value::Null)
    }

    // A panic inside `send` cannot leave `State` half-written, so a poisoned
    // lock is still safe to use.
    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
