//! Response builder collaborator.
//!
//! A [`Responder`] turns callback data and error kinds into wire responses.
//! The default [`EnvelopeResponder`] wraps everything in a small JSON
//! envelope so that clients can tell success from failure without looking at
//! the status line:
//!
//! ```text
//! {"success": true,  "data": {"id": 1}}
//! {"success": false, "error": {"kind": "NOT_FOUND", "message": "Not Found"}}
//! ```

use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::error::ErrorKind;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// Builds structured responses. Shared across all requests.
pub trait Responder: Send + Sync + 'static {
    /// Writes a response carrying `data` with the given status.
    fn send(&self, req: &Request, status: Status, data: Value) -> Response;

    /// Writes a structured error response. Never includes internal detail.
    fn error(&self, req: &Request, kind: ErrorKind) -> Response;
}

/// The default JSON envelope responder.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvelopeResponder;

#[derive(Serialize)]
struct Envelope<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: &'static str,
}

impl EnvelopeResponder {
    fn render(status: Status, envelope: &Envelope<'_>) -> Response {
        match serde_json::to_vec(envelope) {
            Ok(bytes) => Response::builder().status(status).json(bytes),
            Err(e) => {
                error!("failed to serialize response envelope: {e}");
                Response::status(Status::InternalServerError)
            }
        }
    }
}

impl Responder for EnvelopeResponder {
    fn send(&self, _req: &Request, status: Status, data: Value) -> Response {
        // 204 and 304 must not carry a body.
        if matches!(status, Status::NoContent | Status::NotModified) {
            return Response::status(status);
        }
        Self::render(status, &Envelope {
            success: status.is_success(),
            data: Some(&data),
            error: None,
        })
    }

    fn error(&self, _req: &Request, kind: ErrorKind) -> Response {
        let status = kind.status();
        Self::render(status, &Envelope {
            success: false,
            data: None,
            error: Some(ErrorBody { kind: kind.as_str(), message: status.reason() }),
        })
    }
}
