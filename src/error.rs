//! Error types.
//!
//! Two families:
//!
//! - [`Error`] surfaces setup and infrastructure failures: binding a port,
//!   registering an invalid route, initialising a collaborator. These are
//!   fatal to startup and returned to the caller of `App::build`.
//! - [`RequestError`] is a per-request fault raised by a middleware stage or
//!   an endpoint callback. It carries a public [`ErrorKind`] that ends up in
//!   the response body, and a private source that only ever reaches the log.

use std::fmt;

use crate::config::ConfigError;
use crate::status::Status;

/// Boxed error used at collaborator seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by apier's fallible setup operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid route `{path}`: {source}")]
    Route {
        path: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("access verifier setup failed: {0}")]
    AccessInit(#[source] BoxError),

    #[error("database connection failed: {0}")]
    Database(#[source] BoxError),

    #[error("`database_url` is configured but no database was supplied")]
    MissingDatabase,
}

// ── ErrorKind ─────────────────────────────────────────────────────────────────

/// Stable, client-facing error identifier.
///
/// This is the only part of a failure that is ever written to a response.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    PayloadTooLarge,
    InternalServerError,
}

impl ErrorKind {
    /// The wire identifier, e.g. `"NOT_FOUND"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest          => "BAD_REQUEST",
            Self::Unauthorized        => "UNAUTHORIZED",
            Self::Forbidden           => "FORBIDDEN",
            Self::NotFound            => "NOT_FOUND",
            Self::PayloadTooLarge     => "PAYLOAD_TOO_LARGE",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(self) -> Status {
        match self {
            Self::BadRequest          => Status::BadRequest,
            Self::Unauthorized        => Status::Unauthorized,
            Self::Forbidden           => Status::Forbidden,
            Self::NotFound            => Status::NotFound,
            Self::PayloadTooLarge     => Status::ContentTooLarge,
            Self::InternalServerError => Status::InternalServerError,
        }
    }

    /// Client errors are the caller's fault and are logged at `warn`.
    pub fn is_client_error(self) -> bool {
        !matches!(self, Self::InternalServerError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── RequestError ──────────────────────────────────────────────────────────────

/// A fault raised while processing one request.
///
/// Forward it from a middleware with [`Flow::Abort`](crate::Flow::Abort) or
/// return it from an endpoint callback. The terminal handler logs it once and
/// answers with `kind` only.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RequestError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl RequestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), source: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Wraps an unexpected failure. The cause is kept for logging only.
    pub fn internal(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        Self {
            kind: ErrorKind::InternalServerError,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Attaches an underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ErrorKind { self.kind }
    pub fn message(&self) -> &str { &self.message }
}
