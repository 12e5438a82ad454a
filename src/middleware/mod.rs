//! Middleware layer.
//!
//! A middleware stage inspects or modifies the request and reports one of
//! three outcomes through [`Flow`]:
//!
//! - [`Flow::Next`]: continue with the next stage,
//! - [`Flow::Respond`]: stop; this response is final (e.g. a preflight `200`),
//! - [`Flow::Abort`]: stop; hand the error to the terminal handler.
//!
//! Stages are composed into a [`Pipeline`] once, at build time, and run in
//! insertion order for every request:
//!
//! ```text
//! RequestLog → Preflight → JsonBody → DataParser → ResponderInit → VerifyAccess
//!     → route match → permission guard → endpoint middleware → callback
//! ```

mod body;
mod data;
mod log;
mod preflight;
mod respond;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::RequestError;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

pub use body::JsonBody;
pub use data::DataParser;
pub use log::RequestLog;
pub use preflight::Preflight;
pub use respond::ResponderInit;

/// Outcome of one middleware stage.
#[derive(Debug)]
pub enum Flow {
    /// Continue to the next stage.
    Next,
    /// Terminate the chain with this response.
    Respond(Response),
    /// Terminate the chain and route the error to the terminal handler.
    Abort(RequestError),
}

impl Flow {
    pub fn respond(res: impl IntoResponse) -> Self {
        Self::Respond(res.into_response())
    }

    pub fn is_next(&self) -> bool {
        matches!(self, Self::Next)
    }
}

impl From<Result<(), RequestError>> for Flow {
    fn from(res: Result<(), RequestError>) -> Self {
        match res {
            Ok(())   => Self::Next,
            Err(err) => Self::Abort(err),
        }
    }
}

/// A request-processing stage.
///
/// Implementations are shared across concurrent requests and must keep
/// per-request state on the [`Request`], never on `self`.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Name used in logs when the stage short-circuits.
    fn name(&self) -> &'static str;

    async fn handle(&self, req: &mut Request) -> Flow;
}

/// An ordered chain of middleware stages.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage.
    pub fn with<M: Middleware + 'static>(self, stage: M) -> Self {
        self.with_arc(Arc::new(stage))
    }

    pub fn with_arc(mut self, stage: Arc<dyn Middleware>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Appends every stage of `other`, keeping its order.
    pub fn chain(mut self, other: Pipeline) -> Self {
        self.stages.extend(other.stages);
        self
    }

    pub fn len(&self) -> usize { self.stages.len() }
    pub fn is_empty(&self) -> bool { self.stages.is_empty() }

    /// Stage names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs every stage in order until one of them does not return
    /// [`Flow::Next`].
    pub async fn run(&self, req: &mut Request) -> Flow {
        for stage in &self.stages {
            match stage.handle(req).await {
                Flow::Next => {}
                Flow::Respond(res) => {
                    debug!(middleware = stage.name(), status = %res.status_code(), "middleware responded");
                    return Flow::Respond(res);
                }
                Flow::Abort(err) => {
                    debug!(middleware = stage.name(), kind = %err.kind(), "middleware aborted");
                    return Flow::Abort(err);
                }
            }
        }
        Flow::Next
    }
}

// ── Closure stages ────────────────────────────────────────────────────────────

/// Wraps a synchronous closure as a middleware stage.
///
/// ```rust
/// use apier::middleware::{from_fn, Flow, Pipeline};
/// use apier::Status;
///
/// let pipeline = Pipeline::new().with(from_fn("maintenance", |_req| {
///     Flow::respond(Status::ServiceUnavailable)
/// }));
/// assert_eq!(pipeline.names(), ["maintenance"]);
/// ```
pub fn from_fn<F>(name: &'static str, f: F) -> FnMiddleware<F>
where
    F: Fn(&mut Request) -> Flow + Send + Sync + 'static,
{
    FnMiddleware { name, f }
}

/// Stage produced by [`from_fn`].
pub struct FnMiddleware<F> {
    name: &'static str,
    f: F,
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut Request) -> Flow + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn handle(&self, req: &mut Request) -> Flow {
        (self.f)(req)
    }
}
