//! Application entry point.
//!
//! [`AppBuilder::build`] performs the one-time setup and composes the global
//! middleware chain. [`App::handle`] then drives one request through it:
//!
//! ```text
//! START → global middleware → route match ─ matched ──→ endpoint middleware → callback → response
//!                                         └ unmatched → NOT_FOUND
//! any stage ─────────────────────────────────────────→ error response
//! ```
//!
//! Every path ends in exactly one [`Response`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use tracing::{Instrument, error, info, info_span, warn};

use crate::access::{AccessVerifier, TokenVerifier, VerifyAccess};
use crate::config::Config;
use crate::context::Context;
use crate::database::Database;
use crate::error::{Error, ErrorKind, RequestError};
use crate::method::Method;
use crate::middleware::{DataParser, Flow, JsonBody, Pipeline, Preflight, RequestLog, ResponderInit};
use crate::permission::{GrantPermissioner, Permissioner};
use crate::request::Request;
use crate::responder::{EnvelopeResponder, Responder};
use crate::response::Response;
use crate::router::Router;

/// A built application: the request handler handed to the server.
///
/// Immutable after [`AppBuilder::build`]; share it behind an `Arc`.
pub struct App {
    global: Pipeline,
    router: Router,
    responder: Arc<dyn Responder>,
    config: Config,
}

/// Collects the router and collaborators before the one-time setup.
///
/// Every collaborator has a default: [`EnvelopeResponder`],
/// [`TokenVerifier`] and [`GrantPermissioner`]. A [`Database`] has none and
/// is only required when `database_url` is configured.
pub struct AppBuilder {
    config: Config,
    router: Router,
    responder: Arc<dyn Responder>,
    verifier: Arc<dyn AccessVerifier>,
    permissioner: Arc<dyn Permissioner>,
    database: Option<Arc<dyn Database>>,
}

impl App {
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder {
            config,
            router: Router::new(),
            responder: Arc::new(EnvelopeResponder),
            verifier: Arc::new(TokenVerifier::new()),
            permissioner: Arc::new(GrantPermissioner),
            database: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Global stage names in execution order.
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.global.names()
    }

    /// Processes one request to completion.
    pub async fn handle(&self, req: Request) -> Response {
        let span = info_span!("request", method = %req.method(), path = req.path());
        async move {
            let started = Instant::now();
            let res = self.process(req).await;
            info!(
                status = res.status_code().as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "request completed"
            );
            res
        }
        .instrument(span)
        .await
    }

    async fn process(&self, mut req: Request) -> Response {
        if let Some(res) = self.run_stage(&self.global, &mut req).await {
            return res;
        }

        let Some(method) = Method::from_http(req.method()) else {
            return self.not_found(&req);
        };
        let Some((endpoint, params)) = self.router.lookup(method, req.path()) else {
            return self.not_found(&req);
        };
        req.set_params(params);

        if let Some(res) = self.run_stage(endpoint.pipeline(), &mut req).await {
            return res;
        }

        let responder = req.responder().cloned().unwrap_or_else(|| Arc::clone(&self.responder));
        let ctx = Context::new(req, responder);
        let outcome = AssertUnwindSafe(endpoint.callback().call(ctx.clone()))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => ctx.finish(),
            Ok(Err(e)) => self.reject(ctx.req(), RequestError::internal(e)),
            Err(panic) => self.reject(ctx.req(), RequestError::internal(panic_message(&*panic))),
        }
    }

    /// `None` when the pipeline let the request through. A panicking stage
    /// is answered like an aborting one.
    async fn run_stage(&self, pipeline: &Pipeline, req: &mut Request) -> Option<Response> {
        let flow = AssertUnwindSafe(pipeline.run(req))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Flow::Abort(RequestError::internal(panic_message(&*panic))));
        match flow {
            Flow::Next => None,
            Flow::Respond(res) => Some(res),
            Flow::Abort(err) => Some(self.reject(req, err)),
        }
    }

    fn not_found(&self, req: &Request) -> Response {
        info!(method = %req.method(), path = req.path(), "no endpoint matched");
        self.responder_for(req).error(req, ErrorKind::NotFound)
    }

    /// Terminal error handler: logs the fault once and answers with its kind.
    fn reject(&self, req: &Request, err: RequestError) -> Response {
        if err.kind().is_client_error() {
            warn!(kind = %err.kind(), "request rejected: {}", err.message());
        } else if let Some(source) = std::error::Error::source(&err) {
            error!(kind = %err.kind(), %source, "request failed: {}", err.message());
        } else {
            error!(kind = %err.kind(), "request failed: {}", err.message());
        }
        self.responder_for(req).error(req, err.kind())
    }

    /// Structured error for failures outside the pipeline, such as an
    /// unreadable body.
    pub(crate) fn error_response(&self, req: &Request, kind: ErrorKind) -> Response {
        self.responder_for(req).error(req, kind)
    }

    fn responder_for<'a>(&'a self, req: &'a Request) -> &'a Arc<dyn Responder> {
        req.responder().unwrap_or(&self.responder)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "request handler panicked".to_owned())
}

impl AppBuilder {
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn responder(mut self, responder: impl Responder) -> Self {
        self.responder = Arc::new(responder);
        self
    }

    pub fn access_verifier(mut self, verifier: impl AccessVerifier) -> Self {
        self.verifier = Arc::new(verifier);
        self
    }

    pub fn permissioner(mut self, permissioner: impl Permissioner) -> Self {
        self.permissioner = Arc::new(permissioner);
        self
    }

    pub fn database(mut self, database: impl Database) -> Self {
        self.database = Some(Arc::new(database));
        self
    }

    /// Runs the one-time setup and composes the global chain.
    ///
    /// Fails if the access verifier cannot initialise, or if a database is
    /// configured and cannot be reached.
    pub async fn build(self) -> Result<App, Error> {
        let Self { config, mut router, responder, verifier, permissioner, database } = self;

        verifier.init(&config.access).await.map_err(Error::AccessInit)?;

        if let Some(url) = config.database_url.as_deref() {
            let database = database.ok_or(Error::MissingDatabase)?;
            database.connect(url).await.map_err(Error::Database)?;
            info!("database connected");
        }

        let global = Pipeline::new()
            .with(RequestLog)
            .with(Preflight)
            .with(JsonBody)
            .with(DataParser)
            .with(ResponderInit::new(Arc::clone(&responder)))
            .with(VerifyAccess::new(verifier));

        router.seal(&permissioner);

        info!(middleware = ?global.names(), "apier initialised");
        Ok(App { global, router, responder, config })
    }
}
