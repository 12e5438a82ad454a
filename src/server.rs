//! HTTP server: accept loop, body collection and graceful shutdown.
//!
//! Each connection runs in its own task. A request body is collected up to
//! `body_limit` bytes before the [`App`] sees it, so callbacks and middleware
//! always work on a complete [`Request`].
//!
//! On SIGTERM or Ctrl-C (or the caller's signal) the loop stops accepting and
//! tells every open connection to finish: idle keep-alive connections close
//! at once, busy ones after their current response. Connections still open
//! once the drain timeout expires are aborted.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::app::App;
use crate::config::Config;
use crate::error::{Error, ErrorKind};
use crate::request::Request;

const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    body_limit: usize,
    drain_timeout: Duration,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr, body_limit: Config::default().body_limit, drain_timeout: DEFAULT_DRAIN_TIMEOUT }
    }

    /// Takes the listen address and body limit from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self { addr: config.listen, body_limit: config.body_limit, drain_timeout: DEFAULT_DRAIN_TIMEOUT }
    }

    /// How long shutdown waits for open connections before aborting them.
    /// Defaults to 30 s.
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Starts accepting connections and dispatching them through `app`.
    ///
    /// Returns after SIGTERM or Ctrl-C, once open connections have drained
    /// or the drain timeout has expired.
    pub async fn serve(self, app: App) -> Result<(), Error> {
        self.serve_with_shutdown(app, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops when `signal` resolves.
    pub async fn serve_with_shutdown(
        self,
        app: App,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_listener(listener, app, signal).await
    }

    /// Serves on an already-bound listener. The configured address is ignored.
    pub async fn serve_listener(
        self,
        listener: TcpListener,
        app: App,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let app = Arc::new(app);
        let body_limit = self.body_limit;

        info!(addr = %listener.local_addr()?, "apier listening");

        let mut tasks = tokio::task::JoinSet::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(());

        tokio::pin!(signal);

        loop {
            tokio::select! {
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);
                    let mut shutdown = shutdown_rx.clone();

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { dispatch(app, req, body_limit).await }
                        });

                        // HTTP/1.1 and HTTP/2, whatever the client negotiates.
                        let builder = ConnBuilder::new(TokioExecutor::new());
                        let conn = builder.serve_connection(io, svc);
                        tokio::pin!(conn);

                        let res = tokio::select! {
                            res = conn.as_mut() => res,
                            _ = shutdown.changed() => {
                                conn.as_mut().graceful_shutdown();
                                conn.await
                            }
                        };
                        if let Err(e) = res {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Wakes every connection task; each one finishes its current
        // response and closes.
        let _ = shutdown_tx.send(());
        let drained = tokio::time::timeout(self.drain_timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(remaining = tasks.len(), "drain timeout expired, aborting open connections");
            tasks.shutdown().await;
        }

        info!("apier stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Collects the body, then hands the request to the app.
///
/// The error type is [`Infallible`](std::convert::Infallible): every failure
/// becomes a response, so hyper never sees an error.
async fn dispatch(
    app: Arc<App>,
    req: hyper::Request<hyper::body::Incoming>,
    body_limit: usize,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let (head, body) = req.into_parts();

    let body = match Limited::new(body, body_limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let req = Request::from(http::Request::from_parts(head, Bytes::new()));
            let kind = if e.downcast_ref::<http_body_util::LengthLimitError>().is_some() {
                ErrorKind::PayloadTooLarge
            } else {
                ErrorKind::BadRequest
            };
            warn!(path = req.path(), %kind, "failed to read request body: {e}");
            return Ok(app.error_response(&req, kind).into_inner());
        }
    };

    let res = app.handle(Request::from(http::Request::from_parts(head, body))).await;
    Ok(res.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available. A handler that cannot be installed
/// is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
