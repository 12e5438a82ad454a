//! # apier
//!
//! Endpoint registration and a fixed middleware chain on top of hyper.
//!
//! Every request runs through the same global chain, composed once at
//! startup:
//!
//! ```text
//! request log → preflight → JSON body → data → responder → access verification
//! ```
//!
//! then, for a matched endpoint, its permission guard, its own middleware,
//! and finally the endpoint callback. The callback gets a [`Context`] of its
//! own with two helpers, [`Context::set_status_code`] and [`Context::send`].
//!
//! Unmatched routes answer `NOT_FOUND`; anything that goes wrong answers a
//! structured error with a stable kind, never a stack trace.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use apier::{App, Config, Context, Endpoint, Method, Router, Server, Status};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), apier::Error> {
//!     apier::logging::init();
//!     let config = Config::from_env()?;
//!
//!     let router = Router::new()
//!         .endpoint([Method::Get], "/users/:id", get_user)?
//!         .register(
//!             Endpoint::new([Method::Post], "/users", create_user).permissions(["admin"]),
//!         )?;
//!
//!     let app = App::builder(config.clone()).router(router).build().await?;
//!     Server::from_config(&config).serve(app).await
//! }
//!
//! async fn get_user(ctx: Context) {
//!     let id = ctx.param("id").unwrap_or("unknown").to_owned();
//!     ctx.send(json!({ "id": id }));
//! }
//!
//! async fn create_user(ctx: Context) {
//!     ctx.set_status_code(Status::Created);
//!     ctx.send(json!({ "id": 99, "name": ctx.req().data().get("name") }));
//! }
//! ```

mod app;
mod config;
mod context;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod access;
pub mod database;
pub mod logging;
pub mod middleware;
pub mod permission;
pub mod responder;

pub use access::{AccessVerifier, Identity, TokenVerifier};
pub use app::{App, AppBuilder};
pub use config::{AccessConfig, Config, ConfigError, TokenGrant};
pub use context::Context;
pub use database::Database;
pub use error::{BoxError, Error, ErrorKind, RequestError};
pub use handler::{Handler, IntoOutcome};
pub use method::Method;
pub use middleware::{Flow, Middleware, Pipeline};
pub use permission::{GrantPermissioner, Permissioner, Permissions};
pub use request::Request;
pub use responder::{EnvelopeResponder, Responder};
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::{Endpoint, Router};
pub use server::Server;
pub use status::Status;
