//! Access verification (authentication).
//!
//! An [`AccessVerifier`] is initialised once from [`AccessConfig`] when the
//! app is built, then consulted for every request by the [`VerifyAccess`]
//! stage. A verifier answers with:
//!
//! - `Ok(Some(identity))`: the caller is known,
//! - `Ok(None)`: anonymous caller, allowed through to the permission guard,
//! - `Err(_)`: the chain aborts, normally with `UNAUTHORIZED`.
//!
//! The default [`TokenVerifier`] checks `Authorization: Bearer <token>`
//! against the tokens granted in configuration.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::AccessConfig;
use crate::error::{BoxError, RequestError};
use crate::middleware::{Flow, Middleware};
use crate::request::Request;

/// A verified caller.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Identity {
    subject: String,
    permissions: HashSet<String>,
}

impl Identity {
    pub fn new<I, S>(subject: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject: subject.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn subject(&self) -> &str { &self.subject }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }
}

/// Authentication collaborator.
#[async_trait]
pub trait AccessVerifier: Send + Sync + 'static {
    /// One-time setup, called from `AppBuilder::build`.
    async fn init(&self, _config: &AccessConfig) -> Result<(), BoxError> {
        Ok(())
    }

    async fn verify(&self, req: &Request) -> Result<Option<Identity>, RequestError>;
}

/// Middleware stage that runs an [`AccessVerifier`] and stores the identity
/// on the request.
#[derive(Clone)]
pub struct VerifyAccess {
    verifier: Arc<dyn AccessVerifier>,
}

impl VerifyAccess {
    pub fn new(verifier: Arc<dyn AccessVerifier>) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl Middleware for VerifyAccess {
    fn name(&self) -> &'static str {
        "verify_access"
    }

    async fn handle(&self, req: &mut Request) -> Flow {
        match self.verifier.verify(req).await {
            Ok(identity) => {
                req.set_identity(identity);
                Flow::Next
            }
            Err(err) => Flow::Abort(err),
        }
    }
}

// ── TokenVerifier ─────────────────────────────────────────────────────────────

struct TokenTable {
    require_token: bool,
    grants: HashMap<String, Identity>,
}

/// Bearer-token verifier backed by the grants in [`AccessConfig`].
#[derive(Default)]
pub struct TokenVerifier {
    table: OnceLock<TokenTable>,
}

impl TokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }
}

fn bearer_token(req: &Request) -> Option<&str> {
    let value = req.header("authorization")?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

#[async_trait]
impl AccessVerifier for TokenVerifier {
    async fn init(&self, config: &AccessConfig) -> Result<(), BoxError> {
        let grants = config
            .tokens
            .iter()
            .map(|g| (g.token.clone(), Identity::new(g.subject.clone(), g.permissions.iter().cloned())))
            .collect::<HashMap<_, _>>();
        let count = grants.len();
        self.table
            .set(TokenTable { require_token: config.require_token, grants })
            .map_err(|_| "token verifier initialised twice")?;
        info!(tokens = count, require_token = config.require_token, "access verifier initialised");
        Ok(())
    }

    async fn verify(&self, req: &Request) -> Result<Option<Identity>, RequestError> {
        let table = self
            .table
            .get()
            .ok_or_else(|| RequestError::internal("token verifier used before init"))?;

        match bearer_token(req) {
            Some(token) => match table.grants.get(token) {
                Some(identity) => {
                    debug!(subject = identity.subject(), "access granted");
                    Ok(Some(identity.clone()))
                }
                None => Err(RequestError::unauthorized("unknown access token")),
            },
            None if table.require_token => Err(RequestError::unauthorized("missing access token")),
            None => Ok(None),
        }
    }
}
