//! Endpoint authorization.
//!
//! Every endpoint declares the [`Permissions`] it requires. An empty set
//! means the endpoint is public. At build time the app turns each set into a
//! [`RequirePermissions`] guard with [`guard`]; the guard runs first in the
//! endpoint's own pipeline, after access verification has settled the
//! caller's identity.

use std::sync::Arc;

use async_trait::async_trait;

use crate::access::Identity;
use crate::error::RequestError;
use crate::middleware::{Flow, Middleware};
use crate::request::Request;

/// The permissions an endpoint requires. Empty means public.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Permissions(Vec<String>);

impl Permissions {
    /// No authorization requirement.
    pub fn public() -> Self {
        Self(Vec::new())
    }

    pub fn is_public(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Permissions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Authorization collaborator.
#[async_trait]
pub trait Permissioner: Send + Sync + 'static {
    /// Decides whether `identity` may call an endpoint requiring `required`.
    /// Only consulted for non-public endpoints.
    async fn authorize(
        &self,
        identity: Option<&Identity>,
        required: &Permissions,
    ) -> Result<(), RequestError>;
}

/// Builds the authorization stage for one endpoint.
pub fn guard(permissioner: Arc<dyn Permissioner>, required: Permissions) -> RequirePermissions {
    RequirePermissions { permissioner, required }
}

/// Middleware stage produced by [`guard`].
pub struct RequirePermissions {
    permissioner: Arc<dyn Permissioner>,
    required: Permissions,
}

#[async_trait]
impl Middleware for RequirePermissions {
    fn name(&self) -> &'static str {
        "require_permissions"
    }

    async fn handle(&self, req: &mut Request) -> Flow {
        if self.required.is_public() {
            return Flow::Next;
        }
        self.permissioner.authorize(req.identity(), &self.required).await.into()
    }
}

// ── GrantPermissioner ─────────────────────────────────────────────────────────

/// Default permissioner: the identity must hold every required permission.
///
/// Anonymous callers get `UNAUTHORIZED`; known callers missing a permission
/// get `FORBIDDEN`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GrantPermissioner;

#[async_trait]
impl Permissioner for GrantPermissioner {
    async fn authorize(
        &self,
        identity: Option<&Identity>,
        required: &Permissions,
    ) -> Result<(), RequestError> {
        let identity = identity.ok_or_else(|| RequestError::unauthorized("authentication required"))?;
        match required.iter().find(|p| !identity.has_permission(p)) {
            Some(missing) => Err(RequestError::forbidden(format!(
                "`{}` lacks permission `{missing}`",
                identity.subject()
            ))),
            None => Ok(()),
        }
    }
}
