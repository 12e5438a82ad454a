//! Endpoint registry.
//!
//! One radix tree per HTTP method, delegated to [`matchit`]. Each tree maps
//! a path pattern to an index into the endpoint table, so an endpoint
//! registered for several methods is stored once and bound once per method.
//!
//! Registration happens at startup only. [`App`](crate::App) takes ownership of
//! the router, prepends each endpoint's permission guard, and never mutates it
//! again.

use std::collections::HashMap;

use matchit::{InsertError, Router as MatchitRouter};
use tracing::{info, warn};

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{Middleware, Pipeline};
use crate::permission::{self, Permissioner, Permissions};

// ── Endpoint ──────────────────────────────────────────────────────────────────

/// An endpoint registration: methods, path pattern, options and callback.
///
/// ```rust,no_run
/// # use apier::{Context, Endpoint, Method};
/// # async fn list_users(_: Context) {}
/// Endpoint::new([Method::Get, Method::Post], "/users", list_users)
///     .permissions(["admin"]);
/// ```
pub struct Endpoint {
    methods: Vec<Method>,
    path: String,
    middlewares: Pipeline,
    permissions: Permissions,
    callback: BoxedHandler,
}

impl Endpoint {
    /// A public endpoint with no extra middleware.
    pub fn new(methods: impl IntoIterator<Item = Method>, path: &str, callback: impl Handler) -> Self {
        Self {
            methods: methods.into_iter().collect(),
            path: normalize_path(path),
            middlewares: Pipeline::new(),
            permissions: Permissions::public(),
            callback: callback.into_boxed_handler(),
        }
    }

    /// Requires the caller to hold every listed permission.
    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().collect();
        self
    }

    /// Appends an endpoint-specific stage, run after the permission guard.
    pub fn middleware<M: Middleware + 'static>(mut self, stage: M) -> Self {
        self.middlewares = self.middlewares.with(stage);
        self
    }

    /// Replaces the endpoint-specific stages.
    pub fn middlewares(mut self, pipeline: Pipeline) -> Self {
        self.middlewares = pipeline;
        self
    }

    pub fn path(&self) -> &str { &self.path }
    pub fn methods(&self) -> &[Method] { &self.methods }

    pub(crate) fn pipeline(&self) -> &Pipeline { &self.middlewares }
    pub(crate) fn callback(&self) -> &BoxedHandler { &self.callback }
}

/// Rewrites `:name` and `*name` segments into matchit's `{name}` / `{*name}`.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*') {
                format!("{{*{name}}}")
            } else {
                segment.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The endpoint registry.
///
/// Each [`Router::register`] call returns `Result<Self, Error>` so
/// registrations chain with `?`.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, MatchitRouter<usize>>,
    endpoints: Vec<Endpoint>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an endpoint for every one of its methods.
    ///
    /// Registering the same method and pattern again replaces the earlier
    /// endpoint. A pattern that conflicts with a *different* pattern is
    /// rejected.
    pub fn register(mut self, endpoint: Endpoint) -> Result<Self, Error> {
        let index = self.endpoints.len();
        for &method in &endpoint.methods {
            let tree = self.routes.entry(method).or_default();
            match tree.insert(endpoint.path.as_str(), index) {
                Ok(()) => {}
                Err(InsertError::Conflict { with, .. }) if with == endpoint.path => {
                    tree.remove(endpoint.path.as_str());
                    warn!(%method, path = %endpoint.path, "endpoint registered twice, replacing");
                    tree.insert(endpoint.path.as_str(), index)
                        .map_err(|source| Error::Route { path: endpoint.path.clone(), source })?;
                }
                Err(source) => return Err(Error::Route { path: endpoint.path.clone(), source }),
            }
            info!(%method, path = %endpoint.path, "endpoint registered");
        }
        self.endpoints.push(endpoint);
        Ok(self)
    }

    /// Positional shorthand for a public endpoint without extra middleware.
    pub fn endpoint(
        self,
        methods: impl IntoIterator<Item = Method>,
        path: &str,
        callback: impl Handler,
    ) -> Result<Self, Error> {
        self.register(Endpoint::new(methods, path, callback))
    }

    /// Prepends each endpoint's permission guard to its pipeline.
    pub(crate) fn seal(&mut self, permissioner: &std::sync::Arc<dyn Permissioner>) {
        for endpoint in &mut self.endpoints {
            let guard = permission::guard(std::sync::Arc::clone(permissioner), endpoint.permissions.clone());
            let own = std::mem::take(&mut endpoint.middlewares);
            endpoint.middlewares = Pipeline::new().with(guard).chain(own);
        }
    }

    pub(crate) fn lookup(&self, method: Method, path: &str) -> Option<(&Endpoint, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let endpoint = self.endpoints.get(*matched.value)?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((endpoint, params))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::context::Context;
    use crate::permission::GrantPermissioner;

    async fn noop(_ctx: Context) {}

    #[test]
    fn normalizes_colon_and_star_segments() {
        assert_eq!(normalize_path("/users/:id"), "/users/{id}");
        assert_eq!(normalize_path("/files/*rest"), "/files/{*rest}");
        assert_eq!(normalize_path("/users/{id}/posts"), "/users/{id}/posts");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn binds_every_method_to_one_endpoint() {
        let router = Router::new()
            .endpoint([Method::Get, Method::Post], "/users", noop)
            .unwrap();

        let (get, _) = router.lookup(Method::Get, "/users").unwrap();
        let (post, _) = router.lookup(Method::Post, "/users").unwrap();
        assert!(std::ptr::eq(get, post));
        assert!(router.lookup(Method::Delete, "/users").is_none());
        assert_eq!(router.endpoints.len(), 1);
    }

    #[test]
    fn extracts_parameters() {
        let router = Router::new().endpoint([Method::Get], "/users/:id", noop).unwrap();
        let (endpoint, params) = router.lookup(Method::Get, "/users/42").unwrap();
        assert_eq!(endpoint.path(), "/users/{id}");
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn last_registration_wins() {
        let router = Router::new()
            .register(Endpoint::new([Method::Get], "/users", noop))
            .unwrap()
            .register(Endpoint::new([Method::Get], "/users", noop).permissions(["admin"]))
            .unwrap();

        let (endpoint, _) = router.lookup(Method::Get, "/users").unwrap();
        assert_eq!(endpoint.permissions.iter().collect::<Vec<_>>(), ["admin"]);
    }

    #[test]
    fn rejects_conflicting_patterns() {
        let err = Router::new()
            .endpoint([Method::Get], "/users/{id}", noop)
            .unwrap()
            .endpoint([Method::Get], "/users/{name}", noop)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Route { .. }));
    }

    #[test]
    fn seal_prepends_the_permission_guard() {
        let stage = crate::middleware::from_fn("audit", |_| crate::Flow::Next);
        let mut router = Router::new()
            .register(Endpoint::new([Method::Get], "/admin", noop).permissions(["admin"]).middleware(stage))
            .unwrap();

        let permissioner: Arc<dyn Permissioner> = Arc::new(GrantPermissioner);
        router.seal(&permissioner);

        let (endpoint, _) = router.lookup(Method::Get, "/admin").unwrap();
        assert_eq!(endpoint.pipeline().names(), ["require_permissions", "audit"]);
    }
}
