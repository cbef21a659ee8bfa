//! Radix-tree request router with a middleware chain in front.
//!
//! One tree per HTTP method. O(path-length) lookup. Middleware runs first, in
//! registration order; the first one to answer wins and routing is skipped.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{Handler, SharedEndpoint};
use crate::method::Method;
use crate::middleware::{self, BoxedMiddleware, Middleware};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each [`Router::on`] / [`Router::layer`] call returns `self` so
/// registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<SharedEndpoint>>,
    middleware: Vec<BoxedMiddleware>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), middleware: Vec::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// ```rust,no_run
    /// # use veil::{Method, Request, Response, Router, health};
    /// # async fn verify(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::Get, "/verify",  verify)
    ///     .on(Method::Get, "/healthz", health::liveness);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` conflicts with an already registered route.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_endpoint())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Append a middleware to the chain. Returns `self` for chaining.
    pub fn layer(mut self, m: impl Middleware) -> Self {
        self.middleware.push(Arc::new(m));
        self
    }

    /// Runs the middleware chain, then the matching handler.
    ///
    /// `HEAD` falls back to the `GET` handler when no `HEAD` route exists;
    /// hyper strips the body on the way out. Unknown paths get `404`; a path
    /// registered only under other methods gets `405`.
    pub async fn handle(&self, req: Request) -> Response {
        if let Some(res) = middleware::run(&self.middleware, &req) {
            return res;
        }

        let Ok(method) = req.method().parse::<Method>() else {
            return Response::status(Status::MethodNotAllowed);
        };

        let endpoint = self.lookup(method, req.path()).or_else(|| match method {
            Method::Head => self.lookup(Method::Get, req.path()),
            _ => None,
        });

        match endpoint {
            Some(endpoint) => endpoint.call(req).await,
            None if self.path_exists(req.path()) => Response::status(Status::MethodNotAllowed),
            None => Response::status(Status::NotFound),
        }
    }

    fn lookup(&self, method: Method, path: &str) -> Option<SharedEndpoint> {
        let matched = self.routes.get(&method)?.at(path).ok()?;
        Some(Arc::clone(matched.value))
    }

    fn path_exists(&self, path: &str) -> bool {
        self.routes.values().any(|tree| tree.at(path).is_ok())
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
