//! Middleware layer.
//!
//! Middleware sees every request before routing and may answer it outright.
//! The gate's request classifier is one; anything that only needs the
//! request head (header checks, allow-lists, request tagging) fits here too.
//!
//! ```rust
//! use veil::middleware::Middleware;
//! use veil::{Request, Response, Status};
//!
//! struct RequireHost;
//!
//! impl Middleware for RequireHost {
//!     fn before(&self, req: &Request) -> Option<Response> {
//!         match req.header("host") {
//!             Some(_) => None,
//!             None => Some(Response::status(Status::BadRequest)),
//!         }
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::request::Request;
use crate::response::Response;

/// A synchronous request filter.
///
/// Return `None` to let the request continue down the chain, or `Some`
/// response to stop it there. Implementations must not block: anything slow
/// (network calls, disk) belongs in a background task.
pub trait Middleware: Send + Sync + 'static {
    fn before(&self, req: &Request) -> Option<Response>;
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// Runs `chain` in order and returns the first short-circuit response.
pub(crate) fn run(chain: &[BoxedMiddleware], req: &Request) -> Option<Response> {
    chain.iter().find_map(|m| m.before(req))
}
