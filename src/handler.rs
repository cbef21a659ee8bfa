//! Handler trait and type erasure.
//!
//! Every route ends up as an [`Endpoint`] trait object so the router can keep
//! handlers of different concrete types in one tree:
//!
//! ```text
//! move |req| { let gate = gate.clone(); async move { gate.verify(&req) } }
//!        ↓ router.on(Method::Get, "/verify", …)
//! Arc<Closure<F>>  as  Arc<dyn Endpoint>
//!        ↓ per request
//! endpoint.call(req)  → Pin<Box<dyn Future<Output = Response>>>
//! ```
//!
//! Closures that capture shared state (an `Arc` of the gate, say) are
//! handlers exactly like plain `async fn`s.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

pub(crate) type ResponseFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Object-safe face of a handler. Not meant to be implemented by hand.
#[doc(hidden)]
pub trait Endpoint: Send + Sync + 'static {
    fn call(&self, req: Request) -> ResponseFuture;
}

pub(crate) type SharedEndpoint = Arc<dyn Endpoint>;

/// Anything the router accepts as a route handler.
///
/// Satisfied by every `Fn(Request) -> impl Future<Output = impl IntoResponse>`
/// that is `Send + Sync + 'static`; there is nothing to implement.
pub trait Handler: Send + Sync + 'static {
    #[doc(hidden)]
    fn into_endpoint(self) -> Arc<dyn Endpoint>;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_endpoint(self) -> Arc<dyn Endpoint> {
        Arc::new(Closure(self))
    }
}

struct Closure<F>(F);

impl<F, Fut, R> Endpoint for Closure<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> ResponseFuture {
        let pending = (self.0)(req);
        Box::pin(async move { pending.await.into_response() })
    }
}
