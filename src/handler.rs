//! Handler trait, type erasure, and the hyper service adapter.
//!
//! # Two kinds of handler, one interface
//!
//! A host stores handlers of *different* types side by side, so each one is
//! hidden behind a trait object (`dyn ErasedHandler`) with a single `call`.
//!
//! ```text
//! async fn raw(req: Request) -> impl Render    ← plain handler
//! wrap(&binder, show, ["id"])?                 ← Wrapped action
//!        ↓ into_boxed_handler()
//! BoxedHandler = Arc<dyn ErasedHandler>        ← stored by the host
//!        ↓ handler.call(req) at request time
//! BoxFuture<Response>                          ← one vtable dispatch
//! ```
//!
//! [`service`] turns any handler into a `hyper::service::Service`, so it can
//! be served by hyper directly or sit behind whatever router the host uses.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use tracing::warn;

use crate::action::BoxFuture;
use crate::config::DEFAULT_MAX_BODY;
use crate::error::Error;
use crate::request::Request;
use crate::response::{Render, Response};
use crate::wrap::Wrapped;

// ── Internal types ────────────────────────────────────────────────────────────

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture<Response>;

    /// Largest body the hyper adapter buffers for this handler.
    fn body_limit(&self) -> usize {
        DEFAULT_MAX_BODY
    }
}

/// A heap-allocated, type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every value that can handle one request.
///
/// Satisfied by [`Wrapped`] actions and by any `async fn` with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl Render
/// ```
///
/// The trait is **sealed** (via the private `Sealed` supertrait): only the
/// implementations in this module can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Plain functions ───────────────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: Render + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: Render + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Newtype bridging a concrete handler `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: Render + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<Response> {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

// ── Wrapped actions ───────────────────────────────────────────────────────────

impl private::Sealed for Wrapped {}

impl Handler for Wrapped {
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl ErasedHandler for Wrapped {
    fn call(&self, req: Request) -> BoxFuture<Response> {
        Wrapped::call(self, req)
    }

    fn body_limit(&self) -> usize {
        self.binder().config().max_body
    }
}

// ── hyper adapter ─────────────────────────────────────────────────────────────

/// A handler as a `hyper::service::Service`.
///
/// The request body is buffered before the handler runs, up to the binder's
/// [`max_body`](crate::BindConfig::max_body) for wrapped actions and
/// [`DEFAULT_MAX_BODY`] otherwise. A larger body is answered with
/// `413 Payload Too Large`. Path variables are read from a
/// [`PathParams`](crate::PathParams) request extension.
#[derive(Clone)]
pub struct HandlerService {
    handler: BoxedHandler,
    max_body: usize,
}

/// Adapts `handler` for hyper.
pub fn service(handler: impl Handler) -> HandlerService {
    let handler = handler.into_boxed_handler();
    let max_body = handler.body_limit();
    HandlerService { handler, max_body }
}

impl HandlerService {
    /// Overrides the body limit.
    pub fn max_body(mut self, bytes: usize) -> Self {
        self.max_body = bytes;
        self
    }

    /// Handles an already-buffered request.
    pub fn handle(&self, req: Request) -> BoxFuture<Response> {
        self.handler.call(req)
    }
}

impl<B> hyper::service::Service<http::Request<B>> for HandlerService
where
    B: hyper::body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Response = http::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = BoxFuture<Result<Self::Response, Infallible>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let limit = self.max_body;
        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = match Limited::new(body, limit).collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    let e = if e.is::<LengthLimitError>() {
                        Error::PayloadTooLarge { limit }
                    } else {
                        Error::body(e)
                    };
                    warn!(error = %e, "failed to read request body");
                    return Ok(e.into_response().into_inner());
                }
            };
            let req = Request::from_http(http::Request::from_parts(parts, body));
            Ok(handler.call(req).await.into_inner())
        })
    }
}
