//! Host seam: middleware over `http` requests and responses
//!
//! A host framework hands each request to a [`LayerStack`] together with the
//! terminal handler as a [`BoxedNext`]. Every [`MiddlewareLayer`] sees the
//! request on the way in and the response on the way out.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::future::Future;
use std::sync::Arc;
use trafficlog_core::Body;

/// Request type seen by middleware
pub type Request = http::Request<Body>;

/// Response type seen by middleware
pub type Response = http::Response<Body>;

/// Future returned by middleware and handlers
pub type ResponseFuture = BoxFuture<'static, Response>;

/// A boxed next function for middleware chains
pub type BoxedNext = Arc<dyn Fn(Request) -> ResponseFuture + Send + Sync>;

/// Box an async function as the next step of a chain.
pub fn next_fn<F, Fut>(f: F) -> BoxedNext
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| f(req).boxed())
}

/// Trait for middleware that wraps the rest of the chain
pub trait MiddlewareLayer: Send + Sync + 'static {
    /// Apply this middleware to a request, calling `next` to continue the chain
    fn call(&self, req: Request, next: BoxedNext) -> ResponseFuture;

    /// Clone this middleware into a boxed trait object
    fn clone_box(&self) -> Box<dyn MiddlewareLayer>;
}

impl Clone for Box<dyn MiddlewareLayer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Ordered middleware around a terminal handler.
///
/// The first layer pushed sees the request first and the response last. Put
/// the traffic logger first to record the response the client receives.
#[derive(Clone, Default)]
pub struct LayerStack {
    layers: Vec<Box<dyn MiddlewareLayer>>,
}

impl LayerStack {
    /// An empty stack; requests go straight to the handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `layer` inside the layers already pushed.
    pub fn push(&mut self, layer: Box<dyn MiddlewareLayer>) {
        self.layers.push(layer);
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, layer: impl MiddlewareLayer) -> Self {
        self.push(Box::new(layer));
        self
    }

    /// Run `req` through every layer and then `handler`.
    pub fn execute(&self, req: Request, handler: BoxedNext) -> ResponseFuture {
        let chain = self.layers.iter().rev().fold(handler, |next, layer| {
            let layer = layer.clone_box();
            let wrapped: BoxedNext = Arc::new(move |req: Request| layer.call(req, next.clone()));
            wrapped
        });
        chain(req)
    }
}
