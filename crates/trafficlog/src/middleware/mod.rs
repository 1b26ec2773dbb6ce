//! Middleware infrastructure
//!
//! [`TrafficLoggerLayer`] plugs into any host that drives a [`LayerStack`]:
//!
//! ```rust
//! use trafficlog::middleware::{next_fn, LayerStack, Request};
//! use trafficlog::{Body, MemorySink, TrafficLoggerLayer};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sink = MemorySink::new();
//! let stack = LayerStack::new()
//!     .with(TrafficLoggerLayer::builder().sink(sink.clone()).build().unwrap());
//!
//! let handler = next_fn(|_req: Request| async { http::Response::new(Body::from("hi")) });
//! let req = http::Request::get("/").body(Body::empty()).unwrap();
//! stack.execute(req, handler).await;
//!
//! assert_eq!(sink.contents_string().lines().count(), 2);
//! # }
//! ```

mod layer;
mod logger;

pub use layer::{next_fn, BoxedNext, LayerStack, MiddlewareLayer, Request, Response, ResponseFuture};
pub use logger::{TrafficLoggerBuilder, TrafficLoggerLayer};
