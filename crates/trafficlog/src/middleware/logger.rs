//! Traffic logging middleware
//!
//! Each request passes through two decisions. The request-phase decision runs
//! before the handler with the status unknown; the response-phase decision
//! runs after the handler with the status known. Both records of a pair carry
//! the same [`RequestLogId`].
//!
//! When inclusion depends on the status (a status filter, a status-scoped
//! `only` alternative or a status-scoped exclusion), the rendered request
//! record is held back and written just before the response record, or
//! dropped together with it.

use super::layer::{BoxedNext, MiddlewareLayer, Request, Response, ResponseFuture};
use crate::format::{Formatter, JsonFormatter};
use crate::sink::{Sink, WriterSink};
use http::header::CONTENT_ENCODING;
use http::HeaderMap;
use std::fmt;
use std::sync::Arc;
use trafficlog_core::capture::{capture, ContentEncoding};
use trafficlog_core::{
    Body, ConfigError, FacetSet, PhaseRecord, RequestLine, RequestLogId, Ruleset, StatusLine,
    Token,
};

/// HTTP traffic logging middleware layer.
///
/// # Example
///
/// ```rust
/// use trafficlog::{MemorySink, StreamFormatter, TrafficLoggerLayer};
///
/// let sink = MemorySink::new();
/// let layer = TrafficLoggerLayer::builder()
///     .tokens(["headers", "post"])
///     .formatter(StreamFormatter::new())
///     .sink(sink.clone())
///     .build()
///     .unwrap();
/// # let _ = layer;
/// ```
#[derive(Clone)]
pub struct TrafficLoggerLayer {
    inner: Arc<Inner>,
}

struct Inner {
    rules: Ruleset,
    formatter: Box<dyn Formatter>,
    sink: Box<dyn Sink>,
}

impl TrafficLoggerLayer {
    /// Start configuring a layer.
    pub fn builder() -> TrafficLoggerBuilder {
        TrafficLoggerBuilder::default()
    }

    /// Layer with an already resolved ruleset, JSON lines on stdout.
    pub fn new(rules: Ruleset) -> Self {
        Self::from_parts(
            rules,
            Box::new(JsonFormatter::new()),
            Box::new(WriterSink::stdout()),
        )
    }

    fn from_parts(rules: Ruleset, formatter: Box<dyn Formatter>, sink: Box<dyn Sink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                rules,
                formatter,
                sink,
            }),
        }
    }

    /// The resolved rules.
    pub fn rules(&self) -> &Ruleset {
        &self.inner.rules
    }
}

impl fmt::Debug for TrafficLoggerLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrafficLoggerLayer")
            .field("rules", &self.inner.rules)
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn emit(&self, id: &RequestLogId, rendered: &[u8]) {
        if let Err(err) = self.sink.append(rendered) {
            tracing::error!(request_log_id = %id, error = %err, "failed to write traffic log record");
        }
    }

    fn request_record(&self, req: &mut Request, id: &RequestLogId, facets: FacetSet) -> PhaseRecord {
        let mut record = PhaseRecord::request(id.clone(), RequestLine::from_request(req));
        if facets.request_headers {
            record = record.with_headers(req.headers());
        }
        if facets.request_bodies {
            let encoding = content_encoding(req.headers());
            record = record.with_capture(capture_logged(req.body_mut(), &encoding, id));
        }
        record
    }

    fn response_record(
        &self,
        res: &mut Response,
        id: &RequestLogId,
        facets: FacetSet,
    ) -> PhaseRecord {
        let mut record = PhaseRecord::response(id.clone(), StatusLine::from_response(res));
        if facets.response_headers {
            record = record.with_headers(res.headers());
        }
        if facets.response_bodies {
            let encoding = content_encoding(res.headers());
            record = record.with_capture(capture_logged(res.body_mut(), &encoding, id));
        }
        record
    }
}

fn content_encoding(headers: &HeaderMap) -> ContentEncoding {
    ContentEncoding::from_header(
        headers
            .get(CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok()),
    )
}

fn capture_logged(
    body: &mut Body,
    encoding: &ContentEncoding,
    id: &RequestLogId,
) -> Result<trafficlog_core::CapturedBody, trafficlog_core::CaptureError> {
    let captured = capture(body, encoding);
    if let Err(err) = &captured {
        tracing::debug!(request_log_id = %id, error = %err, "body capture failed");
    }
    captured
}

impl MiddlewareLayer for TrafficLoggerLayer {
    fn call(&self, mut req: Request, next: BoxedNext) -> ResponseFuture {
        let inner = self.inner.clone();

        Box::pin(async move {
            let method = req.method().clone();

            let decision = inner.rules.resolve(&method, None);
            if !decision.include {
                tracing::trace!(method = %method, path = %req.uri().path(), "traffic not logged");
                return next(req).await;
            }

            let id = RequestLogId::generate();
            req.extensions_mut().insert(id.clone());

            let record = inner.request_record(&mut req, &id, decision.facets);
            let rendered = inner.formatter.format(&record);
            let held = if decision.awaits_status {
                Some(rendered)
            } else {
                inner.emit(&id, &rendered);
                None
            };

            let mut response = next(req).await;

            let decision = inner.rules.resolve(&method, Some(response.status()));
            if !decision.include {
                tracing::trace!(
                    request_log_id = %id,
                    status = response.status().as_u16(),
                    "traffic not logged for status"
                );
                return response;
            }

            if let Some(rendered) = held {
                inner.emit(&id, &rendered);
            }

            let record = inner.response_record(&mut response, &id, decision.facets);
            inner.emit(&id, &inner.formatter.format(&record));

            tracing::debug!(
                request_log_id = %id,
                method = %method,
                status = response.status().as_u16(),
                "traffic logged"
            );

            response
        })
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}

/// Builder for [`TrafficLoggerLayer`].
///
/// Defaults to JSON lines on stdout with no rules, which logs the basic
/// properties of every request.
#[derive(Default)]
pub struct TrafficLoggerBuilder {
    tokens: Vec<Token>,
    ruleset: Option<Ruleset>,
    formatter: Option<Box<dyn Formatter>>,
    sink: Option<Box<dyn Sink>>,
}

impl TrafficLoggerBuilder {
    /// Append configuration tokens.
    pub fn tokens<I, T>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Token>,
    {
        self.tokens.extend(tokens.into_iter().map(Into::into));
        self
    }

    /// Append one configuration token.
    pub fn token(mut self, token: impl Into<Token>) -> Self {
        self.tokens.push(token.into());
        self
    }

    /// Use an already resolved ruleset instead of tokens.
    pub fn ruleset(mut self, rules: Ruleset) -> Self {
        self.ruleset = Some(rules);
        self
    }

    /// Set the record formatter.
    pub fn formatter<F: Formatter>(mut self, formatter: F) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }

    /// Set the record sink.
    pub fn sink<S: Sink>(mut self, sink: S) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Resolve the configuration and build the layer.
    ///
    /// Fails on the first invalid token.
    pub fn build(self) -> Result<TrafficLoggerLayer, ConfigError> {
        let rules = match self.ruleset {
            Some(rules) => rules,
            None => Ruleset::new(self.tokens)?,
        };
        Ok(TrafficLoggerLayer::from_parts(
            rules,
            self.formatter
                .unwrap_or_else(|| Box::new(JsonFormatter::new())),
            self.sink.unwrap_or_else(|| Box::new(WriterSink::stdout())),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::next_fn;
    use crate::sink::MemorySink;
    use http::{Method, StatusCode};
    use serde_json::Value;
    use std::sync::Mutex;

    fn layer(tokens: Vec<Token>, sink: &MemorySink) -> TrafficLoggerLayer {
        TrafficLoggerLayer::builder()
            .tokens(tokens)
            .sink(sink.clone())
            .build()
            .unwrap()
    }

    fn request(method: Method, body: &'static str) -> Request {
        http::Request::builder()
            .method(method)
            .uri("http://api.example/items?limit=5")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn respond(status: StatusCode, body: &'static str) -> BoxedNext {
        next_fn(move |_req: Request| async move {
            http::Response::builder()
                .status(status)
                .header("x-served-by", "test")
                .body(Body::from(body))
                .unwrap()
        })
    }

    fn records(sink: &MemorySink) -> Vec<Value> {
        sink.contents_string()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_pair_shares_one_id() {
        let sink = MemorySink::new();
        let layer = layer(vec![], &sink);

        layer
            .call(request(Method::GET, ""), respond(StatusCode::OK, "ok"))
            .await;

        let records = records(&sink);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["event"], "request");
        assert_eq!(records[1]["event"], "response");
        assert_eq!(records[0]["request_log_id"], records[1]["request_log_id"]);
        assert_eq!(records[1]["status_code"], 200);
        assert!(records[0].get("headers").is_none());
        assert!(records[1].get("body").is_none());
    }

    #[tokio::test]
    async fn test_request_is_written_before_handler_runs() {
        let sink = MemorySink::new();
        let layer = layer(vec![], &sink);
        let seen = Arc::new(Mutex::new(String::new()));

        let observed = seen.clone();
        let probe = sink.clone();
        let next = next_fn(move |_req: Request| {
            *observed.lock().unwrap() = probe.contents_string();
            async { http::Response::new(Body::empty()) }
        });
        layer.call(request(Method::GET, ""), next).await;

        let before = seen.lock().unwrap().clone();
        assert_eq!(before.lines().count(), 1);
        assert!(before.contains("\"event\":\"request\""));
    }

    #[tokio::test]
    async fn test_post_bodies_only() {
        let sink = MemorySink::new();
        let layer = layer(vec![Token::map([(Token::from("post"), Token::from("request_bodies"))])], &sink);

        layer
            .call(request(Method::POST, "{\"name\":\"x\"}"), respond(StatusCode::CREATED, ""))
            .await;
        layer
            .call(request(Method::GET, "ignored"), respond(StatusCode::OK, ""))
            .await;

        let records = records(&sink);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0]["body"], "{\"name\":\"x\"}");
        assert!(records[2].get("body").is_none());
    }

    #[tokio::test]
    async fn test_handler_sees_unconsumed_body_and_id() {
        let sink = MemorySink::new();
        let layer = layer(vec![Token::from("request_bodies")], &sink);
        let seen = Arc::new(Mutex::new(None));

        let observed = seen.clone();
        let next = next_fn(move |req: Request| {
            let id = req.extensions().get::<RequestLogId>().cloned();
            let body = req.into_body().into_bytes().unwrap();
            *observed.lock().unwrap() = Some((id, body));
            async { http::Response::new(Body::empty()) }
        });
        layer.call(request(Method::PUT, "payload"), next).await;

        let (id, body) = seen.lock().unwrap().take().unwrap();
        assert_eq!(body, bytes::Bytes::from("payload"));
        let records = records(&sink);
        assert_eq!(records[0]["body"], "payload");
        assert_eq!(records[0]["request_log_id"], id.unwrap().as_str());
    }

    #[tokio::test]
    async fn test_excluded_status_suppresses_both_records() {
        let sink = MemorySink::new();
        let layer = layer(vec![Token::from(404u16)], &sink);

        layer
            .call(request(Method::GET, ""), respond(StatusCode::OK, ""))
            .await;
        assert!(sink.contents().is_empty());

        layer
            .call(request(Method::GET, ""), respond(StatusCode::NOT_FOUND, ""))
            .await;
        let records = records(&sink);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["event"], "request");
        assert_eq!(records[1]["status_code"], 404);
    }

    #[tokio::test]
    async fn test_status_scoped_exclusion() {
        let sink = MemorySink::new();
        let layer = layer(
            vec![Token::map([(Token::from(301u16..=302u16), Token::from(false))])],
            &sink,
        );

        layer
            .call(request(Method::GET, ""), respond(StatusCode::FOUND, ""))
            .await;
        assert!(sink.contents().is_empty());

        layer
            .call(request(Method::GET, ""), respond(StatusCode::OK, ""))
            .await;
        assert_eq!(records(&sink).len(), 2);
    }

    #[tokio::test]
    async fn test_response_facets_and_headers() {
        let sink = MemorySink::new();
        let layer = layer(vec![Token::from("response_headers"), Token::from("response_bodies")], &sink);

        layer
            .call(request(Method::GET, ""), respond(StatusCode::OK, "[1,2]"))
            .await;

        let records = records(&sink);
        assert!(records[0].get("headers").is_none());
        assert_eq!(records[1]["headers"]["x-served-by"], "test");
        assert_eq!(records[1]["body"], "[1,2]");
    }

    #[tokio::test]
    async fn test_response_body_survives_capture() {
        let sink = MemorySink::new();
        let layer = layer(vec![Token::from("bodies")], &sink);

        let response = layer
            .call(request(Method::GET, ""), respond(StatusCode::OK, "kept"))
            .await;
        assert_eq!(
            response.into_body().into_bytes().unwrap(),
            bytes::Bytes::from("kept")
        );
    }

    #[tokio::test]
    async fn test_head_with_gzip_and_no_body() {
        let sink = MemorySink::new();
        let layer = layer(vec![Token::from("response_bodies")], &sink);

        let next = next_fn(|_req: Request| async {
            http::Response::builder()
                .header("content-encoding", "gzip")
                .body(Body::empty())
                .unwrap()
        });
        layer.call(request(Method::HEAD, ""), next).await;

        let records = records(&sink);
        assert_eq!(records.len(), 2);
        assert!(records[1].get("error").is_none());
        assert_eq!(records[1]["body"], "");
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_change_response() {
        struct Broken;
        impl Sink for Broken {
            fn append(&self, _bytes: &[u8]) -> Result<(), trafficlog_core::SinkError> {
                Err(trafficlog_core::SinkError::Poisoned)
            }
        }

        let layer = TrafficLoggerLayer::builder()
            .token("all")
            .sink(Broken)
            .build()
            .unwrap();
        let response = layer
            .call(request(Method::GET, ""), respond(StatusCode::ACCEPTED, ""))
            .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_custom_formatter() {
        let sink = MemorySink::new();
        let layer = TrafficLoggerLayer::builder()
            .formatter(|record: &PhaseRecord| format!("{:?}\n", record.event()).into_bytes())
            .sink(sink.clone())
            .build()
            .unwrap();

        layer
            .call(request(Method::GET, ""), respond(StatusCode::OK, ""))
            .await;
        assert_eq!(sink.contents_string(), "Request\nResponse\n");
    }

    #[test]
    fn test_invalid_configuration_fails_fast() {
        let err = TrafficLoggerLayer::builder()
            .token("sometimes")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownSymbol("sometimes".to_string()));
    }
}
