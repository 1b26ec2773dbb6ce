//! Phase records: what gets rendered for each half of a traffic pair

use crate::capture::CapturedBody;
use crate::correlator::RequestLogId;
use crate::error::CaptureError;
use chrono::{DateTime, Utc};
use http::{header, HeaderMap, Request, Response, Version};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::SocketAddr;

/// Which half of a traffic pair a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Observed before the handler ran
    Request,
    /// Observed after the handler returned
    Response,
}

/// Basic request properties, always logged for included traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// Request method
    pub method: String,
    /// Whether the request arrived over TLS
    pub https: bool,
    /// Server host name
    pub host: Option<String>,
    /// Server port
    pub port: Option<u16>,
    /// Request path
    pub path: String,
    /// Raw query string, without the `?`
    pub query_string: Option<String>,
    /// Protocol version, e.g. `HTTP/1.1`
    pub http_version: String,
    /// Peer address, when the host supplied one
    pub remote_addr: Option<String>,
}

impl RequestLine {
    /// Extract the basic properties of `req`.
    ///
    /// Scheme, host and port come from the URI when it is absolute and
    /// otherwise from the `x-forwarded-proto` and `Host` headers. A
    /// [`SocketAddr`] in the request extensions is taken as the peer address.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let uri = req.uri();
        let headers = req.headers();

        let https = match uri.scheme_str() {
            Some(scheme) => scheme.eq_ignore_ascii_case("https"),
            None => header_str(headers, "x-forwarded-proto")
                .map(|proto| proto.eq_ignore_ascii_case("https"))
                .unwrap_or(false),
        };

        let (host, port) = match uri.authority() {
            Some(authority) => (Some(authority.host().to_string()), authority.port_u16()),
            None => match header_str(headers, header::HOST.as_str()) {
                Some(value) => split_host_port(value),
                None => (None, None),
            },
        };
        let port = port.or_else(|| host.as_ref().map(|_| if https { 443 } else { 80 }));

        Self {
            method: req.method().as_str().to_string(),
            https,
            host,
            port,
            path: uri.path().to_string(),
            query_string: uri.query().map(str::to_string),
            http_version: version_str(req.version()).to_string(),
            remote_addr: req
                .extensions()
                .get::<SocketAddr>()
                .map(ToString::to_string),
        }
    }

    /// `path?query`, or just the path.
    pub fn target(&self) -> String {
        match &self.query_string {
            Some(query) if !query.is_empty() => format!("{}?{}", self.path, query),
            _ => self.path.clone(),
        }
    }
}

/// Response status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Protocol version, e.g. `HTTP/1.1`
    pub http_version: String,
    /// Numeric status
    pub status_code: u16,
    /// Canonical reason phrase, empty when unknown
    pub status_name: String,
}

impl StatusLine {
    /// Extract the status line of `res`.
    pub fn from_response<B>(res: &Response<B>) -> Self {
        Self {
            http_version: version_str(res.version()).to_string(),
            status_code: res.status().as_u16(),
            status_name: res.status().canonical_reason().unwrap_or("").to_string(),
        }
    }
}

/// Phase-specific part of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseDetail {
    /// Request phase
    Request(RequestLine),
    /// Response phase
    Response(StatusLine),
}

/// Everything rendered for one phase of a traffic pair.
///
/// Optional parts are present exactly when the decision selected them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireRecord", try_from = "WireRecord")]
pub struct PhaseRecord {
    /// When the phase was observed
    pub timestamp: DateTime<Utc>,
    /// Id shared with the other phase of the same traffic pair
    pub request_log_id: RequestLogId,
    /// Request line or status line
    pub detail: PhaseDetail,
    /// Header fields in arrival order, when selected
    pub headers: Option<Vec<(String, String)>>,
    /// Captured body, when selected and readable
    pub body: Option<CapturedBody>,
    /// Why the body could not be captured
    pub error: Option<String>,
}

impl PhaseRecord {
    /// A request-phase record stamped now.
    pub fn request(id: RequestLogId, line: RequestLine) -> Self {
        Self::new(id, PhaseDetail::Request(line))
    }

    /// A response-phase record stamped now.
    pub fn response(id: RequestLogId, line: StatusLine) -> Self {
        Self::new(id, PhaseDetail::Response(line))
    }

    fn new(request_log_id: RequestLogId, detail: PhaseDetail) -> Self {
        Self {
            timestamp: Utc::now(),
            request_log_id,
            detail,
            headers: None,
            body: None,
            error: None,
        }
    }

    /// Which phase this record belongs to.
    pub fn event(&self) -> EventKind {
        match self.detail {
            PhaseDetail::Request(_) => EventKind::Request,
            PhaseDetail::Response(_) => EventKind::Response,
        }
    }

    /// Attach the full header mapping.
    pub fn with_headers(mut self, headers: &HeaderMap) -> Self {
        self.headers = Some(header_fields(headers));
        self
    }

    /// Attach the outcome of a body capture.
    ///
    /// A failure is kept as the record's `error` field instead of a body.
    pub fn with_capture(mut self, captured: Result<CapturedBody, CaptureError>) -> Self {
        match captured {
            Ok(body) => self.body = Some(body),
            Err(err) => self.error = Some(err.to_string()),
        }
        self
    }

    /// Value of the first header named `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Header fields of `headers` in order, values decoded lossily.
pub fn header_fields(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn split_host_port(value: &str) -> (Option<String>, Option<u16>) {
    // Bracketed IPv6 literals carry colons of their own.
    let split_at = if value.starts_with('[') {
        value.find("]:").map(|i| i + 1)
    } else {
        value.rfind(':')
    };
    match split_at {
        Some(i) => match value[i + 1..].parse() {
            Ok(port) => (Some(value[..i].to_string()), Some(port)),
            Err(_) => (Some(value.to_string()), None),
        },
        None => (Some(value.to_string()), None),
    }
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

/// Flat serialized form of a [`PhaseRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireRecord {
    timestamp: DateTime<Utc>,
    request_log_id: RequestLogId,
    event: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    https: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    query_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remote_addr: Option<String>,
    http_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    headers: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<PhaseRecord> for WireRecord {
    fn from(record: PhaseRecord) -> Self {
        let event = record.event();
        let mut wire = WireRecord {
            timestamp: record.timestamp,
            request_log_id: record.request_log_id,
            event,
            method: None,
            https: None,
            host: None,
            port: None,
            path: None,
            query_string: None,
            remote_addr: None,
            http_version: String::new(),
            status_code: None,
            status_name: None,
            headers: None,
            body: None,
            body_base64: None,
            error: record.error,
        };

        match record.detail {
            PhaseDetail::Request(line) => {
                wire.method = Some(line.method);
                wire.https = Some(line.https);
                wire.host = line.host;
                wire.port = line.port;
                wire.path = Some(line.path);
                wire.query_string = line.query_string;
                wire.remote_addr = line.remote_addr;
                wire.http_version = line.http_version;
            }
            PhaseDetail::Response(line) => {
                wire.http_version = line.http_version;
                wire.status_code = Some(line.status_code);
                wire.status_name = Some(line.status_name);
            }
        }

        wire.headers = record.headers.map(|fields| {
            let mut map = Map::new();
            for (name, value) in fields {
                match map.get_mut(&name) {
                    Some(Value::String(existing)) => {
                        existing.push_str(", ");
                        existing.push_str(&value);
                    }
                    _ => {
                        map.insert(name, Value::String(value));
                    }
                }
            }
            map
        });

        match record.body {
            Some(CapturedBody::Text(text)) => wire.body = Some(text),
            Some(CapturedBody::Base64(encoded)) => wire.body_base64 = Some(encoded),
            None => {}
        }

        wire
    }
}

impl TryFrom<WireRecord> for PhaseRecord {
    type Error = String;

    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        let detail = match wire.event {
            EventKind::Request => PhaseDetail::Request(RequestLine {
                method: wire.method.ok_or("request record without `method`")?,
                https: wire.https.unwrap_or(false),
                host: wire.host,
                port: wire.port,
                path: wire.path.unwrap_or_else(|| "/".to_string()),
                query_string: wire.query_string,
                http_version: wire.http_version,
                remote_addr: wire.remote_addr,
            }),
            EventKind::Response => PhaseDetail::Response(StatusLine {
                http_version: wire.http_version,
                status_code: wire
                    .status_code
                    .ok_or("response record without `status_code`")?,
                status_name: wire.status_name.unwrap_or_default(),
            }),
        };

        let headers = wire.headers.map(|map| {
            map.into_iter()
                .map(|(name, value)| match value {
                    Value::String(s) => (name, s),
                    other => (name, other.to_string()),
                })
                .collect()
        });

        let body = match (wire.body, wire.body_base64) {
            (Some(text), _) => Some(CapturedBody::Text(text)),
            (None, Some(encoded)) => Some(CapturedBody::Base64(encoded)),
            (None, None) => None,
        };

        Ok(PhaseRecord {
            timestamp: wire.timestamp,
            request_log_id: wire.request_log_id,
            detail,
            headers,
            body,
            error: wire.error,
        })
    }
}
