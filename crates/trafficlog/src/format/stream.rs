//! Human readable stream formatter

use super::Formatter;
use console::{style, StyledObject};
use std::fmt::Write;
use trafficlog_core::{CapturedBody, PhaseDetail, PhaseRecord};

/// `Fri 16 Oct '26 09:41:07.512`
const TIMESTAMP_FORMAT: &str = "%a %d %b '%y %H:%M:%S%.3f";

/// Renders records the way the messages looked on the wire.
///
/// ```text
/// @ Fri 16 Oct '26 09:41:07.512 #3f9a0c1d22e4
/// POST /orders?page=2 HTTP/1.1
/// Content-Type: application/json
///
/// {"qty": 2}
///
/// ```
#[derive(Clone, Debug, Default)]
pub struct StreamFormatter {
    /// Emit ANSI colors
    pub color: bool,
    /// Re-indent JSON bodies
    pub pretty_print: bool,
}

impl StreamFormatter {
    /// Plain output, bodies as captured
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable colors
    pub fn color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    /// Enable or disable JSON body re-indentation
    pub fn pretty_print(mut self, enabled: bool) -> Self {
        self.pretty_print = enabled;
        self
    }

    fn paint<D>(&self, styled: StyledObject<D>) -> StyledObject<D> {
        styled.force_styling(self.color)
    }

    fn render(&self, record: &PhaseRecord) -> String {
        let mut out = String::new();

        let _ = writeln!(
            out,
            "{} {}",
            self.paint(style(format!("@ {}", record.timestamp.format(TIMESTAMP_FORMAT))).dim()),
            self.paint(style(format!("#{}", record.request_log_id)).cyan()),
        );

        match &record.detail {
            PhaseDetail::Request(line) => {
                let _ = writeln!(
                    out,
                    "{} {} {}",
                    self.paint(style(&line.method).bold().yellow()),
                    line.target(),
                    line.http_version,
                );
            }
            PhaseDetail::Response(line) => {
                let status = format!("{} {}", line.status_code, line.status_name)
                    .trim_end()
                    .to_string();
                let status = match line.status_code {
                    200..=299 => style(status).green(),
                    300..=399 => style(status).cyan(),
                    400..=499 => style(status).yellow(),
                    _ => style(status).red(),
                };
                let _ = writeln!(
                    out,
                    "{} {}",
                    line.http_version,
                    self.paint(status.bold()),
                );
            }
        }

        if let Some(headers) = &record.headers {
            for (name, value) in headers {
                let _ = writeln!(
                    out,
                    "{}: {}",
                    self.paint(style(title_case(name)).blue()),
                    value
                );
            }
        }

        if let Some(error) = &record.error {
            let _ = writeln!(out, "{}", self.paint(style(format!("! {}", error)).red()));
        }

        out.push('\n');

        if let Some(body) = &record.body {
            match body {
                CapturedBody::Text(text) => {
                    out.push_str(&self.body_text(text));
                }
                CapturedBody::Base64(encoded) => {
                    let _ = write!(out, "{} {}", self.paint(style("[base64]").magenta()), encoded);
                }
            }
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
        }

        out
    }

    fn body_text(&self, text: &str) -> String {
        if !self.pretty_print {
            return text.to_string();
        }
        let trimmed = text.trim_start();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return text.to_string();
        }
        serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .and_then(|value| serde_json::to_string_pretty(&value).ok())
            .unwrap_or_else(|| text.to_string())
    }
}

impl Formatter for StreamFormatter {
    fn format(&self, record: &PhaseRecord) -> Vec<u8> {
        self.render(record).into_bytes()
    }
}

/// `content-type` -> `Content-Type`
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        upper = c == '-';
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use http::{HeaderMap, Request};
    use trafficlog_core::{RequestLine, RequestLogId, StatusLine};

    fn request() -> PhaseRecord {
        let req = Request::post("/orders?page=2")
            .header("host", "shop.example")
            .body(())
            .unwrap();
        let mut record = PhaseRecord::request(
            RequestLogId::from_string("3f9a0c1d22e4"),
            RequestLine::from_request(&req),
        );
        record.timestamp = Utc.with_ymd_and_hms(2026, 10, 16, 9, 41, 7).unwrap()
            + chrono::Duration::milliseconds(512);
        record
    }

    fn response(code: u16, name: &str) -> PhaseRecord {
        let mut record = PhaseRecord::response(
            RequestLogId::from_string("3f9a0c1d22e4"),
            StatusLine {
                http_version: "HTTP/1.1".to_string(),
                status_code: code,
                status_name: name.to_string(),
            },
        );
        record.timestamp = Utc.with_ymd_and_hms(2026, 10, 16, 9, 41, 8).unwrap();
        record
    }

    fn render(formatter: &StreamFormatter, record: &PhaseRecord) -> String {
        String::from_utf8(formatter.format(record)).unwrap()
    }

    #[test]
    fn test_request_without_facets() {
        let text = render(&StreamFormatter::new(), &request());
        assert_eq!(
            text,
            "@ Fri 16 Oct '26 09:41:07.512 #3f9a0c1d22e4\n\
             POST /orders?page=2 HTTP/1.1\n\
             \n"
        );
    }

    #[test]
    fn test_headers_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("x-request-id", "abc".parse().unwrap());
        let record = request()
            .with_headers(&headers)
            .with_capture(Ok(CapturedBody::Text("{\"qty\":2}".to_string())));

        let text = render(&StreamFormatter::new(), &record);
        assert_eq!(
            text,
            "@ Fri 16 Oct '26 09:41:07.512 #3f9a0c1d22e4\n\
             POST /orders?page=2 HTTP/1.1\n\
             Content-Type: application/json\n\
             X-Request-Id: abc\n\
             \n\
             {\"qty\":2}\n\
             \n"
        );
    }

    #[test]
    fn test_pretty_print_reindents_json() {
        let record = response(200, "OK")
            .with_capture(Ok(CapturedBody::Text("{\"a\":1}".to_string())));
        let text = render(&StreamFormatter::new().pretty_print(true), &record);
        assert!(text.contains("HTTP/1.1 200 OK\n"));
        assert!(text.contains("{\n  \"a\": 1\n}\n"));
    }

    #[test]
    fn test_pretty_print_leaves_non_json_alone() {
        let record = response(200, "OK")
            .with_capture(Ok(CapturedBody::Text("{not json".to_string())));
        let text = render(&StreamFormatter::new().pretty_print(true), &record);
        assert!(text.contains("\n{not json\n"));
    }

    #[test]
    fn test_binary_body_is_marked() {
        let record = response(200, "OK").with_capture(Ok(CapturedBody::Base64("/wD+gA==".to_string())));
        let text = render(&StreamFormatter::new(), &record);
        assert!(text.ends_with("\n[base64] /wD+gA==\n\n"));
    }

    #[test]
    fn test_capture_error_is_shown() {
        let mut record = response(500, "Internal Server Error");
        record.error = Some("failed to decode gzip body".to_string());
        let text = render(&StreamFormatter::new(), &record);
        assert!(text.contains("HTTP/1.1 500 Internal Server Error\n! failed to decode gzip body\n"));
    }

    #[test]
    fn test_color_only_when_enabled() {
        let plain = render(&StreamFormatter::new(), &response(404, "Not Found"));
        assert!(!plain.contains('\u{1b}'));

        let colored = render(&StreamFormatter::new().color(true), &response(404, "Not Found"));
        assert!(colored.contains('\u{1b}'));
        assert_eq!(console::strip_ansi_codes(&colored), plain);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("content-type"), "Content-Type");
        assert_eq!(title_case("etag"), "Etag");
        assert_eq!(title_case("x-forwarded-for"), "X-Forwarded-For");
    }
}
