//! Body capture
//!
//! [`capture`] turns any [`Body`] into a [`CapturedBody`] that is safe to put
//! in a text log:
//!
//! 1. proxies are unwrapped until a concrete body is reached
//! 2. the content is read without disturbing the next consumer
//! 3. content codings (`gzip`, `deflate`) are undone
//! 4. valid UTF-8 is kept as text, anything else is base64 encoded

mod body;

pub use body::{Body, BodyProxy, FileBody, ReadSeek, ReplayableRead, RewindableStream};

use crate::error::CaptureError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::{MultiGzDecoder, ZlibDecoder};
use std::io::Read;

/// A single content coding from a `Content-Encoding` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentCoding {
    /// `identity`
    Identity,
    /// `gzip` or `x-gzip`
    Gzip,
    /// `deflate` (zlib framing)
    Deflate,
    /// Any other coding; content is logged as-is
    Other(String),
}

impl ContentCoding {
    fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "" | "identity" => ContentCoding::Identity,
            "gzip" | "x-gzip" => ContentCoding::Gzip,
            "deflate" => ContentCoding::Deflate,
            other => ContentCoding::Other(other.to_string()),
        }
    }
}

/// The codings applied to a body, in the order they were applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentEncoding {
    codings: Vec<ContentCoding>,
}

impl ContentEncoding {
    /// No coding.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Parse a `Content-Encoding` header value, if present.
    pub fn from_header(value: Option<&str>) -> Self {
        let codings = value
            .map(|v| {
                v.split(',')
                    .map(ContentCoding::parse)
                    .filter(|c| *c != ContentCoding::Identity)
                    .collect()
            })
            .unwrap_or_default();
        Self { codings }
    }

    /// Codings in application order.
    pub fn codings(&self) -> &[ContentCoding] {
        &self.codings
    }

    /// Undo every coding, last applied first.
    ///
    /// Decoding stops at the first coding that is not understood. An empty
    /// body is returned as is, since HEAD and 304 responses carry the header
    /// without content.
    pub fn decode(&self, mut bytes: Vec<u8>) -> Result<Vec<u8>, CaptureError> {
        if bytes.is_empty() {
            return Ok(bytes);
        }
        for coding in self.codings.iter().rev() {
            bytes = match coding {
                ContentCoding::Identity => bytes,
                ContentCoding::Gzip => {
                    inflate(MultiGzDecoder::new(bytes.as_slice()), "gzip")?
                }
                ContentCoding::Deflate => {
                    inflate(ZlibDecoder::new(bytes.as_slice()), "deflate")?
                }
                ContentCoding::Other(_) => break,
            };
        }
        Ok(bytes)
    }
}

fn inflate(mut decoder: impl Read, encoding: &'static str) -> Result<Vec<u8>, CaptureError> {
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|source| CaptureError::Decode { encoding, source })?;
    Ok(out)
}

/// A body in a form any text sink can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedBody {
    /// Valid UTF-8 content
    Text(String),
    /// Base64 of content that is not valid UTF-8
    Base64(String),
}

impl CapturedBody {
    /// Classify raw bytes, keeping them as text when possible.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => CapturedBody::Text(text),
            Err(err) => CapturedBody::Base64(BASE64.encode(err.as_bytes())),
        }
    }

    /// Whether the payload is base64 encoded.
    pub fn is_binary(&self) -> bool {
        matches!(self, CapturedBody::Base64(_))
    }

    /// The payload as stored, text or base64.
    pub fn as_str(&self) -> &str {
        match self {
            CapturedBody::Text(s) | CapturedBody::Base64(s) => s,
        }
    }

    /// The original bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        match self {
            CapturedBody::Text(text) => Ok(text.clone().into_bytes()),
            CapturedBody::Base64(encoded) => BASE64.decode(encoded),
        }
    }
}

/// Capture `body` for logging without consuming it.
pub fn capture(body: &mut Body, encoding: &ContentEncoding) -> Result<CapturedBody, CaptureError> {
    let raw = body.to_bytes()?;
    let decoded = encoding.decode(raw.to_vec())?;
    Ok(CapturedBody::from_bytes(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use proptest::prelude::*;
    use std::io::{Cursor, Write};

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn text_is_kept_verbatim() {
        let mut body = Body::from("{\"name\":\"café\"}");
        let captured = capture(&mut body, &ContentEncoding::identity()).unwrap();
        assert_eq!(captured, CapturedBody::Text("{\"name\":\"café\"}".to_string()));
    }

    #[test]
    fn binary_is_base64_encoded() {
        let bytes = vec![0xff, 0x00, 0xfe, 0x80];
        let mut body = Body::from(bytes.clone());
        let captured = capture(&mut body, &ContentEncoding::identity()).unwrap();
        assert!(captured.is_binary());
        assert_eq!(captured.as_str(), "/wD+gA==");
        assert_eq!(captured.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn gzip_is_decompressed() {
        let mut body = Body::from(gzip(b"compressed text"));
        let encoding = ContentEncoding::from_header(Some("gzip"));
        let captured = capture(&mut body, &encoding).unwrap();
        assert_eq!(captured, CapturedBody::Text("compressed text".to_string()));
    }

    #[test]
    fn deflate_is_decompressed() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"zlib text").unwrap();
        let mut body = Body::from(encoder.finish().unwrap());

        let encoding = ContentEncoding::from_header(Some("deflate"));
        let captured = capture(&mut body, &encoding).unwrap();
        assert_eq!(captured.as_str(), "zlib text");
    }

    #[test]
    fn corrupt_gzip_is_a_capture_error() {
        let mut body = Body::from("not gzip at all");
        let encoding = ContentEncoding::from_header(Some("gzip"));
        let err = capture(&mut body, &encoding).unwrap_err();
        assert!(matches!(err, CaptureError::Decode { encoding: "gzip", .. }));
    }

    #[test]
    fn empty_body_with_coding_is_empty_text() {
        for header in ["gzip", "deflate", "gzip, deflate"] {
            let encoding = ContentEncoding::from_header(Some(header));
            let captured = capture(&mut Body::empty(), &encoding).unwrap();
            assert_eq!(captured, CapturedBody::Text(String::new()));
        }
    }

    #[test]
    fn unknown_codings_are_logged_raw() {
        let encoding = ContentEncoding::from_header(Some("br"));
        assert_eq!(
            encoding.codings(),
            &[ContentCoding::Other("br".to_string())]
        );
        let mut body = Body::from("raw");
        assert_eq!(capture(&mut body, &encoding).unwrap().as_str(), "raw");
    }

    #[test]
    fn stacked_codings_are_undone_in_reverse() {
        let twice = gzip(&gzip(b"nested"));
        let encoding = ContentEncoding::from_header(Some("gzip, identity, x-gzip"));
        assert_eq!(encoding.codings().len(), 2);
        assert_eq!(encoding.decode(twice).unwrap(), b"nested");
    }

    #[test]
    fn capture_leaves_stream_readable() {
        let mut body = Body::from_reader(Cursor::new(gzip(b"stream")));
        let encoding = ContentEncoding::from_header(Some("gzip"));
        capture(&mut body, &encoding).unwrap();

        let again = body.into_bytes().unwrap();
        assert_eq!(encoding.decode(again.to_vec()).unwrap(), b"stream");
    }

    proptest! {
        #[test]
        fn prop_text_round_trips(text in ".*") {
            let mut body = Body::from(text.clone());
            let captured = capture(&mut body, &ContentEncoding::identity()).unwrap();
            prop_assert_eq!(captured, CapturedBody::Text(text));
        }

        #[test]
        fn prop_bytes_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
            let mut body = Body::from(bytes.clone());
            let captured = capture(&mut body, &ContentEncoding::identity()).unwrap();
            prop_assert_eq!(captured.to_bytes().unwrap(), bytes);
        }

        #[test]
        fn prop_stream_position_is_preserved(
            bytes in prop::collection::vec(any::<u8>(), 0..256),
            offset in 0usize..256,
        ) {
            let offset = offset.min(bytes.len());
            let mut cursor = Cursor::new(bytes.clone());
            cursor.set_position(offset as u64);
            let mut body = Body::from_reader(cursor);

            let captured = capture(&mut body, &ContentEncoding::identity()).unwrap();
            prop_assert_eq!(captured.to_bytes().unwrap(), bytes[offset..].to_vec());
            prop_assert_eq!(body.into_bytes().unwrap().to_vec(), bytes[offset..].to_vec());
        }
    }
}
