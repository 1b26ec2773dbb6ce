//! Per-request correlation ids

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of random bytes in an id.
pub const REQUEST_LOG_ID_BYTES: usize = 6;

/// Short random identifier shared by a request record and its response record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestLogId(String);

impl RequestLogId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        let mut bytes = [0u8; REQUEST_LOG_ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);

        let mut hex = String::with_capacity(REQUEST_LOG_ID_BYTES * 2);
        for byte in bytes {
            hex.push_str(&format!("{:02x}", byte));
        }
        Self(hex)
    }

    /// Wrap an existing id, e.g. one read back from a log.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestLogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
