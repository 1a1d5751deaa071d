//! Inline `data:` URI payloads.
//!
//! glTF buffers may carry their bytes directly in the JSON as a base64
//! data URI instead of pointing at an external file.

use base64::engine::general_purpose::STANDARD;
use base64::{decoded_len_estimate, Engine as _};

use crate::util::{Error, Result};

/// Prefix written by [`encode`].
pub const OCTET_STREAM_PREFIX: &str = "data:application/octet-stream;base64,";

/// Alternative prefix accepted on read.
pub const GLTF_BUFFER_PREFIX: &str = "data:application/gltf-buffer;base64,";

const PREFIXES: [&str; 2] = [OCTET_STREAM_PREFIX, GLTF_BUFFER_PREFIX];

/// Check whether `uri` is an embedded buffer payload.
#[inline]
pub fn is_embedded(uri: &str) -> bool {
    PREFIXES.iter().any(|prefix| uri.starts_with(prefix))
}

/// Base64 part of an embedded URI, if it is one.
pub fn payload(uri: &str) -> Option<&str> {
    PREFIXES.iter().find_map(|prefix| uri.strip_prefix(prefix))
}

fn require_payload(uri: &str) -> Result<&str> {
    payload(uri).ok_or_else(|| {
        let scheme = uri.split(',').next().unwrap_or(uri);
        Error::InvalidEmbedded(format!("unsupported data URI prefix '{scheme}'"))
    })
}

/// Decode an embedded URI into raw bytes.
pub fn decode(uri: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(require_payload(uri)?)
        .map_err(|e| Error::InvalidEmbedded(e.to_string()))
}

/// Decode at least the first `limit` bytes of an embedded URI.
///
/// Only whole base64 quanta covering `limit` are decoded, so the result
/// holds at most `limit + 2` bytes however long the payload is. Characters
/// past that point are not inspected.
pub fn decode_prefix(uri: &str, limit: u64) -> Result<Vec<u8>> {
    let encoded = require_payload(uri)?.as_bytes();
    let mut input = encoded;
    if decoded_len_estimate(encoded.len()) as u64 > limit {
        let quanta = usize::try_from(limit.div_ceil(3)).unwrap_or(usize::MAX);
        input = &encoded[..quanta.saturating_mul(4).min(encoded.len())];
    }
    STANDARD
        .decode(input)
        .map_err(|e| Error::InvalidEmbedded(e.to_string()))
}

/// Encode raw bytes as an embedded URI.
pub fn encode(data: &[u8]) -> String {
    let mut uri = String::with_capacity(OCTET_STREAM_PREFIX.len() + data.len().div_ceil(3) * 4);
    uri.push_str(OCTET_STREAM_PREFIX);
    STANDARD.encode_string(data, &mut uri);
    uri
}
