//! Sandbox checks for external resource references.
//!
//! Buffer URIs are relative references resolved by the host against some
//! root. Anything that could climb out of that root is refused here, before
//! the host capability is ever called.

use super::{Error, Result};

/// Validate that `uri` stays inside the host's resource root.
///
/// Rejects empty references, `..` segments, absolute paths, Windows drive
/// and UNC prefixes, and `file:` URLs. Percent-encoded separators and dots
/// are decoded before the check so `%2e%2e%2f` is caught as well.
pub fn validate_resource_uri(uri: &str) -> Result<()> {
    let escape = || Error::PathTraversal(uri.to_string());

    if uri.is_empty() {
        return Err(escape());
    }

    let decoded = percent_decode(uri);
    let path = decoded.as_str();

    if path.starts_with('/') || path.starts_with('\\') {
        return Err(escape());
    }
    if has_drive_prefix(path) || path.to_ascii_lowercase().starts_with("file:") {
        return Err(escape());
    }
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(escape());
    }

    Ok(())
}

/// `C:` style prefix.
fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Decode `%XX` escapes. Invalid escapes are kept literally; invalid UTF-8
/// is replaced, which cannot turn a safe path into `..`.
pub(crate) fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Encode `path` as a relative reference. Unreserved characters and `/`
/// pass through; every other byte becomes `%XX`.
pub fn percent_encode_path(path: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(path.len());
    for &b in path.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => {
                out.push('%');
                out.push(HEX[(b >> 4) as usize] as char);
                out.push(HEX[(b & 0x0f) as usize] as char);
            }
        }
    }
    out
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
