//! glTF document model.
//!
//! Only the parts the codec needs are typed: the asset header and the
//! buffer list. Every other top-level member (accessors, meshes, nodes,
//! extensions...) is kept verbatim in [`Document::other`] so a decode
//! followed by an encode loses nothing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::embedded;

/// Root of a glTF asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub asset: Asset,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<Buffer>,
    /// All remaining top-level members.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a buffer and return its index.
    pub fn push_buffer(&mut self, buffer: Buffer) -> usize {
        self.buffers.push(buffer);
        self.buffers.len() - 1
    }
}

/// Metadata about the glTF asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// glTF version this asset targets.
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    /// `extensions`, `extras` and anything else.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            version: "2.0".to_string(),
            generator: None,
            copyright: None,
            min_version: None,
            other: Map::new(),
        }
    }
}

/// A block of binary data referenced by the document.
///
/// `data` is never serialized. It is filled in by the decoder and read by
/// the encoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Declared length in bytes. Must be positive.
    pub byte_length: u64,
    /// Where the bytes live. `None` means the GLB binary chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// `extensions`, `extras` and anything else.
    #[serde(flatten)]
    pub other: Map<String, Value>,
    /// Resolved bytes.
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
    #[serde(skip)]
    embed: bool,
}

impl Buffer {
    /// Buffer with a declared length and no source yet.
    pub fn new(byte_length: u64) -> Self {
        Self {
            byte_length,
            ..Self::default()
        }
    }

    /// Buffer holding `data`, sized to it.
    pub fn from_data(data: Vec<u8>) -> Self {
        Self {
            byte_length: data.len() as u64,
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// `uri` if present and non-empty.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref().filter(|uri| !uri.is_empty())
    }

    /// Resolved bytes, empty if unresolved.
    pub fn bytes(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }

    /// Whether `uri` carries the data inline.
    pub fn is_embedded_resource(&self) -> bool {
        self.uri().is_some_and(embedded::is_embedded)
    }

    /// Ask the next encode to store this buffer inline as a data URI.
    ///
    /// Embedding is never automatic. The mark is consumed by the encoder,
    /// which rewrites `uri` in place.
    pub fn mark_embedded(&mut self) -> &mut Self {
        self.embed = true;
        self
    }

    pub fn is_marked_embedded(&self) -> bool {
        self.embed
    }

    pub(crate) fn take_embed_mark(&mut self) -> bool {
        std::mem::take(&mut self.embed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let doc: Document = serde_json::from_str(
            r#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":4,"uri":"a.bin"}]}"#,
        )
        .unwrap();
        assert_eq!(doc.asset.version, "2.0");
        assert_eq!(doc.buffers.len(), 1);
        assert_eq!(doc.buffers[0].byte_length, 4);
        assert_eq!(doc.buffers[0].uri(), Some("a.bin"));
        assert!(doc.buffers[0].data.is_none());
    }

    #[test]
    fn test_missing_asset_defaults() {
        let doc: Document = serde_json::from_str("{}").unwrap();
        assert_eq!(doc.asset, Asset::default());
        assert!(doc.buffers.is_empty());
    }

    #[test]
    fn test_other_members_preserved() {
        let json = r#"{"asset":{"version":"2.0","extras":{"k":1}},"meshes":[{"name":"m"}],"buffers":[{"byteLength":1,"extras":8.0}],"scene":0}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert!(doc.other.contains_key("meshes"));
        assert!(doc.other.contains_key("scene"));
        assert!(doc.asset.other.contains_key("extras"));
        assert!(doc.buffers[0].other.contains_key("extras"));

        let back: Document = serde_json::from_slice(&serde_json::to_vec(&doc).unwrap()).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_data_not_serialized() {
        let mut buffer = Buffer::from_data(vec![1, 2, 3]).with_uri("a.bin");
        buffer.mark_embedded();
        let json = serde_json::to_string(&buffer).unwrap();
        assert_eq!(json, r#"{"byteLength":3,"uri":"a.bin"}"#);
    }

    #[test]
    fn test_byte_length_required() {
        assert!(serde_json::from_str::<Buffer>(r#"{"uri":"a.bin"}"#).is_err());
        assert!(serde_json::from_str::<Buffer>(r#"{"byteLength":-1}"#).is_err());
    }

    #[test]
    fn test_empty_uri_is_absent() {
        let buffer = Buffer::new(1).with_uri("");
        assert_eq!(buffer.uri(), None);
        assert!(!buffer.is_embedded_resource());
    }

    #[test]
    fn test_embed_mark() {
        let mut buffer = Buffer::from_data(vec![1]);
        assert!(!buffer.is_marked_embedded());
        buffer.mark_embedded();
        assert!(buffer.is_marked_embedded());
        assert!(buffer.take_embed_mark());
        assert!(!buffer.is_marked_embedded());
    }
}
