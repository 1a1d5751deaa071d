//! GLB container constants and structures.

/// Magic bytes at the start of a GLB container.
pub const GLB_MAGIC: &[u8; 4] = b"glTF";

/// Supported container version.
pub const GLB_VERSION: u32 = 2;

/// Size of the container header in bytes (magic, version, total length).
pub const HEADER_SIZE: usize = 12;

/// Size of a chunk header in bytes (length, type).
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Chunk payloads are aligned to this many bytes.
pub const CHUNK_ALIGNMENT: usize = 4;

/// Chunk type tag of the JSON chunk ("JSON" read as u32 LE).
pub const CHUNK_TYPE_JSON: u32 = 0x4E4F_534A;

/// Chunk type tag of the binary chunk ("BIN\0" read as u32 LE).
pub const CHUNK_TYPE_BIN: u32 = 0x004E_4942;

/// Fill byte for JSON chunk padding (space keeps the JSON valid).
pub const JSON_PADDING: u8 = b' ';

/// Fill byte for binary chunk padding.
pub const BIN_PADDING: u8 = 0x00;

/// Kind of a chunk inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Json,
    Bin,
    /// Extension chunk, skipped by the reader.
    Unknown(u32),
}

impl ChunkKind {
    /// Map a raw type tag to a chunk kind.
    #[inline]
    pub const fn from_tag(tag: u32) -> Self {
        match tag {
            CHUNK_TYPE_JSON => Self::Json,
            CHUNK_TYPE_BIN => Self::Bin,
            other => Self::Unknown(other),
        }
    }

    /// Raw type tag written to the container.
    #[inline]
    pub const fn tag(self) -> u32 {
        match self {
            Self::Json => CHUNK_TYPE_JSON,
            Self::Bin => CHUNK_TYPE_BIN,
            Self::Unknown(tag) => tag,
        }
    }

    /// Padding byte used after a payload of this kind.
    #[inline]
    pub const fn padding(self) -> u8 {
        match self {
            Self::Json => JSON_PADDING,
            _ => BIN_PADDING,
        }
    }
}

/// A chunk about to be written to a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub kind: ChunkKind,
    pub payload: &'a [u8],
}

impl<'a> Chunk<'a> {
    pub fn json(payload: &'a [u8]) -> Self {
        Self { kind: ChunkKind::Json, payload }
    }

    pub fn bin(payload: &'a [u8]) -> Self {
        Self { kind: ChunkKind::Bin, payload }
    }

    /// Size this chunk occupies in the container, header included.
    #[inline]
    pub fn framed_len(&self) -> usize {
        CHUNK_HEADER_SIZE + padded_len(self.payload.len())
    }
}

/// Round `len` up to the chunk alignment.
#[inline]
pub const fn padded_len(len: usize) -> usize {
    (len + CHUNK_ALIGNMENT - 1) & !(CHUNK_ALIGNMENT - 1)
}

/// Check whether `bytes` starts with the container magic.
#[inline]
pub fn is_glb(bytes: &[u8]) -> bool {
    bytes.len() >= GLB_MAGIC.len() && &bytes[..GLB_MAGIC.len()] == GLB_MAGIC
}
