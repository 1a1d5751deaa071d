//! # gltf-io
//!
//! Reading and writing glTF 2.0 assets as plain JSON (`.gltf`) or as a
//! binary GLB container (`.glb`), with every buffer resolved to its bytes.
//!
//! ## Modules
//!
//! - [`util`] - Errors and the resource sandbox check
//! - [`glb`] - Low-level GLB container framing
//! - [`embedded`] - Base64 `data:` URI payloads
//! - [`quota`] - Per-decode resource ceilings
//! - [`resource`] - Host I/O capabilities (closures, memory, directory)
//! - [`resolver`] - Buffer source resolution in both directions
//! - [`document`] - The document model
//! - [`decoder`] / [`encoder`] - Top-level entry points
//! - [`fs`] - Open/save helpers for files on disk
//!
//! ## Example
//!
//! ```
//! use gltf_io::{Buffer, Decoder, Document, EncodeOptions, Encoder, MemoryStore};
//!
//! let store = MemoryStore::new();
//!
//! let mut doc = Document::new();
//! doc.push_buffer(Buffer::from_data(vec![1, 2, 3, 4]));
//! doc.push_buffer(Buffer::from_data(vec![5, 6]).with_uri("extra.bin"));
//!
//! let glb = Encoder::new(store.clone(), EncodeOptions::binary()).encode_to_vec(&mut doc)?;
//! let back = Decoder::new(store).decode_slice(&glb)?;
//!
//! assert_eq!(back.buffers[0].bytes(), &[1, 2, 3, 4]);
//! assert_eq!(back.buffers[1].bytes(), &[5, 6]);
//! # Ok::<(), gltf_io::Error>(())
//! ```

pub mod util;
pub mod glb;
pub mod embedded;
pub mod quota;
pub mod resource;
pub mod resolver;
pub mod document;
pub mod decoder;
pub mod encoder;
pub mod fs;

// Re-export commonly used types
pub use util::{Error, ErrorKind, Result};
pub use document::{Asset, Buffer, Document};
pub use decoder::Decoder;
pub use encoder::{EncodeOptions, Encoder};
pub use quota::ReadQuotas;
pub use resource::{DirectoryStore, MemoryStore, NoResources, ResourceReader, ResourceWriter};
pub use resolver::BufferSource;
