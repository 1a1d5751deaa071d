//! Filesystem convenience wrappers.
//!
//! External buffers resolve against the directory of the `.gltf`/`.glb`
//! file, through a [`DirectoryStore`].

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::decoder::Decoder;
use crate::document::Document;
use crate::encoder::{EncodeOptions, Encoder};
use crate::quota::ReadQuotas;
use crate::resource::DirectoryStore;
use crate::util::{Error, Result};

fn base_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}

/// Open and fully decode a glTF or GLB file without quotas.
pub fn open(path: impl AsRef<Path>) -> Result<Document> {
    open_with_quotas(path, ReadQuotas::default())
}

/// Open and fully decode a glTF or GLB file.
pub fn open_with_quotas(path: impl AsRef<Path>, quotas: ReadQuotas) -> Result<Document> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::ResourceRead {
        uri: path.display().to_string(),
        source,
    })?;

    let mut decoder = Decoder::new(DirectoryStore::new(base_dir(path))).with_quotas(quotas);
    tracing::debug!(path = %path.display(), "opening glTF file");

    #[cfg(feature = "mmap")]
    {
        // Mapping an empty file fails on some platforms.
        if file.metadata()?.len() > 0 {
            // Safety: the map is read-only and dropped before this returns.
            let mmap = unsafe { memmap2::Mmap::map(&file) }?;
            return decoder.decode(&mmap[..]);
        }
    }

    decoder.decode(BufReader::new(file))
}

/// Encode `doc` to `path`, writing external buffers next to it.
pub fn save(path: impl AsRef<Path>, doc: &mut Document, binary: bool) -> Result<()> {
    save_with_options(path, doc, EncodeOptions::default().with_binary(binary))
}

/// Encode `doc` to `path` with explicit options.
pub fn save_with_options(
    path: impl AsRef<Path>,
    doc: &mut Document,
    options: EncodeOptions,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| Error::ResourceWrite {
        uri: path.display().to_string(),
        source,
    })?;

    tracing::debug!(path = %path.display(), binary = options.binary, "saving glTF file");
    Encoder::new(DirectoryStore::new(base_dir(path)), options).encode(doc, BufWriter::new(file))
}
