//! Host resource capabilities.
//!
//! The codec never touches storage itself. External buffers are read and
//! written through a [`ResourceReader`] / [`ResourceWriter`] supplied by the
//! caller, which owns every policy decision about where names resolve.
//!
//! Closures work directly:
//!
//! ```
//! use std::io;
//! use gltf_io::Decoder;
//!
//! let mut decoder = Decoder::new(|uri: &str| -> io::Result<io::Cursor<Vec<u8>>> {
//!     Err(io::Error::new(io::ErrorKind::NotFound, uri.to_string()))
//! });
//! # let _ = &mut decoder;
//! ```

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::util::percent_decode;

/// Opens named resources for reading.
pub trait ResourceReader {
    /// Open `uri` for reading. The stream is read to the end and dropped.
    fn open_read(&mut self, uri: &str) -> io::Result<Box<dyn Read + '_>>;
}

/// Opens named resources for writing.
pub trait ResourceWriter {
    /// Open `uri` for writing `size_hint` bytes. The sink is flushed and
    /// dropped once the buffer is written.
    fn open_write(&mut self, uri: &str, size_hint: u64) -> io::Result<Box<dyn Write + '_>>;
}

impl<F, R> ResourceReader for F
where
    F: FnMut(&str) -> io::Result<R>,
    R: Read + 'static,
{
    fn open_read(&mut self, uri: &str) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(self(uri)?))
    }
}

impl<F, W> ResourceWriter for F
where
    F: FnMut(&str, u64) -> io::Result<W>,
    W: Write + 'static,
{
    fn open_write(&mut self, uri: &str, size_hint: u64) -> io::Result<Box<dyn Write + '_>> {
        Ok(Box::new(self(uri, size_hint)?))
    }
}

/// Refuses every request.
///
/// Useful for self-contained input (GLB or embedded buffers only), where any
/// external reference is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResources;

fn unavailable(uri: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("no resource handler for '{uri}'"),
    )
}

impl ResourceReader for NoResources {
    fn open_read(&mut self, uri: &str) -> io::Result<Box<dyn Read + '_>> {
        Err(unavailable(uri))
    }
}

impl ResourceWriter for NoResources {
    fn open_write(&mut self, uri: &str, _size_hint: u64) -> io::Result<Box<dyn Write + '_>> {
        Err(unavailable(uri))
    }
}

/// In-memory resource store.
///
/// Clones share the same contents, so one store can back an encoder and a
/// decoder.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, uri: impl Into<String>, data: Vec<u8>) {
        self.entries.write().insert(uri.into(), data);
    }

    pub fn get(&self, uri: &str) -> Option<Vec<u8>> {
        self.entries.read().get(uri).cloned()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.entries.read().contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Stored names, sorted.
    pub fn uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.entries.read().keys().cloned().collect();
        uris.sort();
        uris
    }
}

impl ResourceReader for MemoryStore {
    fn open_read(&mut self, uri: &str) -> io::Result<Box<dyn Read + '_>> {
        match self.get(uri) {
            Some(data) => Ok(Box::new(Cursor::new(data))),
            None => Err(io::Error::new(io::ErrorKind::NotFound, uri.to_string())),
        }
    }
}

impl ResourceWriter for MemoryStore {
    fn open_write(&mut self, uri: &str, size_hint: u64) -> io::Result<Box<dyn Write + '_>> {
        let capacity = usize::try_from(size_hint).unwrap_or(0);
        self.entries
            .write()
            .insert(uri.to_string(), Vec::with_capacity(capacity));
        Ok(Box::new(MemorySink {
            entries: &self.entries,
            uri: uri.to_string(),
        }))
    }
}

/// Appends straight into the store entry.
struct MemorySink<'a> {
    entries: &'a RwLock<HashMap<String, Vec<u8>>>,
    uri: String,
}

impl Write for MemorySink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.entries
            .write()
            .entry(self.uri.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Resolves references against a directory on the local filesystem.
///
/// References are percent-decoded before joining. Sandbox validation has
/// already happened by the time the store is called.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path a reference maps to.
    pub fn path_for(&self, uri: &str) -> PathBuf {
        self.root.join(percent_decode(uri))
    }
}

impl ResourceReader for DirectoryStore {
    fn open_read(&mut self, uri: &str) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(self.path_for(uri))?))
    }
}

impl ResourceWriter for DirectoryStore {
    fn open_write(&mut self, uri: &str, _size_hint: u64) -> io::Result<Box<dyn Write + '_>> {
        let path = self.path_for(uri);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(reader: &mut dyn ResourceReader, uri: &str) -> io::Result<Vec<u8>> {
        let mut data = Vec::new();
        reader.open_read(uri)?.read_to_end(&mut data)?;
        Ok(data)
    }

    #[test]
    fn test_closure_reader() {
        let mut reader =
            |uri: &str| -> io::Result<Cursor<Vec<u8>>> { Ok(Cursor::new(uri.as_bytes().to_vec())) };
        assert_eq!(read_all(&mut reader, "abc").unwrap(), b"abc");
    }

    #[test]
    fn test_no_resources() {
        let err = read_all(&mut NoResources, "a.bin").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert!(NoResources.open_write("a.bin", 1).is_err());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        {
            let mut sink = store.open_write("a.bin", 3).unwrap();
            sink.write_all(&[1, 2]).unwrap();
            sink.write_all(&[3]).unwrap();
            sink.flush().unwrap();
        }
        assert_eq!(store.get("a.bin"), Some(vec![1, 2, 3]));

        let shared = store.clone();
        assert!(shared.contains("a.bin"));
        assert_eq!(read_all(&mut store, "a.bin").unwrap(), [1u8, 2, 3]);

        let err = read_all(&mut store, "missing.bin").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_store_overwrite() {
        let mut store = MemoryStore::new();
        store.insert("a.bin", vec![9; 8]);
        store.open_write("a.bin", 1).unwrap().write_all(&[1]).unwrap();
        assert_eq!(store.get("a.bin"), Some(vec![1]));
        assert_eq!(store.uris(), vec!["a.bin".to_string()]);
    }

    #[test]
    fn test_directory_store() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = DirectoryStore::new(dir.path());

        {
            let mut sink = store.open_write("sub/with%20space.bin", 2)?;
            sink.write_all(&[4, 5])?;
            sink.flush()?;
        }
        assert!(dir.path().join("sub").join("with space.bin").exists());
        assert_eq!(read_all(&mut store, "sub/with%20space.bin")?, [4u8, 5]);
        assert!(read_all(&mut store, "nope.bin").is_err());
        Ok(())
    }
}
