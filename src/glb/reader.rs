//! GLB container reader.
//!
//! The JSON chunk is read eagerly. The BIN chunk is left on the stream until
//! a buffer claims it, so callers can apply quotas before any allocation.

use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::format::*;
use crate::util::{Error, Result};

/// Deferred access to the payload of a GLB binary chunk.
pub trait BinarySource {
    /// Read at most `limit` bytes from the start of the payload.
    ///
    /// Returns fewer bytes only if the payload itself is shorter. The
    /// payload can be taken once.
    fn read_payload(&mut self, limit: u64) -> Result<Vec<u8>>;
}

impl BinarySource for Vec<u8> {
    fn read_payload(&mut self, limit: u64) -> Result<Vec<u8>> {
        let mut data = std::mem::take(self);
        data.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(data)
    }
}

/// A parsed container with its binary payload still pending.
///
/// Plain JSON input produces a `Container` with `binary == false` and no
/// binary chunk.
#[derive(Debug)]
pub struct Container<R> {
    /// Payload of the JSON chunk, or the whole stream for plain JSON.
    pub json: Vec<u8>,
    /// Whether the input was framed as GLB.
    pub binary: bool,
    chunks: Option<ChunkStream<R>>,
}

impl<R: Read> Container<R> {
    /// Container for an unframed JSON stream.
    pub fn text(json: Vec<u8>) -> Self {
        Self {
            json,
            binary: false,
            chunks: None,
        }
    }

    /// Declared length of the BIN chunk, while it has not been read.
    pub fn bin_len(&self) -> Option<u64> {
        self.chunks.as_ref().and_then(|chunks| chunks.bin_len)
    }

    /// Skip whatever the caller did not read and validate the chunks that
    /// follow, up to the declared total length.
    pub fn finish(self) -> Result<()> {
        match self.chunks {
            Some(chunks) => chunks.finish(),
            None => Ok(()),
        }
    }

    /// Read the whole BIN chunk, if any, and finish the container.
    pub fn into_parts(mut self) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
        let bin = match self.bin_len() {
            Some(_) => Some(self.read_payload(u64::MAX)?),
            None => None,
        };
        let json = std::mem::take(&mut self.json);
        self.finish()?;
        Ok((json, bin))
    }
}

impl<R: Read> BinarySource for Container<R> {
    fn read_payload(&mut self, limit: u64) -> Result<Vec<u8>> {
        match self.chunks.as_mut() {
            Some(chunks) => chunks.read_bin(limit),
            None => Err(Error::chunk("no binary chunk to read")),
        }
    }
}

/// Tracks the byte position while pulling fields off the stream, so
/// truncation errors can name the offset.
#[derive(Debug)]
struct ChunkReader<R> {
    inner: R,
    pos: u64,
}

impl<R: Read> ChunkReader<R> {
    fn new(inner: R, pos: u64) -> Self {
        Self { inner, pos }
    }

    fn read_u32(&mut self) -> Result<u32> {
        let value = self.inner.read_u32::<LittleEndian>().map_err(|e| self.eof(e))?;
        self.pos += 4;
        Ok(value)
    }

    /// Read exactly `len` bytes without trusting `len` for the allocation.
    fn read_payload(&mut self, len: u64) -> Result<Vec<u8>> {
        let mut payload = Vec::new();
        (&mut self.inner).take(len).read_to_end(&mut payload)?;
        self.pos += payload.len() as u64;
        if (payload.len() as u64) < len {
            return Err(Error::UnexpectedEof(self.pos));
        }
        Ok(payload)
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.inner).take(len), &mut io::sink())?;
        self.pos += skipped;
        if skipped < len {
            return Err(Error::UnexpectedEof(self.pos));
        }
        Ok(())
    }

    fn eof(&self, e: io::Error) -> Error {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof(self.pos)
        } else {
            Error::Io(e)
        }
    }
}

/// Chunk-level state of a GLB stream past the header.
#[derive(Debug)]
struct ChunkStream<R> {
    reader: ChunkReader<R>,
    total_length: u64,
    /// Chunks seen so far, including the pending BIN chunk.
    index: usize,
    /// Declared length of the BIN chunk while its payload is unread.
    bin_len: Option<u64>,
    /// Bytes of the current chunk (payload and padding) not yet consumed.
    pending: u64,
}

impl<R: Read> ChunkStream<R> {
    fn new(reader: ChunkReader<R>, total_length: u64) -> Self {
        Self {
            reader,
            total_length,
            index: 0,
            bin_len: None,
            pending: 0,
        }
    }

    fn has_more(&self) -> bool {
        self.reader.pos < self.total_length
    }

    /// Read the next chunk header and check it against the ordering rules.
    fn next_header(&mut self) -> Result<(ChunkKind, u64)> {
        let remaining = self.total_length - self.reader.pos;
        if remaining < CHUNK_HEADER_SIZE as u64 {
            return Err(Error::chunk(format!(
                "{remaining} trailing bytes cannot hold a chunk header"
            )));
        }

        let length = self.reader.read_u32()? as u64;
        let kind = ChunkKind::from_tag(self.reader.read_u32()?);
        let index = self.index;
        if length > self.total_length - self.reader.pos {
            return Err(Error::chunk(format!(
                "chunk {index} of {length} bytes overruns container length {}",
                self.total_length
            )));
        }

        match (index, kind) {
            (0, ChunkKind::Json) => {}
            (0, _) => return Err(Error::MissingJsonChunk),
            (_, ChunkKind::Json) => return Err(Error::chunk("duplicate JSON chunk")),
            (1, ChunkKind::Bin) => {}
            (_, ChunkKind::Bin) => {
                return Err(Error::chunk(format!(
                    "BIN chunk at position {index}, only the chunk after JSON may be BIN"
                )))
            }
            (_, ChunkKind::Unknown(tag)) => {
                tracing::debug!(index, tag, length, "skipping unknown GLB chunk");
            }
        }

        self.index += 1;
        self.pending = length + self.padding(length);
        Ok((kind, length))
    }

    /// Chunk lengths are normally already aligned; tolerate writers that
    /// record the unpadded length.
    fn padding(&self, length: u64) -> u64 {
        let after = self.total_length - self.reader.pos - length;
        (padded_len(length as usize) as u64 - length).min(after)
    }

    fn read_json(&mut self) -> Result<Vec<u8>> {
        let (_, length) = self.next_header()?;
        let json = self.reader.read_payload(length)?;
        self.skip_pending(length)?;
        Ok(json)
    }

    fn skip_pending(&mut self, consumed: u64) -> Result<()> {
        let rest = self.pending - consumed;
        self.pending = 0;
        self.reader.skip(rest)
    }

    /// Advance to the BIN chunk, stopping before its payload. Any other
    /// chunks in between are validated and skipped.
    fn seek_bin(&mut self) -> Result<()> {
        while self.has_more() {
            let (kind, length) = self.next_header()?;
            if kind == ChunkKind::Bin {
                self.bin_len = Some(length);
                return Ok(());
            }
            self.skip_pending(0)?;
        }
        Ok(())
    }

    fn read_bin(&mut self, limit: u64) -> Result<Vec<u8>> {
        let length = self
            .bin_len
            .take()
            .ok_or_else(|| Error::chunk("binary chunk already consumed"))?;
        let len = length.min(limit);
        let payload = self.reader.read_payload(len)?;
        self.skip_pending(len)?;
        Ok(payload)
    }

    fn finish(mut self) -> Result<()> {
        if self.bin_len.take().is_some() {
            self.skip_pending(0)?;
        }
        while self.has_more() {
            self.next_header()?;
            self.skip_pending(0)?;
        }
        tracing::debug!(
            total_length = self.total_length,
            chunks = self.index,
            "finished GLB container"
        );
        Ok(())
    }
}

/// Read a container from `stream`.
///
/// If the stream does not start with the GLB magic, the whole stream is
/// returned as JSON. Otherwise the header and JSON chunk are validated and
/// the stream is left at the start of the BIN payload, if there is one.
/// [`Container::finish`] consumes the rest up to the declared total length;
/// bytes after it are left unread.
pub fn read_container<R: Read>(mut stream: R) -> Result<Container<R>> {
    let mut head = Vec::with_capacity(GLB_MAGIC.len());
    (&mut stream).take(GLB_MAGIC.len() as u64).read_to_end(&mut head)?;

    if !is_glb(&head) {
        stream.read_to_end(&mut head)?;
        tracing::trace!(len = head.len(), "input is not GLB framed, reading as JSON");
        return Ok(Container::text(head));
    }

    read_chunks(stream)
}

/// Read a container that must be GLB framed.
pub fn read_glb<R: Read>(mut stream: R) -> Result<Container<R>> {
    let mut magic = [0u8; 4];
    stream.read_exact(&mut magic).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::InvalidMagic,
        _ => Error::Io(e),
    })?;
    if &magic != GLB_MAGIC {
        return Err(Error::InvalidMagic);
    }
    read_chunks(stream)
}

/// Header, JSON chunk and the BIN chunk header, with the magic already
/// consumed.
fn read_chunks<R: Read>(stream: R) -> Result<Container<R>> {
    let mut reader = ChunkReader::new(stream, GLB_MAGIC.len() as u64);
    let version = reader.read_u32()?;
    if version != GLB_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }
    let total_length = reader.read_u32()? as u64;
    if total_length < (HEADER_SIZE + CHUNK_HEADER_SIZE) as u64 {
        return Err(Error::MissingJsonChunk);
    }

    let mut chunks = ChunkStream::new(reader, total_length);
    let json = chunks.read_json()?;
    chunks.seek_bin()?;

    tracing::debug!(
        total_length,
        json_len = json.len(),
        bin_len = chunks.bin_len,
        "read GLB container"
    );

    Ok(Container {
        json,
        binary: true,
        chunks: Some(chunks),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::ErrorKind;

    fn header(version: u32, total: u32) -> Vec<u8> {
        let mut out = GLB_MAGIC.to_vec();
        out.extend_from_slice(&version.to_le_bytes());
        out.extend_from_slice(&total.to_le_bytes());
        out
    }

    fn chunk(tag: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = (payload.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn glb(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut out = header(GLB_VERSION, (HEADER_SIZE + body.len()) as u32);
        out.extend_from_slice(&body);
        out
    }

    fn parse(data: &[u8]) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
        read_container(data)?.into_parts()
    }

    /// Counts the bytes pulled from the wrapped reader.
    struct Counting<'a> {
        inner: &'a [u8],
        read: &'a std::cell::Cell<usize>,
    }

    impl Read for Counting<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.inner.read(buf)?;
            self.read.set(self.read.get() + n);
            Ok(n)
        }
    }

    #[test]
    fn test_plain_json() {
        let container = read_container(&b"{\"asset\":{}}"[..]).unwrap();
        assert!(!container.binary);
        assert_eq!(container.json, b"{\"asset\":{}}");
        assert!(container.bin_len().is_none());
        container.finish().unwrap();
    }

    #[test]
    fn test_short_plain_input() {
        let (json, bin) = parse(b"{}").unwrap();
        assert_eq!(json, b"{}");
        assert!(bin.is_none());
        let (json, _) = parse(b"").unwrap();
        assert!(json.is_empty());
    }

    #[test]
    fn test_json_and_bin() {
        let data = glb(&[chunk(CHUNK_TYPE_JSON, b"{}  "), chunk(CHUNK_TYPE_BIN, &[1, 2, 3, 0])]);
        let container = read_container(&data[..]).unwrap();
        assert!(container.binary);
        assert_eq!(container.bin_len(), Some(4));
        let (json, bin) = container.into_parts().unwrap();
        assert_eq!(json, b"{}  ");
        assert_eq!(bin.as_deref(), Some(&[1u8, 2, 3, 0][..]));
    }

    #[test]
    fn test_bin_payload_left_on_stream() {
        let payload = vec![7u8; 4096];
        let data = glb(&[chunk(CHUNK_TYPE_JSON, b"{}  "), chunk(CHUNK_TYPE_BIN, &payload)]);
        let read = std::cell::Cell::new(0);

        let mut container = read_container(Counting { inner: &data, read: &read }).unwrap();
        assert_eq!(read.get(), HEADER_SIZE + 2 * CHUNK_HEADER_SIZE + 4);
        assert_eq!(container.bin_len(), Some(4096));

        // Only the requested prefix is kept; the rest is skipped unbuffered.
        let head = container.read_payload(10).unwrap();
        assert_eq!(head, vec![7u8; 10]);
        assert_eq!(read.get(), data.len());
        assert!(container.bin_len().is_none());
        assert!(matches!(container.read_payload(1), Err(Error::InvalidChunk(_))));

        container.finish().unwrap();
        assert_eq!(read.get(), data.len());
    }

    #[test]
    fn test_unclaimed_bin_is_skipped() {
        let data = glb(&[chunk(CHUNK_TYPE_JSON, b"{}  "), chunk(CHUNK_TYPE_BIN, &[0; 64])]);
        let container = read_container(&data[..]).unwrap();
        container.finish().unwrap();
    }

    #[test]
    fn test_unaligned_chunk_length() {
        // Writer recorded the unpadded length but still padded the payload.
        let mut json = chunk(CHUNK_TYPE_JSON, b"{}");
        json.extend_from_slice(b"  ");
        let data = glb(&[json, chunk(CHUNK_TYPE_BIN, &[9, 9, 9, 9])]);
        let (json, bin) = parse(&data).unwrap();
        assert_eq!(json, b"{}");
        assert_eq!(bin, Some(vec![9, 9, 9, 9]));
    }

    #[test]
    fn test_unknown_chunk_skipped() {
        let data = glb(&[
            chunk(CHUNK_TYPE_JSON, b"{}  "),
            chunk(CHUNK_TYPE_BIN, &[1, 1, 1, 1]),
            chunk(0x1234_5678, &[0; 8]),
        ]);
        let (_, bin) = parse(&data).unwrap();
        assert_eq!(bin, Some(vec![1, 1, 1, 1]));

        let data = glb(&[chunk(CHUNK_TYPE_JSON, b"{}  "), chunk(0x1234_5678, &[0; 8])]);
        let container = read_container(&data[..]).unwrap();
        assert!(container.bin_len().is_none());
        container.finish().unwrap();
    }

    #[test]
    fn test_bad_version() {
        let data = header(1, 20);
        let err = read_container(&data[..]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(1)));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_header_only_is_truncated() {
        let data = header(GLB_VERSION, 32);
        let err = read_container(&data[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_declared_length_too_small() {
        let data = header(GLB_VERSION, 12);
        assert!(matches!(read_container(&data[..]), Err(Error::MissingJsonChunk)));
    }

    #[test]
    fn test_first_chunk_not_json() {
        let data = glb(&[chunk(CHUNK_TYPE_BIN, &[0; 4])]);
        assert!(matches!(read_container(&data[..]), Err(Error::MissingJsonChunk)));

        // "JRON" instead of "JSON"
        let data = glb(&[chunk(u32::from_le_bytes(*b"JRON"), b"{}  ")]);
        assert!(matches!(read_container(&data[..]), Err(Error::MissingJsonChunk)));
    }

    #[test]
    fn test_chunk_order() {
        let data = glb(&[chunk(CHUNK_TYPE_JSON, b"{}  "), chunk(CHUNK_TYPE_JSON, b"{}  ")]);
        assert!(matches!(parse(&data), Err(Error::InvalidChunk(_))));

        // A second BIN chunk shows up once the first has been consumed.
        let data = glb(&[
            chunk(CHUNK_TYPE_JSON, b"{}  "),
            chunk(CHUNK_TYPE_BIN, &[0; 4]),
            chunk(CHUNK_TYPE_BIN, &[0; 4]),
        ]);
        assert!(read_container(&data[..]).is_ok());
        assert!(matches!(parse(&data), Err(Error::InvalidChunk(_))));

        let data = glb(&[
            chunk(CHUNK_TYPE_JSON, b"{}  "),
            chunk(0x99, &[0; 4]),
            chunk(CHUNK_TYPE_BIN, &[0; 4]),
        ]);
        assert!(matches!(read_container(&data[..]), Err(Error::InvalidChunk(_))));
    }

    #[test]
    fn test_truncated_payload() {
        let mut data = glb(&[chunk(CHUNK_TYPE_JSON, b"{\"asset\":{}}")]);
        data.truncate(data.len() - 3);
        let err = read_container(&data[..]).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof(_)));

        let mut data = glb(&[chunk(CHUNK_TYPE_JSON, b"{}  "), chunk(CHUNK_TYPE_BIN, &[1; 8])]);
        data.truncate(data.len() - 1);
        let mut container = read_container(&data[..]).unwrap();
        assert!(matches!(container.read_payload(8), Err(Error::UnexpectedEof(_))));
    }

    #[test]
    fn test_chunk_overruns_total() {
        let mut data = header(GLB_VERSION, 24);
        data.extend_from_slice(&chunk(CHUNK_TYPE_JSON, b"{\"asset\":{}}"));
        assert!(matches!(read_container(&data[..]), Err(Error::InvalidChunk(_))));
    }

    #[test]
    fn test_read_glb_requires_magic() {
        assert!(matches!(read_glb(&b"{\"asset\":{}}"[..]), Err(Error::InvalidMagic)));
        assert!(matches!(read_glb(&b"gl"[..]), Err(Error::InvalidMagic)));

        let data = glb(&[chunk(CHUNK_TYPE_JSON, b"{}  ")]);
        assert!(read_glb(&data[..]).unwrap().binary);
    }

    #[test]
    fn test_vec_source() {
        let mut bin = vec![1u8, 2, 3, 4];
        assert_eq!(bin.read_payload(2).unwrap(), [1u8, 2]);
        assert!(bin.is_empty());
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut data = glb(&[chunk(CHUNK_TYPE_JSON, b"{}  ")]);
        data.extend_from_slice(b"garbage");
        let (json, bin) = parse(&data).unwrap();
        assert_eq!(json, b"{}  ");
        assert!(bin.is_none());
    }
}
