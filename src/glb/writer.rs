//! GLB container writer.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use smallvec::SmallVec;

use super::format::*;
use crate::util::{Error, Result};

/// Output stream for writing container data.
pub struct GlbWriter<W: Write> {
    writer: W,
    pos: u64,
}

impl<W: Write> GlbWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, pos: 0 }
    }

    /// Get the current write position.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Write bytes and advance position.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.pos += data.len() as u64;
        Ok(())
    }

    /// Write a u32 value (little-endian).
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32::<LittleEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    /// Write the 12-byte container header.
    pub fn write_header(&mut self, total_length: u32) -> Result<()> {
        self.write_bytes(GLB_MAGIC)?;
        self.write_u32(GLB_VERSION)?;
        self.write_u32(total_length)
    }

    /// Write one chunk: padded length, type tag, payload, padding.
    pub fn write_chunk(&mut self, chunk: &Chunk<'_>) -> Result<()> {
        let padded = padded_len(chunk.payload.len());
        self.write_u32(to_u32(padded)?)?;
        self.write_u32(chunk.kind.tag())?;
        self.write_bytes(chunk.payload)?;
        for _ in chunk.payload.len()..padded {
            self.writer.write_u8(chunk.kind.padding())?;
            self.pos += 1;
        }
        Ok(())
    }

    /// Flush and hand back the inner writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

fn to_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::chunk(format!("{len} bytes do not fit a GLB container")))
}

/// Total container length for the given chunks.
pub fn container_len(chunks: &[Chunk<'_>]) -> usize {
    HEADER_SIZE + chunks.iter().map(Chunk::framed_len).sum::<usize>()
}

/// Frame `json` and optional `bin` as a GLB container.
///
/// Returns the number of bytes written.
pub fn write_container<W: Write>(out: W, json: &[u8], bin: Option<&[u8]>) -> Result<u64> {
    let mut chunks: SmallVec<[Chunk<'_>; 2]> = SmallVec::new();
    chunks.push(Chunk::json(json));
    chunks.extend(bin.map(Chunk::bin));
    let total = to_u32(container_len(&chunks))?;

    let mut writer = GlbWriter::new(out);
    writer.write_header(total)?;
    for chunk in &chunks {
        writer.write_chunk(chunk)?;
    }
    let written = writer.pos();
    writer.finish()?;

    tracing::debug!(
        total,
        json_len = json.len(),
        bin_len = bin.map_or(0, <[u8]>::len),
        "wrote GLB container"
    );
    Ok(written)
}
