//! Buffer resolution.
//!
//! Every buffer gets its bytes from exactly one place: an inline data URI,
//! the GLB binary chunk, or an external resource named by `uri`. Buffers are
//! processed strictly in document order, since only buffer 0 may bind to the
//! binary chunk and quota accounting follows the same order.

use std::io::{Read, Write};

use crate::document::Buffer;
use crate::embedded;
use crate::glb::{BinarySource, CHUNK_ALIGNMENT};
use crate::quota::{QuotaGuard, ReadQuotas};
use crate::resource::{ResourceReader, ResourceWriter};
use crate::util::{validate_resource_uri, Error, Result};

/// Initial allocation cap for external reads; larger buffers grow as read.
const PREALLOC_LIMIT: u64 = 1 << 20;

/// Where a buffer's bytes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferSource<'a> {
    /// Inline `data:` URI.
    Embedded(&'a str),
    /// The GLB binary chunk (no `uri`).
    BinaryChunk,
    /// Resource named by `uri`, served by the host.
    External(&'a str),
}

impl<'a> BufferSource<'a> {
    /// Classify a buffer by its `uri`.
    pub fn of(buffer: &'a Buffer) -> Self {
        match buffer.uri() {
            None => Self::BinaryChunk,
            Some(uri) if embedded::is_embedded(uri) => Self::Embedded(uri),
            Some(uri) => Self::External(uri),
        }
    }
}

/// Fill `data` of every buffer.
///
/// `bin` gives access to the container's binary chunk, if any. It is read
/// only after buffer 0 has passed the memory quota, and never past that
/// buffer's `byteLength`. Any error aborts the whole pass; buffers resolved
/// before it keep their data but the caller must treat the document as
/// unusable.
pub fn resolve_buffers<R>(
    buffers: &mut [Buffer],
    bin: Option<&mut dyn BinarySource>,
    resources: &mut R,
    quotas: ReadQuotas,
) -> Result<()>
where
    R: ResourceReader + ?Sized,
{
    let mut guard = QuotaGuard::new(quotas);
    guard.admit_buffers(buffers.len())?;

    let mut bin = bin;
    for (index, buffer) in buffers.iter_mut().enumerate() {
        let data = resolve_buffer(index, buffer, &mut bin, resources, &mut guard)?;
        buffer.data = Some(data);
    }

    tracing::debug!(
        buffers = guard.buffers(),
        allocated = guard.allocated(),
        "resolved buffers"
    );
    Ok(())
}

fn resolve_buffer<R>(
    index: usize,
    buffer: &Buffer,
    bin: &mut Option<&mut dyn BinarySource>,
    resources: &mut R,
    guard: &mut QuotaGuard,
) -> Result<Vec<u8>>
where
    R: ResourceReader + ?Sized,
{
    let expected = buffer.byte_length;
    if expected == 0 {
        return Err(Error::invalid_buffer(index, "byteLength must be positive"));
    }

    let source = BufferSource::of(buffer);
    tracing::trace!(index, byte_length = expected, ?source, "resolving buffer");

    match source {
        BufferSource::Embedded(uri) => {
            guard.reserve(expected)?;
            let data = embedded::decode_prefix(uri, expected)?;
            fit_length(index, data, expected)
        }
        BufferSource::BinaryChunk => {
            if index != 0 {
                return Err(Error::MissingBinaryChunk { index });
            }
            let source = bin.take().ok_or(Error::MissingBinaryChunk { index })?;
            guard.reserve(expected)?;
            let data = source.read_payload(expected)?;
            fit_length(index, data, expected)
        }
        BufferSource::External(uri) => {
            validate_resource_uri(uri)?;
            guard.reserve(expected)?;
            read_external(uri, expected, resources)
        }
    }
}

/// Read at most `expected` bytes of `uri`; anything past the declared length
/// is never materialized.
fn read_external<R>(uri: &str, expected: u64, resources: &mut R) -> Result<Vec<u8>>
where
    R: ResourceReader + ?Sized,
{
    let read_error = |source| Error::ResourceRead {
        uri: uri.to_string(),
        source,
    };

    let stream = resources.open_read(uri).map_err(read_error)?;
    let mut data = Vec::with_capacity(expected.min(PREALLOC_LIMIT) as usize);
    stream.take(expected).read_to_end(&mut data).map_err(read_error)?;

    if (data.len() as u64) < expected {
        return Err(Error::ShortRead {
            uri: uri.to_string(),
            expected,
            actual: data.len() as u64,
        });
    }
    Ok(data)
}

/// Enforce the length policy: fewer bytes than declared is an error, extra
/// bytes (chunk padding, over-long payloads) are dropped.
fn fit_length(index: usize, mut data: Vec<u8>, expected: u64) -> Result<Vec<u8>> {
    let actual = data.len() as u64;
    if actual < expected {
        return Err(Error::invalid_buffer(
            index,
            format!("holds {actual} bytes but byteLength is {expected}"),
        ));
    }
    if actual > expected {
        if actual - expected >= CHUNK_ALIGNMENT as u64 {
            tracing::warn!(index, actual, expected, "truncating buffer to byteLength");
        }
        data.truncate(expected as usize);
    }
    Ok(data)
}

/// Emit every buffer's bytes ahead of serialization.
///
/// Returns `true` when buffer 0 becomes the GLB binary chunk (only possible
/// when `binary` is set). Buffers marked for embedding get their `uri`
/// rewritten in place; external buffers are written through `resources`.
///
/// Not transactional: resources written before a failing buffer stay
/// written.
pub fn emit_buffers<W>(buffers: &mut [Buffer], binary: bool, resources: &mut W) -> Result<bool>
where
    W: ResourceWriter + ?Sized,
{
    let mut claims_bin = false;
    let mut written = 0usize;

    for (index, buffer) in buffers.iter_mut().enumerate() {
        if buffer.byte_length == 0 {
            return Err(Error::invalid_buffer(index, "byteLength must be positive"));
        }

        if binary && index == 0 && buffer.uri().is_none() && !buffer.is_marked_embedded() {
            check_data(index, buffer)?;
            tracing::trace!(index, len = buffer.bytes().len(), "buffer stored in BIN chunk");
            claims_bin = true;
            continue;
        }

        if buffer.is_marked_embedded() {
            check_data(index, buffer)?;
            buffer.take_embed_mark();
            buffer.uri = Some(embedded::encode(buffer.bytes()));
            tracing::trace!(index, len = buffer.bytes().len(), "buffer embedded");
            continue;
        }

        match BufferSource::of(buffer) {
            BufferSource::Embedded(_) => {}
            BufferSource::BinaryChunk => return Err(Error::MissingBinaryChunk { index }),
            BufferSource::External(uri) => {
                check_data(index, buffer)?;
                write_external(uri, buffer.byte_length, buffer.bytes(), resources)?;
                written += 1;
            }
        }
    }

    tracing::debug!(buffers = buffers.len(), written, claims_bin, "emitted buffers");
    Ok(claims_bin)
}

/// Emitted bytes must cover `byteLength`, or the output would not decode.
fn check_data(index: usize, buffer: &Buffer) -> Result<()> {
    let len = buffer.bytes().len() as u64;
    if len < buffer.byte_length {
        return Err(Error::invalid_buffer(
            index,
            format!("holds {len} bytes but byteLength is {}", buffer.byte_length),
        ));
    }
    Ok(())
}

fn write_external<W>(uri: &str, size_hint: u64, data: &[u8], resources: &mut W) -> Result<()>
where
    W: ResourceWriter + ?Sized,
{
    validate_resource_uri(uri)?;
    let write_error = |source| Error::ResourceWrite {
        uri: uri.to_string(),
        source,
    };

    let mut sink = resources.open_write(uri, size_hint).map_err(write_error)?;
    sink.write_all(data).map_err(write_error)?;
    sink.flush().map_err(write_error)?;
    tracing::trace!(uri, len = data.len(), "wrote external buffer");
    Ok(())
}
