//! Document encoder.

use std::io::Write;

use crate::document::Document;
use crate::glb::write_container;
use crate::resolver::emit_buffers;
use crate::resource::{NoResources, ResourceWriter};
use crate::util::Result;

/// Output settings for an [`Encoder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Frame the output as GLB instead of plain JSON.
    pub binary: bool,
    /// Indent the JSON.
    pub pretty: bool,
}

impl EncodeOptions {
    /// Plain JSON output.
    pub fn json() -> Self {
        Self::default()
    }

    /// GLB output.
    pub fn binary() -> Self {
        Self {
            binary: true,
            ..Self::default()
        }
    }

    pub fn with_binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Writes a [`Document`] as glTF JSON or GLB.
///
/// External buffers are written through the resource writer `W` before the
/// document itself. Buffers marked with [`Buffer::mark_embedded`] are turned
/// into data URIs in place.
///
/// [`Buffer::mark_embedded`]: crate::Buffer::mark_embedded
#[derive(Debug, Clone)]
pub struct Encoder<W> {
    resources: W,
    options: EncodeOptions,
}

impl Default for Encoder<NoResources> {
    fn default() -> Self {
        Self::new(NoResources, EncodeOptions::default())
    }
}

impl<W: ResourceWriter> Encoder<W> {
    pub fn new(resources: W, options: EncodeOptions) -> Self {
        Self { resources, options }
    }

    pub fn options(&self) -> EncodeOptions {
        self.options
    }

    pub fn resources(&self) -> &W {
        &self.resources
    }

    pub fn into_resources(self) -> W {
        self.resources
    }

    /// Encode `doc` into `out`.
    ///
    /// With binary output, buffer 0 without a `uri` becomes the BIN chunk.
    /// External resources written before a failure are not removed.
    #[tracing::instrument(skip_all, fields(binary = self.options.binary))]
    pub fn encode<O: Write>(&mut self, doc: &mut Document, mut out: O) -> Result<()> {
        let claims_bin = emit_buffers(&mut doc.buffers, self.options.binary, &mut self.resources)?;

        let json = if self.options.pretty {
            serde_json::to_vec_pretty(doc)?
        } else {
            serde_json::to_vec(doc)?
        };

        if self.options.binary {
            let bin = if claims_bin {
                Some(doc.buffers[0].bytes())
            } else {
                None
            };
            write_container(out, &json, bin)?;
        } else {
            out.write_all(&json)?;
            out.flush()?;
            tracing::debug!(json_len = json.len(), "wrote glTF JSON");
        }
        Ok(())
    }

    /// Encode `doc` into a new byte vector.
    pub fn encode_to_vec(&mut self, doc: &mut Document) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode(doc, &mut out)?;
        Ok(out)
    }
}
