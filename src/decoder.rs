//! Document decoder.

use std::io::Read;

use crate::document::Document;
use crate::glb::{read_container, BinarySource};
use crate::quota::ReadQuotas;
use crate::resolver::resolve_buffers;
use crate::resource::{NoResources, ResourceReader};
use crate::util::Result;

/// Reads glTF JSON or GLB input into a fully resolved [`Document`].
///
/// External buffers are fetched through the resource reader `R`. A decoder
/// keeps no state between calls apart from its configuration.
#[derive(Debug, Clone)]
pub struct Decoder<R> {
    resources: R,
    quotas: ReadQuotas,
}

impl Default for Decoder<NoResources> {
    fn default() -> Self {
        Self::new(NoResources)
    }
}

impl<R: ResourceReader> Decoder<R> {
    /// Create a decoder reading external buffers through `resources`.
    pub fn new(resources: R) -> Self {
        Self {
            resources,
            quotas: ReadQuotas::default(),
        }
    }

    /// Apply quotas to every subsequent decode.
    pub fn with_quotas(mut self, quotas: ReadQuotas) -> Self {
        self.quotas = quotas;
        self
    }

    pub fn quotas(&self) -> ReadQuotas {
        self.quotas
    }

    pub fn resources(&self) -> &R {
        &self.resources
    }

    pub fn into_resources(self) -> R {
        self.resources
    }

    /// Decode one document from `stream`.
    ///
    /// The input is GLB if it starts with the GLB magic and JSON otherwise.
    /// The binary chunk is only pulled from `stream` once buffer 0 has
    /// passed the memory quota.
    /// On error nothing is returned; there is no partial document.
    #[tracing::instrument(skip_all)]
    pub fn decode<S: Read>(&mut self, stream: S) -> Result<Document> {
        let mut container = read_container(stream)?;
        let mut doc: Document = serde_json::from_slice(&container.json)?;

        tracing::debug!(
            binary = container.binary,
            bin_len = container.bin_len(),
            buffers = doc.buffers.len(),
            "parsed document"
        );

        let bin = match container.bin_len() {
            Some(_) => Some(&mut container as &mut dyn BinarySource),
            None => None,
        };
        resolve_buffers(&mut doc.buffers, bin, &mut self.resources, self.quotas)?;
        container.finish()?;
        Ok(doc)
    }

    /// Decode one document held in memory.
    pub fn decode_slice(&mut self, bytes: &[u8]) -> Result<Document> {
        self.decode(bytes)
    }
}
