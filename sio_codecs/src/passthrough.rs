use crate::{Compressor, COMPRESSOR_NONE};

/// No-op compressor: stores payloads verbatim.
///
/// Lets a record keep the compressed payload layout (id + lengths) while
/// skipping the transform, e.g. for data that is already compressed.
pub struct PassThroughCompressor;

impl Compressor for PassThroughCompressor {
    fn id(&self) -> u16 {
        COMPRESSOR_NONE
    }

    fn name(&self) -> &'static str {
        "none"
    }

    fn compress(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn decompress(&self, stored: &[u8], _raw_len: usize) -> anyhow::Result<Vec<u8>> {
        Ok(stored.to_vec())
    }
}
