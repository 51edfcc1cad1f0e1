use lz4_flex::block::{compress, decompress};

use crate::{Compressor, COMPRESSOR_LZ4};

/// LZ4 block compressor.
///
/// The raw length is already stored next to the payload, so the bare LZ4
/// block format is used rather than the size-prepended variant.
pub struct Lz4Compressor;

impl Compressor for Lz4Compressor {
    fn id(&self) -> u16 {
        COMPRESSOR_LZ4
    }

    fn name(&self) -> &'static str {
        "lz4"
    }

    fn compress(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(compress(raw))
    }

    fn decompress(&self, stored: &[u8], raw_len: usize) -> anyhow::Result<Vec<u8>> {
        decompress(stored, raw_len).map_err(|e| anyhow::anyhow!("lz4 decompress error: {}", e))
    }
}
