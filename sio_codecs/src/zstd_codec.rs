use crate::{Compressor, COMPRESSOR_ZSTD};

/// Zstandard compressor.
///
/// Each payload is compressed as its own frame at the configured level
/// (default: 3), so any block decodes without its neighbours.
pub struct ZstdCompressor {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
}

impl Default for ZstdCompressor {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl ZstdCompressor {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Compressor for ZstdCompressor {
    fn id(&self) -> u16 {
        COMPRESSOR_ZSTD
    }

    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(zstd::bulk::compress(raw, self.level)?)
    }

    fn decompress(&self, stored: &[u8], raw_len: usize) -> anyhow::Result<Vec<u8>> {
        Ok(zstd::bulk::decompress(stored, raw_len)?)
    }
}
