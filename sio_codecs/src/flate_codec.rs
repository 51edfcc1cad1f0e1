use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::{Compressor, COMPRESSOR_FLATE};

/// Raw DEFLATE compressor.
pub struct FlateCompressor {
    /// Compression level, 0 (store) to 9 (best).
    pub level: u32,
}

impl Default for FlateCompressor {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl Compressor for FlateCompressor {
    fn id(&self) -> u16 {
        COMPRESSOR_FLATE
    }

    fn name(&self) -> &'static str {
        "flate"
    }

    fn compress(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::new(self.level));
        enc.write_all(raw)?;
        Ok(enc.finish()?)
    }

    /// Inflates at most one byte past `raw_len`; a stream that goes further
    /// is rejected without reading the rest of it.
    fn decompress(&self, stored: &[u8], raw_len: usize) -> anyhow::Result<Vec<u8>> {
        let mut raw = Vec::with_capacity(raw_len);
        DeflateDecoder::new(stored)
            .take(raw_len as u64 + 1)
            .read_to_end(&mut raw)?;
        if raw.len() > raw_len {
            anyhow::bail!("flate stream inflates past the declared {} bytes", raw_len);
        }
        Ok(raw)
    }
}
