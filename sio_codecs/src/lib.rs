mod compressed;
mod flate_codec;
mod lz4_codec;
mod passthrough;
pub mod payloads;
mod zstd_codec;

pub use compressed::{Compressed, MAX_RAW_LEN};
pub use flate_codec::FlateCompressor;
pub use lz4_codec::Lz4Compressor;
pub use passthrough::PassThroughCompressor;
pub use zstd_codec::ZstdCompressor;

use std::sync::Arc;

// ── Compressor IDs ─────────────────────────────────────────────────────────

pub const COMPRESSOR_NONE: u16 = 0;
pub const COMPRESSOR_ZSTD: u16 = 1;
pub const COMPRESSOR_LZ4: u16 = 2;
pub const COMPRESSOR_FLATE: u16 = 3;

/// Byte-level compression transform applied to a block payload.
///
/// The envelope does not describe the transform; it lives here, behind a
/// stable numeric `id()` stored in front of each compressed payload.
pub trait Compressor: Send + Sync {
    /// Stable id stored with every compressed payload.
    fn id(&self) -> u16;

    /// Human-readable name for CLI display.
    fn name(&self) -> &'static str;

    fn compress(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>>;

    /// Reverse [`Compressor::compress`]. `raw_len` is the original size,
    /// stored alongside the payload; output longer than it is an error.
    fn decompress(&self, stored: &[u8], raw_len: usize) -> anyhow::Result<Vec<u8>>;
}

/// Resolve a compressor from its stored id.
///
/// Used when decoding a [`Compressed`] payload, so the reader does not need
/// to know in advance which transform the writer picked.
pub fn compressor_by_id(id: u16) -> anyhow::Result<Arc<dyn Compressor>> {
    match id {
        COMPRESSOR_NONE => Ok(Arc::new(PassThroughCompressor)),
        COMPRESSOR_ZSTD => Ok(Arc::new(ZstdCompressor::default())),
        COMPRESSOR_LZ4 => Ok(Arc::new(Lz4Compressor)),
        COMPRESSOR_FLATE => Ok(Arc::new(FlateCompressor::default())),
        _ => anyhow::bail!(
            "unknown compressor id {}; supported: 0 (none), 1 (zstd), 2 (lz4), 3 (flate)",
            id
        ),
    }
}

/// Resolve a compressor from a CLI-style name.
pub fn compressor_by_name(name: &str, zstd_level: i32) -> anyhow::Result<Arc<dyn Compressor>> {
    match name {
        "none" | "passthrough" | "pass" => Ok(Arc::new(PassThroughCompressor)),
        "zstd" | "z" => Ok(Arc::new(ZstdCompressor::new(zstd_level))),
        "lz4" | "l" => Ok(Arc::new(Lz4Compressor)),
        "flate" | "deflate" => Ok(Arc::new(FlateCompressor::default())),
        other => anyhow::bail!(
            "unknown compressor '{}'. Valid options: none, zstd, lz4, flate",
            other
        ),
    }
}
