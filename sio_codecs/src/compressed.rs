use std::sync::Arc;

use sio_core::format::checked_align4;
use sio_core::{BinaryCodec, Block};

use crate::{compressor_by_id, Compressor};

/// Size of the prefix in front of the stored bytes.
///   compressor_id:u32 + raw_len:u32 + stored_len:u32 = 12
const PREFIX_SIZE: usize = 12;

/// Largest decompressed size accepted on read. `raw_len` comes from the input
/// and sizes the output buffer, so it is bounded before any transform runs.
pub const MAX_RAW_LEN: usize = 256 << 20;

/// Payload wrapper that compresses the inner payload's encoding.
///
/// # Layout
/// ```text
/// [compressor_id:u32][raw_len:u32][stored_len:u32]
/// [stored bytes][0-3 zero bytes]
/// ```
/// All integers are big-endian. Decoding resolves the compressor from the
/// stored id, so a reader can open payloads written with any bundled
/// transform. Implements [`Block`] when the inner payload does, forwarding its
/// version.
pub struct Compressed<B> {
    inner: B,
    compressor: Arc<dyn Compressor>,
}

impl<B> Compressed<B> {
    pub fn new(inner: B, compressor: Arc<dyn Compressor>) -> Self {
        Self { inner, compressor }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }

    pub fn into_inner(self) -> B {
        self.inner
    }

    /// Compressor used on write.
    pub fn compressor(&self) -> &dyn Compressor {
        self.compressor.as_ref()
    }
}

fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

impl<B: BinaryCodec> BinaryCodec for Compressed<B> {
    fn marshal_binary(&self, buf: &mut Vec<u8>) -> anyhow::Result<()> {
        let mut raw = Vec::new();
        self.inner.marshal_binary(&mut raw)?;
        let stored = self.compressor.compress(&raw)?;

        let raw_len = u32::try_from(raw.len())?;
        let stored_len = u32::try_from(stored.len())?;
        let padded = checked_align4(stored_len)
            .ok_or_else(|| anyhow::anyhow!("{} stored bytes cannot be padded", stored_len))?;

        buf.extend_from_slice(&u32::from(self.compressor.id()).to_be_bytes());
        buf.extend_from_slice(&raw_len.to_be_bytes());
        buf.extend_from_slice(&stored_len.to_be_bytes());
        buf.extend_from_slice(&stored);
        buf.resize(buf.len() + (padded - stored_len) as usize, 0);

        log::trace!(
            "{}: {} -> {} bytes",
            self.compressor.name(),
            raw.len(),
            stored.len()
        );
        Ok(())
    }

    fn unmarshal_binary(&mut self, buf: &mut &[u8]) -> anyhow::Result<()> {
        if buf.len() < PREFIX_SIZE {
            anyhow::bail!(
                "compressed payload prefix needs {} bytes, have {}",
                PREFIX_SIZE,
                buf.len()
            );
        }
        let id = be_u32(&buf[0..4]);
        let raw_len = be_u32(&buf[4..8]) as usize;
        let stored_len = be_u32(&buf[8..12]) as usize;
        let padded = stored_len.div_ceil(4) * 4;
        if buf.len() < PREFIX_SIZE + padded {
            anyhow::bail!(
                "compressed payload needs {} bytes, have {}",
                padded,
                buf.len() - PREFIX_SIZE
            );
        }
        let id = u16::try_from(id).map_err(|_| anyhow::anyhow!("invalid compressor id {}", id))?;
        let stored = &buf[PREFIX_SIZE..PREFIX_SIZE + stored_len];
        if raw_len > MAX_RAW_LEN {
            anyhow::bail!(
                "compressed payload claims {} raw bytes, limit is {}",
                raw_len,
                MAX_RAW_LEN
            );
        }

        let compressor = compressor_by_id(id)?;
        let raw = compressor.decompress(stored, raw_len)?;
        if raw.len() != raw_len {
            anyhow::bail!(
                "{} payload decompressed to {} bytes but prefix says {}",
                compressor.name(),
                raw.len(),
                raw_len
            );
        }

        let mut cur = &raw[..];
        self.inner.unmarshal_binary(&mut cur)?;
        if !cur.is_empty() {
            anyhow::bail!(
                "inner payload left {} of {} decompressed bytes unread",
                cur.len(),
                raw_len
            );
        }

        *buf = &buf[PREFIX_SIZE + padded..];
        Ok(())
    }
}

impl<B: Block> Block for Compressed<B> {
    fn version(&self) -> u32 {
        self.inner.version()
    }
}
