use crate::codec::{BinaryCodec, Block};
use crate::error::{Error, Result};
use crate::format::{align4, BlockData, BlockHeader, BLOCK_MARKER, ENVELOPE_FIXED_SIZE};
use crate::record::Record;

impl Record<'_> {
    /// Append one envelope per connected block to `buf`.
    ///
    /// # Layout written, per block
    /// ```text
    /// [len:u32][typ:u32 = BLOCK_MARKER]     ← header
    /// [version:u32][name_len:u32]           ← sub-header
    /// [name][0-3 zero bytes]                ← name padded to 4
    /// [payload]                             ← block's own marshal output
    /// ```
    /// Blocks are emitted in connect order. On error, envelopes already
    /// appended stay in `buf`; discard it.
    pub fn write(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut scratch = Vec::new();
        for blk in &self.blocks {
            let name = blk.name();

            scratch.clear();
            blk.marshal_binary(&mut scratch)
                .map_err(|e| Error::payload(name, e))?;

            // connect() bounds the name length, so neither conversion can fail
            let name_len = name.len() as u32;
            let padded = align4(name_len);
            let len = u32::try_from(ENVELOPE_FIXED_SIZE + padded as usize + scratch.len())
                .map_err(|_| Error::PayloadTooLarge {
                    name: name.to_string(),
                    len: scratch.len(),
                })?;

            let header = BlockHeader {
                len,
                typ: BLOCK_MARKER,
            };
            let data = BlockData {
                version: blk.version(),
                name_len,
            };

            buf.reserve(len as usize);
            buf.extend_from_slice(&header.to_bytes());
            buf.extend_from_slice(&data.to_bytes());
            buf.extend_from_slice(name.as_bytes());
            buf.resize(buf.len() + (padded - name_len) as usize, 0);
            buf.extend_from_slice(&scratch);

            log::trace!(
                "record {:?}: wrote block {:?} v{} ({} bytes)",
                self.name(),
                name,
                data.version,
                len
            );
        }
        Ok(())
    }

    /// Encode every connected block into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(buf)
    }
}
