use crate::codec::BinaryCodec;
use crate::error::{Error, Result};
use crate::format::{next_envelope_offset, take, BlockData, BlockHeader, BLOCK_MARKER};
use crate::record::Record;

impl Record<'_> {
    /// Decode the envelopes in `buf` into the connected payloads.
    ///
    /// # Read sequence, per envelope
    /// 1. Header: `typ` must be [`BLOCK_MARKER`], otherwise
    ///    [`Error::NoBlockMarker`].
    /// 2. Sub-header, then the padded name.
    /// 3. Unknown name: the rest of `buf` is dropped and the read ends with
    ///    `Ok`. The envelope length cannot be trusted enough to skip a single
    ///    block, so nothing after it is decoded.
    /// 4. Known name: the block unmarshals from the remaining bytes and is
    ///    expected to consume exactly its own payload.
    /// 5. If bytes remain, the cursor is realigned on the next block marker;
    ///    when there is none, the rest is dropped.
    ///
    /// On success `buf` is left empty. A short header or name yields
    /// [`Error::Truncated`]; payload codec failures yield [`Error::Payload`].
    pub fn read(&mut self, buf: &mut &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let header = BlockHeader::read_from(buf)?;
            if header.typ != BLOCK_MARKER {
                return Err(Error::NoBlockMarker { found: header.typ });
            }
            let data = BlockData::read_from(buf)?;

            let padded = take(buf, data.padded_name_len(), "block name")?;
            let name = String::from_utf8_lossy(&padded[..data.name_len as usize]).into_owned();

            let record = self.name().to_string();
            let Some(blk) = self.block_mut(&name) else {
                log::debug!(
                    "record {:?}: no block connected as {:?}, dropping {} trailing bytes",
                    record,
                    name,
                    buf.len()
                );
                *buf = &[];
                break;
            };

            blk.unmarshal_binary(buf)
                .map_err(|e| Error::payload(&name, e))?;
            log::trace!("record {:?}: read block {:?} v{}", record, name, data.version);

            if !buf.is_empty() {
                match next_envelope_offset(buf) {
                    Some(skip) => {
                        if skip > 0 {
                            log::debug!(
                                "record {:?}: skipping {} bytes after block {:?} to next marker",
                                record,
                                skip,
                                name
                            );
                        }
                        *buf = &buf[skip..];
                    }
                    None => {
                        log::debug!(
                            "record {:?}: no block marker after {:?}, dropping {} bytes",
                            record,
                            name,
                            buf.len()
                        );
                        *buf = &[];
                    }
                }
            }
        }
        Ok(())
    }

    /// Decode a complete record buffer.
    pub fn read_from(&mut self, data: &[u8]) -> Result<()> {
        let mut cur = data;
        self.read(&mut cur)
    }
}
