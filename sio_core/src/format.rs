use bitflags::bitflags;

use crate::error::{Error, Result};

/// Sentinel written into the `typ` word of every block envelope.
pub const BLOCK_MARKER: u32 = 0xDEAD_BEEF;

/// On-disk byte pattern of [`BLOCK_MARKER`], searched for when resynchronizing.
pub const BLOCK_MARKER_BYTES: [u8; 4] = BLOCK_MARKER.to_be_bytes();

/// Size of the envelope header in bytes.
///   len:u32 + typ:u32 = 8
pub const BLOCK_HEADER_SIZE: usize = 8;

/// Size of the envelope sub-header in bytes.
///   version:u32 + name_len:u32 = 8
pub const BLOCK_DATA_SIZE: usize = 8;

/// Fixed bytes in front of the block name.
pub const ENVELOPE_FIXED_SIZE: usize = BLOCK_HEADER_SIZE + BLOCK_DATA_SIZE;

/// Width of the `len` word that precedes the marker inside a header.
const LEN_FIELD_SIZE: usize = 4;

// ── Flags ──────────────────────────────────────────────────────────────────

bitflags! {
    /// Record option word.
    ///
    /// Bits without a named constant are retained as-is so a record read from
    /// a newer producer keeps them on the way through.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Options: u32 {
        /// Payload bytes of the record's blocks are stored compressed.
        const COMPRESS = 0x0000_0001;
    }
}

// ── Alignment ──────────────────────────────────────────────────────────────

/// Round `n` up to the next multiple of 4.
///
/// `n` must be at most `u32::MAX - 3`; use [`checked_align4`] for lengths
/// that are not already bounded.
#[inline]
pub const fn align4(n: u32) -> u32 {
    ((n + 3) / 4) * 4
}

/// [`align4`], or `None` when the rounded length does not fit in a `u32`.
#[inline]
pub const fn checked_align4(n: u32) -> Option<u32> {
    match n.checked_add(3) {
        Some(m) => Some(m / 4 * 4),
        None => None,
    }
}

/// Split `n` bytes off the front of `buf`, or report what was missing.
pub(crate) fn take<'b>(buf: &mut &'b [u8], n: usize, what: &'static str) -> Result<&'b [u8]> {
    if buf.len() < n {
        return Err(Error::Truncated {
            what,
            need: n,
            have: buf.len(),
        });
    }
    let (head, tail) = buf.split_at(n);
    *buf = tail;
    Ok(head)
}

#[inline]
fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

// ── Header ─────────────────────────────────────────────────────────────────

/// Envelope header: total envelope length and block marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Envelope length in bytes: header + sub-header + padded name + payload.
    pub len: u32,
    pub typ: u32,
}

impl BlockHeader {
    pub fn to_bytes(&self) -> [u8; BLOCK_HEADER_SIZE] {
        let mut buf = [0u8; BLOCK_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.len.to_be_bytes());
        buf[4..8].copy_from_slice(&self.typ.to_be_bytes());
        buf
    }

    /// Consume a header from the front of `buf`. The marker is not checked.
    pub fn read_from(buf: &mut &[u8]) -> Result<Self> {
        let b = take(buf, BLOCK_HEADER_SIZE, "block header")?;
        Ok(Self {
            len: be_u32(&b[0..4]),
            typ: be_u32(&b[4..8]),
        })
    }
}

/// Envelope sub-header: payload version and unpadded name length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockData {
    pub version: u32,
    pub name_len: u32,
}

impl BlockData {
    pub fn to_bytes(&self) -> [u8; BLOCK_DATA_SIZE] {
        let mut buf = [0u8; BLOCK_DATA_SIZE];
        buf[0..4].copy_from_slice(&self.version.to_be_bytes());
        buf[4..8].copy_from_slice(&self.name_len.to_be_bytes());
        buf
    }

    pub fn read_from(buf: &mut &[u8]) -> Result<Self> {
        let b = take(buf, BLOCK_DATA_SIZE, "block sub-header")?;
        Ok(Self {
            version: be_u32(&b[0..4]),
            name_len: be_u32(&b[4..8]),
        })
    }

    /// Name length rounded up to the 4-byte boundary.
    ///
    /// Computed in `usize` so a corrupt `name_len` near `u32::MAX` cannot
    /// overflow; the caller then fails on the missing bytes instead.
    #[inline]
    pub fn padded_name_len(&self) -> usize {
        (self.name_len as usize).div_ceil(4) * 4
    }
}

/// Offset at which the next envelope starts, found by scanning `rest` for the
/// marker pattern and backing up over the length word in front of it.
///
/// `None` when no marker exists or there is no room for a length word before
/// the first one.
pub fn next_envelope_offset(rest: &[u8]) -> Option<usize> {
    let idx = rest
        .windows(BLOCK_MARKER_BYTES.len())
        .position(|w| w == &BLOCK_MARKER_BYTES[..])?;
    idx.checked_sub(LEN_FIELD_SIZE)
}

// ── Borrowed envelope view ─────────────────────────────────────────────────

/// One envelope located inside a record buffer, without decoding its payload.
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'b> {
    pub header: BlockHeader,
    pub data: BlockData,
    /// Unpadded name bytes.
    pub name: &'b [u8],
    /// Payload bytes as delimited by `header.len`.
    pub payload: &'b [u8],
}

impl Envelope<'_> {
    /// Name decoded as UTF-8, with invalid sequences replaced.
    pub fn name_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.name)
    }
}

/// Walks the envelopes of a record buffer using each header's declared length.
///
/// This is a strict walker for inspection tools: it trusts `header.len` and
/// stops at the first framing problem, yielding the error as its last item.
/// [`crate::Record::read`] does not use it, since decode there is driven by the
/// payload codecs themselves.
pub struct Envelopes<'b> {
    buf: &'b [u8],
    failed: bool,
}

impl<'b> Envelopes<'b> {
    pub fn new(buf: &'b [u8]) -> Self {
        Self { buf, failed: false }
    }

    fn next_envelope(&mut self) -> Result<Envelope<'b>> {
        let mut cur = self.buf;
        let header = BlockHeader::read_from(&mut cur)?;
        if header.typ != BLOCK_MARKER {
            return Err(Error::NoBlockMarker { found: header.typ });
        }
        let data = BlockData::read_from(&mut cur)?;
        let padded = data.padded_name_len();
        let min = ENVELOPE_FIXED_SIZE + padded;
        let len = header.len as usize;
        if len < min {
            return Err(Error::BadLength { len, min });
        }
        let name = take(&mut cur, padded, "block name")?;
        let payload = take(&mut cur, len - min, "block payload")?;
        self.buf = cur;
        Ok(Envelope {
            header,
            data,
            name: &name[..data.name_len as usize],
            payload,
        })
    }
}

impl<'b> Iterator for Envelopes<'b> {
    type Item = Result<Envelope<'b>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.buf.is_empty() {
            return None;
        }
        let item = self.next_envelope();
        if item.is_err() {
            self.failed = true;
        }
        Some(item)
    }
}
