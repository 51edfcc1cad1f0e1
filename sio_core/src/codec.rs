/// Raw binary codec capability: a payload that knows how to write and read
/// its own bytes but carries no explicit format version.
///
/// Both directions work on the record's shared buffer:
/// - `marshal_binary` appends the payload to `buf`.
/// - `unmarshal_binary` decodes from the front of `buf` and advances it by
///   exactly the bytes it consumed. The record hands over everything that is
///   left in the stream, so an implementation must know its own length
///   (fixed size, length prefix, ...).
pub trait BinaryCodec {
    /// Append the encoded payload to `buf`.
    fn marshal_binary(&self, buf: &mut Vec<u8>) -> anyhow::Result<()>;

    /// Decode the payload from the front of `buf`, advancing it past the
    /// consumed bytes.
    fn unmarshal_binary(&mut self, buf: &mut &[u8]) -> anyhow::Result<()>;
}

/// Full block codec contract.
///
/// A `Block` is a [`BinaryCodec`] that also reports the version of its
/// on-disk format. The version is written into every envelope carrying the
/// block, so readers of older files can tell which layout they are looking at.
pub trait Block: BinaryCodec {
    fn version(&self) -> u32;
}
