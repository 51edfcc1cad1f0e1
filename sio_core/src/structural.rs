//! Default codec for payloads that only describe their fields.
//!
//! Any `Serialize + DeserializeOwned` value can be stored in a block without
//! writing a codec by hand. Fields are written in declaration order with
//! fixed-width big-endian integers, the same byte order as the envelope, so a
//! struct of three `i64` occupies exactly 24 bytes. Variable-length fields
//! (strings, vectors) carry a `u64` length prefix.

use bincode::config::{BigEndian, Configuration, Fixint, NoLimit};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::BinaryCodec;

const CONFIG: Configuration<BigEndian, Fixint, NoLimit> = bincode::config::standard()
    .with_big_endian()
    .with_fixed_int_encoding();

/// Object-safe view of a serde value, used by
/// [`crate::BlockHandle::structural`].
pub trait Structural {
    fn encode(&self, buf: &mut Vec<u8>) -> anyhow::Result<()>;

    /// Replace `self` with a value decoded from the front of `buf`.
    fn decode_in_place(&mut self, buf: &mut &[u8]) -> anyhow::Result<()>;
}

impl<T> Structural for T
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, buf: &mut Vec<u8>) -> anyhow::Result<()> {
        bincode::serde::encode_into_std_write(self, buf, CONFIG)?;
        Ok(())
    }

    fn decode_in_place(&mut self, buf: &mut &[u8]) -> anyhow::Result<()> {
        let (value, n): (T, usize) = bincode::serde::decode_from_slice(*buf, CONFIG)?;
        *self = value;
        *buf = &buf[n..];
        Ok(())
    }
}

/// Owned wrapper giving a serde value a [`BinaryCodec`] implementation, for
/// places that need a codec type rather than a connected handle (e.g. a
/// compression wrapper around a structural payload).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Structured<T>(pub T);

impl<T> BinaryCodec for Structured<T>
where
    T: Serialize + DeserializeOwned,
{
    fn marshal_binary(&self, buf: &mut Vec<u8>) -> anyhow::Result<()> {
        self.0.encode(buf)
    }

    fn unmarshal_binary(&mut self, buf: &mut &[u8]) -> anyhow::Result<()> {
        self.0.decode_in_place(buf)
    }
}
