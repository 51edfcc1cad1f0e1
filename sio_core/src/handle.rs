use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{BinaryCodec, Block};
use crate::structural::Structural;

/// How a connected payload is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The payload implements [`Block`] and reports its own version.
    Custom,
    /// The payload implements [`BinaryCodec`] only; version 0.
    Raw,
    /// The payload is a serde value encoded field by field; version 0.
    Structural,
}

enum Payload<'a> {
    Custom(&'a mut dyn Block),
    Raw(&'a mut dyn BinaryCodec),
    Structural(&'a mut dyn Structural),
}

/// A payload connected to a [`crate::Record`] under a name.
///
/// The handle borrows the payload mutably for as long as the record lives;
/// reading a record writes straight into the caller's value. The encoding
/// strategy is chosen by the constructor used, never guessed at runtime.
pub struct BlockHandle<'a> {
    name: String,
    type_name: &'static str,
    payload: Payload<'a>,
}

impl<'a> BlockHandle<'a> {
    /// Use the payload's own [`Block`] implementation.
    pub fn custom<T: Block + 'a>(payload: &'a mut T) -> Self {
        Self {
            name: String::new(),
            type_name: std::any::type_name::<T>(),
            payload: Payload::Custom(payload),
        }
    }

    /// Wrap a versionless [`BinaryCodec`]; envelopes carry version 0.
    pub fn raw<T: BinaryCodec + 'a>(payload: &'a mut T) -> Self {
        Self {
            name: String::new(),
            type_name: std::any::type_name::<T>(),
            payload: Payload::Raw(payload),
        }
    }

    /// Encode the payload through its serde field description.
    pub fn structural<T: Serialize + DeserializeOwned + 'a>(payload: &'a mut T) -> Self {
        Self {
            name: String::new(),
            type_name: std::any::type_name::<T>(),
            payload: Payload::Structural(payload),
        }
    }

    /// Registered block name. Empty until the handle is connected.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> Strategy {
        match self.payload {
            Payload::Custom(_) => Strategy::Custom,
            Payload::Raw(_) => Strategy::Raw,
            Payload::Structural(_) => Strategy::Structural,
        }
    }

    /// Full Rust type name of the connected payload.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without module path or generic arguments.
    pub(crate) fn short_type_name(&self) -> &'static str {
        let base = self.type_name.split('<').next().unwrap_or(self.type_name);
        base.rsplit("::").next().unwrap_or(base)
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl BinaryCodec for BlockHandle<'_> {
    fn marshal_binary(&self, buf: &mut Vec<u8>) -> anyhow::Result<()> {
        match &self.payload {
            Payload::Custom(b) => b.marshal_binary(buf),
            Payload::Raw(b) => b.marshal_binary(buf),
            Payload::Structural(v) => v.encode(buf),
        }
    }

    fn unmarshal_binary(&mut self, buf: &mut &[u8]) -> anyhow::Result<()> {
        match &mut self.payload {
            Payload::Custom(b) => b.unmarshal_binary(buf),
            Payload::Raw(b) => b.unmarshal_binary(buf),
            Payload::Structural(v) => v.decode_in_place(buf),
        }
    }
}

impl Block for BlockHandle<'_> {
    fn version(&self) -> u32 {
        match &self.payload {
            Payload::Custom(b) => b.version(),
            Payload::Raw(_) | Payload::Structural(_) => 0,
        }
    }
}

impl<'a, T: Block + 'a> From<&'a mut T> for BlockHandle<'a> {
    fn from(payload: &'a mut T) -> Self {
        BlockHandle::custom(payload)
    }
}

impl std::fmt::Debug for BlockHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockHandle")
            .field("name", &self.name)
            .field("version", &self.version())
            .field("strategy", &self.strategy())
            .field("type_name", &self.type_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Default, Serialize, Deserialize)]
    struct Plain {
        x: u32,
    }

    struct Versioned(u8);

    impl BinaryCodec for Versioned {
        fn marshal_binary(&self, buf: &mut Vec<u8>) -> anyhow::Result<()> {
            buf.push(self.0);
            Ok(())
        }

        fn unmarshal_binary(&mut self, buf: &mut &[u8]) -> anyhow::Result<()> {
            let (&b, rest) = buf
                .split_first()
                .ok_or_else(|| anyhow::anyhow!("empty buffer"))?;
            self.0 = b;
            *buf = rest;
            Ok(())
        }
    }

    impl Block for Versioned {
        fn version(&self) -> u32 {
            3
        }
    }

    #[test]
    fn constructor_picks_strategy_and_version() {
        let mut v = Versioned(1);
        let h = BlockHandle::custom(&mut v);
        assert_eq!(h.strategy(), Strategy::Custom);
        assert_eq!(h.version(), 3);

        let mut v = Versioned(1);
        let h = BlockHandle::raw(&mut v);
        assert_eq!(h.strategy(), Strategy::Raw);
        assert_eq!(h.version(), 0);

        let mut p = Plain::default();
        let h = BlockHandle::structural(&mut p);
        assert_eq!(h.strategy(), Strategy::Structural);
        assert_eq!(h.version(), 0);
        assert_eq!(h.short_type_name(), "Plain");
    }

    struct Tagged(u32);

    impl BinaryCodec for Tagged {
        fn marshal_binary(&self, _buf: &mut Vec<u8>) -> anyhow::Result<()> {
            Ok(())
        }

        fn unmarshal_binary(&mut self, _buf: &mut &[u8]) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl Block for Tagged {
        fn version(&self) -> u32 {
            self.0
        }
    }

    #[test]
    fn custom_version_is_read_from_payload() {
        let mut t = Tagged(11);
        let h = BlockHandle::custom(&mut t);
        assert_eq!(h.version(), 11);

        let mut t = Tagged(11);
        assert_eq!(BlockHandle::raw(&mut t).version(), 0);
    }

    #[test]
    fn from_mut_ref_is_custom() {
        let mut v = Versioned(9);
        let h: BlockHandle<'_> = (&mut v).into();
        assert_eq!(h.strategy(), Strategy::Custom);
    }
}
