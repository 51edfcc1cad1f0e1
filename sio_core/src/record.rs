use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{BinaryCodec, Block};
use crate::error::{Error, Result};
use crate::format::Options;
use crate::handle::BlockHandle;

/// A named, ordered set of blocks: the unit of read and write.
///
/// # Usage
/// 1. Create the record and [`connect`] every payload it carries.
/// 2. Call [`write`] to append the blocks' envelopes to a buffer, or
///    [`read`] to decode a buffer into the connected payloads.
///
/// Blocks are written in the order they were connected. Reading dispatches by
/// name, so the order on disk does not have to match.
///
/// [`connect`]: Record::connect
/// [`write`]: Record::write
/// [`read`]: Record::read
pub struct Record<'a> {
    name: String,
    unpack: bool,
    options: Options,
    pub(crate) blocks: Vec<BlockHandle<'a>>,
}

impl<'a> Record<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unpack: true,
            options: Options::empty(),
            blocks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a consumer should decode this record's blocks eagerly.
    ///
    /// Advisory only: [`Record::read`] always decodes connected blocks.
    pub fn unpack(&self) -> bool {
        self.unpack
    }

    pub fn set_unpack(&mut self, unpack: bool) {
        self.unpack = unpack;
    }

    pub fn compress(&self) -> bool {
        self.options.contains(Options::COMPRESS)
    }

    /// Set or clear the compress flag, leaving every other option bit as is.
    pub fn set_compress(&mut self, compress: bool) {
        self.options.set(Options::COMPRESS, compress);
    }

    /// Record option word. It is kept for the framing that carries whole
    /// records; [`Record::write`] does not emit it.
    pub fn options(&self) -> Options {
        self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    /// Bind `handle` under `name`.
    ///
    /// An empty `name` falls back to the payload's type name. Fails with
    /// [`Error::BlockConnected`] if the name is already bound; the existing
    /// binding is left untouched. Use [`Record::disconnect`] first to replace
    /// a block.
    pub fn connect(&mut self, name: &str, handle: impl Into<BlockHandle<'a>>) -> Result<()> {
        let mut handle = handle.into();
        let name = if name.is_empty() {
            handle.short_type_name().to_string()
        } else {
            name.to_string()
        };
        if name.is_empty() {
            return Err(Error::InvalidName("empty block name".to_string()));
        }
        if name.len() > (u32::MAX - 3) as usize {
            return Err(Error::InvalidName(format!(
                "name of {} bytes does not fit an envelope",
                name.len()
            )));
        }
        if self.contains(&name) {
            return Err(Error::BlockConnected(name));
        }
        log::trace!("record {:?}: connect block {:?} ({:?})", self.name, name, handle.strategy());
        handle.set_name(name);
        self.blocks.push(handle);
        Ok(())
    }

    /// Connect a payload with its own versioned [`Block`] codec.
    pub fn connect_custom<T: Block + 'a>(&mut self, name: &str, payload: &'a mut T) -> Result<()> {
        self.connect(name, BlockHandle::custom(payload))
    }

    /// Connect a versionless [`BinaryCodec`] payload.
    pub fn connect_raw<T: BinaryCodec + 'a>(&mut self, name: &str, payload: &'a mut T) -> Result<()> {
        self.connect(name, BlockHandle::raw(payload))
    }

    /// Connect a serde payload, encoded field by field.
    pub fn connect_structural<T>(&mut self, name: &str, payload: &'a mut T) -> Result<()>
    where
        T: Serialize + DeserializeOwned + 'a,
    {
        self.connect(name, BlockHandle::structural(payload))
    }

    /// Remove the block bound under `name`. Returns whether one was bound.
    pub fn disconnect(&mut self, name: &str) -> bool {
        let before = self.blocks.len();
        self.blocks.retain(|b| b.name() != name);
        before != self.blocks.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blocks.iter().any(|b| b.name() == name)
    }

    pub fn block(&self, name: &str) -> Option<&BlockHandle<'a>> {
        self.blocks.iter().find(|b| b.name() == name)
    }

    pub(crate) fn block_mut(&mut self, name: &str) -> Option<&mut BlockHandle<'a>> {
        self.blocks.iter_mut().find(|b| b.name() == name)
    }

    /// Connected block names, in write order.
    pub fn names(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl std::fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("name", &self.name)
            .field("unpack", &self.unpack)
            .field("options", &self.options)
            .field("blocks", &self.blocks)
            .finish()
    }
}
