//! Error types for record read/write and block registration.

/// Errors raised by [`crate::Record`] and the envelope walker.
///
/// Unknown block names met while reading are not errors: the remainder of the
/// buffer is dropped and the read returns `Ok`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An envelope header did not carry the block marker.
    #[error("missing block marker (found {found:#010x})")]
    NoBlockMarker { found: u32 },

    /// Fewer bytes were available than a header or name declares.
    #[error("truncated input reading {what}: need {need} bytes, have {have}")]
    Truncated {
        what: &'static str,
        need: usize,
        have: usize,
    },

    /// A block's own marshal/unmarshal failed. `source` is the block's error,
    /// unmodified.
    #[error("block {name:?}: payload codec failed: {source}")]
    Payload {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// `connect` was called with a name that is already bound.
    #[error("block {0:?} already connected")]
    BlockConnected(String),

    /// The block name cannot be stored in an envelope.
    #[error("invalid block name: {0}")]
    InvalidName(String),

    /// The marshaled payload does not fit the 32-bit envelope length.
    #[error("block {name:?}: payload of {len} bytes does not fit an envelope")]
    PayloadTooLarge { name: String, len: usize },

    /// A header declares a length shorter than its own fixed fields.
    #[error("envelope length {len} is shorter than its {min} fixed bytes")]
    BadLength { len: usize, min: usize },
}

impl Error {
    pub(crate) fn payload(name: &str, source: anyhow::Error) -> Self {
        Error::Payload {
            name: name.to_string(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
