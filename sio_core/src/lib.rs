pub mod codec;
pub mod error;
pub mod format;
pub mod handle;
pub mod reader;
pub mod record;
pub mod structural;
pub mod writer;

pub use codec::{BinaryCodec, Block};
pub use error::{Error, Result};
pub use format::{align4, Envelope, Envelopes, Options, BLOCK_MARKER};
pub use handle::{BlockHandle, Strategy};
pub use record::Record;
pub use structural::{Structural, Structured};
