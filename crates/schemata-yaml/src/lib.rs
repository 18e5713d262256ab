//! Schemata YAML
//!
//! Reads and writes schema instances as YAML document streams. Each
//! instance becomes a mapping tagged with its registered class tag, so a
//! stream can be loaded back into typed instances without side-channel
//! type information.

pub mod banner;
pub mod codec;
pub mod error;

pub use banner::{Banner, FORMAT_VERSION};
pub use codec::{dump, dump_all, load, load_all, Codec, LoadAll, MAX_DEPTH};
pub use error::CodecError;
