//! Small value types shared by the trellis crates: artifact fingerprints and
//! byte sizes with unit suffixes.

#![warn(missing_docs)]

pub mod hash;
pub mod size;

pub use hash::ContentHash;
pub use size::{ByteSize, ParseByteSizeError};
