//! Codec for ANSI/NIST-ITL tagged-field Electronic Fingerprint Transmission
//! (EFT) files: a bidirectional binary/tagged serializer plus a
//! size-adaptive compression retry loop.
//!
//! The crate assembles a Type-1 transaction header and its child records
//! (Type-2 biographic, Type-4 binary fingerprint, Type-14 tagged
//! fingerprint) into byte-exact output, and parses that output back into
//! structured records even though record boundaries are ambiguous between
//! length-prefixed binary blocks and separator-terminated tagged blocks.
//!
//! External collaborators — HTTP/upload handling, image acquisition and
//! segmentation, and the WSQ/JP2/NFIQ binaries themselves — stay outside
//! this crate, reachable only through [`codec::CodecAdapter`].

pub mod codec;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod length;
pub mod orchestrator;
pub mod record;
pub mod scratch;
pub mod separators;
pub mod tags;

pub use config::{Clock, Config, Mode, TcnRng};
pub use error::{EftError, EftResult};
pub use record::Record;
