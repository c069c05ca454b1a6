//! Multipart message framing for kernel channels.
//!
//! A kernel channel carries multipart messages: an ordered group of opaque
//! parts that is delivered as a unit. Over a byte stream every part is
//! framed with:
//! - A 2-byte magic number ("KW") for stream synchronization
//! - A 4-byte little-endian payload length
//! - A 2-byte little-endian flag word (`MORE` when further parts follow)
//!
//! Readers always hand back complete parts or complete multipart messages.
//! Writers go through [`MultipartSink`], and [`SharedSink`] serializes whole
//! messages when several senders share one endpoint.

pub mod error;
pub mod part;
pub mod reader;
pub mod sink;
pub mod writer;

#[cfg(unix)]
pub mod uds;

#[cfg(feature = "async")]
pub mod codec;

pub use error::{MultipartError, Result};
pub use part::{
    decode_part, encode_part, Part, PartConfig, DEFAULT_MAX_PARTS, DEFAULT_MAX_PART_SIZE,
    HEADER_SIZE, MORE,
};
pub use reader::MultipartReader;
pub use sink::{MultipartSink, SharedSink};
pub use writer::MultipartWriter;

#[cfg(unix)]
pub use uds::UnixEndpoint;

#[cfg(feature = "async")]
pub use codec::MultipartCodec;
