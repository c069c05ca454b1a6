use std::path::PathBuf;

/// Errors that can occur while framing, reading, or writing multipart messages.
#[derive(Debug, thiserror::Error)]
pub enum MultipartError {
    /// The part header contains an invalid magic number.
    #[error("invalid part magic (expected 0x4B57 \"KW\")")]
    InvalidMagic,

    /// The part header sets flag bits this version does not understand.
    #[error("unknown part flags 0x{0:04x}")]
    InvalidFlags(u16),

    /// A part exceeds the configured maximum size.
    #[error("part too large ({size} bytes, max {max})")]
    PartTooLarge { size: usize, max: usize },

    /// A multipart message has more parts than the configured limit.
    #[error("multipart message exceeds {max} parts")]
    TooManyParts { max: usize },

    /// The connection was closed before a complete part was received.
    #[error("connection closed (incomplete part)")]
    ConnectionClosed,

    /// An I/O error occurred on the underlying stream.
    #[error("multipart I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to bind to the specified socket path.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to the specified socket path.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },
}

pub type Result<T> = std::result::Result<T, MultipartError>;
