use std::fmt;

use kernelwire_multipart::MultipartError;

/// One of the four signed JSON frames of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Header,
    ParentHeader,
    Metadata,
    Content,
}

impl Field {
    /// Wire name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Header => "header",
            Field::ParentHeader => "parent_header",
            Field::Metadata => "metadata",
            Field::Content => "content",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The envelope signature did not verify.
///
/// Carries no payload beyond its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid message signature")]
pub struct SignatureError;

/// The envelope does not have the expected shape.
#[derive(Debug, thiserror::Error)]
pub enum MalformedEnvelope {
    /// No `<IDS|MSG>` frame was found.
    #[error("missing <IDS|MSG> delimiter")]
    MissingDelimiter,

    /// Fewer than signature + four JSON frames follow the delimiter.
    #[error("expected at least 5 frames after delimiter, found {found}")]
    Truncated { found: usize },

    /// A JSON frame failed to parse.
    #[error("invalid {field} JSON: {source}")]
    InvalidJson {
        field: Field,
        source: serde_json::Error,
    },

    /// The header parsed but lacks a required value.
    #[error("header field `{0}` is empty")]
    MissingHeaderField(&'static str),
}

/// Errors produced by the message codec and reply path.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Authentication failure on an inbound message.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// Inbound frames are not a valid envelope.
    #[error("malformed envelope: {0}")]
    Malformed(#[from] MalformedEnvelope),

    /// An outbound field could not be serialized.
    #[error("failed to encode {field}: {source}")]
    Encode {
        field: Field,
        source: serde_json::Error,
    },

    /// The channel transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] MultipartError),
}

impl WireError {
    /// True for authentication failures.
    pub fn is_signature_error(&self) -> bool {
        matches!(self, WireError::Signature(_))
    }

    /// True for envelope shape and JSON failures.
    pub fn is_malformed(&self) -> bool {
        matches!(self, WireError::Malformed(_))
    }
}

/// Errors in channel security configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The signature scheme is not supported.
    #[error("unsupported signature scheme '{0}' (expected 'hmac-sha256')")]
    UnsupportedScheme(String),

    /// The key cannot be used with the scheme.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, WireError>;
