use std::fmt;
use std::io;

use kernelwire_msg::{ConfigError, WireError};
use kernelwire_multipart::MultipartError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn multipart_error(context: &str, err: MultipartError) -> CliError {
    match err {
        MultipartError::Bind { source, .. }
        | MultipartError::Connect { source, .. }
        | MultipartError::Io(source) => io_error(context, source),
        MultipartError::PartTooLarge { .. } | MultipartError::TooManyParts { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        MultipartError::PathTooLong { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        MultipartError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn wire_error(context: &str, err: WireError) -> CliError {
    match err {
        WireError::Transport(err) => multipart_error(context, err),
        WireError::Signature(_) | WireError::Malformed(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        WireError::Encode { .. } => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

pub fn config_error(context: &str, err: ConfigError) -> CliError {
    CliError::new(USAGE, format!("{context}: {err}"))
}
