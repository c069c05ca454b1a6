use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use crate::error::{MultipartError, Result};
use crate::part::{decode_part, Part, PartConfig};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads parts and whole multipart messages from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete parts.
pub struct MultipartReader<T> {
    inner: T,
    buf: BytesMut,
    config: PartConfig,
}

impl<T: Read> MultipartReader<T> {
    /// Create a new reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, PartConfig::default())
    }

    /// Create a new reader with explicit configuration.
    pub fn with_config(inner: T, config: PartConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete part (blocking).
    ///
    /// Returns `Err(MultipartError::ConnectionClosed)` when EOF is reached.
    pub fn read_part(&mut self) -> Result<Part> {
        loop {
            if let Some(part) = decode_part(&mut self.buf, self.config.max_part_size)? {
                return Ok(part);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(MultipartError::Io(err)),
            };

            if read == 0 {
                return Err(MultipartError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read parts up to and including the first one without `MORE`.
    ///
    /// An oversized message is drained to its last part before
    /// `TooManyParts` is returned, so the stream stays aligned on the
    /// next message.
    pub fn read_multipart(&mut self) -> Result<Vec<Bytes>> {
        let max = self.config.max_parts;
        let mut parts = Vec::new();
        let mut overflow = false;

        loop {
            let part = self.read_part()?;
            if parts.len() < max {
                parts.push(part.payload);
            } else {
                overflow = true;
            }
            if !part.more {
                break;
            }
        }

        if overflow {
            return Err(MultipartError::TooManyParts { max });
        }
        Ok(parts)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &PartConfig {
        &self.config
    }
}

#[cfg(unix)]
impl MultipartReader<std::os::unix::net::UnixStream> {
    /// Create a reader for a Unix stream and apply the read timeout from config.
    pub fn with_config_unix(
        inner: std::os::unix::net::UnixStream,
        config: PartConfig,
    ) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
