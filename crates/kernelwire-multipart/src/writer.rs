use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::error::{MultipartError, Result};
use crate::part::{encode_part, PartConfig};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes multipart messages to any `Write` stream.
///
/// Parts sent with `more = true` are staged in memory. The staged parts and
/// the final part are written to the stream together, so a peer never sees
/// the head of a message without its tail.
pub struct MultipartWriter<T> {
    inner: T,
    buf: BytesMut,
    staged_parts: usize,
    config: PartConfig,
}

impl<T: Write> MultipartWriter<T> {
    /// Create a new writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, PartConfig::default())
    }

    /// Create a new writer with explicit configuration.
    pub fn with_config(inner: T, config: PartConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            staged_parts: 0,
            config,
        }
    }

    /// Stage or send one part.
    ///
    /// With `more = false` the part terminates the current message and the
    /// whole message is written (blocking).
    pub fn send_part(&mut self, payload: &[u8], more: bool) -> Result<()> {
        if payload.len() > self.config.max_part_size {
            self.discard_staged();
            return Err(MultipartError::PartTooLarge {
                size: payload.len(),
                max: self.config.max_part_size,
            });
        }
        if self.staged_parts >= self.config.max_parts {
            self.discard_staged();
            return Err(MultipartError::TooManyParts {
                max: self.config.max_parts,
            });
        }

        encode_part(payload, more, &mut self.buf)?;
        self.staged_parts += 1;

        if more {
            return Ok(());
        }

        let written = self.write_staged();
        self.discard_staged();
        written?;
        self.flush()
    }

    /// Send a complete multipart message (blocking).
    pub fn send_multipart<P: AsRef<[u8]>>(&mut self, parts: &[P]) -> Result<()> {
        let last = parts.len().saturating_sub(1);
        for (idx, part) in parts.iter().enumerate() {
            self.send_part(part.as_ref(), idx < last)?;
        }
        Ok(())
    }

    /// Flush the underlying stream.
    ///
    /// Parts staged for an unfinished message are not written.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(MultipartError::Io(err)),
            }
        }
    }

    /// Number of parts staged for the message being assembled.
    pub fn staged_parts(&self) -> usize {
        self.staged_parts
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &PartConfig {
        &self.config
    }

    fn write_staged(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(MultipartError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(MultipartError::Io(err)),
            }
        }
        Ok(())
    }

    /// Drop the parts staged for the message being assembled.
    pub fn discard_staged(&mut self) {
        self.buf.clear();
        self.staged_parts = 0;
    }
}

#[cfg(unix)]
impl MultipartWriter<std::os::unix::net::UnixStream> {
    /// Create a writer for a Unix stream and apply the write timeout from config.
    pub fn with_config_unix(
        inner: std::os::unix::net::UnixStream,
        config: PartConfig,
    ) -> Result<Self> {
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
