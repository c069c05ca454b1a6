//! Send side of a kernel channel.

use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use crate::error::Result;
use crate::writer::MultipartWriter;

/// A destination for multipart messages.
///
/// `more = true` marks that further parts of the same message follow.
/// Implementations decide when bytes actually hit the wire, but must not
/// deliver a message until its final part has been sent.
pub trait MultipartSink {
    /// Send one part.
    fn send_part(&mut self, part: &[u8], more: bool) -> Result<()>;

    /// Flush buffered output of completed messages.
    fn flush(&mut self) -> Result<()>;

    /// Abandon the message being assembled. Parts already sent with
    /// `more = true` must never be delivered.
    fn discard(&mut self);

    /// Send a group of parts. Every part but the last is marked `MORE`;
    /// the last one takes the caller's `more`.
    fn send_parts(&mut self, parts: &[Bytes], more: bool) -> Result<()> {
        let last = parts.len().saturating_sub(1);
        for (idx, part) in parts.iter().enumerate() {
            self.send_part(part, more || idx < last)?;
        }
        Ok(())
    }
}

impl<T: Write> MultipartSink for MultipartWriter<T> {
    fn send_part(&mut self, part: &[u8], more: bool) -> Result<()> {
        MultipartWriter::send_part(self, part, more)
    }

    fn flush(&mut self) -> Result<()> {
        MultipartWriter::flush(self)
    }

    fn discard(&mut self) {
        self.discard_staged();
    }
}

/// A sink shared between senders.
///
/// Endpoints are not safe for interleaved multipart writes, so the lock is
/// held for one complete message: every part a closure passed to
/// [`SharedSink::send_message`] sends lands contiguously on the wire.
pub struct SharedSink<S> {
    inner: Mutex<S>,
}

impl<S: MultipartSink> SharedSink<S> {
    /// Wrap a sink.
    pub fn new(sink: S) -> Self {
        Self {
            inner: Mutex::new(sink),
        }
    }

    /// Run `f` with exclusive access to the sink.
    ///
    /// If `f` fails, whatever it staged is discarded before the lock is
    /// released, so the next message starts clean.
    pub fn send_message<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut S) -> Result<R>,
    {
        let mut sink = self.lock();
        let result = f(&mut sink);
        if result.is_err() {
            sink.discard();
        }
        result
    }

    /// Send a complete multipart message under the lock.
    pub fn send_multipart(&self, parts: &[Bytes]) -> Result<()> {
        self.send_message(|sink| sink.send_parts(parts, false))
    }

    /// Consume the wrapper and return the sink.
    pub fn into_inner(self) -> S {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A sender panicked mid-message; its staged parts are dropped.
                let mut guard = poisoned.into_inner();
                guard.discard();
                self.inner.clear_poison();
                guard
            }
        }
    }
}

impl<S> std::fmt::Debug for SharedSink<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSink").finish_non_exhaustive()
    }
}
