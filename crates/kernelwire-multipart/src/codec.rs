use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{MultipartError, Result};
use crate::part::{decode_part, encode_part, PartConfig};

/// `tokio_util` codec yielding whole multipart messages.
///
/// Parts are collected across `decode` calls until the last part of a
/// message arrives.
#[derive(Debug, Default)]
pub struct MultipartCodec {
    config: PartConfig,
    pending: Vec<Bytes>,
    overflow: bool,
}

impl MultipartCodec {
    /// Create a codec with explicit configuration.
    pub fn new(config: PartConfig) -> Self {
        Self {
            config,
            pending: Vec::new(),
            overflow: false,
        }
    }
}

impl Decoder for MultipartCodec {
    type Item = Vec<Bytes>;
    type Error = MultipartError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        while let Some(part) = decode_part(src, self.config.max_part_size)? {
            if self.pending.len() < self.config.max_parts {
                self.pending.push(part.payload);
            } else {
                self.overflow = true;
            }
            if part.more {
                continue;
            }

            let parts = std::mem::take(&mut self.pending);
            if std::mem::take(&mut self.overflow) {
                return Err(MultipartError::TooManyParts {
                    max: self.config.max_parts,
                });
            }
            return Ok(Some(parts));
        }
        Ok(None)
    }
}

impl Encoder<Vec<Bytes>> for MultipartCodec {
    type Error = MultipartError;

    fn encode(&mut self, parts: Vec<Bytes>, dst: &mut BytesMut) -> Result<()> {
        if parts.len() > self.config.max_parts {
            return Err(MultipartError::TooManyParts {
                max: self.config.max_parts,
            });
        }
        let last = parts.len().saturating_sub(1);
        for (idx, part) in parts.iter().enumerate() {
            if part.len() > self.config.max_part_size {
                return Err(MultipartError::PartTooLarge {
                    size: part.len(),
                    max: self.config.max_part_size,
                });
            }
            encode_part(part, idx < last, dst)?;
        }
        Ok(())
    }
}
