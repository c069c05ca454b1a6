use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{MultipartError, Result};

/// Part header: magic (2) + length (4) + flags (2) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Magic bytes: "KW" (0x4B 0x57).
pub const MAGIC: [u8; 2] = [0x4B, 0x57];

/// Flag bit: more parts of the same multipart message follow.
pub const MORE: u16 = 0x0001;

/// Default maximum part size: 16 MiB.
pub const DEFAULT_MAX_PART_SIZE: usize = 16 * 1024 * 1024;

/// Default maximum number of parts in one multipart message.
pub const DEFAULT_MAX_PARTS: usize = 64;

const KNOWN_FLAGS: u16 = MORE;

/// One part of a multipart message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// The part payload.
    pub payload: Bytes,
    /// Whether further parts of the same message follow.
    pub more: bool,
}

impl Part {
    /// Create a new part.
    pub fn new(payload: impl Into<Bytes>, more: bool) -> Self {
        Self {
            payload: payload.into(),
            more,
        }
    }

    /// The total wire size of this part (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode one part into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────┬──────────┬─────────────────┐
/// │ Magic (2B)   │ Length    │ Flags    │ Payload         │
/// │ 0x4B 0x57    │ (4B LE)   │ (2B LE)  │ (Length bytes)  │
/// │ "KW"         │           │ bit0=MORE│                 │
/// └──────────────┴───────────┴──────────┴─────────────────┘
/// ```
pub fn encode_part(payload: &[u8], more: bool, dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(MultipartError::PartTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    let flags = if more { MORE } else { 0 };
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(payload.len() as u32);
    dst.put_u16_le(flags);
    dst.put_slice(payload);
    Ok(())
}

/// Decode one part from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete part yet.
/// On success, consumes the part bytes from the buffer.
pub fn decode_part(src: &mut BytesMut, max_part_size: usize) -> Result<Option<Part>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != MAGIC {
        return Err(MultipartError::InvalidMagic);
    }

    let payload_len = u32::from_le_bytes([src[2], src[3], src[4], src[5]]) as usize;
    let flags = u16::from_le_bytes([src[6], src[7]]);

    if flags & !KNOWN_FLAGS != 0 {
        return Err(MultipartError::InvalidFlags(flags));
    }

    if payload_len > max_part_size {
        return Err(MultipartError::PartTooLarge {
            size: payload_len,
            max: max_part_size,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Part {
        payload,
        more: flags & MORE != 0,
    }))
}

/// Configuration for multipart readers and writers.
#[derive(Debug, Clone)]
pub struct PartConfig {
    /// Maximum size of a single part in bytes. Default: 16 MiB.
    pub max_part_size: usize,
    /// Maximum number of parts in one multipart message. Default: 64.
    pub max_parts: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for PartConfig {
    fn default() -> Self {
        Self {
            max_part_size: DEFAULT_MAX_PART_SIZE,
            max_parts: DEFAULT_MAX_PARTS,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
