//! Envelope codec: multipart frames ⇄ [`Message`].
//!
//! Wire format of one multipart message:
//! ```text
//! [identity]* <IDS|MSG> <hex-signature> <header> <parent_header> <metadata> <content> [buffer]*
//! ```
//! The signature covers the four JSON frames, in that order.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Field, MalformedEnvelope, Result, SignatureError, WireError};
use crate::message::{Header, Message};
use crate::signer::Signer;

/// Frame separating routing identities from the signed payload.
pub const DELIMITER: &[u8] = b"<IDS|MSG>";

/// Routing identity frames, preserved verbatim from an inbound message.
pub type Identities = Vec<Bytes>;

/// Signature frame plus the four JSON frames.
const ENVELOPE_FRAMES: usize = 5;

/// Parse raw frames into a message and its routing identities.
///
/// The signature is checked before any JSON is parsed; a message that fails
/// either step is rejected whole.
pub fn decode(frames: &[Bytes], signer: &Signer) -> Result<(Message, Identities)> {
    let delim = frames
        .iter()
        .position(|frame| frame.as_ref() == DELIMITER)
        .ok_or(MalformedEnvelope::MissingDelimiter)?;

    let identities = frames[..delim].to_vec();
    let envelope = &frames[delim + 1..];
    if envelope.len() < ENVELOPE_FRAMES {
        return Err(MalformedEnvelope::Truncated {
            found: envelope.len(),
        }
        .into());
    }

    let signature = &envelope[0];
    let signed = &envelope[1..ENVELOPE_FRAMES];
    if !signer.verify(signed, signature) {
        return Err(SignatureError.into());
    }

    let header: Header = parse(Field::Header, &signed[0])?;
    let parent_header: Header = parse(Field::ParentHeader, &signed[1])?;
    let metadata: Option<Map<String, Value>> = parse(Field::Metadata, &signed[2])?;
    let content: Value = parse(Field::Content, &signed[3])?;

    if header.msg_id.is_empty() {
        return Err(MalformedEnvelope::MissingHeaderField("msg_id").into());
    }
    if header.msg_type.is_empty() {
        return Err(MalformedEnvelope::MissingHeaderField("msg_type").into());
    }

    let message = Message {
        header,
        parent_header,
        metadata: metadata.unwrap_or_default(),
        content,
        buffers: envelope[ENVELOPE_FRAMES..].to_vec(),
    };
    Ok((message, identities))
}

/// Serialize and sign a message.
///
/// Returns the signature frame, the four JSON frames and any buffers. The
/// identities and delimiter are not included; see [`encode_envelope`].
pub fn encode(msg: &Message, signer: &Signer) -> Result<Vec<Bytes>> {
    let header = to_frame(Field::Header, &msg.header)?;
    let parent_header = to_frame(Field::ParentHeader, &msg.parent_header)?;
    let metadata = to_frame(Field::Metadata, &msg.metadata)?;
    let content = to_frame(Field::Content, &msg.content)?;

    let signature = signer.sign(&[&header, &parent_header, &metadata, &content]);

    let mut frames = Vec::with_capacity(ENVELOPE_FRAMES + msg.buffers.len());
    frames.push(Bytes::from(signature));
    frames.push(header);
    frames.push(parent_header);
    frames.push(metadata);
    frames.push(content);
    frames.extend(msg.buffers.iter().cloned());
    Ok(frames)
}

/// Build the complete frame list: identities, delimiter, signed payload.
pub fn encode_envelope(
    identities: &[Bytes],
    msg: &Message,
    signer: &Signer,
) -> Result<Vec<Bytes>> {
    let payload = encode(msg, signer)?;
    let mut frames = Vec::with_capacity(identities.len() + 1 + payload.len());
    frames.extend(identities.iter().cloned());
    frames.push(Bytes::from_static(DELIMITER));
    frames.extend(payload);
    Ok(frames)
}

fn parse<T: DeserializeOwned>(field: Field, frame: &[u8]) -> Result<T> {
    serde_json::from_slice(frame)
        .map_err(|source| WireError::from(MalformedEnvelope::InvalidJson { field, source }))
}

fn to_frame<T: Serialize>(field: Field, value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|source| WireError::Encode { field, source })
}
