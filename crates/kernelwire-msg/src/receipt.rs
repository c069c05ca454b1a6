use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;
use kernelwire_multipart::{MultipartReader, MultipartSink, SharedSink};

use crate::error::Result;
use crate::factory::new_message;
use crate::message::Message;
use crate::recorder::MessageRecorder;
use crate::signer::Signer;
use crate::wire::{self, Identities, DELIMITER};

/// A received message bundled with what is needed to answer it.
///
/// Owned by the handler processing the request and dropped when it is done.
#[derive(Debug, Clone)]
pub struct Receipt {
    /// The decoded inbound message.
    pub message: Message,
    /// Routing identities the message arrived with.
    pub identities: Identities,
    signer: Arc<Signer>,
}

impl Receipt {
    pub fn new(message: Message, identities: Identities, signer: Arc<Signer>) -> Self {
        Self {
            message,
            identities,
            signer,
        }
    }

    /// Decode raw frames received on a channel signed by `signer`.
    pub fn decode(frames: &[Bytes], signer: Arc<Signer>) -> Result<Self> {
        let (message, identities) = wire::decode(frames, &signer)?;
        Ok(Self::new(message, identities, signer))
    }

    /// Signer of the channel the message arrived on.
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Whether the message was checked against a key.
    ///
    /// `false` means the channel runs without a key and the message was
    /// accepted unverified.
    pub fn authenticated(&self) -> bool {
        self.signer.is_authenticated()
    }

    /// Start a reply of `msg_type` correlated to the received message.
    pub fn reply(&self, msg_type: impl Into<String>) -> Message {
        new_message(msg_type, &self.message)
    }

    /// Send `msg` back to the original requester through `socket`.
    ///
    /// Writes, as one multipart message: the routing identities, the
    /// delimiter, then the signed payload. Nothing is written if `msg`
    /// fails to encode. The record goes to `recorder` once the send succeeds.
    pub fn send_reply<S: MultipartSink>(
        &self,
        socket: &SharedSink<S>,
        msg: &Message,
        recorder: &dyn MessageRecorder,
    ) -> Result<()> {
        let payload = wire::encode(msg, &self.signer)?;

        socket.send_message(|sink| {
            sink.send_parts(&self.identities, true)?;
            sink.send_part(DELIMITER, true)?;
            sink.send_parts(&payload, false)?;
            sink.flush()
        })?;

        recorder.record_outbound(&msg.header.msg_type, &msg.content);
        Ok(())
    }
}

/// Read one multipart message from `reader` and decode it.
///
/// Transport failures and rejected envelopes both surface as errors; a
/// rejected envelope has been fully consumed, so the next call reads the
/// following message.
pub fn receive<R: Read>(
    reader: &mut MultipartReader<R>,
    signer: &Arc<Signer>,
) -> Result<Receipt> {
    let frames = reader.read_multipart()?;
    Receipt::decode(&frames, Arc::clone(signer))
}
