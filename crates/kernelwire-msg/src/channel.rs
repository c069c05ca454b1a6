use std::sync::Arc;

use bytes::Bytes;
use kernelwire_multipart::{MultipartSink, SharedSink};

use crate::error::Result;
use crate::message::Message;
use crate::receipt::Receipt;
use crate::recorder::{MessageRecorder, TracingRecorder};
use crate::signer::Signer;
use crate::wire;

/// Outbound side of one kernel socket.
///
/// Bundles the shared sink, the signer configured for the socket and the
/// recorder, so handlers on many threads can answer through one `Channel`.
pub struct Channel<S> {
    sink: SharedSink<S>,
    signer: Arc<Signer>,
    recorder: Arc<dyn MessageRecorder>,
}

impl<S: MultipartSink> Channel<S> {
    /// Channel recording outbound traffic through `tracing`.
    pub fn new(sink: S, signer: Arc<Signer>) -> Self {
        Self::with_recorder(sink, signer, Arc::new(TracingRecorder))
    }

    pub fn with_recorder(
        sink: S,
        signer: Arc<Signer>,
        recorder: Arc<dyn MessageRecorder>,
    ) -> Self {
        Self {
            sink: SharedSink::new(sink),
            signer,
            recorder,
        }
    }

    pub fn signer(&self) -> &Arc<Signer> {
        &self.signer
    }

    pub fn sink(&self) -> &SharedSink<S> {
        &self.sink
    }

    /// Answer `receipt` with `msg`. See [`Receipt::send_reply`].
    pub fn reply(&self, receipt: &Receipt, msg: &Message) -> Result<()> {
        receipt.send_reply(&self.sink, msg, self.recorder.as_ref())
    }

    /// Send a message not tied to an inbound request, signed with this
    /// channel's key.
    pub fn send(&self, identities: &[Bytes], msg: &Message) -> Result<()> {
        let frames = wire::encode_envelope(identities, msg, &self.signer)?;
        self.sink.send_multipart(&frames)?;
        self.recorder.record_outbound(msg.msg_type(), &msg.content);
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.sink.into_inner()
    }
}

impl<S> std::fmt::Debug for Channel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}
