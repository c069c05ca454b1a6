//! Passive observation of outbound messages.

use serde_json::Value;

/// Receives a record of every message sent through a reply path.
///
/// Called after the message has been written. Implementations must not
/// block for long and cannot fail the send.
pub trait MessageRecorder: Send + Sync {
    fn record_outbound(&self, msg_type: &str, content: &Value);
}

/// Emits outbound messages as `tracing` debug events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRecorder;

impl MessageRecorder for TracingRecorder {
    fn record_outbound(&self, msg_type: &str, content: &Value) {
        tracing::debug!(target: "kernelwire::outbound", msg_type, %content, "<--");
    }
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl MessageRecorder for NullRecorder {
    fn record_outbound(&self, _msg_type: &str, _content: &Value) {}
}
