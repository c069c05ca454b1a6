//! Signed message codec for kernel channels.
//!
//! Inbound traffic flows raw multipart frames → [`wire::decode`] →
//! [`Receipt`]. Outbound replies flow [`new_message`] → [`wire::encode`] →
//! [`Receipt::send_reply`], which writes the original routing identities, the
//! `<IDS|MSG>` delimiter and the signed payload as one multipart message.
//!
//! Everything except the send path is pure and safe to call from any
//! number of threads.

pub mod channel;
pub mod error;
pub mod factory;
pub mod message;
pub mod receipt;
pub mod recorder;
pub mod signer;
pub mod wire;

pub use channel::Channel;
pub use error::{ConfigError, Field, MalformedEnvelope, Result, SignatureError, WireError};
pub use factory::{new_message, new_msg_id, reply_type, MessageFactory};
pub use message::{Header, Message};
pub use receipt::{receive, Receipt};
pub use recorder::{MessageRecorder, NullRecorder, TracingRecorder};
pub use signer::{SignatureScheme, Signer};
pub use wire::{decode, encode, encode_envelope, Identities, DELIMITER};
