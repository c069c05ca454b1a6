//! Signed multipart message codec for interactive computing kernels.
//!
//! kernelwire parses, authenticates and produces the multipart messages a
//! kernel exchanges with its front-ends, and routes replies back to the
//! peer that asked.
//!
//! # Crate Structure
//!
//! - [`multipart`]: part framing over byte streams, Unix socket endpoints
//!   and the serialized multipart sender
//! - [`msg`]: signer, envelope codec, message factory and reply routing

/// Re-export multipart transport types.
pub mod multipart {
    pub use kernelwire_multipart::*;
}

/// Re-export message codec types.
pub mod msg {
    pub use kernelwire_msg::*;
}
