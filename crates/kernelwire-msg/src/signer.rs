//! HMAC signing of envelope frames.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ConfigError;

type HmacSha256 = Hmac<Sha256>;

/// Signature scheme named in a channel's connection info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureScheme {
    #[default]
    HmacSha256,
}

impl SignatureScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            SignatureScheme::HmacSha256 => "hmac-sha256",
        }
    }
}

impl FromStr for SignatureScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hmac-sha256" => Ok(SignatureScheme::HmacSha256),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes and verifies envelope signatures for one channel key.
///
/// An empty key puts the signer in unauthenticated mode: signatures are
/// empty and every signature verifies. Key material never appears in
/// `Debug` output.
#[derive(Clone)]
pub struct Signer {
    scheme: SignatureScheme,
    key_len: usize,
    // Keyed MAC state, cloned per message. `None` when unauthenticated.
    mac: Option<HmacSha256>,
}

impl Signer {
    /// Create a signer for `key` using HMAC-SHA256.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        Self::with_scheme(SignatureScheme::HmacSha256, key)
    }

    /// Create a signer for `key` using an explicit scheme.
    pub fn with_scheme(
        scheme: SignatureScheme,
        key: impl AsRef<[u8]>,
    ) -> Result<Self, ConfigError> {
        let key = key.as_ref();
        if key.is_empty() {
            return Ok(Self::unauthenticated());
        }
        let mac = match scheme {
            SignatureScheme::HmacSha256 => HmacSha256::new_from_slice(key)
                .map_err(|err| ConfigError::InvalidKey(err.to_string()))?,
        };
        Ok(Self {
            scheme,
            key_len: key.len(),
            mac: Some(mac),
        })
    }

    /// A signer that neither signs nor checks signatures.
    pub fn unauthenticated() -> Self {
        Self {
            scheme: SignatureScheme::default(),
            key_len: 0,
            mac: None,
        }
    }

    /// Whether a key is configured.
    pub fn is_authenticated(&self) -> bool {
        self.mac.is_some()
    }

    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    /// Sign `parts` in order, returning the lowercase hex digest.
    ///
    /// Each part is fed to the MAC in turn, so the result equals the MAC of
    /// their concatenation. Unauthenticated signers return an empty vector.
    pub fn sign<P: AsRef<[u8]>>(&self, parts: &[P]) -> Vec<u8> {
        match self.digest(parts) {
            Some(mac) => hex::encode(mac.finalize().into_bytes()).into_bytes(),
            None => Vec::new(),
        }
    }

    /// Verify a hex `signature` over `parts` in constant time.
    ///
    /// Only lowercase hex is accepted, so every distinct signature frame
    /// maps to a distinct MAC. Unauthenticated signers accept anything.
    pub fn verify<P: AsRef<[u8]>>(&self, parts: &[P], signature: &[u8]) -> bool {
        let Some(mac) = self.digest(parts) else {
            return true;
        };
        if !signature.iter().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return false;
        }
        match hex::decode(signature) {
            Ok(expected) => mac.verify_slice(&expected).is_ok(),
            Err(_) => false,
        }
    }

    fn digest<P: AsRef<[u8]>>(&self, parts: &[P]) -> Option<HmacSha256> {
        let mut mac = self.mac.clone()?;
        for part in parts {
            mac.update(part.as_ref());
        }
        Some(mac)
    }
}

impl Default for Signer {
    fn default() -> Self {
        Self::unauthenticated()
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Signer");
        dbg.field("scheme", &self.scheme);
        if self.is_authenticated() {
            dbg.field("key", &format_args!("<redacted:{} bytes>", self.key_len));
        } else {
            dbg.field("key", &Option::<()>::None);
        }
        dbg.finish()
    }
}
