use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use kernelwire_msg::{SignatureScheme, Signer};

use crate::exit::{config_error, io_error, CliResult};

/// Channel security settings shared by every command that touches the wire.
#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// Signing key. Empty disables signing and verification.
    #[arg(long, env = "KERNELWIRE_KEY", hide_env_values = true, conflicts_with = "key_file")]
    pub key: Option<String>,

    /// Read the signing key from a file (surrounding whitespace is trimmed).
    #[arg(long, value_name = "PATH")]
    pub key_file: Option<PathBuf>,

    /// Signature scheme, as named in kernel connection files.
    #[arg(
        long,
        env = "KERNELWIRE_SIGNATURE_SCHEME",
        default_value = "hmac-sha256"
    )]
    pub signature_scheme: String,
}

impl KeyArgs {
    /// Build the signer for this channel.
    pub fn signer(&self) -> CliResult<Arc<Signer>> {
        let scheme: SignatureScheme = self
            .signature_scheme
            .parse()
            .map_err(|err| config_error("invalid --signature-scheme", err))?;
        let key = self.key_bytes()?;

        let signer =
            Signer::with_scheme(scheme, &key).map_err(|err| config_error("invalid key", err))?;
        if signer.is_authenticated() {
            tracing::debug!(scheme = %scheme, "message signing enabled");
        } else {
            tracing::warn!("no signing key configured; messages are neither signed nor verified");
        }
        Ok(Arc::new(signer))
    }

    fn key_bytes(&self) -> CliResult<Vec<u8>> {
        if let Some(path) = &self.key_file {
            let raw = fs::read_to_string(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
            return Ok(raw.trim().as_bytes().to_vec());
        }
        Ok(self
            .key
            .as_deref()
            .map(|key| key.as_bytes().to_vec())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::USAGE;

    fn args(key: Option<&str>) -> KeyArgs {
        KeyArgs {
            key: key.map(str::to_string),
            key_file: None,
            signature_scheme: "hmac-sha256".to_string(),
        }
    }

    #[test]
    fn missing_key_is_unauthenticated() {
        let signer = args(None).signer().unwrap();
        assert!(!signer.is_authenticated());
        assert!(!args(Some("")).signer().unwrap().is_authenticated());
    }

    #[test]
    fn key_enables_signing() {
        assert!(args(Some("secret")).signer().unwrap().is_authenticated());
    }

    #[test]
    fn unknown_scheme_is_usage_error() {
        let mut args = args(Some("secret"));
        args.signature_scheme = "hmac-md5".to_string();
        let err = args.signer().unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn key_file_is_trimmed() {
        let path = std::env::temp_dir().join(format!("kernelwire-key-{}", std::process::id()));
        fs::write(&path, "secret\n").unwrap();

        let from_file = KeyArgs {
            key_file: Some(path.clone()),
            ..args(None)
        };
        let parts = [b"{}".as_slice()];
        assert_eq!(
            from_file.signer().unwrap().sign(&parts),
            args(Some("secret")).signer().unwrap().sign(&parts)
        );
        let _ = fs::remove_file(&path);
    }
}
