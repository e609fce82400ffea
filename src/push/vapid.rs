//! VAPID key pair for Web Push (RFC 8292).
//!
//! One P-256 key pair signs every delivery the server makes. The private half
//! lives in `vapid.json` under the data directory; the public half is handed to
//! browsers as the `applicationServerKey`.

use std::fs;
use std::path::Path;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL};
use p256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Length of an uncompressed SEC1 P-256 point (0x04 || x || y).
pub const PUBLIC_KEY_LEN: usize = 65;
const PRIVATE_KEY_LEN: usize = 32;

/// The raw 32-byte scalar is stored rather than DER because
/// `web_push::VapidSignatureBuilder::from_base64` expects exactly that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VapidKeys {
    private_key: String,
    public_key: String,
}

impl VapidKeys {
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let public_point = signing_key.verifying_key().to_encoded_point(false);

        Self {
            private_key: BASE64URL.encode(signing_key.to_bytes().as_slice()),
            public_key: BASE64URL.encode(public_point.as_bytes()),
        }
    }

    /// Rebuilds a key pair from base64url strings, validating both halves.
    pub fn from_base64url(public_key: &str, private_key: &str) -> Result<Self> {
        decode_public_key(public_key)?;

        let private_bytes = BASE64URL
            .decode(private_key)
            .map_err(|e| Error::Crypto(format!("invalid base64url for VAPID private key: {e}")))?;
        if private_bytes.len() != PRIVATE_KEY_LEN {
            return Err(Error::Crypto(format!(
                "VAPID private key must be a {PRIVATE_KEY_LEN}-byte P-256 scalar, got {} bytes",
                private_bytes.len()
            )));
        }
        SigningKey::from_bytes(private_bytes.as_slice().into())
            .map_err(|_| Error::Crypto("VAPID private key is not a valid P-256 scalar".to_string()))?;

        Ok(Self {
            private_key: private_key.to_string(),
            public_key: public_key.to_string(),
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let stored: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("corrupt VAPID key file: {e}")))?;
        Self::from_base64url(&stored.public_key, &stored.private_key)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to encode VAPID keys: {e}")))?;
        fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Base64url public key, sent to browsers as the `applicationServerKey`.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Base64url raw private scalar, consumed by the delivery signer.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

/// Decodes a base64url VAPID public key into raw key material.
pub fn decode_public_key(encoded: &str) -> Result<Vec<u8>> {
    let bytes = BASE64URL
        .decode(encoded.trim_end_matches('='))
        .map_err(|e| Error::Crypto(format!("invalid base64url for VAPID public key: {e}")))?;

    if bytes.len() != PUBLIC_KEY_LEN || bytes[0] != 0x04 {
        return Err(Error::Crypto(format!(
            "VAPID public key must be a {PUBLIC_KEY_LEN}-byte uncompressed P-256 point"
        )));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_produces_expected_lengths() {
        let keys = VapidKeys::generate();

        let public = decode_public_key(keys.public_key()).unwrap();
        assert_eq!(public.len(), PUBLIC_KEY_LEN);
        assert_eq!(public[0], 0x04);

        let private = BASE64URL.decode(keys.private_key()).unwrap();
        assert_eq!(private.len(), PRIVATE_KEY_LEN);
    }

    #[test]
    fn test_from_base64url_rejects_invalid() {
        assert!(VapidKeys::from_base64url("not-valid-key", "also-bad").is_err());

        let keys = VapidKeys::generate();
        assert!(VapidKeys::from_base64url(keys.public_key(), "AAAA").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vapid.json");

        let keys = VapidKeys::generate();
        keys.save(&path).unwrap();

        let loaded = VapidKeys::load(&path).unwrap();
        assert_eq!(loaded.public_key(), keys.public_key());
        assert_eq!(loaded.private_key(), keys.private_key());
    }

    #[test]
    fn test_keys_accepted_by_web_push_signer() {
        use web_push::{SubscriptionInfo, VapidSignatureBuilder};

        let keys = VapidKeys::generate();
        let sub = SubscriptionInfo::new(
            "https://push.example.com/test",
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            "AAAAAAAAAAAAAAAAAAAAAA",
        );
        assert!(VapidSignatureBuilder::from_base64(keys.private_key(), &sub).is_ok());
    }
}
