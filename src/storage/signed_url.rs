//! Signed, time-limited URLs for private storage objects.
//!
//! Tokens are HMAC-SHA256 over `"{path}\n{expires_unix}"` with a per-process
//! random secret. Both preview links and extraction input use the default
//! 60-second expiry.

use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use super::StorageError;
use crate::config::SIGNED_URL_EXPIRY_SECS;

type HmacSha256 = Hmac<Sha256>;

/// A signed reference to a storage object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    /// Bucket-relative object path.
    pub path: String,
    /// Unix timestamp after which the URL is rejected.
    pub expires: u64,
    /// URL-safe base64 HMAC tag.
    pub signature: String,
}

impl SignedUrl {
    /// Render as a server-relative URL for the `/files` route.
    ///
    /// The path is interpolated verbatim: stored paths are UUID segments
    /// plus a file name the gateway has restricted to URL-safe characters.
    pub fn to_uri(&self) -> String {
        format!(
            "/files/{}?expires={}&sig={}",
            self.path, self.expires, self.signature
        )
    }
}

/// Issues and verifies signed URLs.
///
/// The secret is generated at startup; restarting the server invalidates
/// outstanding URLs, which is acceptable at a 60-second lifetime.
pub struct UrlSigner {
    secret: [u8; 32],
}

impl UrlSigner {
    pub fn new_random() -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self { secret }
    }

    #[cfg(test)]
    pub fn from_secret(secret: [u8; 32]) -> Self {
        Self { secret }
    }

    /// Sign `path` with the default expiry.
    pub fn sign(&self, path: &str) -> SignedUrl {
        self.sign_with_ttl(path, SIGNED_URL_EXPIRY_SECS)
    }

    /// Sign `path`, valid for `ttl_secs` from now.
    pub fn sign_with_ttl(&self, path: &str, ttl_secs: u64) -> SignedUrl {
        let expires = now_unix() + ttl_secs;
        SignedUrl {
            path: path.to_string(),
            expires,
            signature: self.tag(path, expires),
        }
    }

    /// Verify a presented path/expiry/signature triple.
    ///
    /// Expiry is checked first so a tampered-but-expired token reports
    /// expiry, matching what the client can act on.
    pub fn verify(&self, path: &str, expires: u64, signature: &str) -> Result<(), StorageError> {
        if now_unix() > expires {
            return Err(StorageError::UrlExpired);
        }
        // Constant-time comparison via the Mac verify API
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(message(path, expires).as_bytes());
        let presented = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| StorageError::SignatureMismatch)?;
        mac.verify_slice(&presented)
            .map_err(|_| StorageError::SignatureMismatch)?;
        Ok(())
    }

    fn tag(&self, path: &str, expires: u64) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(message(path, expires).as_bytes());
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

fn message(path: &str, expires: u64) -> String {
    format!("{path}\n{expires}")
}

fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
