//! Request signing.
//!
//! Each request carries the application id, the user URI, a timestamp and an
//! `Authorization` value: base64(HMAC-SHA1(api_key, method + host + path + md5(params) + ts)).

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

/// Service credentials. The API key never appears in logs or dumps.
#[derive(Clone, Default)]
pub struct Credentials {
    pub app_id: String,
    pub api_key: String,
    pub user: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("api_key", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Headers to attach to one signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SignedHeaders {
    pub timestamp: String,
    pub app_id: String,
    pub user: String,
    pub authorization: String,
}

impl Credentials {
    pub(crate) fn sign(
        &self,
        method: &str,
        host: &str,
        path: &str,
        params: &str,
        timestamp: u64,
    ) -> Result<SignedHeaders, hmac::digest::InvalidLength> {
        let params_digest = hex::encode(Md5::digest(params.as_bytes()));
        let payload = format!("{method}{host}{path}{params_digest}{timestamp}");
        let mut mac = HmacSha1::new_from_slice(self.api_key.as_bytes())?;
        mac.update(payload.as_bytes());
        let authorization = STANDARD.encode(mac.finalize().into_bytes());
        Ok(SignedHeaders {
            timestamp: timestamp.to_string(),
            app_id: self.app_id.clone(),
            user: self.user.clone(),
            authorization,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials {
            app_id: "administer".to_string(),
            api_key: "some-key".to_string(),
            user: "http://ex.org/users/admin".to_string(),
        }
    }

    #[test]
    fn signature_is_deterministic_and_input_sensitive() {
        let a = creds().sign("POST", "ex.org", "/ws/crud/create/", "dataset=x", 1_700_000_000)
            .unwrap();
        let b = creds().sign("POST", "ex.org", "/ws/crud/create/", "dataset=x", 1_700_000_000)
            .unwrap();
        let c = creds().sign("POST", "ex.org", "/ws/crud/create/", "dataset=y", 1_700_000_000)
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a.authorization, c.authorization);
        assert_eq!(a.timestamp, "1700000000");
        // base64 of a 20-byte SHA1 MAC
        assert_eq!(a.authorization.len(), 28);
    }

    #[test]
    fn debug_output_hides_the_api_key() {
        let text = format!("{:?}", creds());
        assert!(!text.contains("some-key"));
        assert!(text.contains("administer"));
    }
}
