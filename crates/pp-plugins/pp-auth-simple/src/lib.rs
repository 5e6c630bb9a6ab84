//! # pp-auth-simple
//!
//! HMAC-SHA256 implementation of `IdentityProvider`.
//! Tokens are `<account_id>.<hex mac>`; the server secret never leaves the
//! process and there is no token store to consult.

use hmac::{Hmac, Mac};
use pp_core::traits::IdentityProvider;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub struct SimpleIdentityProvider {
    /// Keyed once at startup, cloned per token.
    mac: HmacSha256,
}

impl SimpleIdentityProvider {
    /// Accepts the session secret (e.g., from `PICPOP__SESSION_SECRET`).
    pub fn new(secret: &SecretString) -> anyhow::Result<Self> {
        let key = secret.expose_secret();
        if key.is_empty() {
            anyhow::bail!("session secret must not be empty");
        }
        let mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid session secret: {e}"))?;
        Ok(Self { mac })
    }

    fn sign(&self, account_id: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(account_id.as_bytes());
        mac
    }
}

impl IdentityProvider for SimpleIdentityProvider {
    fn issue_token(&self, account_id: &str) -> String {
        let tag = self.sign(account_id).finalize().into_bytes();
        format!("{}.{}", account_id, hex::encode(tag))
    }

    /// Constant-time check of the tag; any malformed token is simply rejected.
    fn verify_token(&self, token: &str) -> Option<String> {
        let (account_id, tag) = token.rsplit_once('.')?;
        if account_id.is_empty() {
            return None;
        }
        let tag = hex::decode(tag).ok()?;
        match self.sign(account_id).verify_slice(&tag) {
            Ok(()) => Some(account_id.to_string()),
            Err(_) => {
                log::debug!("rejected bearer token with bad signature");
                None
            }
        }
    }
}
