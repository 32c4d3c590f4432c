//! Single shared API key.
//!
//! Clients send the key as `Authorization: Bearer <key>` or `X-API-Key: <key>`.
//! The caller's user id is derived from the key, so everyone holding the
//! same key shares sessions and history.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{AuthError, AuthRequest, Authenticator, Identity};

pub struct ApiKeyAuthenticator {
    expected_digest: [u8; 32],
    user_id: String,
}

impl ApiKeyAuthenticator {
    pub fn new(api_key: String) -> Self {
        let expected_digest = digest(&api_key);
        Self {
            user_id: user_id_for(&expected_digest),
            expected_digest,
        }
    }

    /// The user id every request carrying the configured key acts as.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Key presented on the request. A bearer header wins over `X-API-Key`.
fn presented_key(request: &AuthRequest) -> Option<&str> {
    let bearer = request.header("authorization").and_then(|value| {
        value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .map(str::trim)
    });
    bearer.or_else(|| request.header("x-api-key"))
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let key = presented_key(request).ok_or(AuthError::NotAuthenticated)?;

        // Comparing digests keeps the check independent of key length.
        if constant_time_eq(&digest(key), &self.expected_digest) {
            Ok(Identity::new(self.user_id.clone(), self.method_name()))
        } else {
            Err(AuthError::InvalidCredentials("Invalid API key".to_string()))
        }
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

fn digest(key: &str) -> [u8; 32] {
    Sha256::digest(key.as_bytes()).into()
}

/// `key-` and the first 12 hex digits of the key's SHA-256.
fn user_id_for(digest: &[u8; 32]) -> String {
    let hex: String = digest[..6].iter().map(|b| format!("{:02x}", b)).collect();
    format!("key-{}", hex)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
