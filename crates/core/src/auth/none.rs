use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Open access: every request acts as the anonymous user, so all callers
/// share one session and history scope. Only used when `auth.method = "none"`
/// is written out in config.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoneAuthenticator;

impl NoneAuthenticator {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, _request: &AuthRequest) -> Result<Identity, AuthError> {
        Ok(Identity::anonymous())
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}
