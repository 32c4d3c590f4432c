use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuthRequest, Identity};

#[derive(Debug, Error)]
pub enum AuthError {
    /// No credentials were presented
    #[error("Authentication required")]
    NotAuthenticated,

    /// Credentials were presented but rejected
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The authenticator could not be built from config
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl AuthError {
    /// True when the caller can fix the failure by sending other credentials.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::InvalidCredentials(_))
    }
}

/// Resolves the identity behind a request.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// Short name reported in logs and in `Identity::method`
    fn method_name(&self) -> &'static str;

    async fn is_authenticated(&self, request: &AuthRequest) -> bool {
        self.authenticate(request).await.is_ok()
    }
}
