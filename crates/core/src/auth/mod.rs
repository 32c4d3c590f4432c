//! Request authentication.
//!
//! The HTTP layer turns each request into an [`AuthRequest`] and asks the
//! configured [`Authenticator`] for an [`Identity`]. Sessions and history
//! records are scoped by the identity's user id.

mod api_key;
mod none;
mod traits;
mod types;

pub use api_key::ApiKeyAuthenticator;
pub use none::NoneAuthenticator;
pub use traits::{AuthError, Authenticator};
pub use types::{AuthRequest, Identity, ANONYMOUS_USER};

use tracing::debug;

use crate::config::{AuthConfig, AuthMethod};

/// Build the authenticator selected by `config.method`.
///
/// `api_key` needs a non-empty key; a missing one is a configuration error
/// rather than a silent fallback to open access.
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    let authenticator: Box<dyn Authenticator> = match config.method {
        AuthMethod::None => Box::new(NoneAuthenticator::new()),
        AuthMethod::ApiKey => match config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Box::new(ApiKeyAuthenticator::new(key.to_string())),
            _ => {
                return Err(AuthError::ConfigurationError(
                    "api_key must be set when using the api_key auth method".to_string(),
                ))
            }
        },
    };

    debug!(method = authenticator.method_name(), "Authenticator created");
    Ok(authenticator)
}
