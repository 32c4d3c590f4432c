use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// What an authenticator gets to see of an incoming request
#[derive(Debug, Clone)]
pub struct AuthRequest {
    /// Header names are stored lower-cased
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

impl AuthRequest {
    pub fn new<K, V>(headers: impl IntoIterator<Item = (K, V)>, source_ip: IpAddr) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
                .collect(),
            source_ip,
        }
    }

    /// Header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// User id given to every request when authentication is disabled.
pub const ANONYMOUS_USER: &str = "anonymous";

/// The user a request acts for. Sessions and history records are scoped
/// by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    /// Name of the authenticator that produced this identity
    pub method: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            method: method.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_USER, "none")
    }

    pub fn is_anonymous(&self) -> bool {
        self.method == "none"
    }
}
