//! Configuration for the conversion executor.

use serde::{Deserialize, Serialize};

/// Limits applied to every conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Converter call timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Largest payload accepted by the upload phase.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_timeout() -> u64 {
    300
}

fn default_max_upload_bytes() -> u64 {
    100 * 1024 * 1024
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ExecutorConfig {
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}
