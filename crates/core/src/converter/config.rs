//! Configuration for the local converter backend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for [`LocalConverter`](super::LocalConverter).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Directory converted files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Prefix for download references (joined with the output file name).
    #[serde(default = "default_download_base_url")]
    pub download_base_url: String,
}

fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("formatshift-output")
}

fn default_download_base_url() -> String {
    "/downloads".to_string()
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            download_base_url: default_download_base_url(),
        }
    }
}

impl ConverterConfig {
    /// Sets the output directory.
    pub fn with_output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = output_dir;
        self
    }

    /// Sets the download base URL.
    pub fn with_download_base_url(mut self, base: impl Into<String>) -> Self {
        self.download_base_url = base.into();
        self
    }
}
