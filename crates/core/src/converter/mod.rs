//! Converter capability: the boundary to byte-level format conversion.
//!
//! The workflow only knows the [`Converter`] trait. [`LocalConverter`] is a
//! store-only backend that writes the input under the target extension and
//! hands back a download reference. Results the workflow drops are handed
//! back through [`Converter::discard`].
//!
//! # Example
//!
//! ```ignore
//! use formatshift_core::converter::{
//!     Converter, ConverterConfig, ConversionJob, LocalConverter,
//! };
//! use formatshift_core::Category;
//!
//! let converter = LocalConverter::new(ConverterConfig::default());
//! converter.validate().await?;
//!
//! let job = ConversionJob {
//!     job_id: "job-1".to_string(),
//!     original_name: "report.pdf".to_string(),
//!     source_format: "pdf".to_string(),
//!     target_format: Category::Document.target("DOCX").unwrap(),
//!     input: std::fs::read("report.pdf")?,
//! };
//!
//! let output = converter.convert(job).await?;
//! println!("Download at {}", output.download_ref);
//! ```

mod config;
mod error;
mod local;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use local::LocalConverter;
pub use traits::Converter;
pub use types::{ConversionJob, ConversionOutput};
