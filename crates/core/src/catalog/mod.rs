//! Format catalog and category classifier.
//!
//! The catalog maps each [`Category`] to the ordered list of target formats a
//! user can pick. The classifier derives the category from a file's declared
//! media type.

mod classifier;
mod formats;
mod types;

pub use classifier::classify;
pub use formats::{catalog, formats_for};
pub use types::{Category, FormatLabel, UnknownCategory};
