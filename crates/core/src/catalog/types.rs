//! Category and format label types.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Coarse file kind that decides which target formats are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Document,
    Image,
    Audio,
    Video,
}

impl Category {
    /// All categories in display order.
    pub fn all() -> [Category; 4] {
        [
            Category::Document,
            Category::Image,
            Category::Audio,
            Category::Video,
        ]
    }

    /// Returns the category name as used in labels and URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Document => "document",
            Category::Image => "image",
            Category::Audio => "audio",
            Category::Video => "video",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::all()
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A target format label taken from the catalog (e.g. `PDF`, `WEBP`).
///
/// Only the catalog hands these out, so a label always belongs to some
/// category's format list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatLabel(pub(super) &'static str);

impl FormatLabel {
    /// The label as displayed (upper case).
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// The label lower-cased, used as file extension and in history records.
    pub fn extension(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for FormatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for FormatLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str_is_case_insensitive() {
        assert_eq!("image".parse::<Category>().unwrap(), Category::Image);
        assert_eq!("VIDEO".parse::<Category>().unwrap(), Category::Video);
        assert_eq!(" Audio ".parse::<Category>().unwrap(), Category::Audio);
    }

    #[test]
    fn test_category_from_str_unknown() {
        let err = "spreadsheet".parse::<Category>().unwrap_err();
        assert_eq!(err, UnknownCategory("spreadsheet".to_string()));
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Document).unwrap();
        assert_eq!(json, "\"document\"");
        let parsed: Category = serde_json::from_str("\"audio\"").unwrap();
        assert_eq!(parsed, Category::Audio);
    }

    #[test]
    fn test_format_label_extension() {
        let label = FormatLabel("WEBP");
        assert_eq!(label.as_str(), "WEBP");
        assert_eq!(label.extension(), "webp");
        assert_eq!(serde_json::to_string(&label).unwrap(), "\"WEBP\"");
    }
}
