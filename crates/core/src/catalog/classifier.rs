//! Media type to category classification.

use super::types::Category;

/// Assigns a declared media type (e.g. `image/png`) to a category.
///
/// Matching is by substring, checked in the order image, audio, video.
/// Anything else, including an empty string, falls back to `Document`.
pub fn classify(declared_media_type: &str) -> Category {
    if declared_media_type.contains("image") {
        Category::Image
    } else if declared_media_type.contains("audio") {
        Category::Audio
    } else if declared_media_type.contains("video") {
        Category::Video
    } else {
        if !declared_media_type.starts_with("application/")
            && !declared_media_type.starts_with("text/")
        {
            tracing::debug!(
                media_type = declared_media_type,
                "Unrecognized media type, classifying as document"
            );
        }
        Category::Document
    }
}
